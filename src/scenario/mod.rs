//! Scenario model: ordered setup/check/teardown steps sharing scenario-local
//! state.
//!
//! State is an explicit name-to-value map scoped to one scenario run. Setup
//! (and check) steps populate it by extracting values from responses; later
//! steps read it through `{{name}}` placeholders resolved immediately before
//! the step's request is built. Nothing is shared between scenarios, so any
//! number of them can run in parallel.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::http::RequestSpec;
use crate::testing::{Assertion, AssertionOutcome};

/// Pull one named value out of a step's response body by JSON pointer.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub name: String,
    pub pointer: String,
}

impl Extraction {
    pub fn new(name: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pointer: pointer.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StepKind {
    /// Prepare state for later steps. A transport failure or a missing
    /// extraction target errors the scenario.
    Setup { extract: Vec<Extraction> },
    /// Execute a request and assert on the capture. May also extract values
    /// for later steps.
    Check {
        assertions: Vec<Assertion>,
        extract: Vec<Extraction>,
    },
    /// Best-effort cleanup. Runs on every exit path; its failures are
    /// recorded but never change the scenario verdict.
    Teardown,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub request: RequestSpec,
    pub kind: StepKind,
}

/// One complete, independently reportable test case.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn setup(
        mut self,
        name: impl Into<String>,
        request: RequestSpec,
        extract: Vec<Extraction>,
    ) -> Self {
        self.steps.push(Step {
            name: name.into(),
            request,
            kind: StepKind::Setup { extract },
        });
        self
    }

    pub fn check(
        self,
        name: impl Into<String>,
        request: RequestSpec,
        assertions: Vec<Assertion>,
    ) -> Self {
        self.check_extracting(name, request, assertions, Vec::new())
    }

    pub fn check_extracting(
        mut self,
        name: impl Into<String>,
        request: RequestSpec,
        assertions: Vec<Assertion>,
        extract: Vec<Extraction>,
    ) -> Self {
        self.steps.push(Step {
            name: name.into(),
            request,
            kind: StepKind::Check { assertions, extract },
        });
        self
    }

    pub fn teardown(mut self, name: impl Into<String>, request: RequestSpec) -> Self {
        self.steps.push(Step {
            name: name.into(),
            request,
            kind: StepKind::Teardown,
        });
        self
    }
}

/// Scenario-local state populated by extractions.
#[derive(Debug, Clone, Default)]
pub struct ScenarioState {
    values: HashMap<String, Value>,
}

impl ScenarioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Replace `{{name}}` placeholders. Unknown placeholders are left
    /// untouched. Strings substitute raw; other scalars use their JSON
    /// rendering, so a numeric id interpolates into a path without quotes.
    pub fn render(&self, input: &str) -> String {
        let mut result = input.to_string();
        for (key, value) in &self.values {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            result = result.replace(&format!("{{{{{key}}}}}"), &rendered);
        }
        result
    }

    /// Resolve every placeholder in a request template: path, header
    /// values, and string leaves of the JSON body.
    pub fn resolve_request(&self, template: &RequestSpec) -> RequestSpec {
        let mut resolved = template.clone();
        resolved.path = self.render(&template.path);
        resolved.headers = template
            .headers
            .iter()
            .map(|(key, value)| (key.clone(), self.render(value)))
            .collect();
        resolved.body = template.body.as_ref().map(|body| self.render_value(body));
        resolved
    }

    fn render_value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => {
                // A placeholder standing alone substitutes the stored value
                // with its type intact; embedded placeholders render to text.
                if let Some(name) = lone_placeholder(text) {
                    if let Some(stored) = self.values.get(name) {
                        return stored.clone();
                    }
                }
                Value::String(self.render(text))
            }
            Value::Array(items) => Value::Array(items.iter().map(|item| self.render_value(item)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.render_value(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

fn lone_placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.is_empty() || inner.contains('{') || inner.contains('}') {
        return None;
    }
    Some(inner)
}

/// Scenario lifecycle. Pending and Running are transient; the other three
/// are final verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub assertions: Vec<AssertionOutcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub steps: Vec<StepOutcome>,
    pub teardown_failures: Vec<String>,
    pub duration_ms: u64,
}

impl ScenarioResult {
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.steps
            .iter()
            .flat_map(|step| step.assertions.iter())
            .filter(|outcome| !outcome.passed)
    }
}
