//! Assertions evaluated against captured HTTP responses.
//!
//! Every assertion is pure: it inspects one `ResponseCapture` and yields a
//! pass/fail outcome with expected and actual values side by side. A bad
//! assertion (missing property, wrong body kind) becomes a failing outcome,
//! never a panic, so one mistake cannot abort the rest of the list.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

use crate::http::ResponseCapture;

/// The JSON type vocabulary assertions compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => JsonKind::String,
            Value::Number(_) => JsonKind::Number,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Object(_) => JsonKind::Object,
            Value::Array(_) => JsonKind::Array,
            Value::Null => JsonKind::Null,
        }
    }
}

impl Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JsonKind::String => "string",
            JsonKind::Number => "number",
            JsonKind::Boolean => "boolean",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
            JsonKind::Null => "null",
        };
        write!(f, "{label}")
    }
}

/// A single declarative expectation.
///
/// Property paths accept a bare name (`title`), a dotted path
/// (`owner.login`), or a JSON pointer (`/owner/login`).
#[derive(Debug, Clone)]
pub enum Assertion {
    StatusEquals(u16),
    /// The named response header exists and contains the substring.
    HeaderContains(String, String),
    HasProperty(String),
    PropertyTypeEquals(String, JsonKind),
    PropertyValueEquals(String, Value),
    BodyEquals(Value),
    BodyIsArray,
    ArrayMinLength(usize),
    /// Fails when two array elements share the same key, reporting every
    /// duplicated key found.
    ArrayAllUnique(String),
    /// Every array element has the property. Vacuously true on an empty
    /// array, like the rest of the element-wise assertions.
    ArrayAllHaveProperty(String),
    ArrayAllPropertyTypeEquals(String, JsonKind),
    ArrayAllPropertyValueEquals(String, Value),
}

impl Assertion {
    pub fn describe(&self) -> String {
        match self {
            Assertion::StatusEquals(status) => format!("status equals {status}"),
            Assertion::HeaderContains(name, needle) => {
                format!("header `{name}` contains `{needle}`")
            }
            Assertion::HasProperty(path) => format!("body has property `{path}`"),
            Assertion::PropertyTypeEquals(path, kind) => {
                format!("property `{path}` has type {kind}")
            }
            Assertion::PropertyValueEquals(path, value) => {
                format!("property `{path}` equals {value}")
            }
            Assertion::BodyEquals(value) => format!("body equals {value}"),
            Assertion::BodyIsArray => "body is an array".to_string(),
            Assertion::ArrayMinLength(min) => format!("array has at least {min} elements"),
            Assertion::ArrayAllUnique(key) => format!("array elements unique by `{key}`"),
            Assertion::ArrayAllHaveProperty(path) => {
                format!("every element has property `{path}`")
            }
            Assertion::ArrayAllPropertyTypeEquals(path, kind) => {
                format!("every element property `{path}` has type {kind}")
            }
            Assertion::ArrayAllPropertyValueEquals(path, value) => {
                format!("every element property `{path}` equals {value}")
            }
        }
    }
}

/// Result of evaluating one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionOutcome {
    pub description: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl AssertionOutcome {
    fn pass(assertion: &Assertion, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            description: assertion.describe(),
            passed: true,
            expected: value.clone(),
            actual: value,
        }
    }

    fn fail(assertion: &Assertion, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            description: assertion.describe(),
            passed: false,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Normalize a property path to a JSON pointer.
fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        return path.to_string();
    }
    format!("/{}", path.replace('.', "/"))
}

fn lookup<'a>(body: Option<&'a Value>, path: &str) -> Option<&'a Value> {
    body.and_then(|value| value.pointer(&normalize_path(path)))
}

/// Evaluate assertions in order. Outcomes preserve list order, and
/// re-evaluating the same list against the same capture is deterministic.
pub fn evaluate(assertions: &[Assertion], response: &ResponseCapture) -> Vec<AssertionOutcome> {
    assertions
        .iter()
        .map(|assertion| evaluate_one(assertion, response))
        .collect()
}

fn evaluate_one(assertion: &Assertion, response: &ResponseCapture) -> AssertionOutcome {
    match assertion {
        Assertion::StatusEquals(expected) => {
            if response.status == *expected {
                AssertionOutcome::pass(assertion, expected.to_string())
            } else {
                AssertionOutcome::fail(assertion, expected.to_string(), response.status.to_string())
            }
        }

        Assertion::HeaderContains(name, needle) => match response.header(name) {
            Some(value) if value.contains(needle.as_str()) => {
                AssertionOutcome::pass(assertion, value.to_string())
            }
            Some(value) => {
                AssertionOutcome::fail(assertion, format!("contains `{needle}`"), value.to_string())
            }
            None => AssertionOutcome::fail(
                assertion,
                format!("contains `{needle}`"),
                format!("header `{name}` absent"),
            ),
        },

        Assertion::HasProperty(path) => match lookup(response.json(), path) {
            Some(value) => AssertionOutcome::pass(assertion, value.to_string()),
            None => AssertionOutcome::fail(
                assertion,
                format!("property `{path}` present"),
                missing_actual(response, path),
            ),
        },

        Assertion::PropertyTypeEquals(path, kind) => match lookup(response.json(), path) {
            Some(value) => {
                let actual = JsonKind::of(value);
                if actual == *kind {
                    AssertionOutcome::pass(assertion, kind.to_string())
                } else {
                    AssertionOutcome::fail(assertion, kind.to_string(), actual.to_string())
                }
            }
            None => AssertionOutcome::fail(assertion, kind.to_string(), missing_actual(response, path)),
        },

        Assertion::PropertyValueEquals(path, expected) => match lookup(response.json(), path) {
            Some(value) => {
                if value == expected {
                    AssertionOutcome::pass(assertion, expected.to_string())
                } else {
                    AssertionOutcome::fail(assertion, expected.to_string(), value.to_string())
                }
            }
            None => {
                AssertionOutcome::fail(assertion, expected.to_string(), missing_actual(response, path))
            }
        },

        Assertion::BodyEquals(expected) => match response.json() {
            Some(value) => {
                if value == expected {
                    AssertionOutcome::pass(assertion, expected.to_string())
                } else {
                    AssertionOutcome::fail(assertion, expected.to_string(), value.to_string())
                }
            }
            None => AssertionOutcome::fail(
                assertion,
                expected.to_string(),
                format!("non-JSON body: {}", response.body.preview()),
            ),
        },

        Assertion::BodyIsArray => match response.json() {
            Some(Value::Array(items)) => {
                AssertionOutcome::pass(assertion, format!("array of {} elements", items.len()))
            }
            Some(value) => {
                AssertionOutcome::fail(assertion, "array", JsonKind::of(value).to_string())
            }
            None => AssertionOutcome::fail(
                assertion,
                "array",
                format!("non-JSON body: {}", response.body.preview()),
            ),
        },

        Assertion::ArrayMinLength(min) => match response.json() {
            Some(Value::Array(items)) => {
                if items.len() >= *min {
                    AssertionOutcome::pass(assertion, format!("length {}", items.len()))
                } else {
                    AssertionOutcome::fail(
                        assertion,
                        format!("length >= {min}"),
                        format!("length {}", items.len()),
                    )
                }
            }
            Some(value) => AssertionOutcome::fail(
                assertion,
                format!("array with length >= {min}"),
                JsonKind::of(value).to_string(),
            ),
            None => AssertionOutcome::fail(
                assertion,
                format!("array with length >= {min}"),
                format!("non-JSON body: {}", response.body.preview()),
            ),
        },

        Assertion::ArrayAllUnique(key) => match response.json() {
            Some(Value::Array(items)) => {
                let keys: Vec<String> = items
                    .iter()
                    .map(|item| {
                        lookup(Some(item), key)
                            .map(Value::to_string)
                            .unwrap_or_else(|| format!("<missing `{key}`>"))
                    })
                    .collect();

                let duplicates = duplicate_keys(&keys);
                if duplicates.is_empty() {
                    AssertionOutcome::pass(assertion, format!("{} unique keys", keys.len()))
                } else {
                    AssertionOutcome::fail(
                        assertion,
                        "all element keys unique",
                        format!("duplicate keys: {}", duplicates.join(", ")),
                    )
                }
            }
            Some(value) => {
                AssertionOutcome::fail(assertion, "array", JsonKind::of(value).to_string())
            }
            None => AssertionOutcome::fail(
                assertion,
                "array",
                format!("non-JSON body: {}", response.body.preview()),
            ),
        },

        Assertion::ArrayAllHaveProperty(path) => evaluate_elements(
            assertion,
            response,
            format!("property `{path}` present"),
            |item| match lookup(Some(item), path) {
                Some(_) => Ok(()),
                None => Err(format!("property `{path}` missing")),
            },
        ),

        Assertion::ArrayAllPropertyTypeEquals(path, kind) => {
            evaluate_elements(assertion, response, kind.to_string(), |item| {
                match lookup(Some(item), path) {
                    Some(value) if JsonKind::of(value) == *kind => Ok(()),
                    Some(value) => Err(JsonKind::of(value).to_string()),
                    None => Err(format!("property `{path}` missing")),
                }
            })
        }

        Assertion::ArrayAllPropertyValueEquals(path, expected) => {
            evaluate_elements(assertion, response, expected.to_string(), |item| {
                match lookup(Some(item), path) {
                    Some(value) if value == expected => Ok(()),
                    Some(value) => Err(value.to_string()),
                    None => Err(format!("property `{path}` missing")),
                }
            })
        }
    }
}

/// Apply a per-element check to every element of an array body, reporting
/// every failing element by index.
fn evaluate_elements(
    assertion: &Assertion,
    response: &ResponseCapture,
    expected: String,
    check: impl Fn(&Value) -> Result<(), String>,
) -> AssertionOutcome {
    match response.json() {
        Some(Value::Array(items)) => {
            let failures: Vec<String> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    check(item).err().map(|actual| format!("[{index}] {actual}"))
                })
                .collect();
            if failures.is_empty() {
                AssertionOutcome::pass(
                    assertion,
                    format!("{expected} for all {} elements", items.len()),
                )
            } else {
                AssertionOutcome::fail(assertion, expected, failures.join("; "))
            }
        }
        Some(value) => AssertionOutcome::fail(assertion, expected, JsonKind::of(value).to_string()),
        None => AssertionOutcome::fail(
            assertion,
            expected,
            format!("non-JSON body: {}", response.body.preview()),
        ),
    }
}

fn missing_actual(response: &ResponseCapture, path: &str) -> String {
    match response.json() {
        Some(_) => format!("property `{path}` missing"),
        None => format!("non-JSON body: {}", response.body.preview()),
    }
}

/// Every key that occurs more than once, in first-occurrence order.
fn duplicate_keys(keys: &[String]) -> Vec<String> {
    let mut duplicates = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        let occurrences = keys.iter().filter(|other| *other == key).count();
        let first_at = keys.iter().position(|other| other == key);
        if occurrences > 1 && first_at == Some(index) {
            duplicates.push(key.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::http::ResponseBody;

    fn capture(status: u16, body: Value) -> ResponseCapture {
        ResponseCapture {
            status,
            headers: HashMap::new(),
            body: ResponseBody::Json(body),
            size_bytes: 0,
            duration_ms: 0,
        }
    }

    fn text_capture(status: u16, body: &str) -> ResponseCapture {
        ResponseCapture {
            status,
            headers: HashMap::new(),
            body: ResponseBody::Text(body.to_string()),
            size_bytes: body.len(),
            duration_ms: 0,
        }
    }

    #[test]
    fn status_equals() {
        let response = capture(404, json!("Not found"));
        let outcomes = evaluate(
            &[Assertion::StatusEquals(404), Assertion::StatusEquals(200)],
            &response,
        );
        assert!(outcomes[0].passed);
        assert!(!outcomes[1].passed);
        assert_eq!(outcomes[1].expected, "200");
        assert_eq!(outcomes[1].actual, "404");
    }

    #[test]
    fn property_type_boolean_vs_string() {
        let response = capture(200, json!({"completed": false}));
        let outcomes = evaluate(
            &[Assertion::PropertyTypeEquals("completed".into(), JsonKind::Boolean)],
            &response,
        );
        assert!(outcomes[0].passed);

        let response = capture(200, json!({"completed": "false"}));
        let outcomes = evaluate(
            &[Assertion::PropertyTypeEquals("completed".into(), JsonKind::Boolean)],
            &response,
        );
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].actual, "string");
    }

    #[test]
    fn nested_paths_resolve() {
        let response = capture(200, json!({"owner": {"login": "octocat"}}));
        let outcomes = evaluate(
            &[
                Assertion::PropertyValueEquals("owner.login".into(), json!("octocat")),
                Assertion::HasProperty("/owner/login".into()),
            ],
            &response,
        );
        assert!(outcomes.iter().all(|outcome| outcome.passed));
    }

    #[test]
    fn missing_property_fails_without_aborting_rest() {
        let response = capture(200, json!({"id": 1}));
        let outcomes = evaluate(
            &[
                Assertion::PropertyTypeEquals("dueDate".into(), JsonKind::String),
                Assertion::StatusEquals(200),
            ],
            &response,
        );
        assert!(!outcomes[0].passed);
        assert!(outcomes[0].actual.contains("missing"));
        assert!(outcomes[1].passed);
    }

    #[test]
    fn body_equals_literal_string() {
        let response = capture(404, json!("Not found"));
        let outcomes = evaluate(&[Assertion::BodyEquals(json!("Not found"))], &response);
        assert!(outcomes[0].passed);
    }

    #[test]
    fn array_all_unique_reports_every_duplicate() {
        let response = capture(
            200,
            json!([{"id": 1}, {"id": 2}, {"id": 1}, {"id": 3}, {"id": 3}]),
        );
        let outcomes = evaluate(&[Assertion::ArrayAllUnique("id".into())], &response);
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].actual, "duplicate keys: 1, 3");
    }

    #[test]
    fn array_all_unique_passes_on_distinct_keys() {
        let response = capture(200, json!([{"id": 1}, {"id": 2}]));
        let outcomes = evaluate(&[Assertion::ArrayAllUnique("id".into())], &response);
        assert!(outcomes[0].passed);
    }

    #[test]
    fn header_contains() {
        let mut response = capture(200, json!([]));
        response
            .headers
            .insert("content-type".into(), "application/json; charset=utf-8".into());

        let outcomes = evaluate(
            &[
                Assertion::HeaderContains("Content-Type".into(), "application/json".into()),
                Assertion::HeaderContains("content-type".into(), "text/html".into()),
                Assertion::HeaderContains("x-request-id".into(), "abc".into()),
            ],
            &response,
        );
        assert!(outcomes[0].passed);
        assert!(!outcomes[1].passed);
        assert!(!outcomes[2].passed);
        assert!(outcomes[2].actual.contains("absent"));
    }

    #[test]
    fn element_wise_assertions_report_failing_indices() {
        let response = capture(
            200,
            json!([
                {"id": 1, "completed": false},
                {"id": "2", "completed": false},
                {"completed": true},
            ]),
        );

        let outcomes = evaluate(
            &[
                Assertion::ArrayAllHaveProperty("id".into()),
                Assertion::ArrayAllPropertyTypeEquals("id".into(), JsonKind::Number),
                Assertion::ArrayAllPropertyValueEquals("completed".into(), json!(false)),
            ],
            &response,
        );

        assert!(!outcomes[0].passed);
        assert!(outcomes[0].actual.contains("[2]"));
        assert!(!outcomes[1].passed);
        assert!(outcomes[1].actual.contains("[1] string"));
        assert!(!outcomes[2].passed);
        assert!(outcomes[2].actual.contains("[2] true"));
    }

    #[test]
    fn element_wise_assertions_pass_on_empty_and_conforming_arrays() {
        let empty = capture(200, json!([]));
        let outcomes = evaluate(
            &[Assertion::ArrayAllHaveProperty("id".into())],
            &empty,
        );
        assert!(outcomes[0].passed);

        let conforming = capture(200, json!([{"owner": {"login": "a"}}, {"owner": {"login": "b"}}]));
        let outcomes = evaluate(
            &[Assertion::ArrayAllHaveProperty("owner.login".into())],
            &conforming,
        );
        assert!(outcomes[0].passed);
    }

    #[test]
    fn element_wise_assertions_require_an_array_body() {
        let response = capture(200, json!({"id": 1}));
        let outcomes = evaluate(
            &[Assertion::ArrayAllPropertyTypeEquals("id".into(), JsonKind::Number)],
            &response,
        );
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].actual, "object");
    }

    #[test]
    fn array_min_length() {
        let response = capture(200, json!([1, 2, 3]));
        let outcomes = evaluate(
            &[
                Assertion::BodyIsArray,
                Assertion::ArrayMinLength(3),
                Assertion::ArrayMinLength(4),
            ],
            &response,
        );
        assert!(outcomes[0].passed);
        assert!(outcomes[1].passed);
        assert!(!outcomes[2].passed);
    }

    #[test]
    fn text_body_fails_property_assertions_gracefully() {
        let response = text_capture(500, "<html>oops</html>");
        let outcomes = evaluate(
            &[
                Assertion::HasProperty("id".into()),
                Assertion::BodyIsArray,
            ],
            &response,
        );
        assert!(!outcomes[0].passed);
        assert!(outcomes[0].actual.contains("non-JSON body"));
        assert!(!outcomes[1].passed);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let response = capture(200, json!({"id": 7, "title": "Activity 7"}));
        let assertions = vec![
            Assertion::StatusEquals(200),
            Assertion::HasProperty("id".into()),
            Assertion::PropertyValueEquals("title".into(), json!("Activity 7")),
            Assertion::PropertyTypeEquals("id".into(), JsonKind::Number),
        ];
        let first = evaluate(&assertions, &response);
        let second = evaluate(&assertions, &response);
        assert_eq!(first, second);
    }
}
