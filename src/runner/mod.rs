//! Scenario execution: step sequencing within a scenario, worker-pool
//! fan-out across scenarios, and run-wide cancellation.
//!
//! A scenario moves Pending -> Running -> {Passed, Failed, Errored}. Steps
//! run strictly in declaration order because later steps read state captured
//! by earlier ones. Teardown steps run on every exit path and are not
//! interruptible by cancellation, so a cancelled run still cleans up the
//! resources it created.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::http::{self, ExecutionContext};
use crate::scenario::{Scenario, ScenarioResult, ScenarioState, ScenarioStatus, StepKind, StepOutcome};
use crate::testing;

/// Run-wide cancellation handle.
///
/// The flag stops new scenarios and new setup/check steps from starting;
/// the broadcast channel interrupts requests already in flight.
pub struct RunCancel {
    cancelled: AtomicBool,
    tx: broadcast::Sender<()>,
}

impl RunCancel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            cancelled: AtomicBool::new(false),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for RunCancel {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute one scenario to completion.
pub async fn run_scenario(
    scenario: &Scenario,
    ctx: &ExecutionContext,
    cancel: &RunCancel,
) -> ScenarioResult {
    let started = Instant::now();
    let mut state = ScenarioState::new();
    let mut steps = Vec::with_capacity(scenario.steps.len());
    let mut teardown_failures = Vec::new();
    let mut errored = false;
    let mut assertion_failed = false;

    for step in &scenario.steps {
        match &step.kind {
            StepKind::Teardown => {
                // Best-effort cleanup, shielded from cancellation. The
                // guard keeps the channel open so the select arm in the
                // executor never fires.
                let request = state.resolve_request(&step.request);
                let (guard, mut detached_rx) = broadcast::channel(1);
                let outcome = http::execute(&request, ctx, &mut detached_rx).await;
                drop(guard);

                match outcome {
                    Ok(_) => steps.push(StepOutcome {
                        step: step.name.clone(),
                        error: None,
                        assertions: Vec::new(),
                    }),
                    Err(err) => {
                        teardown_failures.push(format!("{}: {err}", step.name));
                        steps.push(StepOutcome {
                            step: step.name.clone(),
                            error: Some(err.to_string()),
                            assertions: Vec::new(),
                        });
                    }
                }
            }

            StepKind::Setup { extract } | StepKind::Check { extract, .. } => {
                if errored {
                    continue;
                }
                if cancel.is_cancelled() {
                    errored = true;
                    steps.push(StepOutcome {
                        step: step.name.clone(),
                        error: Some("run cancelled before step started".to_string()),
                        assertions: Vec::new(),
                    });
                    continue;
                }

                let request = state.resolve_request(&step.request);
                let mut cancel_rx = cancel.subscribe();
                match http::execute(&request, ctx, &mut cancel_rx).await {
                    Err(err) => {
                        errored = true;
                        steps.push(StepOutcome {
                            step: step.name.clone(),
                            error: Some(err.to_string()),
                            assertions: Vec::new(),
                        });
                    }
                    Ok(response) => {
                        let assertions = match &step.kind {
                            StepKind::Check { assertions, .. } => testing::evaluate(assertions, &response),
                            _ => Vec::new(),
                        };
                        if assertions.iter().any(|outcome| !outcome.passed) {
                            assertion_failed = true;
                        }

                        let mut error = None;
                        for extraction in extract {
                            match response.json().and_then(|body| body.pointer(&extraction.pointer)) {
                                Some(value) => state.set(&extraction.name, value.clone()),
                                None => {
                                    errored = true;
                                    error = Some(format!(
                                        "extraction `{}` not found at `{}` in response",
                                        extraction.name, extraction.pointer
                                    ));
                                    break;
                                }
                            }
                        }

                        steps.push(StepOutcome {
                            step: step.name.clone(),
                            error,
                            assertions,
                        });
                    }
                }
            }
        }
    }

    let status = if errored {
        ScenarioStatus::Errored
    } else if assertion_failed {
        ScenarioStatus::Failed
    } else {
        ScenarioStatus::Passed
    };
    debug!(scenario = %scenario.name, status = ?status, "scenario finished");

    ScenarioResult {
        name: scenario.name.clone(),
        status,
        steps,
        teardown_failures,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

#[derive(Debug)]
pub struct SuiteOutcome {
    pub results: Vec<ScenarioResult>,
    pub cancelled: bool,
}

/// Fan scenarios out over a bounded worker pool.
///
/// Workers pull the next scenario index from a shared counter; scenarios
/// share no mutable state, so order of completion does not matter. Results
/// come back sorted by catalog order for stable reporting. After
/// cancellation no new scenario starts, but started ones finish their
/// teardown steps before their worker exits.
pub async fn run_suite(
    scenarios: Vec<Scenario>,
    ctx: ExecutionContext,
    workers: usize,
    cancel: Arc<RunCancel>,
) -> SuiteOutcome {
    let total = scenarios.len();
    let worker_count = workers.max(1).min(total.max(1));
    info!(scenarios = total, workers = worker_count, "starting run");

    let scenarios = Arc::new(scenarios);
    let ctx = Arc::new(ctx);
    let next = Arc::new(AtomicUsize::new(0));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let scenarios = Arc::clone(&scenarios);
        let ctx = Arc::clone(&ctx);
        let next = Arc::clone(&next);
        let cancel = Arc::clone(&cancel);
        let result_tx = result_tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= scenarios.len() || cancel.is_cancelled() {
                    break;
                }
                let result = run_scenario(&scenarios[index], &ctx, &cancel).await;
                let _ = result_tx.send((index, result));
            }
        }));
    }
    drop(result_tx);

    let mut indexed = Vec::with_capacity(total);
    while let Some(entry) = result_rx.recv().await {
        indexed.push(entry);
    }
    for handle in handles {
        let _ = handle.await;
    }

    let cancelled = cancel.is_cancelled();
    if cancelled {
        warn!(completed = indexed.len(), total, "run cancelled before all scenarios started");
    }

    indexed.sort_by_key(|(index, _)| *index);
    SuiteOutcome {
        results: indexed.into_iter().map(|(_, result)| result).collect(),
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestSpec;
    use crate::scenario::Extraction;
    use crate::testing::Assertion;

    #[test]
    fn cancel_handle_flags_and_broadcasts() {
        let cancel = RunCancel::new();
        let mut rx = cancel.subscribe();
        assert!(!cancel.is_cancelled());

        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert!(rx.try_recv().is_ok());
    }

    // 127.0.0.1:1 refuses connections immediately, which makes it a fast,
    // network-free stand-in for an unreachable host.
    fn refused_ctx() -> ExecutionContext {
        ExecutionContext::new("http://127.0.0.1:1", 2_000)
    }

    #[tokio::test]
    async fn transport_failure_errors_scenario_and_still_runs_teardown() {
        let scenario = Scenario::new("refused")
            .setup(
                "create",
                RequestSpec::post("activities"),
                vec![Extraction::new("id", "/id")],
            )
            .check(
                "read",
                RequestSpec::get("activities/{{id}}"),
                vec![Assertion::StatusEquals(200)],
            )
            .teardown("cleanup", RequestSpec::delete("activities/{{id}}"));

        let result = run_scenario(&scenario, &refused_ctx(), &RunCancel::new()).await;

        assert_eq!(result.status, ScenarioStatus::Errored);
        // Setup failed, check skipped, teardown still attempted.
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].step, "create");
        assert!(result.steps[0].error.is_some());
        assert_eq!(result.steps[1].step, "cleanup");
        assert_eq!(result.teardown_failures.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_run_skips_steps_but_not_teardown() {
        let cancel = RunCancel::new();
        cancel.cancel();

        let scenario = Scenario::new("cancelled")
            .check("read", RequestSpec::get("activities"), vec![])
            .teardown("cleanup", RequestSpec::delete("activities/1"));

        let result = run_scenario(&scenario, &refused_ctx(), &cancel).await;

        assert_eq!(result.status, ScenarioStatus::Errored);
        assert_eq!(result.steps[0].error.as_deref(), Some("run cancelled before step started"));
        // Teardown ran (and recorded its own transport failure).
        assert_eq!(result.steps[1].step, "cleanup");
        assert_eq!(result.teardown_failures.len(), 1);
    }
}
