//! Report renderers: human list for stdout, JSON for machines, and a
//! self-contained HTML page.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};
use crate::scenario::{ScenarioResult, ScenarioStatus};

use super::RunSummary;

fn status_mark(status: ScenarioStatus) -> &'static str {
    match status {
        ScenarioStatus::Passed => "ok",
        ScenarioStatus::Failed => "FAIL",
        ScenarioStatus::Errored => "ERROR",
        ScenarioStatus::Pending | ScenarioStatus::Running => "...",
    }
}

/// Human-readable listing, one line per scenario plus expected/actual
/// detail for every failing assertion.
pub fn render_list(results: &[ScenarioResult], summary: &RunSummary) -> String {
    let mut out = String::new();

    for result in results {
        out.push_str(&format!(
            "  [{:>5}] {} ({}ms)\n",
            status_mark(result.status),
            result.name,
            result.duration_ms
        ));

        for step in &result.steps {
            if let Some(error) = &step.error {
                out.push_str(&format!("      step `{}`: {error}\n", step.step));
            }
            for outcome in step.assertions.iter().filter(|outcome| !outcome.passed) {
                out.push_str(&format!("      {}\n", outcome.description));
                out.push_str(&format!("        expected: {}\n", outcome.expected));
                out.push_str(&format!("        actual:   {}\n", outcome.actual));
            }
        }
        for failure in &result.teardown_failures {
            out.push_str(&format!("      teardown: {failure}\n"));
        }
    }

    out.push_str(&format!(
        "\n  {} passed, {} failed, {} errored ({} total) in {}ms\n",
        summary.passed, summary.failed, summary.errored, summary.total, summary.duration_total_ms
    ));
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    summary: &'a RunSummary,
    scenarios: &'a [ScenarioResult],
}

/// Machine-readable report with per-scenario and per-assertion detail.
pub fn render_json(results: &[ScenarioResult], summary: &RunSummary) -> HarnessResult<String> {
    let report = JsonReport {
        summary,
        scenarios: results,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|err| HarnessError::Report(format!("failed to serialize report: {err}")))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Self-contained HTML page with the same detail as the JSON report.
pub fn render_html(results: &[ScenarioResult], summary: &RunSummary) -> String {
    let mut rows = String::new();
    for result in results {
        let mut detail = String::new();
        for step in &result.steps {
            if let Some(error) = &step.error {
                detail.push_str(&format!(
                    "<div class=\"error\">step <code>{}</code>: {}</div>",
                    escape_html(&step.step),
                    escape_html(error)
                ));
            }
            for outcome in step.assertions.iter().filter(|outcome| !outcome.passed) {
                detail.push_str(&format!(
                    "<div class=\"assertion\"><code>{}</code><br>expected: <code>{}</code><br>actual: <code>{}</code></div>",
                    escape_html(&outcome.description),
                    escape_html(&outcome.expected),
                    escape_html(&outcome.actual)
                ));
            }
        }
        for failure in &result.teardown_failures {
            detail.push_str(&format!(
                "<div class=\"teardown\">teardown: {}</div>",
                escape_html(failure)
            ));
        }

        rows.push_str(&format!(
            "<tr class=\"{status}\"><td>{status}</td><td>{name}</td><td>{duration}ms</td><td>{detail}</td></tr>\n",
            status = status_label(result.status),
            name = escape_html(&result.name),
            duration = result.duration_ms,
            detail = detail
        ));
    }

    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>testman report</title>\n<style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         td, th {{ border: 1px solid #ccc; padding: 6px 10px; vertical-align: top; }}\n\
         tr.passed td:first-child {{ color: #2a7a2a; }}\n\
         tr.failed td:first-child {{ color: #b03030; }}\n\
         tr.errored td:first-child {{ color: #b07020; }}\n\
         code {{ background: #f5f5f5; padding: 1px 3px; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>testman report</h1>\n\
         <p>{passed} passed, {failed} failed, {errored} errored ({total} total) in {duration}ms</p>\n\
         <table>\n<tr><th>Status</th><th>Scenario</th><th>Duration</th><th>Detail</th></tr>\n{rows}</table>\n\
         </body>\n</html>\n",
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        total = summary.total,
        duration = summary.duration_total_ms,
        rows = rows
    )
}

fn status_label(status: ScenarioStatus) -> &'static str {
    match status {
        ScenarioStatus::Passed => "passed",
        ScenarioStatus::Failed => "failed",
        ScenarioStatus::Errored => "errored",
        ScenarioStatus::Pending | ScenarioStatus::Running => "pending",
    }
}

pub fn write_report_file(path: &Path, contents: &str) -> HarnessResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                HarnessError::Report(format!("failed to create report directory `{}`: {err}", parent.display()))
            })?;
        }
    }
    fs::write(path, contents)
        .map_err(|err| HarnessError::Report(format!("failed to write report file `{}`: {err}", path.display())))
}
