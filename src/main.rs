use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use testman::cli::{Cli, Commands, ReporterKind};
use testman::config::RunConfig;
use testman::report::{ReportAggregator, render};
use testman::runner::{self, RunCancel};
use testman::suite;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Run {
            filter,
            workers,
            timeout,
            reporter,
            report_file,
        } => run(filter, workers, timeout, reporter, report_file).await,
        Commands::List { filter } => list(filter),
    };

    process::exit(exit_code);
}

fn load_config() -> Option<RunConfig> {
    match RunConfig::from_env() {
        Ok(config) => Some(config),
        Err(err) => {
            error!("{err}");
            error!("set TESTMAN_BASE_URL (or URL) to the Activities API to test against");
            None
        }
    }
}

async fn run(
    filter: Option<String>,
    workers: Option<usize>,
    timeout: Option<u64>,
    reporter: ReporterKind,
    report_file: Option<PathBuf>,
) -> i32 {
    let Some(mut config) = load_config() else {
        return 1;
    };
    if let Some(workers) = workers {
        if workers == 0 {
            error!("--workers must be greater than 0");
            return 1;
        }
        config.workers = workers;
    }
    if let Some(timeout) = timeout {
        if timeout == 0 {
            error!("--timeout must be greater than 0");
            return 1;
        }
        config.timeout_ms = timeout;
    }
    if let Some(report_file) = report_file {
        config.report_file = report_file;
    }

    let scenarios = suite::filter(suite::catalog(&config), filter.as_deref());
    if scenarios.is_empty() {
        warn!("no scenarios match the filter; nothing to run");
        return 0;
    }

    let cancel = Arc::new(RunCancel::new());
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested; in-flight teardown steps will finish");
                cancel.cancel();
            }
        });
    }

    let outcome = runner::run_suite(
        scenarios,
        config.execution_context(),
        config.workers,
        cancel,
    )
    .await;

    let mut aggregator = ReportAggregator::new();
    for result in outcome.results {
        aggregator.add(result);
    }
    let summary = aggregator.summary();

    let json_report = match render::render_json(aggregator.results(), &summary) {
        Ok(raw) => raw,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };

    let mut report_ok = true;
    if let Err(err) = render::write_report_file(&config.report_file, &json_report) {
        error!("{err}");
        report_ok = false;
    } else {
        info!(path = %config.report_file.display(), "wrote JSON report");
    }

    match reporter {
        ReporterKind::List => {
            print!("{}", render::render_list(aggregator.results(), &summary));
        }
        ReporterKind::Json => {
            println!("{json_report}");
        }
        ReporterKind::Html => {
            let html_path = config.report_file.with_extension("html");
            let page = render::render_html(aggregator.results(), &summary);
            if let Err(err) = render::write_report_file(&html_path, &page) {
                error!("{err}");
                report_ok = false;
            } else {
                info!(path = %html_path.display(), "wrote HTML report");
            }
            print!("{}", render::render_list(aggregator.results(), &summary));
        }
    }

    if outcome.cancelled {
        warn!("run cancelled");
        return 1;
    }
    if summary.all_passed() && report_ok { 0 } else { 1 }
}

fn list(filter: Option<String>) -> i32 {
    let Some(config) = load_config() else {
        return 1;
    };

    let scenarios = suite::filter(suite::catalog(&config), filter.as_deref());
    for scenario in &scenarios {
        println!("{}", scenario.name);
    }
    info!(count = scenarios.len(), "scenarios in catalog");
    0
}
