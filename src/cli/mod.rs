//! Command-line interface for running the catalog in CI pipelines.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Stdout rendering for run results. The JSON report file is written
/// regardless; `html` additionally writes an HTML page next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReporterKind {
    List,
    Json,
    Html,
}

#[derive(Parser)]
#[command(name = "testman", version, about = "Declarative HTTP API contract test harness")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scenario catalog against the configured APIs
    Run {
        /// Only run scenarios whose name matches this `*`-wildcard glob
        #[arg(long)]
        filter: Option<String>,

        /// Number of scenarios to run in parallel
        #[arg(long)]
        workers: Option<usize>,

        /// Per-request timeout in milliseconds
        #[arg(long, value_name = "MS")]
        timeout: Option<u64>,

        /// Output format for stdout
        #[arg(long, default_value = "list", value_enum)]
        reporter: ReporterKind,

        /// Path for the machine-readable JSON report
        #[arg(long)]
        report_file: Option<PathBuf>,
    },

    /// Print the scenario catalog without executing anything
    List {
        /// Only list scenarios whose name matches this `*`-wildcard glob
        #[arg(long)]
        filter: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "testman",
            "run",
            "--filter",
            "activity*",
            "--workers",
            "2",
            "--timeout",
            "5000",
            "--reporter",
            "json",
            "--report-file",
            "out/results.json",
        ]);

        let Commands::Run {
            filter,
            workers,
            timeout,
            reporter,
            report_file,
        } = cli.command
        else {
            panic!("expected run command");
        };
        assert_eq!(filter.as_deref(), Some("activity*"));
        assert_eq!(workers, Some(2));
        assert_eq!(timeout, Some(5000));
        assert_eq!(reporter, ReporterKind::Json);
        assert_eq!(report_file, Some(PathBuf::from("out/results.json")));
    }
}
