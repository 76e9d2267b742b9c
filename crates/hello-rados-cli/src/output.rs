use anyhow::{Context, Result};
use atty::Stream;
use hello_rados_core::{CommandStatus, ExecutionOutcome, HelloReport};

use crate::cli::HelloCli;
use crate::style::Style;

/// Prints the outcome and returns the process exit code.
///
/// Primary failures go to stdout; a pool cleanup failure always goes to
/// stderr, even with `--quiet` or `--json`.
pub fn emit_output(cli: &HelloCli, report: &HelloReport, outcome: &ExecutionOutcome) -> Result<i32> {
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));
    let err_style = Style::new(cli.no_color, atty::is(Stream::Stderr));

    if cli.json {
        let payload = serde_json::to_string_pretty(&outcome.to_json())
            .context("failed to render JSON output")?;
        println!("{payload}");
    } else if !cli.quiet {
        match (&report.error, &report.read_back) {
            (Some(err), _) => {
                println!("{}", style.status(CommandStatus::Failure, &err.to_string()));
            }
            (None, Some(data)) => {
                let message = format!("read back object {} from pool {}", report.object, report.pool);
                println!("{}", style.status(CommandStatus::Ok, &message));
                println!("{}", style.content(&String::from_utf8_lossy(data)));
            }
            (None, None) => {}
        }
    }

    if let Some(cleanup) = &report.cleanup_error {
        eprintln!(
            "{}",
            err_style.status(
                CommandStatus::FatalCleanup,
                &format!("We failed to delete our test pool! {cleanup}")
            )
        );
    }

    Ok(outcome.exit_code())
}
