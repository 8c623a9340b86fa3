use std::process::ExitCode;

use vacancy_enrich::pipeline::RunOutcome;

fn main() -> ExitCode {
    vacancy_enrich::init_tracing();

    match vacancy_enrich::run() {
        Ok(RunOutcome::Stored(output)) => {
            tracing::info!(key = %output.key, records = output.record_count, "Done");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Skipped(reason)) => {
            tracing::info!(?reason, "Nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}
