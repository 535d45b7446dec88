use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match review_stats::cli_app::run_from_args(std::env::args()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
