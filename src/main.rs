use devops_clients::cli::{Args, Runner};
use devops_clients::logging::init_tracing;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let result = match Runner::new(args) {
        Ok(runner) => runner.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
