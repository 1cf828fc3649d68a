use drove_runtime::DroveRuntime;
use std::process::ExitCode;
#[allow(unused_imports)]
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("drove=info,drove_runtime=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let runtime = match DroveRuntime::new().with_args() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.run().await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
