use std::env;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use product_indexer::{Dependencies, IndexingError, Options};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_tracing();

    let options = Options::parse();

    match run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Product indexer failed");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(options: Options) -> Result<(), IndexingError> {
    if options.stats_only {
        let stats = Dependencies::store_stats(&options).await?;
        print_json(&stats);
        return Ok(());
    }

    let mut dependencies = Dependencies::new(&options).await?;
    let orchestrator = &mut dependencies.orchestrator;

    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current page");
            let _ = shutdown.send(());
        }
    });

    let summary = orchestrator.run().await?;
    print_json(&summary);

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!(error = %e, "Could not serialize output"),
    }
}
