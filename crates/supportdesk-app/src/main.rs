use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use supportdesk::{run, Cli};

/// Library crates log through `log`; `-v` opens up their debug output
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,supportdesk=debug,supportdesk_api=debug,supportdesk_chat=debug,supportdesk_logging=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    run(cli).await
}
