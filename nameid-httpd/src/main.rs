//! nameid HTTP server binary.
//!
//! Run with: `cargo run -p nameid-httpd -- --help`

use clap::Parser;
use nameid_httpd::NameidServer;
use nameid_service::Options;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Options::parse().with_env().resolve()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter))
        .init();

    info!(
        seed = %config.seed,
        input = config.seed_input.as_deref().unwrap_or("<uuid>"),
        "starting name-based UUID rewriting service"
    );
    for option in &config.missing_alias_options {
        warn!(
            option = *option,
            "missing alias backend option; aliasing disabled, local UUID derivation in use"
        );
    }

    let listen = config.listen;
    let server = NameidServer::new(&config);
    server.run(listen).await?;
    Ok(())
}
