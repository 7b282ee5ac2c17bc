use anyhow::Context;
use clap::Parser;
use cli::Cli;
use log::info;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();
    let report = strike_weather::run(&config)
        .await
        .with_context(|| format!("Run {} to {} failed", config.start_date, config.end_date))?;

    info!(
        "Done: {} incidents processed, {} enriched, {} errors",
        report.processed,
        report.matched(),
        report.errors()
    );
    Ok(())
}
