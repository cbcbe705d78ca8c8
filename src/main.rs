use anyhow::{Context, Result};
use clap::Parser;
use expiring_cache::{args::ServiceArguments, config::Config, server::CacheServer};
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServiceArguments::parse();
    init_logging(&args.log_level)?;

    let config = Config::from_args(&args)?;
    info!(?config, "starting expiring-cache");

    let server = CacheServer::from_config(config)?;
    let listener = server.listen().await?;

    server.serve(listener).await
}

fn init_logging(level: &str) -> Result<()> {
    let default_level: LevelFilter = level
        .parse()
        .with_context(|| format!("invalid log level {level:?}"))?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    Ok(())
}
