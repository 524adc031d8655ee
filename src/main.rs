use anyhow::Result;
use clap::Parser;
use rental_booking::{
    cli::{Args, CliApp},
    utils::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // loaded before the subscriber exists, errors surface through main's Result
    let config = Config::from_env()?;

    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("🚗 Rental CLI starting...");
    tracing::info!(
        "Configuration loaded for {} environment",
        config.environment
    );

    let app = CliApp::new(config, &args)?;
    app.run(args).await?;

    tracing::info!("🚗 Rental CLI stopped");
    Ok(())
}
