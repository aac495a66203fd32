use clap::Parser;

use member_tx::adapter::cli::handler::MemberHandler;
use member_tx::adapter::cli::Cli;
use member_tx::adapter::config::AppConfig;
use member_tx::adapter::init::AppInitializer;
use member_tx::adapter::telemetry::{init_tracing, TracingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug })?;

    let config = cli.apply(AppConfig::load()?);
    config.validate()?;

    let state = AppInitializer::initialize(&config).await?;
    let handler = MemberHandler::new(state.clone(), cli.json);
    let result = handler.handle(cli.command).await;
    state.close().await;

    println!("{}", result?);
    Ok(())
}
