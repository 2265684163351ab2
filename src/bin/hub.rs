use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fleet_relay::{
    api::{ApiConfig, ApiState, spawn_api_server},
    broker::{Broker, SweeperHandle},
    config::read_config_file,
    serialize::JsonSerializer,
};
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("fleet_relay", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let broker = Arc::new(Broker::new());

    let sweeper = SweeperHandle::spawn(
        broker.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );
    debug!("sweeper started with {}s interval", config.sweep_interval_secs);

    let state = ApiState::new(
        broker,
        Arc::new(JsonSerializer),
        Duration::from_secs(config.long_poll_timeout_secs),
    );
    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        ..ApiConfig::default()
    };

    spawn_api_server(api_config, state).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    sweeper.shutdown().await;

    Ok(())
}
