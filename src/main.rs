use margin_monitor::config::Config;
use margin_monitor::services::{
    FallbackDataset, LoanManager, LoggingListener, MarginCalculator, PriceHistoryGenerator,
    RefreshHandle, RefreshListener, RefreshSettings, ScenarioEngine,
};
use margin_monitor::sources::{RiskApiClient, RiskDataSource};
use margin_monitor::tui::{run_tui, LogBuffer, LogMakeWriter, TuiContext};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "margin_monitor=info";
const LOG_BUFFER_LINES: usize = 1_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = Config::from_env();
    if std::env::args().any(|arg| arg == "--headless") {
        config.headless = true;
    }
    config.validate()?;

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
    };

    // The TUI owns the terminal, so logs go to an in-memory buffer instead
    let log_buffer = Arc::new(LogBuffer::new(LOG_BUFFER_LINES));
    if config.headless {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(LogMakeWriter::new(log_buffer.clone())),
            )
            .init();
    }

    info!(
        "Starting margin monitor for client {} against {}",
        config.client_id, config.api_base_url
    );

    let client: Arc<dyn RiskDataSource> = Arc::new(RiskApiClient::from_config(&config)?);
    let calculator = MarginCalculator::new(config.maintenance_margin_rate);

    let listeners: Vec<Arc<dyn RefreshListener>> = vec![Arc::new(LoggingListener)];
    let refresh = RefreshHandle::spawn(
        client.clone(),
        RefreshSettings {
            client_id: config.client_id,
            interval: config.refresh_interval,
            fallback: FallbackDataset::demo(&calculator),
        },
        listeners,
    );

    if config.headless {
        info!("Running headless, press Ctrl+C to stop");
        tokio::signal::ctrl_c().await?;
    } else {
        let ctx = TuiContext {
            snapshots: refresh.subscribe(),
            commander: refresh.commander(),
            engine: ScenarioEngine::new(calculator),
            loans: Arc::new(LoanManager::new(
                client,
                config.client_id,
                config.initial_margin_cap,
            )),
            history: PriceHistoryGenerator::new(config.price_history.clone()),
            shock_limit_pct: config.scenario_shock_limit_pct,
            log_buffer,
        };
        run_tui(ctx).await?;
    }

    refresh.shutdown().await;
    info!("Margin monitor stopped");
    Ok(())
}
