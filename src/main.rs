use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, watch};

use coin_coaster::config::Config;
use coin_coaster::controller::TrackerController;
use coin_coaster::feed::cryptocompare::CryptoCompareClient;
use coin_coaster::input::run_input_loop;
use coin_coaster::servo::SimulatedServo;
use coin_coaster::ui::{PanelState, TerminalPanel};

const INPUT_POLL_MS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists or set COIN_COASTER_CONFIG");
            std::process::exit(1);
        }
    };

    // Log to file so it doesn't interfere with the terminal panel
    let log_file = std::fs::File::create(&config.logging.file)
        .with_context(|| format!("failed to create {}", config.logging.file))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.logging.level)
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    let settings = config.tracker_settings()?;
    tracing::info!(
        assets = ?settings.assets,
        fiat = %settings.fiat,
        tick_interval = %config.tracker.tick_interval,
        window = %config.tracker.window,
        depth = settings.depth,
        "Starting coin-coaster"
    );

    let client = CryptoCompareClient::new(
        &config.feed.base_url,
        config.feed.exchange.as_deref(),
        config.feed.timeout(),
    )?;
    let mapper = config.position_mapper()?;
    let panel_state = PanelState::new(
        config.display.columns,
        config.display.rows,
        mapper.servo(),
    );

    // A display that cannot be opened is fatal; nothing is retried.
    let terminal = ratatui::try_init().context("failed to initialise terminal display")?;
    let panel = TerminalPanel::new(terminal, panel_state, SimulatedServo::new(config.servo.pin));

    let controller = TrackerController::new(
        settings,
        mapper,
        config.feed.retry_policy(),
        client,
        panel.clone(),
        panel.clone(),
    )?;

    let (select_tx, select_rx) = mpsc::channel::<()>(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let input_shutdown = shutdown_tx.clone();
    let input_panel = panel.clone();
    let debounce = config.debounce();
    let input_task = tokio::task::spawn_blocking(move || {
        let next_event = || -> std::io::Result<_> {
            if crossterm::event::poll(Duration::from_millis(INPUT_POLL_MS))? {
                crossterm::event::read().map(Some)
            } else {
                Ok(None)
            }
        };
        run_input_loop(
            next_event,
            || input_panel.redraw(),
            select_tx,
            input_shutdown,
            debounce,
        )
    });

    let result = controller.run(select_rx, shutdown_rx).await;

    let _ = shutdown_tx.send(true);
    match input_task.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "Input loop failed"),
        Err(e) => tracing::warn!(error = %e, "Input task panicked"),
        Ok(Ok(())) => {}
    }

    ratatui::restore();
    result.context("tracker stopped with a fault")?;
    tracing::info!("Shutdown complete");
    println!("Goodbye! Check {} for details.", config.logging.file);
    Ok(())
}
