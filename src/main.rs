use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};

use spectrum_client::ui::{poll_command, Command, Tui};
use spectrum_client::{App, ConfigManager, ConnectionEvent, Settings};

/// Live spectrum bar chart fed by a WebSocket.
///
/// Logs go to stderr; redirect it when running the terminal UI.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Settings file (defaults to <config dir>/spectrum-client/config.toml)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to connect to, overriding the settings file
    #[clap(short, long)]
    endpoint: Option<String>,

    /// Log reconciliations instead of drawing the chart
    #[clap(long)]
    headless: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging based on debug flag
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
        debug!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = match &args.config {
        Some(path) => ConfigManager::with_file(path)?,
        None => ConfigManager::new()?,
    };
    debug!("Using settings from {:?}", config.config_file());

    let mut settings = config.settings().clone();
    if let Some(endpoint) = args.endpoint {
        settings.endpoint_url = endpoint;
    }
    settings.validate()?;

    info!("Starting spectrum-client for {}", settings.endpoint_url);

    if args.headless {
        run_headless(settings).await
    } else {
        run_tui(settings).await
    }
}

/// Render into an off-screen chart and log each reconciliation
async fn run_headless(settings: Settings) -> Result<()> {
    let dimensions = settings.headless_dimensions();
    let mut app = App::new(settings, dimensions)?;

    app.connect().await?;

    loop {
        tokio::select! {
            Some(event) = app.next_event() => {
                let closed = matches!(event, ConnectionEvent::Closed { .. });
                if let Some(report) = app.handle_event(event) {
                    info!(
                        "{} bars ({} created, {} updated, {} removed)",
                        app.pipeline().reconciler().len(),
                        report.created.len(),
                        report.updated.len(),
                        report.removed.len()
                    );
                }
                if closed {
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing connection");
                break;
            }
        }
    }

    app.shutdown().await?;
    Ok(())
}

/// Draw the chart in the terminal until the user quits
async fn run_tui(settings: Settings) -> Result<()> {
    let mut tui = Tui::new()?;
    // Sized on first draw
    let mut app = App::new(settings, Default::default())?;
    tui.draw(&mut app)?;

    // The handshake runs in the background so keys and ticks keep flowing
    if let Err(e) = app.connect_in_background().await {
        error!("{}", e);
    }

    let tick_rate = Duration::from_millis(33); // ~30 FPS
    let mut ticker = tokio::time::interval(tick_rate);

    while !app.should_quit() {
        tokio::select! {
            Some(event) = app.next_event() => {
                app.handle_event(event);
            }

            _ = ticker.tick() => {
                while let Some(command) = poll_command(Duration::ZERO)? {
                    match command {
                        Command::Quit => app.quit(),
                        Command::Reconnect => {
                            if let Err(e) = app.reconnect().await {
                                error!("{}", e);
                            }
                        }
                    }
                }
                tui.draw(&mut app)?;
            }
        }
    }

    app.shutdown().await?;
    drop(tui);
    Ok(())
}
