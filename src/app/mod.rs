pub mod config;
pub mod pipeline;

use log::{error, info};
use tokio::sync::mpsc::{self, error::TryRecvError, Receiver};

use crate::error::{Error, Result};
use crate::network::{ConnectionEvent, ConnectionManager, ConnectionState};
use crate::render::{ChartDimensions, ReconcileReport, Reconciler, ScaleConfig};
use config::Settings;
use pipeline::SpectrumPipeline;

/// Main application struct that ties the connection to the render pipeline
pub struct App {
    settings: Settings,
    pipeline: SpectrumPipeline,
    connection: ConnectionManager,
    event_rx: Receiver<ConnectionEvent>,
    should_quit: bool,
}

impl App {
    /// Creates a new application laid out on a chart of the given size
    pub fn new(settings: Settings, dimensions: ChartDimensions) -> Result<Self> {
        settings.validate()?;

        let scales = ScaleConfig::new(dimensions, settings.scale_params());
        let reconciler = Reconciler::new(scales).with_fill(settings.fill.clone());
        Ok(Self::with_pipeline(settings, SpectrumPipeline::new(reconciler)))
    }

    /// Creates an application around an existing pipeline
    pub fn with_pipeline(settings: Settings, pipeline: SpectrumPipeline) -> Self {
        let (event_tx, event_rx) = mpsc::channel(settings.channel_capacity.max(1));
        let connection = ConnectionManager::new(settings.endpoint_url.clone(), event_tx);

        Self {
            settings,
            pipeline,
            connection,
            event_rx,
            should_quit: false,
        }
    }

    /// Opens the spectrum socket and waits for the handshake
    pub async fn connect(&mut self) -> Result<()> {
        self.begin_connect().await?;
        let result = self.connection.open().await;
        if result.is_err() {
            // The failure itself arrives as a Closed event
            self.drain_events();
        }
        result
    }

    /// Starts opening the socket and returns without waiting for the handshake.
    /// The outcome arrives as an `Opened` or `Closed` event.
    pub async fn connect_in_background(&mut self) -> Result<()> {
        self.begin_connect().await?;
        self.connection.spawn_open().await
    }

    /// Reopens the socket if it is down; a no-op while connected or connecting
    pub async fn reconnect(&mut self) -> Result<()> {
        if self.connection.state().await != ConnectionState::Disconnected {
            return Ok(());
        }
        info!("Reconnecting to {}", self.settings.endpoint_url);
        match self.connect_in_background().await {
            Err(Error::AlreadyConnected) => Ok(()),
            other => other,
        }
    }

    /// Closes the socket, keeping the bars on screen
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Err(e) = self.connection.close().await {
            error!("Error closing connection: {}", e);
        }
        self.drain_events();
        Ok(())
    }

    async fn begin_connect(&mut self) -> Result<()> {
        if self.connection.state().await != ConnectionState::Disconnected {
            return Err(Error::AlreadyConnected);
        }
        // Events from the previous socket go first so its Closed cannot
        // overwrite the new Connecting state
        self.drain_events();
        self.pipeline.set_connecting();
        Ok(())
    }

    /// Waits for the next connection event
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.event_rx.recv().await
    }

    pub fn handle_event(&mut self, event: ConnectionEvent) -> Option<ReconcileReport> {
        self.pipeline.handle_event(event)
    }

    /// Handles every event already queued, in order. Returns how many were handled.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    self.pipeline.handle_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Closes the socket and handles whatever it reported on the way out
    pub async fn shutdown(&mut self) -> Result<()> {
        self.disconnect().await
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pipeline(&self) -> &SpectrumPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut SpectrumPipeline {
        &mut self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::WireMessage;

    #[test]
    fn test_app_rejects_invalid_settings() {
        let settings = Settings {
            magnitude_max: 0,
            ..Settings::default()
        };
        assert!(matches!(
            App::new(settings, ChartDimensions::new(100, 100)),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_app_starts_disconnected_and_empty() {
        let app = App::new(Settings::default(), ChartDimensions::new(100, 100)).unwrap();
        assert!(!app.should_quit());
        assert_eq!(
            app.pipeline().connection_state(),
            ConnectionState::Disconnected
        );
        assert!(app.pipeline().reconciler().is_empty());
    }

    #[tokio::test]
    async fn test_handle_event_updates_bars() {
        let mut app = App::new(Settings::default(), ChartDimensions::new(100, 100)).unwrap();
        let report = app
            .handle_event(ConnectionEvent::Message(WireMessage::Binary(vec![1, 2])))
            .unwrap();
        assert_eq!(report.created, vec![0, 1]);
        assert_eq!(app.pipeline().reconciler().len(), 2);
    }
}
