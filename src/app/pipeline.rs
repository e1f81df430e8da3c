use log::{debug, info, warn};

use crate::error::Error;
use crate::network::{ConnectionEvent, ConnectionState};
use crate::render::{decode, ChartDimensions, ReconcileReport, Reconciler};

/// Receives connection lifecycle notifications from the pipeline
#[cfg_attr(test, mockall::automock)]
pub trait LifecycleObserver {
    /// The socket is open
    fn opened(&self, endpoint: &str);

    /// The socket closed or failed; rendered bars are left as they were
    fn closed(&self, reason: Option<String>);

    /// A message was dropped without touching the bar set
    fn frame_dropped(&self, error: &Error);
}

/// Observer that writes lifecycle events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LifecycleObserver for LogObserver {
    fn opened(&self, endpoint: &str) {
        info!("Spectrum websocket opened: {}", endpoint);
    }

    fn closed(&self, reason: Option<String>) {
        match reason {
            Some(reason) => info!("Spectrum websocket closed: {}", reason),
            None => info!("Spectrum websocket closed"),
        }
    }

    fn frame_dropped(&self, error: &Error) {
        warn!("Dropping frame: {}", error);
    }
}

/// Counters shown in the status bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_rendered: u64,
    pub frames_dropped: u64,
}

/// Runs each connection event through decode and reconcile
pub struct SpectrumPipeline {
    reconciler: Reconciler,
    observer: Box<dyn LifecycleObserver>,
    connection: ConnectionState,
    stats: PipelineStats,
}

impl SpectrumPipeline {
    pub fn new(reconciler: Reconciler) -> Self {
        Self::with_observer(reconciler, Box::new(LogObserver))
    }

    pub fn with_observer(reconciler: Reconciler, observer: Box<dyn LifecycleObserver>) -> Self {
        Self {
            reconciler,
            observer,
            connection: ConnectionState::Disconnected,
            stats: PipelineStats::default(),
        }
    }

    /// Handle one event. Returns the reconciliation report when a frame was rendered.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> Option<ReconcileReport> {
        match event {
            ConnectionEvent::Opened { endpoint } => {
                self.connection = ConnectionState::Connected;
                self.observer.opened(&endpoint);
                None
            }
            ConnectionEvent::Closed { reason } => {
                self.connection = ConnectionState::Disconnected;
                self.observer.closed(reason);
                None
            }
            ConnectionEvent::Message(message) => match decode(&message) {
                Ok(frame) => {
                    let report = self.reconciler.reconcile(&frame);
                    self.stats.frames_rendered += 1;
                    debug!(
                        "Rendered frame of {} bins ({} created, {} updated, {} removed)",
                        frame.len(),
                        report.created.len(),
                        report.updated.len(),
                        report.removed.len()
                    );
                    Some(report)
                }
                Err(e) => {
                    self.stats.frames_dropped += 1;
                    self.observer.frame_dropped(&e);
                    None
                }
            },
        }
    }

    /// Mark the connection as being (re)opened
    pub fn set_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    /// Re-lay out the bars for a new chart size
    pub fn resize(&mut self, dimensions: ChartDimensions) -> bool {
        let resized = self.reconciler.resize(dimensions);
        if resized {
            debug!("Chart resized to {}x{}", dimensions.width, dimensions.height);
        }
        resized
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}
