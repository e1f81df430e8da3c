// spectrum-client: live spectrum bar chart fed by a WebSocket
// Expose public modules for use in integration tests

pub mod app;
pub mod error;
pub mod network;
pub mod render;
pub mod ui;

// Re-export commonly used types for convenience
pub use app::config::{ConfigManager, Settings};
pub use app::pipeline::{LifecycleObserver, LogObserver, SpectrumPipeline};
pub use app::App;
pub use error::{Error, Result};
pub use network::{ConnectionEvent, ConnectionManager, ConnectionState, WireMessage};
pub use render::{BarElement, ChartDimensions, Reconciler, SampleFrame, ScaleConfig};
