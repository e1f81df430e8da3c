// Rendering model
// Decodes frames and maintains the bar set drawn by the UI

pub mod frame;
pub mod reconciler;
pub mod scale;

pub use frame::{decode, SampleFrame};
pub use reconciler::{BarElement, ReconcileReport, Reconciler, RenderState, DEFAULT_FILL};
pub use scale::{ChartDimensions, ScaleConfig, ScaleParams};
