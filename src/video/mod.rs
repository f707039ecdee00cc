//! GStreamer camera handling: device discovery and the capture pipeline.

pub mod devices;
pub mod pipeline;

pub use devices::CameraDevice;
pub use pipeline::{PipelineError, PipelineEvent, VideoPipeline};
