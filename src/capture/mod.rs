//! Capture-and-crop pipeline: raw camera frame in, print-ready JPEG out.
//!
//! Everything here is GTK-free. The video layer hands over a [`Frame`], the
//! state machine decides when, and [`capture_frame`] does the work.

pub mod crop;
pub mod filter;
pub mod frame;

pub use crop::CropRect;
pub use filter::Brightness;
pub use frame::{capture_frame, CaptureError, CapturedImage, Frame};
