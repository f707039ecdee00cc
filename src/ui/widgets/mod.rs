//! Reusable UI widgets.

pub mod animations;
pub mod capture_button;
pub mod qr_image;

pub use capture_button::{create_action_button, create_capture_button};
pub use qr_image::{jpeg_texture, qr_texture};
