//! Fotobox core: everything that does not need a display.
//!
//! - `state`: the booth state machine (events in, commands out)
//! - `countdown`: pre-capture countdown
//! - `capture`: crop / filter / encode pipeline for camera frames
//! - `collection`: persisted photo collection and its storage
//! - `share`: collection link and QR code
//! - `print`: print page geometry and the standalone print document
//! - `booking`: package prices and the order form
//! - `hotkeys`: keyboard shortcut mapping
//!
//! The GTK / GStreamer kiosk binary lives in `main.rs` and drives these.

pub mod booking;
pub mod capture;
pub mod collection;
pub mod config;
pub mod countdown;
pub mod hotkeys;
pub mod print;
pub mod share;
pub mod state;
