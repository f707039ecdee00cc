//! Fotobox - GTK4 + GStreamer photo booth kiosk.
//!
//! Architecture:
//! - `fotobox` library: GTK-free state machine, capture pipeline, collection
//!   store, booking and print documents (testable)
//! - `app` module: Bridges state machine to GTK and background work
//! - `video` module: GStreamer camera discovery and pipeline
//! - `ui` module: GTK4 widgets and screens

use std::sync::Arc;

use libadwaita as adw;
use libadwaita::prelude::*;

mod app;
mod ui;
mod video;

use app::AppContext;
use fotobox::config::BoothConfig;
use fotobox::state::BoothEvent;
use ui::MainWindow;

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Fotobox");

    let config = match BoothConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return glib::ExitCode::FAILURE;
        }
    };

    if let Err(e) = gstreamer::init() {
        log::error!("Failed to initialize GStreamer: {}", e);
        return glib::ExitCode::FAILURE;
    }
    // Bundled gtk4paintablesink, so the preview works without the system plugin
    if let Err(e) = gstgtk4::plugin_register_static() {
        log::warn!("Could not register bundled GTK4 sink: {}", e);
    }

    // Background runtime for encoding, device probing and file writes
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => Arc::new(runtime),
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            return glib::ExitCode::FAILURE;
        }
    };

    let app = adw::Application::builder()
        .application_id("de.fotobox.Booth")
        .build();

    app.connect_activate(move |app| {
        let (ctx, mut rx) = AppContext::new(runtime.clone(), config.clone());

        let main_window = MainWindow::new(app, ctx.clone());

        // Poll the tokio channel from the GTK main loop
        let window = main_window.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(16), move || {
            while let Ok(msg) = rx.try_recv() {
                window.handle_message(msg);
            }
            glib::ControlFlow::Continue
        });

        main_window.window.present();
        ctx.send_event(BoothEvent::Started);
    });

    let code = app.run();

    log::info!("Fotobox shutting down");
    code
}
