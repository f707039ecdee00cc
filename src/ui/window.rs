//! Main application window: booth screen plus collection sidebar.

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use std::rc::Rc;

use fotobox::capture::Brightness;
use fotobox::hotkeys::Hotkey;
use fotobox::state::{BoothCommand, BoothEvent};

use crate::app::{AppContext, AppMessage};
use crate::ui::booth::BoothPanel;
use crate::ui::order;
use crate::ui::sidebar::CollectionPanel;

pub struct MainWindow {
    pub window: adw::ApplicationWindow,
    ctx: Rc<AppContext>,
    booth: BoothPanel,
    collection: CollectionPanel,
    /// Carries the brightness filter for the live preview
    preview_filter: gtk::CssProvider,
}

fn is_text_input(widget: &gtk::Widget) -> bool {
    widget.is::<gtk::Text>() || widget.is::<gtk::TextView>() || widget.is::<gtk::Entry>()
}

impl MainWindow {
    pub fn new(app: &adw::Application, ctx: Rc<AppContext>) -> Rc<Self> {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Fotobox")
            .default_width(1600)
            .default_height(1000)
            .build();

        // Kiosk: go fullscreen once mapped
        window.connect_map(|window| {
            let window = window.clone();
            glib::timeout_add_local_once(std::time::Duration::from_millis(100), move || {
                window.fullscreen();
            });
        });

        let booth = BoothPanel::new(&ctx);
        let collection = CollectionPanel::new(&ctx, &window);

        // === Header ===
        let header = gtk::Box::new(gtk::Orientation::Horizontal, 12);
        header.add_css_class("top-bar");

        let title = gtk::Label::new(Some("Fotobox"));
        title.add_css_class("app-title");
        title.set_hexpand(true);
        title.set_xalign(0.0);

        let order_button = gtk::Button::with_label("Book the photo box");
        order_button.add_css_class("order-button");
        order_button.add_css_class("pill");
        {
            let window = window.clone();
            order_button.connect_clicked(move |_| order::show_order_dialog(&window));
        }

        header.append(&title);
        header.append(&order_button);

        // === Content ===
        let content = gtk::Box::new(gtk::Orientation::Horizontal, 24);
        content.add_css_class("booth-content");
        content.set_vexpand(true);
        content.append(&booth.root);
        content.append(&collection.root);

        let main_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        main_box.add_css_class("booth-screen");
        main_box.append(&header);
        main_box.append(&content);
        window.set_content(Some(&main_box));

        let main_window = Rc::new(Self {
            window,
            ctx,
            booth,
            collection,
            preview_filter: gtk::CssProvider::new(),
        });

        main_window.load_css();
        main_window.connect_hotkeys();
        main_window.update_ui();

        main_window
    }

    fn load_css(&self) {
        let Some(display) = gtk::gdk::Display::default() else {
            log::warn!("No display, skipping stylesheet");
            return;
        };

        let provider = gtk::CssProvider::new();
        provider.load_from_string(include_str!("../../resources/style.css"));
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );

        // Above the stylesheet so the slider always wins
        gtk::style_context_add_provider_for_display(
            &display,
            &self.preview_filter,
            gtk::STYLE_PROVIDER_PRIORITY_USER,
        );
    }

    /// Window-wide keyboard shortcuts, checked before focused widgets see the key
    fn connect_hotkeys(&self) {
        let controller = gtk::EventControllerKey::new();
        controller.set_propagation_phase(gtk::PropagationPhase::Capture);

        let ctx = self.ctx.clone();
        let window_weak = self.window.downgrade();
        controller.connect_key_pressed(move |_, key, _, _| {
            let Some(name) = key.name() else {
                return glib::Propagation::Proceed;
            };

            // Dialogs and text fields get their keys
            let suppressed = window_weak.upgrade().is_some_and(|window| {
                window.visible_dialog().is_some()
                    || window.focus().is_some_and(|widget| is_text_input(&widget))
            });

            match Hotkey::from_key(&name, suppressed) {
                Some(hotkey) => {
                    log::debug!("Hotkey {:?}", hotkey);
                    ctx.send_event(hotkey.event());
                    glib::Propagation::Stop
                }
                None => glib::Propagation::Proceed,
            }
        });

        self.window.add_controller(controller);
    }

    /// Handle app messages - main entry point for state updates
    pub fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        let commands = match msg {
            AppMessage::Event(event) => self.ctx.process_event(event),
            AppMessage::DevicesFound(devices) => self.ctx.register_devices(devices),
        };

        let mut needs_update = false;
        for cmd in commands {
            match cmd {
                BoothCommand::ApplyPreviewFilter { brightness } => {
                    self.apply_preview_filter(brightness)
                }
                BoothCommand::PrintPhoto { image } => {
                    self.ctx.print_photo(&image, self.window.upcast_ref())
                }
                BoothCommand::OpenCollection => self.open_collection(),
                BoothCommand::UpdateUI => needs_update = true,
                _ => {}
            }
        }

        if needs_update {
            self.update_ui();
        }
    }

    fn apply_preview_filter(&self, brightness: Brightness) {
        self.preview_filter.load_from_string(&format!(
            ".live-preview {{ filter: {}; }}",
            brightness.css_filter()
        ));
    }

    fn open_collection(&self) {
        let url = self.ctx.collection_url();
        log::info!("Opening collection {}", url);

        let ctx = self.ctx.clone();
        gtk::UriLauncher::new(&url).launch(
            Some(&self.window),
            gio::Cancellable::NONE,
            move |result| {
                if let Err(e) = result {
                    ctx.send_event(BoothEvent::OperationFailed {
                        error: format!("Could not open {}: {}", url, e),
                    });
                }
            },
        );
    }

    /// Update the UI to reflect current state
    fn update_ui(&self) {
        let paintable = self
            .ctx
            .video
            .borrow()
            .as_ref()
            .map(|video| video.paintable().clone());

        {
            let sm = self.ctx.state_machine.borrow();
            self.booth.update(&sm, paintable.as_ref());
        }

        let url = self.ctx.collection_url();
        self.collection
            .update(self.ctx.store.borrow().collection(), &url);
    }
}
