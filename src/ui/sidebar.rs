//! Collection sidebar: share QR code, statistics and collection actions.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;

use fotobox::collection::PhotoCollection;
use fotobox::config;
use fotobox::hotkeys;
use fotobox::state::BoothEvent;

use crate::app::AppContext;
use crate::ui::{dialogs, widgets};

pub struct CollectionPanel {
    pub root: gtk::Box,
    qr_picture: gtk::Picture,
    url_label: gtk::Label,
    shown_url: RefCell<Option<String>>,
    photo_count: gtk::Label,
    print_count: gtk::Label,
    created_label: gtk::Label,
}

fn stat_row(title: &str) -> (gtk::Box, gtk::Label) {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let title = gtk::Label::new(Some(title));
    title.set_hexpand(true);
    title.set_xalign(0.0);
    let value = gtk::Label::new(None);
    value.add_css_class("stat-value");
    row.append(&title);
    row.append(&value);
    (row, value)
}

impl CollectionPanel {
    pub fn new(ctx: &Rc<AppContext>, window: &adw::ApplicationWindow) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 16);
        root.add_css_class("collection-panel");
        root.set_width_request(300);

        let heading = gtk::Label::new(Some("Your photos"));
        heading.add_css_class("panel-heading");

        let qr_picture = gtk::Picture::new();
        qr_picture.add_css_class("qr-image");
        qr_picture.set_size_request(config::QR_SIZE as i32, config::QR_SIZE as i32);
        qr_picture.set_halign(gtk::Align::Center);
        qr_picture.set_can_shrink(false);

        let scan_hint = gtk::Label::new(Some("Scan to see all photos of this event"));
        scan_hint.set_wrap(true);

        let url_label = gtk::Label::new(None);
        url_label.add_css_class("collection-url");
        url_label.set_wrap(true);
        url_label.set_wrap_mode(gtk::pango::WrapMode::Char);
        url_label.set_selectable(true);

        // === Stats ===
        let stats = gtk::Box::new(gtk::Orientation::Vertical, 4);
        stats.add_css_class("collection-stats");
        let (row, photo_count) = stat_row("Saved photos");
        stats.append(&row);
        let (row, print_count) = stat_row("Printed photos");
        stats.append(&row);
        let (row, created_label) = stat_row("Created");
        stats.append(&row);

        // === Actions ===
        let open_button = gtk::Button::with_label("Open photo collection");
        open_button.add_css_class("suggested-action");
        {
            let ctx = ctx.clone();
            open_button.connect_clicked(move |_| ctx.send_event(BoothEvent::OpenCollection));
        }

        let url_button = gtk::Button::with_label("Set custom link...");
        {
            let ctx = ctx.clone();
            let window = window.clone();
            url_button.connect_clicked(move |_| dialogs::show_custom_url_dialog(&window, &ctx));
        }

        let reset_button = gtk::Button::with_label("Start new collection");
        reset_button.add_css_class("destructive-action");
        {
            let ctx = ctx.clone();
            let window = window.clone();
            reset_button.connect_clicked(move |_| dialogs::show_reset_confirmation(&window, &ctx));
        }

        root.append(&heading);
        root.append(&qr_picture);
        root.append(&scan_hint);
        root.append(&url_label);
        root.append(&stats);
        root.append(&open_button);
        root.append(&url_button);
        root.append(&reset_button);
        root.append(&hotkey_legend());

        Self {
            root,
            qr_picture,
            url_label,
            shown_url: RefCell::new(None),
            photo_count,
            print_count,
            created_label,
        }
    }

    pub fn update(&self, collection: &PhotoCollection, url: &str) {
        self.photo_count.set_text(&collection.photos.len().to_string());
        self.print_count.set_text(&collection.printed_photos.to_string());
        self.created_label.set_text(
            &collection
                .created_at
                .with_timezone(&Local)
                .format("%d.%m.%Y %H:%M")
                .to_string(),
        );

        if self.shown_url.borrow().as_deref() == Some(url) {
            return;
        }
        self.url_label.set_text(url);
        match widgets::qr_texture(url, config::QR_SIZE) {
            Ok(texture) => self.qr_picture.set_paintable(Some(&texture)),
            Err(e) => {
                log::error!("Cannot render QR code for {}: {}", url, e);
                self.qr_picture.set_paintable(None::<&gtk::gdk::Paintable>);
            }
        }
        *self.shown_url.borrow_mut() = Some(url.to_string());
    }
}

fn hotkey_legend() -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("hotkey-legend");
    grid.set_row_spacing(4);
    grid.set_column_spacing(12);
    grid.set_vexpand(true);
    grid.set_valign(gtk::Align::End);

    for (row, (key, action)) in hotkeys::LEGEND.iter().enumerate() {
        let key_label = gtk::Label::new(Some(key));
        key_label.add_css_class("shortcut-key");
        key_label.set_xalign(0.0);
        let action_label = gtk::Label::new(Some(action));
        action_label.set_xalign(0.0);

        grid.attach(&key_label, 0, row as i32, 1, 1);
        grid.attach(&action_label, 1, row as i32, 1, 1);
    }

    grid
}
