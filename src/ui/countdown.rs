//! Countdown overlay shown over the live preview.

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::ui::widgets::animations;

/// Full-size overlay with the big countdown number
pub struct CountdownOverlay {
    pub container: gtk::Box,
    number: gtk::Label,
}

impl CountdownOverlay {
    pub fn new() -> Self {
        let container = gtk::Box::new(gtk::Orientation::Vertical, 16);
        container.add_css_class("countdown-overlay");
        container.set_halign(gtk::Align::Fill);
        container.set_valign(gtk::Align::Fill);
        container.set_hexpand(true);
        container.set_vexpand(true);
        container.set_visible(false);
        container.set_can_target(false);

        let number_container = gtk::Overlay::new();
        number_container.set_halign(gtk::Align::Center);
        number_container.set_valign(gtk::Align::Center);
        number_container.set_vexpand(true);

        // Ring behind the number
        let ring = gtk::Frame::new(None);
        ring.add_css_class("countdown-ring");
        ring.set_halign(gtk::Align::Center);
        ring.set_valign(gtk::Align::Center);
        number_container.set_child(Some(&ring));

        let number = gtk::Label::new(None);
        number.add_css_class("countdown-number");
        number_container.add_overlay(&number);

        let hint = gtk::Label::new(Some("Esc to cancel"));
        hint.add_css_class("countdown-hint");
        hint.set_margin_bottom(24);

        container.append(&number_container);
        container.append(&hint);

        Self { container, number }
    }

    /// Show `value`, or hide the overlay when no countdown runs
    pub fn set_value(&self, value: Option<u32>) {
        match value {
            Some(value) => {
                let text = value.to_string();
                if !self.container.is_visible() || self.number.text().as_str() != text {
                    self.number.set_text(&text);
                    animations::pop_in(&self.number);
                }
                self.container.set_visible(true);
            }
            None => self.container.set_visible(false),
        }
    }
}
