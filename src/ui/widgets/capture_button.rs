//! Booth action buttons.

use gtk4 as gtk;
use gtk4::prelude::*;

use super::animations;

/// Create the round capture button with press feedback
pub fn create_capture_button<F>(on_click: F) -> gtk::Button
where
    F: Fn() + 'static,
{
    let button = gtk::Button::new();
    button.add_css_class("capture-button");
    button.set_size_request(120, 120);
    button.set_tooltip_text(Some("Take photo (Space)"));

    let icon = gtk::Image::from_icon_name("camera-photo-symbolic");
    icon.set_pixel_size(48);
    icon.add_css_class("capture-icon");
    button.set_child(Some(&icon));

    let button_clone = button.clone();
    button.connect_clicked(move |_| {
        animations::button_press(&button_clone);
        on_click();
    });

    button
}

/// Labelled action button showing its keyboard shortcut
pub fn create_action_button<F>(label: &str, shortcut: &str, css_class: &str, on_click: F) -> gtk::Button
where
    F: Fn() + 'static,
{
    let content = gtk::Box::new(gtk::Orientation::Horizontal, 12);

    let text = gtk::Label::new(Some(label));
    let key = gtk::Label::new(Some(shortcut));
    key.add_css_class("shortcut-key");

    content.append(&text);
    content.append(&key);

    let button = gtk::Button::new();
    button.set_child(Some(&content));
    button.add_css_class("action-button");
    button.add_css_class(css_class);

    let button_clone = button.clone();
    button.connect_clicked(move |_| {
        animations::button_press(&button_clone);
        on_click();
    });

    button
}
