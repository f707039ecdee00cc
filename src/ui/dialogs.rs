//! Collection dialogs.

use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;

use fotobox::state::BoothEvent;

use crate::app::AppContext;

/// Ask for a custom share URL; an empty entry goes back to the generated one
pub fn show_custom_url_dialog(window: &adw::ApplicationWindow, ctx: &Rc<AppContext>) {
    let dialog = adw::AlertDialog::new(
        Some("Custom link"),
        Some("Enter the address your photos are published under. Leave empty to use the generated link."),
    );

    let entry = gtk::Entry::new();
    entry.set_placeholder_text(Some("https://"));
    entry.set_input_purpose(gtk::InputPurpose::Url);
    entry.set_activates_default(true);
    if let Some(url) = ctx.store.borrow().collection().custom_url.as_deref() {
        entry.set_text(url);
    }
    dialog.set_extra_child(Some(&entry));

    dialog.add_response("cancel", "Cancel");
    dialog.add_response("save", "Save");
    dialog.set_response_appearance("save", adw::ResponseAppearance::Suggested);
    dialog.set_default_response(Some("save"));
    dialog.set_close_response("cancel");

    let ctx = ctx.clone();
    dialog.connect_response(None, move |_, response| {
        if response == "save" {
            ctx.send_event(BoothEvent::SetCustomUrl {
                url: entry.text().to_string(),
            });
        }
    });

    dialog.present(Some(window));
}

/// Confirm before discarding the whole collection
pub fn show_reset_confirmation(window: &adw::ApplicationWindow, ctx: &Rc<AppContext>) {
    let dialog = adw::AlertDialog::new(
        Some("Start a new collection?"),
        Some("All saved photos, the print counter and the custom link are cleared. Guests with the old link will no longer see new photos."),
    );

    dialog.add_response("cancel", "Cancel");
    dialog.add_response("reset", "Start new collection");
    dialog.set_response_appearance("reset", adw::ResponseAppearance::Destructive);
    dialog.set_default_response(Some("cancel"));
    dialog.set_close_response("cancel");

    let ctx = ctx.clone();
    dialog.connect_response(None, move |_, response| {
        if response == "reset" {
            ctx.send_event(BoothEvent::ResetCollection);
        }
    });

    dialog.present(Some(window));
}
