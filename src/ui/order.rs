//! Booking dialog: pick upgrades, then enter contact details.

use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;

use fotobox::booking::{BookingOptions, ContactField, OrderForm, OrderStep, Upgrade, BASE_PACKAGE};

fn price_summary(options: &BookingOptions) -> String {
    let mut lines: Vec<String> = options
        .line_items()
        .iter()
        .map(|(name, price)| format!("{}: {} €", name, price))
        .collect();
    lines.push(format!("Total: {} €", options.total()));
    lines.join("\n")
}

fn bullet_list(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| format!("• {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn details_label() -> gtk::Label {
    let label = gtk::Label::new(None);
    label.add_css_class("package-details");
    label.set_xalign(0.0);
    label.set_margin_start(24);
    label
}

struct OrderWidgets {
    stack: gtk::Stack,
    /// Detail list under each upgrade switch
    upgrade_details: Vec<(Upgrade, gtk::Label)>,
    total_label: gtk::Label,
    summary_label: gtk::Label,
    error_label: gtk::Label,
}

impl OrderWidgets {
    fn sync(&self, form: &OrderForm) {
        self.total_label
            .set_text(&format!("Total: {} €", form.options.total()));
        self.summary_label.set_text(&price_summary(&form.options));
        for (upgrade, label) in &self.upgrade_details {
            let details = form.options.visible_details(*upgrade);
            label.set_text(&bullet_list(details));
            label.set_visible(!details.is_empty());
        }
        self.stack.set_visible_child_name(match form.step {
            OrderStep::Options => "options",
            OrderStep::Contact => "contact",
        });
    }

    fn show_error(&self, message: Option<&str>) {
        self.error_label.set_text(message.unwrap_or_default());
        self.error_label.set_visible(message.is_some());
    }
}

/// Present the booking dialog. The form state lives only as long as the dialog.
pub fn show_order_dialog(parent: &impl IsA<gtk::Widget>) {
    let form = Rc::new(RefCell::new(OrderForm::default()));

    // === Step 1: options ===
    let options_page = gtk::Box::new(gtk::Orientation::Vertical, 12);

    let base_group = adw::PreferencesGroup::builder().title("Package").build();
    let base_row = adw::ActionRow::builder()
        .title(BASE_PACKAGE.name)
        .subtitle(format!("{} €, {}", BASE_PACKAGE.price, BASE_PACKAGE.summary.to_lowercase()))
        .build();
    base_group.add(&base_row);
    let base_details = details_label();
    base_details.set_text(&bullet_list(BASE_PACKAGE.details));

    let upgrades = adw::PreferencesGroup::builder().title("Upgrades").build();
    let upgrade_row = |upgrade: Upgrade| {
        let package = upgrade.package();
        adw::SwitchRow::builder()
            .title(package.name)
            .subtitle(format!("{} (+{} €)", package.summary, package.price))
            .build()
    };
    let print_row = upgrade_row(Upgrade::Print);
    let premium_row = upgrade_row(Upgrade::Premium);
    let print_details = details_label();
    let premium_details = details_label();
    upgrades.add(&print_row);
    upgrades.add(&premium_row);

    let total_label = gtk::Label::new(None);
    total_label.add_css_class("order-total");

    let continue_button = gtk::Button::with_label("Continue");
    continue_button.add_css_class("suggested-action");
    continue_button.add_css_class("pill");

    options_page.append(&base_group);
    options_page.append(&base_details);
    options_page.append(&upgrades);
    options_page.append(&print_details);
    options_page.append(&premium_details);
    options_page.append(&total_label);
    options_page.append(&continue_button);

    // === Step 2: contact ===
    let contact_page = gtk::Box::new(gtk::Orientation::Vertical, 12);

    let summary_label = gtk::Label::new(None);
    summary_label.add_css_class("order-summary");
    summary_label.set_xalign(0.0);

    let contact_group = adw::PreferencesGroup::builder().title("Contact").build();
    let name_row = adw::EntryRow::builder().title("Name").build();
    let email_row = adw::EntryRow::builder()
        .title("E-mail")
        .input_purpose(gtk::InputPurpose::Email)
        .build();
    let phone_row = adw::EntryRow::builder()
        .title("Phone (optional)")
        .input_purpose(gtk::InputPurpose::Phone)
        .build();
    contact_group.add(&name_row);
    contact_group.add(&email_row);
    contact_group.add(&phone_row);

    let error_label = gtk::Label::new(None);
    error_label.add_css_class("error");
    error_label.set_visible(false);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    buttons.set_halign(gtk::Align::Center);
    let back_button = gtk::Button::with_label("Back");
    back_button.add_css_class("pill");
    let submit_button = gtk::Button::with_label("Send booking request");
    submit_button.add_css_class("suggested-action");
    submit_button.add_css_class("pill");
    buttons.append(&back_button);
    buttons.append(&submit_button);

    contact_page.append(&summary_label);
    contact_page.append(&contact_group);
    contact_page.append(&error_label);
    contact_page.append(&buttons);

    let stack = gtk::Stack::new();
    stack.set_transition_type(gtk::StackTransitionType::SlideLeftRight);
    stack.add_named(&options_page, Some("options"));
    stack.add_named(&contact_page, Some("contact"));
    stack.set_margin_start(24);
    stack.set_margin_end(24);
    stack.set_margin_top(12);
    stack.set_margin_bottom(24);

    let toolbar = adw::ToolbarView::new();
    toolbar.add_top_bar(&adw::HeaderBar::new());
    toolbar.set_content(Some(&stack));

    let dialog = adw::Dialog::builder()
        .title("Book the photo box")
        .content_width(520)
        .child(&toolbar)
        .build();

    let widgets = Rc::new(OrderWidgets {
        stack,
        upgrade_details: vec![
            (Upgrade::Print, print_details),
            (Upgrade::Premium, premium_details),
        ],
        total_label,
        summary_label,
        error_label,
    });
    widgets.sync(&form.borrow());

    for (row, upgrade) in [(&print_row, Upgrade::Print), (&premium_row, Upgrade::Premium)] {
        let form = form.clone();
        let widgets = widgets.clone();
        row.connect_active_notify(move |_| {
            form.borrow_mut().options.toggle(upgrade);
            widgets.sync(&form.borrow());
        });
    }

    for (row, field) in [
        (&name_row, ContactField::Name),
        (&email_row, ContactField::Email),
        (&phone_row, ContactField::Phone),
    ] {
        let form = form.clone();
        row.connect_changed(move |row| {
            form.borrow_mut().contact.set(field, &row.text());
        });
    }

    {
        let form = form.clone();
        let widgets = widgets.clone();
        continue_button.connect_clicked(move |_| {
            form.borrow_mut().proceed();
            widgets.sync(&form.borrow());
        });
    }

    {
        let form = form.clone();
        let widgets = widgets.clone();
        back_button.connect_clicked(move |_| {
            form.borrow_mut().back();
            widgets.show_error(None);
            widgets.sync(&form.borrow());
        });
    }

    {
        let dialog_weak = dialog.downgrade();
        submit_button.connect_clicked(move |_| {
            let result = form.borrow().submit();
            match result {
                Ok(order) => {
                    log::info!("Booking request for {} EUR sent", order.total_price);
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.close();
                    }
                }
                Err(e) => widgets.show_error(Some(&e.to_string())),
            }
        });
    }

    dialog.present(Some(parent));
}
