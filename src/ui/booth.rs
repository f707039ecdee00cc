//! Booth screen: camera controls, preview and the capture actions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use fotobox::capture::{Brightness, CapturedImage};
use fotobox::config::{self, DEFAULT_DEVICE_ID};
use fotobox::state::{BoothEvent, BoothStateMachine, DeviceInfo, StreamStatus};

use crate::app::AppContext;
use crate::ui::countdown::CountdownOverlay;
use crate::ui::widgets::{self, animations};

const DEFAULT_DEVICE_LABEL: &str = "Default camera";

/// References to updateable widgets on the booth screen
pub struct BoothPanel {
    pub root: gtk::Box,
    device_list: gtk::StringList,
    device_dropdown: gtk::DropDown,
    /// Device ids in dropdown order
    device_ids: Rc<RefCell<Vec<String>>>,
    /// Set while the dropdown is changed programmatically
    syncing_devices: Rc<Cell<bool>>,
    brightness_scale: gtk::Scale,
    brightness_label: gtk::Label,
    preview_stack: gtk::Stack,
    live_picture: gtk::Picture,
    photo_picture: gtk::Picture,
    shown_photo: RefCell<Option<String>>,
    status_label: gtk::Label,
    countdown: CountdownOverlay,
    flash: gtk::Box,
    error_label: gtk::Label,
    capture_button: gtk::Button,
    live_actions: gtk::Box,
    photo_actions: gtk::Box,
}

impl BoothPanel {
    pub fn new(ctx: &Rc<AppContext>) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 16);
        root.add_css_class("booth-panel");
        root.set_hexpand(true);

        // === Camera controls ===
        let controls = gtk::Box::new(gtk::Orientation::Horizontal, 16);
        controls.add_css_class("camera-controls");

        let device_list = gtk::StringList::new(&[DEFAULT_DEVICE_LABEL]);
        let device_dropdown = gtk::DropDown::new(Some(device_list.clone()), None::<gtk::Expression>);
        device_dropdown.set_selected(gtk::INVALID_LIST_POSITION);
        device_dropdown.set_hexpand(true);

        let device_ids = Rc::new(RefCell::new(vec![DEFAULT_DEVICE_ID.to_string()]));
        let syncing_devices = Rc::new(Cell::new(false));
        {
            let ctx = ctx.clone();
            let device_ids = device_ids.clone();
            let syncing = syncing_devices.clone();
            device_dropdown.connect_selected_notify(move |dropdown| {
                if syncing.get() {
                    return;
                }
                let id = device_ids.borrow().get(dropdown.selected() as usize).cloned();
                if let Some(id) = id {
                    ctx.send_event(BoothEvent::SelectDevice { id });
                }
            });
        }

        let brightness_label = gtk::Label::new(None);
        brightness_label.add_css_class("brightness-label");
        brightness_label.set_width_chars(16);

        let brightness_scale = gtk::Scale::with_range(
            gtk::Orientation::Horizontal,
            f64::from(config::BRIGHTNESS_MIN),
            f64::from(config::BRIGHTNESS_MAX),
            f64::from(config::BRIGHTNESS_STEP),
        );
        brightness_scale.set_value(f64::from(config::BRIGHTNESS_DEFAULT));
        brightness_scale.set_draw_value(false);
        brightness_scale.set_size_request(240, -1);
        {
            let ctx = ctx.clone();
            brightness_scale.connect_value_changed(move |scale| {
                let brightness = Brightness::snapped(scale.value());
                ctx.send_event(BoothEvent::SetBrightness(brightness.percent()));
            });
        }

        let camera_label = gtk::Label::new(Some("Camera"));
        camera_label.add_css_class("control-label");

        controls.append(&camera_label);
        controls.append(&device_dropdown);
        controls.append(&brightness_label);
        controls.append(&brightness_scale);

        // === Preview ===
        let preview_overlay = gtk::Overlay::new();
        preview_overlay.add_css_class("preview-frame");

        let live_picture = gtk::Picture::new();
        live_picture.set_content_fit(gtk::ContentFit::Cover);
        live_picture.add_css_class("live-preview");

        let photo_picture = gtk::Picture::new();
        photo_picture.set_content_fit(gtk::ContentFit::Contain);
        photo_picture.add_css_class("captured-photo");

        let preview_stack = gtk::Stack::new();
        preview_stack.set_transition_type(gtk::StackTransitionType::Crossfade);
        preview_stack.add_named(&live_picture, Some("live"));
        preview_stack.add_named(&photo_picture, Some("photo"));
        preview_overlay.set_child(Some(&preview_stack));

        let status_label = gtk::Label::new(None);
        status_label.add_css_class("preview-status");
        status_label.set_halign(gtk::Align::Center);
        status_label.set_valign(gtk::Align::Center);
        preview_overlay.add_overlay(&status_label);

        let countdown = CountdownOverlay::new();
        preview_overlay.add_overlay(&countdown.container);

        let flash = gtk::Box::new(gtk::Orientation::Vertical, 0);
        flash.add_css_class("capture-flash");
        flash.set_can_target(false);
        flash.set_visible(false);
        preview_overlay.add_overlay(&flash);

        let error_label = gtk::Label::new(None);
        error_label.add_css_class("error-banner");
        error_label.set_halign(gtk::Align::Center);
        error_label.set_valign(gtk::Align::Start);
        error_label.set_margin_top(16);
        error_label.set_wrap(true);
        error_label.set_visible(false);
        preview_overlay.add_overlay(&error_label);

        // Preview keeps the print's aspect ratio
        let preview_frame = gtk::AspectFrame::new(0.5, 0.5, config::ASPECT_RATIO as f32, false);
        preview_frame.set_child(Some(&preview_overlay));
        preview_frame.set_vexpand(true);

        // === Actions ===
        let live_actions = gtk::Box::new(gtk::Orientation::Horizontal, 16);
        live_actions.set_halign(gtk::Align::Center);
        let capture_button = {
            let ctx = ctx.clone();
            widgets::create_capture_button(move || ctx.send_event(BoothEvent::CapturePressed))
        };
        live_actions.append(&capture_button);

        let photo_actions = gtk::Box::new(gtk::Orientation::Horizontal, 16);
        photo_actions.set_halign(gtk::Align::Center);
        let actions: [(&str, &str, &str, BoothEvent); 3] = [
            ("Save photo", "S", "save-button", BoothEvent::SavePressed),
            ("Print photo (10x15 cm)", "P", "print-button", BoothEvent::PrintPressed),
            ("New photo", "Space", "retake-button", BoothEvent::ClearCapture),
        ];
        for (label, shortcut, css_class, event) in actions {
            let ctx = ctx.clone();
            let button = widgets::create_action_button(label, shortcut, css_class, move || {
                ctx.send_event(event.clone())
            });
            photo_actions.append(&button);
        }

        let actions_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        actions_box.set_margin_bottom(16);
        actions_box.append(&live_actions);
        actions_box.append(&photo_actions);

        root.append(&controls);
        root.append(&preview_frame);
        root.append(&actions_box);

        Self {
            root,
            device_list,
            device_dropdown,
            device_ids,
            syncing_devices,
            brightness_scale,
            brightness_label,
            preview_stack,
            live_picture,
            photo_picture,
            shown_photo: RefCell::new(None),
            status_label,
            countdown,
            flash,
            error_label,
            capture_button,
            live_actions,
            photo_actions,
        }
    }

    /// Redraw from the current booth state
    pub fn update(&self, sm: &BoothStateMachine, paintable: Option<&gtk::gdk::Paintable>) {
        self.set_devices(&sm.devices, sm.selected_device.as_deref());
        self.set_brightness(sm.settings.brightness.percent());
        self.set_paintable(paintable);
        self.set_photo(sm.captured.as_ref());

        let live = sm.is_live_view();
        self.preview_stack
            .set_visible_child_name(if live { "live" } else { "photo" });
        self.live_actions.set_visible(live);
        self.photo_actions.set_visible(!live);
        self.capture_button.set_sensitive(sm.can_capture());

        let status = if !live {
            None
        } else if sm.capture_in_flight {
            Some("Capturing...")
        } else {
            match sm.stream {
                StreamStatus::Live => None,
                StreamStatus::Stopped => Some("Choose a camera"),
                StreamStatus::Acquiring => Some("Starting camera..."),
                StreamStatus::Failed => Some("Camera unavailable"),
            }
        };
        self.status_label.set_text(status.unwrap_or_default());
        self.status_label.set_visible(status.is_some());

        self.countdown.set_value(sm.countdown.value());

        match sm.error {
            Some(ref error) => {
                self.error_label.set_text(error);
                self.error_label.set_visible(true);
            }
            None => self.error_label.set_visible(false),
        }
    }

    fn set_devices(&self, devices: &[DeviceInfo], selected: Option<&str>) {
        let mut ids = vec![DEFAULT_DEVICE_ID.to_string()];
        ids.extend(devices.iter().map(|d| d.id.clone()));

        self.syncing_devices.set(true);

        if *self.device_ids.borrow() != ids {
            let labels: Vec<String> = std::iter::once(DEFAULT_DEVICE_LABEL.to_string())
                .chain(devices.iter().enumerate().map(|(i, d)| {
                    if d.label.is_empty() {
                        format!("Camera {}", i + 1)
                    } else {
                        d.label.clone()
                    }
                }))
                .collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            self.device_list.splice(0, self.device_list.n_items(), &labels);
            *self.device_ids.borrow_mut() = ids.clone();
        }

        let position = selected
            .and_then(|id| ids.iter().position(|candidate| candidate == id))
            .map_or(gtk::INVALID_LIST_POSITION, |i| i as u32);
        if self.device_dropdown.selected() != position {
            self.device_dropdown.set_selected(position);
        }

        self.syncing_devices.set(false);
    }

    fn set_brightness(&self, percent: u32) {
        self.brightness_label
            .set_text(&format!("Brightness: {}%", percent));
        let current = Brightness::snapped(self.brightness_scale.value());
        if current.percent() != percent {
            self.brightness_scale.set_value(f64::from(percent));
        }
    }

    fn set_paintable(&self, paintable: Option<&gtk::gdk::Paintable>) {
        if self.live_picture.paintable().as_ref() != paintable {
            self.live_picture.set_paintable(paintable);
        }
    }

    fn set_photo(&self, image: Option<&CapturedImage>) {
        let uri = image.map(|i| i.data_uri().to_string());
        if *self.shown_photo.borrow() == uri {
            return;
        }

        match image {
            Some(image) => {
                let texture = image
                    .jpeg_bytes()
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| widgets::jpeg_texture(&bytes).map_err(|e| e.to_string()));
                match texture {
                    Ok(texture) => self.photo_picture.set_paintable(Some(&texture)),
                    Err(e) => log::error!("Cannot display captured photo: {}", e),
                }
                animations::flash(&self.flash);
            }
            None => self.photo_picture.set_paintable(None::<&gtk::gdk::Paintable>),
        }

        *self.shown_photo.borrow_mut() = uri;
    }
}
