//! Small libadwaita animations for booth feedback.

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;

/// Animation durations (in milliseconds)
pub mod duration {
    pub const FAST: u32 = 150;
    pub const FLASH: u32 = 400;
    pub const COUNTDOWN: u32 = 800;
}

fn timed(
    widget: &impl IsA<gtk::Widget>,
    duration_ms: u32,
    apply: impl Fn(f64) + 'static,
) -> adw::TimedAnimation {
    let target = adw::CallbackAnimationTarget::new(apply);

    let animation = adw::TimedAnimation::builder()
        .widget(widget)
        .value_from(0.0)
        .value_to(1.0)
        .duration(duration_ms)
        .easing(adw::Easing::EaseOutCubic)
        .target(&target)
        .build();

    animation.play();
    animation
}

/// Quick opacity dip on press: 1.0 -> 0.7 -> 1.0
pub fn button_press(widget: &impl IsA<gtk::Widget>) -> adw::TimedAnimation {
    let widget_clone = widget.clone().upcast::<gtk::Widget>();
    timed(widget, duration::FAST, move |value| {
        let dip = if value < 0.5 { value } else { 1.0 - value };
        widget_clone.set_opacity(1.0 - dip * 0.6);
    })
}

/// Camera-flash style white-out that fades away, then hides the widget
pub fn flash(widget: &impl IsA<gtk::Widget>) -> adw::TimedAnimation {
    widget.set_visible(true);
    let widget_clone = widget.clone().upcast::<gtk::Widget>();
    let animation = timed(widget, duration::FLASH, move |value| {
        widget_clone.set_opacity(1.0 - value);
    });

    let widget_clone = widget.clone().upcast::<gtk::Widget>();
    animation.connect_done(move |_| widget_clone.set_visible(false));
    animation
}

/// Fade a freshly changed countdown number in
pub fn pop_in(widget: &impl IsA<gtk::Widget>) -> adw::TimedAnimation {
    let widget_clone = widget.clone().upcast::<gtk::Widget>();
    timed(widget, duration::COUNTDOWN, move |value| {
        widget_clone.set_opacity((value / 0.3).min(1.0));
    })
}
