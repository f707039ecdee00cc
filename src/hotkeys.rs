//! Keyboard shortcuts.

use crate::state::BoothEvent;

/// Actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    /// Space: start the countdown, or discard the held photo
    CaptureOrRetake,
    /// S: save the held photo
    Save,
    /// P: print the held photo
    Print,
    /// Escape: abort a running countdown
    CancelCountdown,
}

/// Shortcut legend shown in the sidebar
pub const LEGEND: &[(&str, &str)] = &[
    ("Space", "Take photo / retake"),
    ("S", "Save photo"),
    ("P", "Print photo"),
    ("Esc", "Cancel countdown"),
];

impl Hotkey {
    /// Map a key name (as GDK names keys) to a hotkey.
    ///
    /// Shortcuts are suppressed while a text input has focus so typing a
    /// URL or a name never triggers a capture.
    pub fn from_key(key_name: &str, text_input_focused: bool) -> Option<Self> {
        if text_input_focused {
            return None;
        }

        match key_name.to_ascii_lowercase().as_str() {
            "space" | " " => Some(Hotkey::CaptureOrRetake),
            "s" => Some(Hotkey::Save),
            "p" => Some(Hotkey::Print),
            "escape" => Some(Hotkey::CancelCountdown),
            _ => None,
        }
    }

    pub fn event(self) -> BoothEvent {
        match self {
            Hotkey::CaptureOrRetake => BoothEvent::CapturePressed,
            Hotkey::Save => BoothEvent::SavePressed,
            Hotkey::Print => BoothEvent::PrintPressed,
            Hotkey::CancelCountdown => BoothEvent::CancelCountdown,
        }
    }
}
