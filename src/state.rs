//! GTK-free state machine and business logic.
//!
//! This module contains the pure Rust state machine that can be tested
//! independently of GTK. The UI layer feeds it events, executes the commands
//! it returns, and observes its state to redraw.

use crate::capture::{Brightness, CapturedImage};
use crate::config::{COUNTDOWN_SECONDS, DEFAULT_DEVICE_ID};
use crate::countdown::{Countdown, Tick};
use crate::share;

/// A camera the user can pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
}

/// Live camera stream status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// No device selected yet
    Stopped,
    /// Pipeline requested, waiting for it to play
    Acquiring,
    /// Preview is running
    Live,
    /// Acquisition failed; re-selecting a device retries
    Failed,
}

/// Camera settings applied to preview and capture alike
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraSettings {
    pub brightness: Brightness,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum BoothEvent {
    // Lifecycle
    Started,

    // User actions
    SelectDevice { id: String },
    SetBrightness(u32),
    /// Main button / space: capture, or discard the held photo
    CapturePressed,
    CancelCountdown,
    ClearCapture,
    SavePressed,
    PrintPressed,
    OpenCollection,
    SetCustomUrl { url: String },
    ResetCollection,

    // Video layer
    DevicesEnumerated { devices: Vec<DeviceInfo> },
    DeviceEnumerationFailed { error: String },
    StreamStarted,
    StreamFailed { error: String },

    // Countdown timer
    CountdownTick,

    // Capture worker
    FrameCaptured { image: CapturedImage },
    CaptureSkipped,
    CaptureFailed { error: String },

    // Collection / IO feedback
    CollectionChanged,
    OperationFailed { error: String },

    // Internal
    /// Error display timer for the error raised as `generation`
    ClearError { generation: u64 },
}

/// Commands emitted by the state machine for the app layer to execute
#[derive(Debug, Clone)]
pub enum BoothCommand {
    /// List the available cameras
    EnumerateDevices,
    /// Stop the current stream (if any) and start one on this device
    AcquireStream { device_id: String },
    /// Start the one-second countdown timer
    StartCountdownTimer,
    /// Stop the countdown timer
    StopCountdownTimer,
    /// Grab the current frame and run it through the capture pipeline
    CaptureFrame { brightness: Brightness },
    /// Update the live preview filter
    ApplyPreviewFilter { brightness: Brightness },
    /// Write the photo to disk and append it to the collection
    SavePhoto { image: CapturedImage },
    /// Print the photo and count the print
    PrintPhoto { image: CapturedImage },
    /// Open the collection URL in the default handler
    OpenCollection,
    /// Persist a new custom collection URL (None clears it)
    StoreCustomUrl { url: Option<String> },
    /// Replace the collection with a fresh one
    ResetCollection,
    /// Schedule error clear after timeout
    ScheduleErrorClear { generation: u64 },
    /// Update UI to reflect new state
    UpdateUI,
}

/// The photo booth state machine
#[derive(Debug)]
pub struct BoothStateMachine {
    pub devices: Vec<DeviceInfo>,
    pub selected_device: Option<String>,
    pub stream: StreamStatus,
    pub settings: CameraSettings,
    pub countdown: Countdown,
    /// A capture was requested and the worker has not answered yet
    pub capture_in_flight: bool,
    pub captured: Option<CapturedImage>,
    pub error: Option<String>,
    /// Bumped on every new error so older clear timers go stale
    error_generation: u64,
    countdown_from: u32,
}

impl Default for BoothStateMachine {
    fn default() -> Self {
        Self::new(COUNTDOWN_SECONDS)
    }
}

impl BoothStateMachine {
    pub fn new(countdown_from: u32) -> Self {
        Self {
            devices: Vec::new(),
            selected_device: None,
            stream: StreamStatus::Stopped,
            settings: CameraSettings::default(),
            countdown: Countdown::Idle,
            capture_in_flight: false,
            captured: None,
            error: None,
            error_generation: 0,
            countdown_from,
        }
    }

    /// Check if currently showing the live preview (no photo held)
    pub fn is_live_view(&self) -> bool {
        self.captured.is_none()
    }

    /// Whether a new countdown may start right now
    pub fn can_capture(&self) -> bool {
        self.is_live_view() && self.countdown.is_idle() && !self.capture_in_flight
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: BoothEvent) -> Vec<BoothCommand> {
        let mut commands = Vec::new();

        match event {
            BoothEvent::Started => {
                commands.push(BoothCommand::EnumerateDevices);
                commands.push(BoothCommand::ApplyPreviewFilter {
                    brightness: self.settings.brightness,
                });
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::DevicesEnumerated { devices } => {
                log::info!("Found {} camera(s)", devices.len());
                let first = devices.first().map(|device| {
                    if device.id.is_empty() {
                        DEFAULT_DEVICE_ID.to_string()
                    } else {
                        device.id.clone()
                    }
                });
                self.devices = devices;

                if self.selected_device.is_none() {
                    match first {
                        Some(id) => self.select_device(id, &mut commands),
                        None => log::warn!("No cameras found"),
                    }
                }
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::DeviceEnumerationFailed { error } => {
                self.set_error(error, &mut commands);
            }

            BoothEvent::SelectDevice { id } => {
                if self.selected_device.as_deref() != Some(id.as_str()) {
                    self.select_device(id, &mut commands);
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::StreamStarted => {
                self.stream = StreamStatus::Live;
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::StreamFailed { error } => {
                self.stream = StreamStatus::Failed;
                self.set_error(error, &mut commands);
            }

            BoothEvent::SetBrightness(percent) => {
                let brightness = Brightness::new(percent);
                if brightness != self.settings.brightness {
                    self.settings.brightness = brightness;
                    commands.push(BoothCommand::ApplyPreviewFilter { brightness });
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::CapturePressed => {
                if !self.is_live_view() {
                    // Same control retakes: drop the held photo first
                    self.clear_capture(&mut commands);
                } else if self.can_capture() && self.countdown.start(self.countdown_from) {
                    commands.push(BoothCommand::StartCountdownTimer);
                    commands.push(BoothCommand::UpdateUI);
                } else {
                    log::debug!("Capture ignored, countdown or capture already running");
                }
            }

            BoothEvent::CancelCountdown => {
                if self.countdown.cancel() {
                    log::info!("Countdown cancelled");
                    commands.push(BoothCommand::StopCountdownTimer);
                    commands.push(BoothCommand::UpdateUI);
                }
            }

            BoothEvent::CountdownTick => match self.countdown.tick() {
                Tick::Continue(_) => commands.push(BoothCommand::UpdateUI),
                Tick::Fire => {
                    self.capture_in_flight = true;
                    commands.push(BoothCommand::StopCountdownTimer);
                    commands.push(BoothCommand::CaptureFrame {
                        brightness: self.settings.brightness,
                    });
                    commands.push(BoothCommand::UpdateUI);
                }
                Tick::Ignored => {}
            },

            BoothEvent::FrameCaptured { image } => {
                self.capture_in_flight = false;
                self.captured = Some(image);
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::CaptureSkipped => {
                self.capture_in_flight = false;
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::CaptureFailed { error } => {
                self.capture_in_flight = false;
                self.set_error(error, &mut commands);
            }

            BoothEvent::ClearCapture => {
                self.clear_capture(&mut commands);
            }

            BoothEvent::SavePressed => {
                if let Some(ref image) = self.captured {
                    commands.push(BoothCommand::SavePhoto {
                        image: image.clone(),
                    });
                }
            }

            BoothEvent::PrintPressed => {
                if let Some(ref image) = self.captured {
                    commands.push(BoothCommand::PrintPhoto {
                        image: image.clone(),
                    });
                }
            }

            BoothEvent::OpenCollection => {
                commands.push(BoothCommand::OpenCollection);
            }

            BoothEvent::SetCustomUrl { url } => match share::normalize_custom_url(&url) {
                Ok(url) => commands.push(BoothCommand::StoreCustomUrl { url }),
                Err(e) => self.set_error(e.to_string(), &mut commands),
            },

            BoothEvent::ResetCollection => {
                commands.push(BoothCommand::ResetCollection);
            }

            BoothEvent::CollectionChanged => {
                commands.push(BoothCommand::UpdateUI);
            }

            BoothEvent::OperationFailed { error } => {
                self.set_error(error, &mut commands);
            }

            BoothEvent::ClearError { generation } => {
                if generation == self.error_generation && self.error.take().is_some() {
                    commands.push(BoothCommand::UpdateUI);
                }
            }
        }

        commands
    }

    fn select_device(&mut self, id: String, commands: &mut Vec<BoothCommand>) {
        log::info!("Selected camera {}", id);
        self.selected_device = Some(id.clone());
        self.stream = StreamStatus::Acquiring;
        commands.push(BoothCommand::AcquireStream { device_id: id });
    }

    fn clear_capture(&mut self, commands: &mut Vec<BoothCommand>) {
        if self.captured.take().is_none() {
            return;
        }
        // Resume the live preview
        if let Some(ref id) = self.selected_device {
            self.stream = StreamStatus::Acquiring;
            commands.push(BoothCommand::AcquireStream {
                device_id: id.clone(),
            });
        }
        commands.push(BoothCommand::UpdateUI);
    }

    fn set_error(&mut self, error: String, commands: &mut Vec<BoothCommand>) {
        log::error!("{}", error);
        self.error = Some(error);
        self.error_generation += 1;
        commands.push(BoothCommand::ScheduleErrorClear {
            generation: self.error_generation,
        });
        commands.push(BoothCommand::UpdateUI);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(id: &str) -> DeviceInfo {
        DeviceInfo {
            id: id.into(),
            label: format!("Camera {}", id),
        }
    }

    fn photo() -> CapturedImage {
        CapturedImage::from_jpeg(&[0xff, 0xd8, 0xff, 0xd9], 1800, 1200)
    }

    fn booth_with_stream() -> BoothStateMachine {
        let mut sm = BoothStateMachine::default();
        sm.process(BoothEvent::Started);
        sm.process(BoothEvent::DevicesEnumerated {
            devices: vec![cam("cam-1"), cam("cam-2")],
        });
        sm.process(BoothEvent::StreamStarted);
        sm
    }

    fn count_captures(cmds: &[BoothCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, BoothCommand::CaptureFrame { .. }))
            .count()
    }

    #[test]
    fn test_initial_state() {
        let sm = BoothStateMachine::default();
        assert_eq!(sm.stream, StreamStatus::Stopped);
        assert!(sm.selected_device.is_none());
        assert!(sm.is_live_view());
        assert!(sm.countdown.is_idle());
    }

    #[test]
    fn test_start_enumerates_devices() {
        let mut sm = BoothStateMachine::default();
        let cmds = sm.process(BoothEvent::Started);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::EnumerateDevices)));
    }

    #[test]
    fn test_first_device_selected_and_acquired() {
        let mut sm = BoothStateMachine::default();
        let cmds = sm.process(BoothEvent::DevicesEnumerated {
            devices: vec![cam("cam-1"), cam("cam-2")],
        });
        assert_eq!(sm.selected_device.as_deref(), Some("cam-1"));
        assert_eq!(sm.stream, StreamStatus::Acquiring);
        assert!(cmds.iter().any(|c| matches!(
            c,
            BoothCommand::AcquireStream { device_id } if device_id == "cam-1"
        )));

        sm.process(BoothEvent::StreamStarted);
        assert_eq!(sm.stream, StreamStatus::Live);
    }

    #[test]
    fn test_device_without_id_uses_default_camera() {
        let mut sm = BoothStateMachine::default();
        sm.process(BoothEvent::DevicesEnumerated {
            devices: vec![cam("")],
        });
        assert_eq!(sm.selected_device.as_deref(), Some(DEFAULT_DEVICE_ID));
    }

    #[test]
    fn test_no_devices_selects_nothing() {
        let mut sm = BoothStateMachine::default();
        let cmds = sm.process(BoothEvent::DevicesEnumerated { devices: vec![] });
        assert!(sm.selected_device.is_none());
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::AcquireStream { .. })));
    }

    #[test]
    fn test_device_change_reacquires() {
        let mut sm = booth_with_stream();

        let cmds = sm.process(BoothEvent::SelectDevice { id: "cam-2".into() });
        assert!(cmds.iter().any(|c| matches!(
            c,
            BoothCommand::AcquireStream { device_id } if device_id == "cam-2"
        )));
        assert_eq!(sm.stream, StreamStatus::Acquiring);

        // Re-selecting the same device is not a change
        sm.process(BoothEvent::StreamStarted);
        let cmds = sm.process(BoothEvent::SelectDevice { id: "cam-2".into() });
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_stream_failure_is_recoverable() {
        let mut sm = booth_with_stream();
        let cmds = sm.process(BoothEvent::StreamFailed {
            error: "Permission denied".into(),
        });
        assert_eq!(sm.stream, StreamStatus::Failed);
        assert_eq!(sm.error.as_deref(), Some("Permission denied"));
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::ScheduleErrorClear { .. })));

        sm.process(BoothEvent::ClearError { generation: 1 });
        assert!(sm.error.is_none());

        let cmds = sm.process(BoothEvent::SelectDevice {
            id: DEFAULT_DEVICE_ID.into(),
        });
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::AcquireStream { .. })));
    }

    #[test]
    fn test_countdown_fires_exactly_once_after_five_ticks() {
        let mut sm = booth_with_stream();

        let cmds = sm.process(BoothEvent::CapturePressed);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::StartCountdownTimer)));
        assert_eq!(sm.countdown.value(), Some(5));

        let mut captures = 0;
        for tick in 1..=5 {
            let cmds = sm.process(BoothEvent::CountdownTick);
            captures += count_captures(&cmds);
            if tick < 5 {
                assert_eq!(captures, 0, "captured early at tick {}", tick);
                assert_eq!(sm.countdown.value(), Some(5 - tick));
            } else {
                assert!(cmds
                    .iter()
                    .any(|c| matches!(c, BoothCommand::StopCountdownTimer)));
            }
        }
        assert_eq!(captures, 1);
        assert!(sm.countdown.is_idle());
        assert!(sm.capture_in_flight);

        // Stray ticks after the timer stops do nothing
        let cmds = sm.process(BoothEvent::CountdownTick);
        assert_eq!(count_captures(&cmds), 0);
    }

    #[test]
    fn test_no_second_countdown_while_running() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::CapturePressed);
        sm.process(BoothEvent::CountdownTick);

        let cmds = sm.process(BoothEvent::CapturePressed);
        assert!(cmds.is_empty());
        assert_eq!(sm.countdown.value(), Some(4));
    }

    #[test]
    fn test_no_countdown_while_capture_in_flight() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::CapturePressed);
        for _ in 0..5 {
            sm.process(BoothEvent::CountdownTick);
        }
        assert!(sm.capture_in_flight);

        let cmds = sm.process(BoothEvent::CapturePressed);
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_cancel_countdown() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::CapturePressed);
        sm.process(BoothEvent::CountdownTick);

        let cmds = sm.process(BoothEvent::CancelCountdown);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::StopCountdownTimer)));
        assert!(sm.countdown.is_idle());

        for _ in 0..5 {
            let cmds = sm.process(BoothEvent::CountdownTick);
            assert_eq!(count_captures(&cmds), 0);
        }

        // Cancelling while idle is a no-op
        assert!(sm.process(BoothEvent::CancelCountdown).is_empty());
    }

    #[test]
    fn test_capture_uses_preview_brightness() {
        for percent in (50..=150).step_by(5) {
            let mut sm = booth_with_stream();
            let preview = sm
                .process(BoothEvent::SetBrightness(percent))
                .into_iter()
                .find_map(|c| match c {
                    BoothCommand::ApplyPreviewFilter { brightness } => Some(brightness),
                    _ => None,
                })
                .unwrap_or(sm.settings.brightness);

            sm.process(BoothEvent::CapturePressed);
            let mut captured = None;
            for _ in 0..5 {
                for cmd in sm.process(BoothEvent::CountdownTick) {
                    if let BoothCommand::CaptureFrame { brightness } = cmd {
                        captured = Some(brightness);
                    }
                }
            }
            assert_eq!(captured, Some(preview));
            assert_eq!(preview.percent(), percent);
        }
    }

    #[test]
    fn test_brightness_changed_mid_countdown() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::CapturePressed);
        sm.process(BoothEvent::CountdownTick);
        sm.process(BoothEvent::SetBrightness(130));

        let mut captured = None;
        for _ in 0..4 {
            for cmd in sm.process(BoothEvent::CountdownTick) {
                if let BoothCommand::CaptureFrame { brightness } = cmd {
                    captured = Some(brightness.percent());
                }
            }
        }
        assert_eq!(captured, Some(130));
    }

    #[test]
    fn test_brightness_clamped() {
        let mut sm = BoothStateMachine::default();
        sm.process(BoothEvent::SetBrightness(10));
        assert_eq!(sm.settings.brightness.percent(), 50);

        // Unchanged value emits nothing
        assert!(sm.process(BoothEvent::SetBrightness(40)).is_empty());
    }

    fn scheduled_generation(cmds: &[BoothCommand]) -> u64 {
        cmds.iter()
            .find_map(|c| match c {
                BoothCommand::ScheduleErrorClear { generation } => Some(*generation),
                _ => None,
            })
            .expect("error clear scheduled")
    }

    #[test]
    fn test_older_error_timer_keeps_newer_error() {
        let mut sm = booth_with_stream();
        let first = scheduled_generation(&sm.process(BoothEvent::OperationFailed {
            error: "Printer offline".into(),
        }));
        let second = scheduled_generation(&sm.process(BoothEvent::OperationFailed {
            error: "Disk full".into(),
        }));
        assert_ne!(first, second);

        // The first timer fires while the second error is still fresh
        assert!(sm.process(BoothEvent::ClearError { generation: first }).is_empty());
        assert_eq!(sm.error.as_deref(), Some("Disk full"));

        let cmds = sm.process(BoothEvent::ClearError { generation: second });
        assert!(matches!(cmds.as_slice(), [BoothCommand::UpdateUI]));
        assert!(sm.error.is_none());
    }

    #[test]
    fn test_capture_rejected_while_photo_held() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::FrameCaptured { image: photo() });
        assert!(!sm.is_live_view());
        assert!(!sm.can_capture());

        // Pressing capture again clears instead of starting a countdown
        let cmds = sm.process(BoothEvent::CapturePressed);
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::StartCountdownTimer)));
        assert!(sm.is_live_view());
        assert!(sm.countdown.is_idle());

        // Live again: the next press starts the countdown
        let cmds = sm.process(BoothEvent::CapturePressed);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, BoothCommand::StartCountdownTimer)));
    }

    #[test]
    fn test_clear_restarts_stream() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::FrameCaptured { image: photo() });

        let cmds = sm.process(BoothEvent::ClearCapture);
        assert!(cmds.iter().any(|c| matches!(
            c,
            BoothCommand::AcquireStream { device_id } if device_id == "cam-1"
        )));
        assert_eq!(sm.stream, StreamStatus::Acquiring);

        // Clearing twice does nothing more
        assert!(sm.process(BoothEvent::ClearCapture).is_empty());
    }

    #[test]
    fn test_capture_skipped_without_frame() {
        let mut sm = booth_with_stream();
        sm.process(BoothEvent::CapturePressed);
        for _ in 0..5 {
            sm.process(BoothEvent::CountdownTick);
        }
        sm.process(BoothEvent::CaptureSkipped);
        assert!(!sm.capture_in_flight);
        assert!(sm.is_live_view());
        assert!(sm.error.is_none());
        assert!(sm.can_capture());
    }

    #[test]
    fn test_save_and_print_need_photo() {
        let mut sm = booth_with_stream();
        assert!(sm.process(BoothEvent::SavePressed).is_empty());
        assert!(sm.process(BoothEvent::PrintPressed).is_empty());

        sm.process(BoothEvent::FrameCaptured { image: photo() });
        let cmds = sm.process(BoothEvent::SavePressed);
        assert!(matches!(
            cmds.as_slice(),
            [BoothCommand::SavePhoto { image }] if *image == photo()
        ));
        let cmds = sm.process(BoothEvent::PrintPressed);
        assert!(matches!(cmds.as_slice(), [BoothCommand::PrintPhoto { .. }]));

        // The photo stays held after save and print
        assert!(!sm.is_live_view());
    }

    #[test]
    fn test_custom_url_validation() {
        let mut sm = BoothStateMachine::default();
        let cmds = sm.process(BoothEvent::SetCustomUrl {
            url: "https://ihre-fotos.de/sammlung".into(),
        });
        assert!(matches!(
            cmds.as_slice(),
            [BoothCommand::StoreCustomUrl { url: Some(url) }] if url == "https://ihre-fotos.de/sammlung"
        ));

        let cmds = sm.process(BoothEvent::SetCustomUrl { url: "".into() });
        assert!(matches!(
            cmds.as_slice(),
            [BoothCommand::StoreCustomUrl { url: None }]
        ));

        sm.process(BoothEvent::SetCustomUrl {
            url: "mailto:someone".into(),
        });
        assert!(sm.error.is_some());
    }

    #[test]
    fn test_scenario_capture_and_print() {
        let mut sm = BoothStateMachine::default();
        sm.process(BoothEvent::Started);
        sm.process(BoothEvent::DevicesEnumerated {
            devices: vec![cam("cam-1")],
        });
        sm.process(BoothEvent::StreamStarted);

        sm.process(crate::hotkeys::Hotkey::CaptureOrRetake.event());
        let mut request = None;
        for _ in 0..5 {
            for cmd in sm.process(BoothEvent::CountdownTick) {
                if let BoothCommand::CaptureFrame { brightness } = cmd {
                    request = Some(brightness);
                }
            }
        }
        let brightness = request.expect("capture requested");

        let frame = crate::capture::Frame {
            width: 640,
            height: 480,
            data: vec![128; 640 * 480 * 4],
        };
        let image = crate::capture::capture_frame(Some(frame), brightness)
            .unwrap()
            .unwrap();
        assert_eq!((image.width, image.height), (1800, 1200));
        sm.process(BoothEvent::FrameCaptured { image });

        let mut store =
            crate::collection::CollectionStore::open(crate::collection::MemoryStorage::default())
                .unwrap();
        assert_eq!(store.collection().printed_photos, 0);

        for cmd in sm.process(crate::hotkeys::Hotkey::Print.event()) {
            if let BoothCommand::PrintPhoto { .. } = cmd {
                store.increment_print_count().unwrap();
            }
        }
        assert_eq!(store.collection().printed_photos, 1);
    }
}
