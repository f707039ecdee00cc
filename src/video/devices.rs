//! Camera discovery via the GStreamer device monitor.

use gstreamer as gst;
use gstreamer::prelude::*;

use fotobox::state::DeviceInfo;

use super::pipeline::PipelineError;

/// Device properties that carry a stable identifier, in order of preference
const ID_PROPERTIES: &[&str] = &["device.path", "api.v4l2.path", "object.path"];

/// A discovered camera with the handle needed to open it
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub info: DeviceInfo,
    pub device: gst::Device,
}

/// List video input devices once
pub fn enumerate() -> Result<Vec<CameraDevice>, PipelineError> {
    gst::init()?;

    let monitor = gst::DeviceMonitor::new();
    if monitor.add_filter(Some("Video/Source"), None).is_none() {
        log::warn!("Device monitor rejected the Video/Source filter");
    }
    monitor.start().map_err(|_| PipelineError::DeviceMonitor)?;

    let devices: Vec<CameraDevice> = monitor
        .devices()
        .into_iter()
        .enumerate()
        .map(|(index, device)| {
            let info = DeviceInfo {
                id: device_id(&device, index),
                label: device.display_name().to_string(),
            };
            log::debug!("Camera {}: {}", info.id, info.label);
            CameraDevice { info, device }
        })
        .collect();

    monitor.stop();
    Ok(devices)
}

fn device_id(device: &gst::Device, index: usize) -> String {
    device
        .properties()
        .and_then(|props| {
            ID_PROPERTIES
                .iter()
                .find_map(|key| props.get::<String>(*key).ok())
        })
        .unwrap_or_else(|| format!("camera-{}", index))
}
