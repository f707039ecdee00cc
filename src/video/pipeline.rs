//! GStreamer pipeline for the live camera preview and still capture.
//!
//! ```text
//! source ! capsfilter ! decodebin ! videoconvert ! tee
//!     tee. ! queue ! gtk4paintablesink
//!     tee. ! queue ! videoconvert ! appsink (RGBA, newest frame only)
//! ```

use std::sync::{Arc, Mutex};

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use gtk4 as gtk;
use thiserror::Error;

use fotobox::capture::Frame;
use fotobox::config::{self, DEFAULT_DEVICE_ID};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    Gstreamer(#[from] glib::Error),
    #[error("GStreamer bool error: {0}")]
    GstreamerBool(#[from] glib::BoolError),
    #[error("Failed to create element: {0}")]
    ElementCreation(String),
    #[error("Failed to start device monitor")]
    DeviceMonitor,
    #[error("Pipeline has no bus")]
    NoBus,
    #[error("Camera could not be started")]
    StateChange,
}

/// Pipeline notifications relevant to the booth
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Frames are flowing
    Playing,
    /// The camera failed or disappeared
    Error(String),
}

/// Camera pipeline; the device is released when this is dropped
pub struct VideoPipeline {
    pipeline: gst::Pipeline,
    paintable: gtk::gdk::Paintable,
    latest_sample: Arc<Mutex<Option<gst::Sample>>>,
    bus_watch: Option<gst::bus::BusWatchGuard>,
}

fn make(factory: &str) -> Result<gst::Element, PipelineError> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|_| PipelineError::ElementCreation(factory.into()))
}

/// Caps asking for 4K at the print aspect ratio first, then plain 4K, and
/// accepting whatever the camera offers after
fn requested_caps() -> gst::Caps {
    let mut caps = gst::Caps::builder_full();
    for (width, height) in config::requested_sizes() {
        for name in ["video/x-raw", "image/jpeg"] {
            caps = caps.structure(
                gst::Structure::builder(name)
                    .field("width", width as i32)
                    .field("height", height as i32)
                    .build(),
            );
        }
    }
    caps.structure(gst::Structure::new_empty("video/x-raw"))
        .structure(gst::Structure::new_empty("image/jpeg"))
        .build()
}

impl VideoPipeline {
    /// Build a pipeline for the given camera.
    ///
    /// `device` is the handle from enumeration when known; otherwise the
    /// default id opens `autovideosrc` and any other id is treated as a
    /// V4L2 device path.
    pub fn new(device_id: &str, device: Option<&gst::Device>) -> Result<Self, PipelineError> {
        gst::init()?;

        let pipeline = gst::Pipeline::new();

        let source = match device {
            Some(device) => device
                .create_element(Some("camera-source"))
                .map_err(|_| PipelineError::ElementCreation(device.display_name().to_string()))?,
            None if device_id == DEFAULT_DEVICE_ID => make("autovideosrc")?,
            None => gst::ElementFactory::make("v4l2src")
                .property("device", device_id)
                .build()
                .map_err(|_| PipelineError::ElementCreation("v4l2src".into()))?,
        };

        let capsfilter = gst::ElementFactory::make("capsfilter")
            .property("caps", requested_caps())
            .build()
            .map_err(|_| PipelineError::ElementCreation("capsfilter".into()))?;

        // Handles both MJPEG and raw cameras
        let decode = make("decodebin")?;
        let convert = make("videoconvert")?;
        let tee = make("tee")?;

        let preview_queue = make("queue")?;
        let preview_sink = make("gtk4paintablesink")?;
        let paintable = preview_sink.property::<gtk::gdk::Paintable>("paintable");

        let frame_queue = gst::ElementFactory::make("queue")
            .property_from_str("leaky", "downstream")
            .property("max-size-buffers", 1u32)
            .build()
            .map_err(|_| PipelineError::ElementCreation("queue".into()))?;
        let frame_convert = make("videoconvert")?;
        let frame_sink = gst_app::AppSink::builder()
            .caps(
                &gst_video::VideoCapsBuilder::new()
                    .format(gst_video::VideoFormat::Rgba)
                    .build(),
            )
            .max_buffers(1)
            .drop(true)
            .sync(false)
            .build();

        pipeline.add_many([
            &source,
            &capsfilter,
            &decode,
            &convert,
            &tee,
            &preview_queue,
            &preview_sink,
            &frame_queue,
            &frame_convert,
            frame_sink.upcast_ref(),
        ])?;

        source.link(&capsfilter)?;
        capsfilter.link(&decode)?;
        gst::Element::link_many([&convert, &tee])?;
        gst::Element::link_many([&tee, &preview_queue, &preview_sink])?;
        gst::Element::link_many([&tee, &frame_queue, &frame_convert, frame_sink.upcast_ref()])?;

        let convert_weak = convert.downgrade();
        decode.connect_pad_added(move |_decode, src_pad| {
            log::debug!("Decoder pad added: {}", src_pad.name());

            if let Some(convert) = convert_weak.upgrade() {
                if let Some(sink_pad) = convert.static_pad("sink") {
                    if !sink_pad.is_linked() {
                        if let Err(e) = src_pad.link(&sink_pad) {
                            log::error!("Failed to link decoder to converter: {:?}", e);
                        } else {
                            log::info!("Linked decoder to converter");
                        }
                    }
                }
            }
        });

        // Keep only the newest frame; capture converts it on demand
        let latest_sample = Arc::new(Mutex::new(None));
        let slot = latest_sample.clone();
        frame_sink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    if let Ok(mut latest) = slot.lock() {
                        *latest = Some(sample);
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(Self {
            pipeline,
            paintable,
            latest_sample,
            bus_watch: None,
        })
    }

    /// Get the paintable for use in GTK widgets
    pub fn paintable(&self) -> &gtk::gdk::Paintable {
        &self.paintable
    }

    /// Copy of the most recent frame, if any arrived yet
    pub fn latest_frame(&self) -> Option<Frame> {
        let sample = self.latest_sample.lock().ok()?.clone()?;
        let info = gst_video::VideoInfo::from_caps(sample.caps()?).ok()?;
        let buffer = sample.buffer()?;
        let map = buffer.map_readable().ok()?;

        let stride = usize::try_from(*info.stride().first()?).ok()?;
        Frame::from_strided(info.width(), info.height(), stride, map.as_slice())
    }

    /// Start the pipeline
    pub fn play(&self) -> Result<(), PipelineError> {
        log::info!("Starting camera pipeline");
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Stop the pipeline and release the camera
    pub fn stop(&self) -> Result<(), PipelineError> {
        log::info!("Stopping camera pipeline");
        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Watch the bus on the GTK main loop. Must be called from the main thread.
    pub fn watch_bus<F>(&mut self, callback: F) -> Result<(), PipelineError>
    where
        F: Fn(PipelineEvent) + 'static,
    {
        let bus = self.pipeline.bus().ok_or(PipelineError::NoBus)?;
        let pipeline_weak = self.pipeline.downgrade();

        let guard = bus.add_watch_local(move |_bus, msg| {
            use gst::MessageView;

            match msg.view() {
                MessageView::Error(err) => {
                    log::error!(
                        "Camera error from {:?}: {} ({:?})",
                        err.src().map(|s| s.path_string()),
                        err.error(),
                        err.debug()
                    );
                    callback(PipelineEvent::Error(err.error().to_string()));
                }
                MessageView::Eos(_) => {
                    log::warn!("Camera stream ended");
                    callback(PipelineEvent::Error("Camera stream ended".into()));
                }
                MessageView::StateChanged(change) => {
                    let from_pipeline = pipeline_weak
                        .upgrade()
                        .is_some_and(|p| msg.src() == Some(p.upcast_ref::<gst::Object>()));
                    if from_pipeline && change.current() == gst::State::Playing {
                        callback(PipelineEvent::Playing);
                    }
                }
                _ => {}
            }

            glib::ControlFlow::Continue
        })?;

        self.bus_watch = Some(guard);
        Ok(())
    }
}

impl Drop for VideoPipeline {
    fn drop(&mut self) {
        self.bus_watch.take();
        let _ = self.stop();
    }
}
