//! Application context - bridges the GTK-free state machine with GTK UI.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gstreamer as gst;
use gtk4 as gtk;
use tokio::sync::mpsc;

use fotobox::capture::{self, CapturedImage};
use fotobox::collection::{
    saved_photo_filename, CollectionStore, FileStorage, MemoryStorage, Storage, StoreError,
};
use fotobox::config::{self, BoothConfig, PrintTarget};
use fotobox::print::{self, PrintError};
use fotobox::share;
use fotobox::state::{BoothCommand, BoothEvent, BoothStateMachine};

use crate::ui::printing;
use crate::video::{self, CameraDevice, PipelineError, PipelineEvent, VideoPipeline};

/// Messages sent from async tasks to the GTK main loop
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// Process a booth event through the state machine
    Event(BoothEvent),
    /// Enumeration finished; device handles must reach the main thread
    DevicesFound(Vec<CameraDevice>),
}

/// Sender that can dispatch messages to the GTK main loop from any thread
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl MessageSender {
    pub fn send(&self, msg: AppMessage) {
        let _ = self.tx.send(msg);
    }

    pub fn event(&self, event: BoothEvent) {
        self.send(AppMessage::Event(event));
    }
}

/// Application context - holds state and provides methods to interact with it
pub struct AppContext {
    /// Operator configuration
    pub config: BoothConfig,
    /// The GTK-free state machine
    pub state_machine: RefCell<BoothStateMachine>,
    /// Persistent photo collection
    pub store: RefCell<CollectionStore<Box<dyn Storage>>>,
    /// Active camera pipeline
    pub video: RefCell<Option<VideoPipeline>>,
    /// Device handles from the last enumeration, by id
    devices: RefCell<HashMap<String, gst::Device>>,
    /// Running countdown timer
    countdown_timer: RefCell<Option<glib::SourceId>>,
    /// Tokio runtime for background work
    pub runtime: Arc<tokio::runtime::Runtime>,
    /// Sender for dispatching messages to GTK main loop
    pub message_tx: MessageSender,
}

impl AppContext {
    pub fn new(
        runtime: Arc<tokio::runtime::Runtime>,
        config: BoothConfig,
    ) -> (Rc<Self>, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let store = open_store(&config);
        let state_machine = BoothStateMachine::new(config.countdown_seconds);

        let ctx = Rc::new(Self {
            config,
            state_machine: RefCell::new(state_machine),
            store: RefCell::new(store),
            video: RefCell::new(None),
            devices: RefCell::new(HashMap::new()),
            countdown_timer: RefCell::new(None),
            runtime,
            message_tx: MessageSender { tx },
        });

        (ctx, rx)
    }

    /// Send an event to the state machine (from any thread)
    pub fn send_event(&self, event: BoothEvent) {
        self.message_tx.event(event);
    }

    /// Remember device handles and hand the plain descriptions to the state machine
    pub fn register_devices(self: &Rc<Self>, devices: Vec<CameraDevice>) -> Vec<BoothCommand> {
        let infos = devices.iter().map(|d| d.info.clone()).collect();
        *self.devices.borrow_mut() = devices
            .into_iter()
            .map(|d| (d.info.id, d.device))
            .collect();
        self.process_event(BoothEvent::DevicesEnumerated { devices: infos })
    }

    /// Process an event and execute resulting commands
    /// This should be called from the GTK main loop
    pub fn process_event(self: &Rc<Self>, event: BoothEvent) -> Vec<BoothCommand> {
        let commands = self.state_machine.borrow_mut().process(event);

        for cmd in &commands {
            self.execute_command(cmd.clone());
        }

        commands
    }

    /// URL guests reach the collection under
    pub fn collection_url(&self) -> String {
        share::collection_url(self.store.borrow().collection(), &self.config.collection_base_url)
    }

    /// Execute a command from the state machine
    fn execute_command(self: &Rc<Self>, cmd: BoothCommand) {
        match cmd {
            BoothCommand::EnumerateDevices => {
                let tx = self.message_tx.clone();
                self.runtime.spawn_blocking(move || match video::devices::enumerate() {
                    Ok(devices) => tx.send(AppMessage::DevicesFound(devices)),
                    Err(e) => tx.event(BoothEvent::DeviceEnumerationFailed {
                        error: format!("Could not list cameras: {}", e),
                    }),
                });
            }

            BoothCommand::AcquireStream { device_id } => {
                if let Err(e) = self.acquire_stream(&device_id) {
                    self.send_event(BoothEvent::StreamFailed {
                        error: format!("Camera access failed: {}", e),
                    });
                }
            }

            BoothCommand::StartCountdownTimer => {
                self.stop_countdown_timer();
                let tx = self.message_tx.clone();
                let source = glib::timeout_add_local(
                    Duration::from_millis(config::COUNTDOWN_TICK_MS),
                    move || {
                        tx.event(BoothEvent::CountdownTick);
                        glib::ControlFlow::Continue
                    },
                );
                *self.countdown_timer.borrow_mut() = Some(source);
            }

            BoothCommand::StopCountdownTimer => self.stop_countdown_timer(),

            BoothCommand::CaptureFrame { brightness } => {
                let frame = self.video.borrow().as_ref().and_then(|v| v.latest_frame());
                let tx = self.message_tx.clone();

                self.runtime.spawn_blocking(move || {
                    let event = match capture::capture_frame(frame, brightness) {
                        Ok(Some(image)) => BoothEvent::FrameCaptured { image },
                        Ok(None) => {
                            log::debug!("No camera frame available, capture skipped");
                            BoothEvent::CaptureSkipped
                        }
                        Err(e) => BoothEvent::CaptureFailed {
                            error: format!("Capture failed: {}", e),
                        },
                    };
                    tx.event(event);
                });
            }

            BoothCommand::SavePhoto { image } => self.save_photo(image),

            BoothCommand::StoreCustomUrl { url } => {
                let result = self.store.borrow_mut().set_custom_url(url);
                self.report_store_result(result, "Could not store the link");
            }

            BoothCommand::ResetCollection => {
                let result = self.store.borrow_mut().reset();
                self.report_store_result(result, "Could not reset the collection");
            }

            BoothCommand::ScheduleErrorClear { generation } => {
                let tx = self.message_tx.clone();
                glib::timeout_add_once(
                    Duration::from_millis(config::ERROR_DISPLAY_DURATION_MS),
                    move || {
                        tx.event(BoothEvent::ClearError { generation });
                    },
                );
            }

            BoothCommand::ApplyPreviewFilter { .. }
            | BoothCommand::PrintPhoto { .. }
            | BoothCommand::OpenCollection
            | BoothCommand::UpdateUI => {
                // These need the window and are handled there
            }
        }
    }

    fn acquire_stream(self: &Rc<Self>, device_id: &str) -> Result<(), PipelineError> {
        // Release the current camera before opening the next one
        if self.video.borrow_mut().take().is_some() {
            log::debug!("Released previous camera");
        }

        let device = self.devices.borrow().get(device_id).cloned();
        let mut pipeline = VideoPipeline::new(device_id, device.as_ref())?;

        let tx = self.message_tx.clone();
        pipeline.watch_bus(move |event| match event {
            PipelineEvent::Playing => tx.event(BoothEvent::StreamStarted),
            PipelineEvent::Error(error) => tx.event(BoothEvent::StreamFailed {
                error: format!("Camera error: {}", error),
            }),
        })?;

        pipeline.play()?;
        *self.video.borrow_mut() = Some(pipeline);
        Ok(())
    }

    fn stop_countdown_timer(&self) {
        if let Some(source) = self.countdown_timer.borrow_mut().take() {
            source.remove();
        }
    }

    /// Add the photo to the collection and write the JPEG to disk
    fn save_photo(&self, image: CapturedImage) {
        let result = self.store.borrow_mut().append(image.data_uri().to_string());
        self.report_store_result(result, "Could not add the photo to the collection");

        let dir = self.config.save_dir.clone();
        let tx = self.message_tx.clone();
        self.runtime.spawn(async move {
            let path = dir.join(saved_photo_filename(Utc::now()));
            let result: Result<(), Box<dyn std::error::Error + Send + Sync>> = async {
                let bytes = image.jpeg_bytes()?;
                tokio::fs::create_dir_all(&dir).await?;
                tokio::fs::write(&path, bytes).await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => log::info!("Saved photo to {}", path.display()),
                Err(e) => tx.event(BoothEvent::OperationFailed {
                    error: format!("Could not save {}: {}", path.display(), e),
                }),
            }
        });
    }

    /// Print the photo on the configured target and count the print
    pub fn print_photo(&self, image: &CapturedImage, parent: &gtk::Window) {
        match &self.config.print {
            PrintTarget::Dialog => {
                if let Err(e) = printing::run_print_dialog(parent, image) {
                    self.send_event(BoothEvent::OperationFailed {
                        error: format!("Printing failed: {}", e),
                    });
                }
            }
            PrintTarget::Spool { dir } => self.spool_print(image, dir.clone()),
        }

        // Counted whether or not the job went through
        let result = self.store.borrow_mut().increment_print_count().map(|count| {
            log::info!("Print count is now {}", count);
        });
        self.report_store_result(result, "Could not update the print counter");
    }

    fn spool_print(&self, image: &CapturedImage, dir: PathBuf) {
        let document = print::print_document(image);
        let tx = self.message_tx.clone();

        self.runtime.spawn(async move {
            let path = dir.join(print::spool_filename(Utc::now()));
            let result: Result<(), PrintError> = async {
                tokio::fs::create_dir_all(&dir).await?;
                tokio::fs::write(&path, document).await?;
                Ok(())
            }
            .await;

            match result {
                Ok(()) => log::info!("Spooled print job to {}", path.display()),
                Err(e) => tx.event(BoothEvent::OperationFailed {
                    error: format!("Printing failed: {}", e),
                }),
            }
        });
    }

    fn report_store_result(&self, result: Result<(), StoreError>, context: &str) {
        match result {
            Ok(()) => self.send_event(BoothEvent::CollectionChanged),
            Err(e) => self.send_event(BoothEvent::OperationFailed {
                error: format!("{}: {}", context, e),
            }),
        }
    }
}

/// Open the persistent store, falling back to a session-only one
fn open_store(config: &BoothConfig) -> CollectionStore<Box<dyn Storage>> {
    let storage: Box<dyn Storage> = Box::new(FileStorage::new(&config.storage_dir));
    match CollectionStore::open(storage) {
        Ok(store) => store,
        Err(e) => {
            log::error!(
                "Cannot use {} ({}); photos will not survive a restart",
                config.storage_dir.display(),
                e
            );
            let fallback: Box<dyn Storage> = Box::new(MemoryStorage::default());
            CollectionStore::fresh(fallback)
        }
    }
}
