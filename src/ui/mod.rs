//! UI components for the booth.

pub mod booth;
pub mod countdown;
pub mod dialogs;
pub mod order;
pub mod printing;
pub mod sidebar;
pub mod widgets;
pub mod window;

pub use window::MainWindow;
