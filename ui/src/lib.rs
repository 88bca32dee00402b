pub mod app;
mod executor;
pub mod logging;

use iced::Application;

pub use app::{Flags, PanelApp};
pub use logging::{
    apply_log_level, init_logging, LogEntry, LogLevel, LogStore, ReloadHandle,
    DEFAULT_LOG_CAPACITY,
};

pub type UiResult = iced::Result;

pub fn run(flags: Flags) -> UiResult {
    let mut settings = iced::Settings::with_flags(flags);
    settings.window.size = iced::Size::new(1180.0, 820.0);
    PanelApp::run(settings)
}
