mod app;
mod config;
mod logging;
mod progress;
mod prompt;

pub use app::run_app;
pub use logging::LogDestination;
