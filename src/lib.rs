//! gridlock: drag across a grid overlay to move and resize the active window

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod platform;
pub mod ui;

#[cfg(test)]
mod testing;

use app::{AppError, RunOutcome};
use config::Config;

/// Runs one session with the window-system backend of this platform
pub fn run(config: &Config) -> Result<RunOutcome, AppError> {
    #[cfg(all(unix, not(target_os = "macos")))]
    return platform::x11::overlay::run(config);

    #[cfg(windows)]
    return ui::overlay::run(config);

    #[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
    {
        let _ = config;
        Err(AppError::Platform(platform::PlatformError::Unsupported))
    }
}
