//! Window-manager collaborators
//!
//! The session only talks to the window system through the two traits in
//! this module. Each backend module implements them for its platform.

#[cfg(windows)]
pub mod monitors;
pub mod win32;
#[cfg(windows)]
pub mod window;
#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

use std::fmt;

use thiserror::Error;

use crate::domain::core::Rect;
use crate::domain::geometry::{GeometryRequest, GravityMode};

/// Window-manager classification of a top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Normal,
    Desktop,
    Dock,
    Dialog,
    Toolbar,
    Menu,
    Utility,
    Splash,
    Other,
}

impl WindowType {
    /// Only regular application windows are moved by gridlock
    pub fn is_normal(&self) -> bool {
        matches!(self, WindowType::Normal)
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowType::Normal => "normal",
            WindowType::Desktop => "desktop",
            WindowType::Dock => "dock",
            WindowType::Dialog => "dialog",
            WindowType::Toolbar => "toolbar",
            WindowType::Menu => "menu",
            WindowType::Utility => "utility",
            WindowType::Splash => "splash",
            WindowType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors raised by a platform backend
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no window-system backend is available on this platform")]
    Unsupported,

    #[cfg(all(unix, not(target_os = "macos")))]
    #[error("X11: {0}")]
    X11(#[from] x11::X11Error),

    #[cfg(windows)]
    #[error("Win32: {0}")]
    Win32(#[from] window::WindowError),
}

/// Read-only view of the window manager
pub trait WindowQuery {
    type Handle: Clone + fmt::Debug;

    /// The focused top-level window, if any
    fn active_window(&self) -> Result<Option<Self::Handle>, PlatformError>;

    /// Absolute geometry of the window as a request with `gravity` would place it
    ///
    /// Static gravity positions the client area; every other mode positions
    /// the frame, so the origin differs by the decorations.
    fn geometry(&self, window: &Self::Handle, gravity: GravityMode) -> Result<Rect, PlatformError>;

    fn window_type(&self, window: &Self::Handle) -> Result<WindowType, PlatformError>;

    /// Whether translucent windows are composited
    fn is_composited(&self) -> Result<bool, PlatformError>;

    /// Gives focus back to the window
    fn activate(&self, window: &Self::Handle) -> Result<(), PlatformError>;
}

/// Applies geometry requests to a window
pub trait GeometryMutator {
    type Handle;

    fn set_geometry(
        &mut self,
        window: &Self::Handle,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError>;

    /// Puts the window back to the geometry captured at session start
    ///
    /// Backends that had to change window state for a preview (such as
    /// leaving the maximized state) undo that here as well.
    fn restore_geometry(
        &mut self,
        window: &Self::Handle,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        self.set_geometry(window, request)
    }
}
