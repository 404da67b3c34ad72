//! Monitor lookup and DPI-aware coordinate handling
//!
//! The overlay covers the monitor that holds the target window. All
//! rectangles are in physical pixels once the process is per-monitor DPI
//! aware, which matches what `GetWindowRect` and `SetWindowPos` use.
//!
//! Secondary monitors can have negative coordinates in the virtual screen.

use thiserror::Error;
use tracing::debug;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::HiDpi::*;

use crate::config::OverlayMode;
use crate::domain::core::Rect;
use crate::platform::win32::win32_rect_to_rect;

/// A monitor as seen by the overlay
#[derive(Debug, Clone)]
pub struct Monitor {
    pub handle: HMONITOR,
    /// Whole monitor in physical pixels
    pub physical_rect: Rect,
    /// Work area in physical pixels (excluding taskbar)
    pub work_area: Rect,
}

impl Monitor {
    /// Area the overlay window should cover
    pub fn overlay_area(&self, mode: OverlayMode) -> Rect {
        match mode {
            OverlayMode::Fullscreen => self.physical_rect,
            OverlayMode::Maximized => self.work_area,
        }
    }
}

/// Error types for monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("no monitor found for window {0:?}")]
    MonitorNotFound(HWND),

    #[error("failed to get info for monitor {0:?}")]
    InfoFailed(HMONITOR),
}

/// Switches the process to per-monitor DPI awareness
///
/// Fails harmlessly when awareness was already set, e.g. by a manifest.
pub fn enable_dpi_awareness() {
    unsafe {
        if let Err(e) = SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE) {
            debug!(error = %e, "DPI awareness unchanged");
        }
    }
}

/// Gets the monitor with the largest overlap with the window
pub fn monitor_for_window(hwnd: HWND) -> Result<Monitor, MonitorError> {
    unsafe {
        let hmonitor = MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST);
        if hmonitor.is_invalid() {
            return Err(MonitorError::MonitorNotFound(hwnd));
        }

        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if GetMonitorInfoW(hmonitor, &mut info) == FALSE {
            return Err(MonitorError::InfoFailed(hmonitor));
        }

        let monitor = Monitor {
            handle: hmonitor,
            physical_rect: win32_rect_to_rect(&info.rcMonitor),
            work_area: win32_rect_to_rect(&info.rcWork),
        };
        debug!(?monitor, "overlay monitor");

        Ok(monitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_area_follows_mode() {
        let monitor = Monitor {
            handle: HMONITOR(0),
            physical_rect: Rect::new(-1920, 0, 1920, 1080),
            work_area: Rect::new(-1920, 0, 1920, 1040), // 40px taskbar
        };

        assert_eq!(
            monitor.overlay_area(OverlayMode::Fullscreen),
            Rect::new(-1920, 0, 1920, 1080)
        );
        assert_eq!(
            monitor.overlay_area(OverlayMode::Maximized),
            Rect::new(-1920, 0, 1920, 1040)
        );
    }
}
