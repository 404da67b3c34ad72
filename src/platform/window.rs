//! Foreground window queries and geometry changes on Win32
//!
//! This module handles:
//! - Getting the currently active window and its classification
//! - Moving and resizing windows for geometry requests
//! - Handing focus back to the target window
//!
//! Positioning never activates the target or changes its Z-order.

use thiserror::Error;
use tracing::debug;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Dwm::DwmIsCompositionEnabled;
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::domain::core::Rect;
use crate::domain::geometry::{GeometryRequest, GravityMode, MoveResizeMask};
use crate::platform::win32::{rect_to_win32_rect, win32_rect_to_rect, window_type_from_styles};
use crate::platform::{GeometryMutator, PlatformError, WindowQuery, WindowType};

/// Failures talking to a top-level window
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("invalid window handle {0:?}")]
    InvalidHandle(HWND),

    #[error("failed to get info for window {0:?}")]
    InfoFailed(HWND),

    #[error("failed to position window {0:?}")]
    PositionFailed(HWND),

    #[error("desktop composition query failed: {0:?}")]
    Composition(windows::core::HRESULT),
}

/// Snapshot of a top-level window taken before positioning it
#[derive(Debug, Clone)]
pub struct WindowInfo {
    /// Outer window rectangle in screen coordinates
    pub rect: Rect,
    pub style: u32,
    pub ex_style: u32,
    pub class_name: String,
    /// Placement before any change, used to undo leaving the maximized state
    pub placement: WINDOWPLACEMENT,
}

impl WindowInfo {
    pub fn is_maximized(&self) -> bool {
        self.placement.showCmd == SW_SHOWMAXIMIZED.0 as u32
    }
}

/// Reads rect, styles, class and placement of `hwnd`
pub fn get_window_info(hwnd: HWND) -> Result<WindowInfo, WindowError> {
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            return Err(WindowError::InvalidHandle(hwnd));
        }

        let mut window_rect = RECT::default();
        if GetWindowRect(hwnd, &mut window_rect).is_err() {
            return Err(WindowError::InfoFailed(hwnd));
        }

        let mut class_buffer = [0u16; 256];
        let class_length = GetClassNameW(hwnd, &mut class_buffer);
        let class_name = String::from_utf16_lossy(&class_buffer[..class_length.max(0) as usize]);

        let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
        let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;

        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        if GetWindowPlacement(hwnd, &mut placement).is_err() {
            return Err(WindowError::InfoFailed(hwnd));
        }

        Ok(WindowInfo {
            rect: win32_rect_to_rect(&window_rect),
            style,
            ex_style,
            class_name,
            placement,
        })
    }
}

/// Outer rectangle for a request
///
/// Static gravity places the client area; the frame is added around it.
fn outer_rect(info: &WindowInfo, request: &GeometryRequest) -> Rect {
    let mut rect = request.rect;

    // Fields missing from the mask keep their current value
    if !request.mask.contains(MoveResizeMask::X) {
        rect.x = info.rect.x;
    }
    if !request.mask.contains(MoveResizeMask::Y) {
        rect.y = info.rect.y;
    }
    if !request.mask.contains(MoveResizeMask::WIDTH) {
        rect.w = info.rect.w;
    }
    if !request.mask.contains(MoveResizeMask::HEIGHT) {
        rect.h = info.rect.h;
    }

    if request.gravity != GravityMode::Static {
        return rect;
    }

    let mut frame = rect_to_win32_rect(&rect);
    let adjusted = unsafe {
        AdjustWindowRectEx(
            &mut frame,
            WINDOW_STYLE(info.style),
            FALSE,
            WINDOW_EX_STYLE(info.ex_style),
        )
    };
    match adjusted {
        Ok(()) => win32_rect_to_rect(&frame),
        Err(e) => {
            debug!(error = %e, "AdjustWindowRectEx failed, using rect as outer bounds");
            rect
        }
    }
}

/// Client area of a window in screen coordinates
pub fn client_screen_rect(hwnd: HWND) -> Result<Rect, WindowError> {
    unsafe {
        let mut client = RECT::default();
        if GetClientRect(hwnd, &mut client).is_err() {
            return Err(WindowError::InfoFailed(hwnd));
        }

        let mut origin = POINT::default();
        if !ClientToScreen(hwnd, &mut origin).as_bool() {
            return Err(WindowError::InfoFailed(hwnd));
        }

        Ok(Rect::new(
            origin.x,
            origin.y,
            client.right - client.left,
            client.bottom - client.top,
        ))
    }
}

/// Moves and resizes a window without activating it
///
/// Returns the placement the window had when it was maximized, since a
/// maximized window has to be restored before it can be moved.
pub fn position_window(
    hwnd: HWND,
    request: &GeometryRequest,
) -> Result<Option<WINDOWPLACEMENT>, WindowError> {
    let info = get_window_info(hwnd)?;
    let unmaximized = info.is_maximized().then_some(info.placement);

    unsafe {
        if unmaximized.is_some() {
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }

        let target = outer_rect(&info, request);
        SetWindowPos(
            hwnd,
            HWND(0),
            target.x,
            target.y,
            target.w,
            target.h,
            SWP_NOACTIVATE | SWP_NOZORDER,
        )
        .map_err(|_| WindowError::PositionFailed(hwnd))?;
    }

    Ok(unmaximized)
}

/// Foreground window queries and positioning on the interactive desktop
///
/// Remembers the placement of every window it took out of the maximized
/// state so a restore can maximize it again.
#[derive(Debug, Clone, Default)]
pub struct Win32WindowManager {
    unmaximized: Vec<(HWND, WINDOWPLACEMENT)>,
}

impl Win32WindowManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn remember(&mut self, hwnd: HWND, placement: WINDOWPLACEMENT) {
        if !self.unmaximized.iter().any(|(known, _)| *known == hwnd) {
            self.unmaximized.push((hwnd, placement));
        }
    }

    fn take_placement(&mut self, hwnd: HWND) -> Option<WINDOWPLACEMENT> {
        let index = self.unmaximized.iter().position(|(known, _)| *known == hwnd)?;
        Some(self.unmaximized.swap_remove(index).1)
    }
}

impl WindowQuery for Win32WindowManager {
    type Handle = HWND;

    fn active_window(&self) -> Result<Option<HWND>, PlatformError> {
        let hwnd = unsafe { GetForegroundWindow() };
        Ok((hwnd.0 != 0).then_some(hwnd))
    }

    fn geometry(&self, window: &HWND, gravity: GravityMode) -> Result<Rect, PlatformError> {
        match gravity {
            GravityMode::Static => Ok(client_screen_rect(*window)?),
            GravityMode::Current | GravityMode::NorthWest => Ok(get_window_info(*window)?.rect),
        }
    }

    fn window_type(&self, window: &HWND) -> Result<WindowType, PlatformError> {
        let info = get_window_info(*window)?;
        Ok(window_type_from_styles(info.style, info.ex_style, &info.class_name))
    }

    fn is_composited(&self) -> Result<bool, PlatformError> {
        let enabled =
            unsafe { DwmIsCompositionEnabled() }.map_err(|e| WindowError::Composition(e.code()))?;
        Ok(enabled.as_bool())
    }

    fn activate(&self, window: &HWND) -> Result<(), PlatformError> {
        unsafe {
            if !SetForegroundWindow(*window).as_bool() {
                debug!(?window, "SetForegroundWindow was refused");
            }
        }
        Ok(())
    }
}

impl GeometryMutator for Win32WindowManager {
    type Handle = HWND;

    fn set_geometry(
        &mut self,
        window: &HWND,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        if let Some(placement) = position_window(*window, request)? {
            self.remember(*window, placement);
        }
        Ok(())
    }

    fn restore_geometry(
        &mut self,
        window: &HWND,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        let Some(placement) = self.take_placement(*window) else {
            return self.set_geometry(window, request);
        };

        // The saved placement carries both the normal rect and the maximized state
        debug!(?window, "re-maximizing target window");
        unsafe { SetWindowPlacement(*window, &placement) }
            .map_err(|_| WindowError::PositionFailed(*window))?;
        Ok(())
    }
}
