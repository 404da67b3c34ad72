//! Win32 overlay window and message loop
//!
//! A layered topmost popup covers the monitor of the target window. The
//! window procedure only translates messages into [`InputEvent`]s and queues
//! them; the message loop feeds the queue into the session and presents the
//! rendered pixmap with `UpdateLayeredWindow`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;

use tracing::{debug, info, warn};
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION,
    CreateCompatibleDC, CreateDIBSection, DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, HDC,
    HGDIOBJ, ReleaseDC, SelectObject,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, IDC_CROSS,
    LoadCursorW, MSG, RegisterClassW, SW_SHOW, SetForegroundWindow, ShowWindow, TranslateMessage,
    ULW_ALPHA, UpdateLayeredWindow, WM_CLOSE, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_XBUTTONDOWN,
    WM_XBUTTONUP, WNDCLASSW, WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
};
use windows::core::w;

use crate::app::controller::{
    AppError, Preflight, RunOutcome, Session, SessionStatus, preflight, refocus,
};
use crate::app::state::{InputEvent, Key, Outcome, PointerButton};
use crate::config::Config;
use crate::domain::core::Rect;
use crate::platform::monitors::{MonitorError, enable_dpi_awareness, monitor_for_window};
use crate::platform::win32::{client_point, key_from_virtual_key, x_button};
use crate::platform::window::Win32WindowManager;
use crate::ui::renderer::{DrawingSurface, PixmapSurface};

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("could not register the overlay window class")]
    ClassRegistration,

    #[error("could not create the overlay window")]
    WindowCreation,

    #[error("GDI call {0} failed while preparing an overlay frame")]
    Gdi(&'static str),

    #[error("UpdateLayeredWindow rejected the overlay frame")]
    LayerUpdate,

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

thread_local! {
    /// Input translated by the window procedure, drained by the message loop
    static PENDING: RefCell<VecDeque<InputEvent>> = RefCell::new(VecDeque::new());
}

fn queue(event: InputEvent) {
    PENDING.with(|pending| pending.borrow_mut().push_back(event));
}

fn next_pending() -> Option<InputEvent> {
    PENDING.with(|pending| pending.borrow_mut().pop_front())
}

/// Translates a window message into session input
fn translate_message(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<InputEvent> {
    let (x, y) = client_point(lparam.0);
    let press = |button| Some(InputEvent::ButtonPress { button, x, y });
    let release = |button| Some(InputEvent::ButtonRelease { button, x, y });

    match msg {
        WM_MOUSEMOVE => Some(InputEvent::PointerMotion { x, y }),
        WM_LBUTTONDOWN => {
            unsafe { SetCapture(hwnd) };
            press(PointerButton::Primary)
        }
        WM_LBUTTONUP => {
            unsafe {
                let _ = ReleaseCapture();
            }
            release(PointerButton::Primary)
        }
        WM_RBUTTONDOWN => press(PointerButton::Secondary),
        WM_RBUTTONUP => release(PointerButton::Secondary),
        WM_MBUTTONDOWN => press(PointerButton::Middle),
        WM_MBUTTONUP => release(PointerButton::Middle),
        WM_XBUTTONDOWN => press(x_button((wparam.0 >> 16) as u16)),
        WM_XBUTTONUP => release(x_button((wparam.0 >> 16) as u16)),
        WM_KEYDOWN => Some(InputEvent::KeyPress(key_from_virtual_key(wparam.0 as u16))),
        WM_CLOSE => Some(InputEvent::KeyPress(Key::Escape)),
        _ => None,
    }
}

unsafe extern "system" fn overlay_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match translate_message(hwnd, msg, wparam, lparam) {
        Some(event) => {
            queue(event);
            LRESULT(0)
        }
        None => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Layered overlay covering one monitor area
#[derive(Debug)]
pub struct OverlayWindow {
    pub hwnd: HWND,
    /// Screen area covered by the overlay
    pub area: Rect,
}

impl OverlayWindow {
    pub fn create(area: Rect) -> Result<Self, OverlayError> {
        let class_name = w!("GridlockOverlayWindow");

        unsafe {
            let hinstance = GetModuleHandleW(None).map_err(|_| OverlayError::ClassRegistration)?;

            let wc = WNDCLASSW {
                lpfnWndProc: Some(overlay_window_proc),
                hInstance: hinstance.into(),
                lpszClassName: class_name,
                hCursor: LoadCursorW(None, IDC_CROSS).unwrap_or_default(),
                ..Default::default()
            };
            if RegisterClassW(&wc) == 0 {
                return Err(OverlayError::ClassRegistration);
            }

            let hwnd = CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                class_name,
                w!("gridlock"),
                WS_POPUP,
                area.x,
                area.y,
                area.w,
                area.h,
                None,
                None,
                hinstance,
                None,
            );
            if hwnd.0 == 0 {
                return Err(OverlayError::WindowCreation);
            }

            debug!(?hwnd, ?area, "overlay window created");
            Ok(Self { hwnd, area })
        }
    }

    /// Shows the overlay and takes keyboard focus
    pub fn show(&self) {
        unsafe {
            ShowWindow(self.hwnd, SW_SHOW);
            if !SetForegroundWindow(self.hwnd).as_bool() {
                debug!("overlay could not take the foreground");
            }
        }
    }

    /// Copies the rendered frame into a DIB and hands it to the compositor
    pub fn present(&self, surface: &PixmapSurface) -> Result<(), OverlayError> {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let frame = FrameDc::new(width as i32, height as i32)?;
        frame.write(&surface.to_bgra());

        let size = SIZE {
            cx: width as i32,
            cy: height as i32,
        };
        let position = POINT {
            x: self.area.x,
            y: self.area.y,
        };
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: u8::MAX,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };

        unsafe {
            UpdateLayeredWindow(
                self.hwnd,
                frame.screen,
                Some(&position),
                Some(&size),
                frame.memory,
                Some(&POINT::default()),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            )
        }
        .map_err(|_| OverlayError::LayerUpdate)
    }
}

/// Screen DC, memory DC and a selected top-down 32-bit DIB, released on drop
struct FrameDc {
    screen: HDC,
    memory: HDC,
    bitmap: HGDIOBJ,
    previous: HGDIOBJ,
    bits: *mut u8,
    len: usize,
}

impl FrameDc {
    fn new(width: i32, height: i32) -> Result<Self, OverlayError> {
        let mut frame = FrameDc {
            screen: HDC(0),
            memory: HDC(0),
            bitmap: HGDIOBJ(0),
            previous: HGDIOBJ(0),
            bits: std::ptr::null_mut(),
            len: width as usize * height as usize * 4,
        };

        unsafe {
            frame.screen = GetDC(HWND(0));
            if frame.screen.0 == 0 {
                return Err(OverlayError::Gdi("GetDC"));
            }
            frame.memory = CreateCompatibleDC(frame.screen);
            if frame.memory.0 == 0 {
                return Err(OverlayError::Gdi("CreateCompatibleDC"));
            }

            let info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // negative height: rows run top to bottom like the pixmap
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let mut bits: *mut c_void = std::ptr::null_mut();
            let dib = CreateDIBSection(frame.memory, &info, DIB_RGB_COLORS, &mut bits, None, 0)
                .map_err(|_| OverlayError::Gdi("CreateDIBSection"))?;
            frame.bitmap = dib.into();
            if bits.is_null() {
                return Err(OverlayError::Gdi("CreateDIBSection"));
            }
            frame.bits = bits.cast();

            frame.previous = SelectObject(frame.memory, frame.bitmap);
            if frame.previous.0 == 0 {
                return Err(OverlayError::Gdi("SelectObject"));
            }
        }

        Ok(frame)
    }

    fn write(&self, pixels: &[u8]) {
        let len = pixels.len().min(self.len);
        unsafe { std::ptr::copy_nonoverlapping(pixels.as_ptr(), self.bits, len) };
    }
}

impl Drop for FrameDc {
    fn drop(&mut self) {
        unsafe {
            if self.previous.0 != 0 {
                SelectObject(self.memory, self.previous);
            }
            if self.bitmap.0 != 0 {
                DeleteObject(self.bitmap);
            }
            if self.memory.0 != 0 {
                DeleteDC(self.memory);
            }
            if self.screen.0 != 0 {
                ReleaseDC(HWND(0), self.screen);
            }
        }
    }
}

impl Drop for OverlayWindow {
    fn drop(&mut self) {
        unsafe {
            DestroyWindow(self.hwnd).ok();
        }
    }
}

/// Runs one gridlock invocation on the interactive desktop
pub fn run(config: &Config) -> Result<RunOutcome, AppError> {
    enable_dpi_awareness();

    let wm = Win32WindowManager::new();
    let (target, original_geometry) = match preflight(&wm, config.gravity)? {
        Preflight::NotNormal(window_type) => return Ok(RunOutcome::Skipped(window_type)),
        Preflight::Ready {
            target,
            original_geometry,
        } => (target, original_geometry),
    };

    let monitor = monitor_for_window(target).map_err(OverlayError::from)?;
    let area = monitor.overlay_area(config.overlay_mode);
    let overlay = OverlayWindow::create(area)?;

    let mut session = Session::new(
        config,
        target,
        original_geometry,
        Win32WindowManager::new(),
        PixmapSurface::new(),
    );
    session.dispatch(&InputEvent::OverlayConfigured {
        origin: Some(area.origin()),
        width: area.w.max(0) as u32,
        height: area.h.max(0) as u32,
    })?;
    session.render();
    overlay.present(session.surface())?;
    overlay.show();

    let outcome = 'messages: loop {
        let mut msg = MSG::default();
        let received = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if received.0 <= 0 {
            // The loop was torn down from outside; end like a cancel
            match session.dispatch(&InputEvent::KeyPress(Key::Escape))? {
                SessionStatus::Finished(outcome) => break 'messages outcome,
                SessionStatus::Running => break 'messages Outcome::Cancelled { restored: false },
            }
        }

        unsafe {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        while let Some(event) = next_pending() {
            if let SessionStatus::Finished(outcome) = session.dispatch(&event)? {
                break 'messages outcome;
            }
        }

        if session.surface_mut().take_redraw_request() {
            session.render();
            if let Err(e) = overlay.present(session.surface()) {
                warn!(error = %e, "overlay presentation failed");
            }
        }
    };

    drop(overlay);
    PENDING.with(|pending| pending.borrow_mut().clear());
    refocus(&wm, &target);
    info!(?outcome, "session finished");

    Ok(RunOutcome::Finished(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_queue_is_fifo() {
        queue(InputEvent::PointerMotion { x: 1, y: 2 });
        queue(InputEvent::KeyPress(Key::Escape));
        assert_eq!(next_pending(), Some(InputEvent::PointerMotion { x: 1, y: 2 }));
        assert_eq!(next_pending(), Some(InputEvent::KeyPress(Key::Escape)));
        assert_eq!(next_pending(), None);
    }

    #[test]
    fn messages_translate_to_input() {
        let lparam = LPARAM(0x0064_00c8);
        assert_eq!(
            translate_message(HWND(0), WM_MOUSEMOVE, WPARAM(0), lparam),
            Some(InputEvent::PointerMotion { x: 200, y: 100 })
        );
        assert_eq!(
            translate_message(HWND(0), WM_RBUTTONDOWN, WPARAM(0), lparam),
            Some(InputEvent::ButtonPress {
                button: PointerButton::Secondary,
                x: 200,
                y: 100
            })
        );
        assert_eq!(
            translate_message(HWND(0), WM_KEYDOWN, WPARAM(0x1b), LPARAM(0)),
            Some(InputEvent::KeyPress(Key::Escape))
        );
        assert_eq!(translate_message(HWND(0), 0x000F, WPARAM(0), LPARAM(0)), None);
    }
}
