//! General Windows platform utilities
//!
//! Conversions and classification helpers shared by the Win32 window
//! manager and overlay. The style and key mapping work on raw values so
//! they can be checked on any host.

use crate::app::state::{Key, PointerButton};
#[cfg(windows)]
use crate::domain::core::Rect;
use crate::platform::WindowType;

pub const WS_CHILD: u32 = 0x4000_0000;
pub const WS_DLGFRAME: u32 = 0x0040_0000;
pub const WS_THICKFRAME: u32 = 0x0004_0000;
pub const WS_EX_TOOLWINDOW: u32 = 0x0000_0080;

const VK_ESCAPE: u16 = 0x1b;

/// Classifies a top-level window from its styles and window class
pub fn window_type_from_styles(style: u32, ex_style: u32, class_name: &str) -> WindowType {
    match class_name {
        "Progman" | "WorkerW" => return WindowType::Desktop,
        "Shell_TrayWnd" | "Shell_SecondaryTrayWnd" => return WindowType::Dock,
        "#32770" => return WindowType::Dialog,
        _ => {}
    }

    if style & WS_CHILD != 0 || ex_style & WS_EX_TOOLWINDOW != 0 {
        WindowType::Utility
    } else if style & WS_THICKFRAME == 0 && style & WS_DLGFRAME != 0 {
        WindowType::Dialog
    } else {
        WindowType::Normal
    }
}

/// Maps a virtual-key code to a session key
pub fn key_from_virtual_key(vk: u16) -> Key {
    match vk {
        VK_ESCAPE => Key::Escape,
        // Letter keys report the uppercase ASCII code
        0x41..=0x5a => Key::Char(char::from(vk as u8).to_ascii_lowercase()),
        0x30..=0x39 => Key::Char(char::from(vk as u8)),
        other => Key::Other(u32::from(other)),
    }
}

/// Pointer button for an XBUTTON number (1 or 2)
pub fn x_button(number: u16) -> PointerButton {
    PointerButton::Other(3 + number as u8)
}

/// Converts a domain rectangle to Windows RECT structure
#[cfg(windows)]
pub fn rect_to_win32_rect(rect: &Rect) -> windows::Win32::Foundation::RECT {
    windows::Win32::Foundation::RECT {
        left: rect.x,
        top: rect.y,
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

#[cfg(windows)]
pub fn win32_rect_to_rect(rect: &windows::Win32::Foundation::RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top)
}

/// Splits a packed mouse `LPARAM` into signed client coordinates
pub fn client_point(lparam: isize) -> (i32, i32) {
    let x = (lparam & 0xffff) as u16 as i16;
    let y = ((lparam >> 16) & 0xffff) as u16 as i16;
    (i32::from(x), i32::from(y))
}
