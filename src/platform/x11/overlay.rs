//! X11 overlay window and event loop
//!
//! A 32-bit ARGB top-level window covering the screen (or the work area when
//! maximized) receives pointer and keyboard input. Events are translated into
//! [`InputEvent`]s for the session and the tiny-skia pixmap is pushed back
//! with `PutImage`.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ColormapAlloc, ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask,
    Gcontext, GrabMode, GrabStatus, ImageFormat, ImageOrder, Keycode, Keysym, PropMode, Window,
    WindowClass,
};
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

use crate::app::controller::{
    AppError, Preflight, RunOutcome, Session, SessionStatus, preflight, refocus,
};
use crate::app::state::{InputEvent, Key, PointerButton};
use crate::config::{Config, OverlayMode};
use crate::domain::core::Point;
use crate::platform::x11::{Ewmh, X11Error, find_argb_visual};
use crate::ui::renderer::{DrawingSurface, PixmapSurface};

const KEYSYM_ESCAPE: Keysym = 0xff1b;

/// Fixed part of a PutImage request in bytes
const PUT_IMAGE_HEADER: usize = 24;

const GRAB_ATTEMPTS: u32 = 50;

/// `_MOTIF_WM_HINTS` flag telling the window manager the decorations field is set
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

impl From<X11Error> for AppError {
    fn from(error: X11Error) -> Self {
        AppError::Platform(error.into())
    }
}

/// Keycode to keysym table of the current keyboard mapping
#[derive(Debug, Clone)]
pub struct KeyMap {
    min_keycode: Keycode,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

impl KeyMap {
    pub fn load<C: Connection>(conn: &C) -> Result<Self, X11Error> {
        let setup = conn.setup();
        let count = setup.max_keycode - setup.min_keycode + 1;
        let reply = conn.get_keyboard_mapping(setup.min_keycode, count)?.reply()?;

        Ok(Self {
            min_keycode: setup.min_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    /// Unshifted keysym of a keycode
    pub fn keysym(&self, keycode: Keycode) -> Option<Keysym> {
        let offset = keycode.checked_sub(self.min_keycode)?;
        let index = usize::from(offset) * usize::from(self.keysyms_per_keycode);
        self.keysyms.get(index).copied().filter(|sym| *sym != 0)
    }
}

pub fn key_from_keysym(keysym: Keysym) -> Key {
    match keysym {
        KEYSYM_ESCAPE => Key::Escape,
        // Latin-1 keysyms equal their character codes
        0x20..=0x7e => Key::Char(char::from(keysym as u8)),
        other => Key::Other(other),
    }
}

/// Pointer button for a core button number; wheel steps are not buttons
pub fn pointer_button(detail: u8) -> Option<PointerButton> {
    match detail {
        1 => Some(PointerButton::Primary),
        2 => Some(PointerButton::Middle),
        3 => Some(PointerButton::Secondary),
        4..=7 => None,
        other => Some(PointerButton::Other(other)),
    }
}

/// Converts premultiplied BGRA bytes to the server's 32-bit pixel layout
pub fn encode_argb32(mut bgra: Vec<u8>, order: ImageOrder) -> Vec<u8> {
    if order == ImageOrder::MSB_FIRST {
        for pixel in bgra.chunks_exact_mut(4) {
            pixel.reverse();
        }
    }
    bgra
}

/// Number of 32-bit rows that fit in one PutImage request
pub fn rows_per_request(max_request_bytes: usize, width: u32) -> u32 {
    let row_bytes = (width as usize * 4).max(1);
    let rows = max_request_bytes.saturating_sub(PUT_IMAGE_HEADER) / row_bytes;
    rows.clamp(1, u16::MAX as usize) as u32
}

/// ARGB overlay window
pub struct X11Overlay<'c, C: Connection> {
    conn: &'c C,
    root: Window,
    window: Window,
    gc: Gcontext,
    colormap: u32,
    grabbed: bool,
}

impl<'c, C: Connection> X11Overlay<'c, C> {
    pub fn create(ewmh: &Ewmh<'c, C>, mode: OverlayMode) -> Result<Self, X11Error> {
        let conn = ewmh.conn();
        let screen = ewmh.screen();
        let atoms = ewmh.atoms();
        let visual = find_argb_visual(screen).ok_or(X11Error::NoArgbVisual)?;

        let colormap = conn.generate_id()?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, screen.root, visual)?;

        let window = conn.generate_id()?;
        let events = EventMask::EXPOSURE
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION
            | EventMask::KEY_PRESS;
        conn.create_window(
            32,
            window,
            screen.root,
            0,
            0,
            screen.width_in_pixels,
            screen.height_in_pixels,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &CreateWindowAux::new()
                .background_pixel(0)
                .border_pixel(0)
                .colormap(colormap)
                .event_mask(events),
        )?;

        let text: [(Atom, Atom, &[u8]); 3] = [
            (AtomEnum::WM_NAME.into(), AtomEnum::STRING.into(), &b"gridlock"[..]),
            (atoms._NET_WM_NAME, atoms.UTF8_STRING, &b"gridlock"[..]),
            (AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into(), &b"gridlock\0Gridlock\0"[..]),
        ];
        for (property, kind, value) in text {
            conn.change_property8(PropMode::REPLACE, window, property, kind, value)?;
        }

        let mut state = vec![atoms._NET_WM_STATE_ABOVE];
        match mode {
            OverlayMode::Fullscreen => state.push(atoms._NET_WM_STATE_FULLSCREEN),
            OverlayMode::Maximized => {
                state.push(atoms._NET_WM_STATE_MAXIMIZED_VERT);
                state.push(atoms._NET_WM_STATE_MAXIMIZED_HORZ);

                // flags, functions, decorations, input mode, status
                let hints = [MWM_HINTS_DECORATIONS, 0, 0, 0, 0];
                let motif = atoms._MOTIF_WM_HINTS;
                conn.change_property32(PropMode::REPLACE, window, motif, motif, &hints)?;
            }
        }
        let wm_state = atoms._NET_WM_STATE;
        conn.change_property32(PropMode::REPLACE, window, wm_state, AtomEnum::ATOM, &state)?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, window, &CreateGCAux::new())?;

        conn.map_window(window)?;
        conn.flush()?;
        debug!(window, ?mode, "overlay window mapped");

        Ok(Self {
            conn,
            root: screen.root,
            window,
            gc,
            colormap,
            grabbed: false,
        })
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Grabs keyboard and pointer; retried while the window manager maps us
    pub fn grab_input(&mut self) -> Result<(), X11Error> {
        if self.grabbed {
            return Ok(());
        }

        let mut keyboard = false;
        let mut pointer = false;
        for _ in 0..GRAB_ATTEMPTS {
            if !keyboard {
                let reply = self
                    .conn
                    .grab_keyboard(
                        true,
                        self.window,
                        CURRENT_TIME,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?
                    .reply()?;
                keyboard = reply.status == GrabStatus::SUCCESS;
            }
            if !pointer {
                let reply = self
                    .conn
                    .grab_pointer(
                        true,
                        self.window,
                        EventMask::BUTTON_PRESS
                            | EventMask::BUTTON_RELEASE
                            | EventMask::POINTER_MOTION,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                        NONE,
                        NONE,
                        CURRENT_TIME,
                    )?
                    .reply()?;
                pointer = reply.status == GrabStatus::SUCCESS;
            }
            if keyboard && pointer {
                self.grabbed = true;
                return Ok(());
            }
            thread::sleep(Duration::from_millis(10));
        }

        Err(X11Error::GrabFailed(if keyboard { "pointer" } else { "keyboard" }))
    }

    /// Absolute position of the overlay's top-left pixel
    pub fn origin(&self) -> Option<Point> {
        let reply = self
            .conn
            .translate_coordinates(self.window, self.root, 0, 0)
            .ok()?
            .reply();

        match reply {
            Ok(reply) => Some(Point::new(reply.dst_x.into(), reply.dst_y.into())),
            Err(e) => {
                debug!(error = %e, "overlay origin unavailable");
                None
            }
        }
    }

    /// Uploads the surface in strips bounded by the maximum request length
    pub fn present(&self, surface: &PixmapSurface) -> Result<(), X11Error> {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let data = encode_argb32(surface.to_bgra(), self.conn.setup().image_byte_order);
        let row_bytes = width as usize * 4;
        let strip = rows_per_request(self.conn.maximum_request_bytes(), width);

        let mut y = 0;
        while y < height {
            let rows = strip.min(height - y);
            let start = y as usize * row_bytes;
            let end = start + rows as usize * row_bytes;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.window,
                self.gc,
                width as u16,
                rows as u16,
                0,
                y as i16,
                0,
                32,
                &data[start..end],
            )?;
            y += rows;
        }

        self.conn.flush()?;
        Ok(())
    }
}

impl<C: Connection> Drop for X11Overlay<'_, C> {
    fn drop(&mut self) {
        if self.grabbed {
            let _ = self.conn.ungrab_pointer(CURRENT_TIME);
            let _ = self.conn.ungrab_keyboard(CURRENT_TIME);
        }
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.free_colormap(self.colormap);
        let _ = self.conn.flush();
    }
}

/// Translates an X event for the overlay into session input
fn translate_event<C: Connection>(
    event: &Event,
    overlay: &mut X11Overlay<'_, C>,
    keymap: &KeyMap,
) -> Result<Option<InputEvent>, X11Error> {
    let input = match event {
        Event::MapNotify(e) if e.window == overlay.window() => {
            overlay.grab_input()?;
            None
        }
        Event::ConfigureNotify(e) if e.window == overlay.window() => {
            Some(InputEvent::OverlayConfigured {
                origin: overlay.origin(),
                width: e.width.into(),
                height: e.height.into(),
            })
        }
        Event::MotionNotify(e) => Some(InputEvent::PointerMotion {
            x: e.event_x.into(),
            y: e.event_y.into(),
        }),
        Event::ButtonPress(e) => pointer_button(e.detail).map(|button| InputEvent::ButtonPress {
            button,
            x: e.event_x.into(),
            y: e.event_y.into(),
        }),
        Event::ButtonRelease(e) => pointer_button(e.detail).map(|button| InputEvent::ButtonRelease {
            button,
            x: e.event_x.into(),
            y: e.event_y.into(),
        }),
        Event::KeyPress(e) => keymap
            .keysym(e.detail)
            .map(|sym| InputEvent::KeyPress(key_from_keysym(sym))),
        _ => None,
    };
    Ok(input)
}

/// Runs one gridlock invocation against the X server named by `$DISPLAY`
pub fn run(config: &Config) -> Result<RunOutcome, AppError> {
    let (conn, screen_num) = x11rb::connect(None).map_err(X11Error::from)?;
    let ewmh = Ewmh::new(&conn, screen_num)?;

    let (target, original_geometry) = match preflight(&ewmh, config.gravity)? {
        Preflight::NotNormal(window_type) => return Ok(RunOutcome::Skipped(window_type)),
        Preflight::Ready {
            target,
            original_geometry,
        } => (target, original_geometry),
    };

    let keymap = KeyMap::load(&conn)?;
    let mut overlay = X11Overlay::create(&ewmh, config.overlay_mode)?;
    let mut session = Session::new(config, target, original_geometry, ewmh, PixmapSurface::new());

    let outcome = 'events: loop {
        let mut pending = vec![conn.wait_for_event().map_err(X11Error::from)?];
        while let Some(event) = conn.poll_for_event().map_err(X11Error::from)? {
            pending.push(event);
        }

        for event in &pending {
            if let Event::Expose(e) = event {
                if e.window == overlay.window() && e.count == 0 {
                    session.surface_mut().request_redraw();
                }
                continue;
            }

            let Some(input) = translate_event(event, &mut overlay, &keymap)? else {
                continue;
            };
            if let SessionStatus::Finished(outcome) = session.dispatch(&input)? {
                break 'events outcome;
            }
        }

        if session.surface_mut().take_redraw_request() {
            session.render();
            overlay.present(session.surface())?;
        }
    };

    drop(overlay);
    refocus(&ewmh, &target);
    conn.flush().map_err(X11Error::from)?;
    info!(?outcome, "session finished");

    Ok(RunOutcome::Finished(outcome))
}
