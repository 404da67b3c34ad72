//! X11 backend
//!
//! Talks to an EWMH compliant window manager through `x11rb`. The window
//! manager does the actual moving: geometry goes out as
//! `_NET_MOVERESIZE_WINDOW` client messages on the root window, the same way
//! pagers and tiling helpers do it.

pub mod overlay;

use thiserror::Error;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageData, ClientMessageEvent, ConnectionExt as _, EventMask,
    Screen, VisualClass, Visualid, Window, CLIENT_MESSAGE_EVENT,
};
use x11rb::NONE;

use crate::domain::core::{Point, Rect};
use crate::domain::geometry::{GeometryRequest, GravityMode};
use crate::platform::{GeometryMutator, PlatformError, WindowQuery, WindowType};

/// X11 errors
#[derive(Debug, Error)]
pub enum X11Error {
    #[error("failed to connect to the X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X11 request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("screen {0} does not exist")]
    NoScreen(usize),

    #[error("no 32-bit TrueColor visual is available")]
    NoArgbVisual,

    #[error("could not grab the {0}")]
    GrabFailed(&'static str),
}

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_TRANSIENT_FOR,
        _NET_ACTIVE_WINDOW,
        _NET_MOVERESIZE_WINDOW,
        _NET_FRAME_EXTENTS,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DESKTOP,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_WM_WINDOW_TYPE_TOOLBAR,
        _NET_WM_WINDOW_TYPE_MENU,
        _NET_WM_WINDOW_TYPE_UTILITY,
        _NET_WM_WINDOW_TYPE_SPLASH,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_NAME,
        _MOTIF_WM_HINTS,
        UTF8_STRING,
    }
}

/// Source indication for requests coming from pagers and similar tools
const SOURCE_PAGER: u32 = 2;

/// Gravity values from the X11 window gravity enumeration
pub fn gravity_code(gravity: GravityMode) -> u32 {
    match gravity {
        GravityMode::Current => 0,
        GravityMode::NorthWest => 1,
        GravityMode::Static => 10,
    }
}

/// `data.l` of a `_NET_MOVERESIZE_WINDOW` message
///
/// `l[0]` packs gravity in bits 0-7, the x/y/width/height presence flags in
/// bits 8-11 and the source indication in bits 12-15.
pub fn moveresize_data(request: &GeometryRequest) -> [u32; 5] {
    let flags = gravity_code(request.gravity)
        | (u32::from(request.mask.bits()) << 8)
        | (SOURCE_PAGER << 12);
    let rect = request.rect;

    // Coordinates travel as 32-bit two's complement values
    [
        flags,
        rect.x as u32,
        rect.y as u32,
        rect.w.max(1) as u32,
        rect.h.max(1) as u32,
    ]
}

/// Origin a `_NET_MOVERESIZE_WINDOW` with `gravity` would need to keep a window in place
///
/// `extents` is the `_NET_FRAME_EXTENTS` value (left, right, top, bottom).
/// Static gravity addresses the client itself; the other modes address the
/// outer frame.
pub fn reference_origin(client: Point, extents: &[u32], gravity: GravityMode) -> Point {
    let (left, top) = match extents {
        [left, _, top, _] => (*left as i32, *top as i32),
        _ => (0, 0),
    };

    match gravity {
        GravityMode::Static => client,
        GravityMode::Current | GravityMode::NorthWest => {
            Point::new(client.x - left, client.y - top)
        }
    }
}

/// Maps `_NET_WM_WINDOW_TYPE` atoms to a window type
///
/// The property lists types in order of preference, so the first known atom
/// wins. Windows without the property are normal, or dialogs when transient.
pub fn classify_window(
    types: &[Atom],
    known: &[(Atom, WindowType)],
    transient: bool,
) -> WindowType {
    if types.is_empty() {
        return if transient {
            WindowType::Dialog
        } else {
            WindowType::Normal
        };
    }

    types
        .iter()
        .find_map(|atom| {
            known
                .iter()
                .find(|(candidate, _)| candidate == atom)
                .map(|(_, window_type)| *window_type)
        })
        .unwrap_or(WindowType::Other)
}

/// Finds a 32-bit TrueColor visual for translucent windows
pub fn find_argb_visual(screen: &Screen) -> Option<Visualid> {
    screen
        .allowed_depths
        .iter()
        .filter(|depth| depth.depth == 32)
        .flat_map(|depth| depth.visuals.iter())
        .find(|visual| visual.class == VisualClass::TRUE_COLOR)
        .map(|visual| visual.visual_id)
}

/// EWMH view of the window manager for one screen
pub struct Ewmh<'c, C: Connection> {
    conn: &'c C,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
}

impl<C: Connection> Clone for Ewmh<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Connection> Copy for Ewmh<'_, C> {}

impl<'c, C: Connection> Ewmh<'c, C> {
    pub fn new(conn: &'c C, screen_num: usize) -> Result<Self, X11Error> {
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(X11Error::NoScreen(screen_num))?;
        let atoms = Atoms::new(conn)?.reply()?;

        Ok(Self {
            conn,
            screen_num,
            root: screen.root,
            atoms,
        })
    }

    pub fn conn(&self) -> &'c C {
        self.conn
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    pub fn root(&self) -> Window {
        self.root
    }

    fn known_types(&self) -> [(Atom, WindowType); 8] {
        let atoms = &self.atoms;
        [
            (atoms._NET_WM_WINDOW_TYPE_NORMAL, WindowType::Normal),
            (atoms._NET_WM_WINDOW_TYPE_DESKTOP, WindowType::Desktop),
            (atoms._NET_WM_WINDOW_TYPE_DOCK, WindowType::Dock),
            (atoms._NET_WM_WINDOW_TYPE_DIALOG, WindowType::Dialog),
            (atoms._NET_WM_WINDOW_TYPE_TOOLBAR, WindowType::Toolbar),
            (atoms._NET_WM_WINDOW_TYPE_MENU, WindowType::Menu),
            (atoms._NET_WM_WINDOW_TYPE_UTILITY, WindowType::Utility),
            (atoms._NET_WM_WINDOW_TYPE_SPLASH, WindowType::Splash),
        ]
    }

    fn cardinals(
        &self,
        window: Window,
        property: Atom,
        kind: AtomEnum,
        len: u32,
    ) -> Result<Vec<u32>, X11Error> {
        let reply = self
            .conn
            .get_property(false, window, property, kind, 0, len)?
            .reply()?;
        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    fn query_active(&self) -> Result<Option<Window>, X11Error> {
        let active = self.cardinals(self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW, 1)?;
        Ok(active.first().copied().filter(|window| *window != NONE))
    }

    fn query_geometry(&self, window: Window, gravity: GravityMode) -> Result<Rect, X11Error> {
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let absolute = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)?
            .reply()?;
        let extents = self.cardinals(
            window,
            self.atoms._NET_FRAME_EXTENTS,
            AtomEnum::CARDINAL,
            4,
        )?;

        let client = Point::new(absolute.dst_x.into(), absolute.dst_y.into());
        let origin = reference_origin(client, &extents, gravity);
        Ok(Rect::new(
            origin.x,
            origin.y,
            i32::from(geometry.width),
            i32::from(geometry.height),
        ))
    }

    fn query_type(&self, window: Window) -> Result<WindowType, X11Error> {
        let types = self.cardinals(window, self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM, 32)?;
        let transient = !self
            .cardinals(window, self.atoms.WM_TRANSIENT_FOR, AtomEnum::WINDOW, 1)?
            .is_empty();
        Ok(classify_window(&types, &self.known_types(), transient))
    }

    fn query_composited(&self) -> Result<bool, X11Error> {
        let name = format!("_NET_WM_CM_S{}", self.screen_num);
        let selection = self.conn.intern_atom(false, name.as_bytes())?.reply()?.atom;
        let owner = self.conn.get_selection_owner(selection)?.reply()?.owner;

        Ok(owner != NONE && find_argb_visual(self.screen()).is_some())
    }

    /// Sends an EWMH client message about `window` to the root
    fn send_root_message(
        &self,
        window: Window,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), X11Error> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: message_type,
            data: ClientMessageData::from(data),
        };

        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

impl<C: Connection> WindowQuery for Ewmh<'_, C> {
    type Handle = Window;

    fn active_window(&self) -> Result<Option<Window>, PlatformError> {
        Ok(self.query_active()?)
    }

    fn geometry(&self, window: &Window, gravity: GravityMode) -> Result<Rect, PlatformError> {
        Ok(self.query_geometry(*window, gravity)?)
    }

    fn window_type(&self, window: &Window) -> Result<WindowType, PlatformError> {
        Ok(self.query_type(*window)?)
    }

    fn is_composited(&self) -> Result<bool, PlatformError> {
        Ok(self.query_composited()?)
    }

    fn activate(&self, window: &Window) -> Result<(), PlatformError> {
        debug!(window, "re-activating target window");
        let data = [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0];
        Ok(self.send_root_message(*window, self.atoms._NET_ACTIVE_WINDOW, data)?)
    }
}

impl<C: Connection> GeometryMutator for Ewmh<'_, C> {
    type Handle = Window;

    fn set_geometry(
        &mut self,
        window: &Window,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        let data = moveresize_data(request);
        Ok(self.send_root_message(*window, self.atoms._NET_MOVERESIZE_WINDOW, data)?)
    }
}
