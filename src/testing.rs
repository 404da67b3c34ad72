//! Test doubles for the platform seams

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Rgba;
use crate::domain::core::Rect;
use crate::domain::geometry::{GeometryRequest, GravityMode};
use crate::platform::{GeometryMutator, PlatformError, WindowQuery, WindowType};
use crate::ui::renderer::{DrawingSurface, Line, RendererError};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Fill(Rect, Rgba),
    Line(Line),
}

/// Surface that records draw calls instead of rasterizing them
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
    pub redraw_requests: usize,
}

impl RecordingSurface {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl DrawingSurface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn request_redraw(&mut self) {
        self.redraw_requests += 1;
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(DrawOp::Fill(rect, color));
    }

    fn stroke_line(&mut self, line: &Line) {
        self.ops.push(DrawOp::Line(*line));
    }
}

/// Mutator that keeps every request it receives
///
/// Clones share the same logs so a test can keep one after handing the
/// other to a session. Restores land in both logs.
#[derive(Debug, Clone, Default)]
pub struct RecordingMutator {
    pub requests: Rc<RefCell<Vec<(u32, GeometryRequest)>>>,
    pub restored: Rc<RefCell<Vec<GeometryRequest>>>,
    pub fail: bool,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<GeometryRequest> {
        self.requests.borrow().iter().map(|(_, request)| *request).collect()
    }

    pub fn restores(&self) -> Vec<GeometryRequest> {
        self.restored.borrow().clone()
    }
}

impl GeometryMutator for RecordingMutator {
    type Handle = u32;

    fn set_geometry(
        &mut self,
        window: &u32,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        self.requests.borrow_mut().push((*window, *request));
        if self.fail {
            return Err(PlatformError::Unsupported);
        }
        Ok(())
    }

    fn restore_geometry(
        &mut self,
        window: &u32,
        request: &GeometryRequest,
    ) -> Result<(), PlatformError> {
        self.restored.borrow_mut().push(*request);
        self.set_geometry(window, request)
    }
}

/// Window manager with a single scripted window
#[derive(Debug, Clone)]
pub struct FakeWindowManager {
    pub active: Option<u32>,
    /// Frame origin with client size
    pub geometry: Rect,
    /// Client area, reported for static gravity
    pub client: Rect,
    pub window_type: WindowType,
    pub composited: bool,
    pub activated: RefCell<Vec<u32>>,
}

impl FakeWindowManager {
    pub fn new() -> Self {
        Self {
            active: Some(7),
            geometry: Rect::new(100, 100, 800, 600),
            client: Rect::new(108, 131, 800, 600),
            window_type: WindowType::Normal,
            composited: true,
            activated: RefCell::new(Vec::new()),
        }
    }
}

impl WindowQuery for FakeWindowManager {
    type Handle = u32;

    fn active_window(&self) -> Result<Option<u32>, PlatformError> {
        Ok(self.active)
    }

    fn geometry(&self, _window: &u32, gravity: GravityMode) -> Result<Rect, PlatformError> {
        Ok(match gravity {
            GravityMode::Static => self.client,
            GravityMode::Current | GravityMode::NorthWest => self.geometry,
        })
    }

    fn window_type(&self, _window: &u32) -> Result<WindowType, PlatformError> {
        Ok(self.window_type)
    }

    fn is_composited(&self) -> Result<bool, PlatformError> {
        Ok(self.composited)
    }

    fn activate(&self, window: &u32) -> Result<(), PlatformError> {
        self.activated.borrow_mut().push(*window);
        Ok(())
    }
}
