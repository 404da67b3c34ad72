//! Interaction state machine
//!
//! Defines the drag state machine as a pure transition function. Events go
//! in, a new state and a list of effects come out. Effects are plain data
//! executed by [`crate::app::controller::Session`], so every transition can be
//! tested without a windowing system.

use crate::config::Config;
use crate::domain::core::{Point, Rect};
use crate::domain::geometry::{GeometryRequest, GravityMode, Offset, translate};
use crate::domain::grid::{CellCoords, CellSize, GridSpec};
use crate::domain::selection::CellRect;

/// Pointer buttons as reported by the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u8),
}

/// Keys the session distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Char(char),
    Other(u32),
}

impl Key {
    /// Escape and `q` end the session without applying anything
    pub fn is_quit(&self) -> bool {
        matches!(self, Key::Escape | Key::Char('q') | Key::Char('Q'))
    }
}

/// Input events delivered by the overlay, in arrival order
///
/// Pointer positions are relative to the overlay's top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Overlay absolute position and size became known or changed
    OverlayConfigured {
        origin: Option<Point>,
        width: u32,
        height: u32,
    },
    PointerMotion { x: i32, y: i32 },
    ButtonPress { button: PointerButton, x: i32, y: i32 },
    ButtonRelease { button: PointerButton, x: i32, y: i32 },
    KeyPress(Key),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The selection was applied with this request
    Committed(GeometryRequest),
    /// Nothing new was applied; `restored` tells whether the original
    /// geometry had to be re-issued after live preview
    Cancelled { restored: bool },
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Overlay content changed and must be redrawn
    Redraw,
    /// Send a geometry request to the target window
    ApplyGeometry(GeometryRequest),
    /// Put the target window back where the session found it
    RestoreGeometry(GeometryRequest),
    /// The session is over
    Finish(Outcome),
}

/// Phase of the drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No button held; the cursor cell follows the pointer
    #[default]
    Idle,
    /// Primary button held since press
    Dragging,
    /// Terminal: commit or cancel happened
    Finished(Outcome),
}

/// Per-session values that never change while the overlay is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub grid: GridSpec,
    pub offset: Offset,
    pub gravity: GravityMode,
    pub live_preview: bool,
    /// Target window geometry captured at session start, in the
    /// convention `gravity` expects
    pub original_geometry: Rect,
}

impl SessionConfig {
    pub fn new(config: &Config, original_geometry: Rect) -> Self {
        Self {
            grid: config.grid,
            offset: config.offset,
            gravity: config.gravity,
            live_preview: config.live_preview,
            original_geometry,
        }
    }

    fn restore_request(&self) -> GeometryRequest {
        GeometryRequest::new(self.gravity, self.original_geometry)
    }
}

/// Complete interaction state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub phase: Phase,
    pub cursor: CellRect,
    /// Pixel size of one cell; `None` until the overlay size is known
    pub cell_size: Option<CellSize>,
    /// Absolute position of the overlay's top-left pixel
    pub grid_origin: Option<Point>,
    /// Last pixel rectangle sent in live preview
    pub last_emitted: Option<Rect>,
    /// True once any live-preview geometry was sent
    pub preview_applied: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Current selection in overlay pixels, if anything is selected
    pub fn pixel_rect(&self) -> Option<Rect> {
        self.cursor.to_pixel_rect(self.cell_size?)
    }

    fn cell_under(&self, grid: &GridSpec, x: i32, y: i32) -> Option<CellCoords> {
        self.cell_size.map(|cell| grid.cell_at(x, y, cell))
    }

    /// Absolute geometry for the current selection
    ///
    /// `None` while nothing is selected or the overlay origin is unknown.
    fn target_geometry(&self, config: &SessionConfig) -> Option<(Rect, GeometryRequest)> {
        let pixels = self.pixel_rect()?;
        let origin = self.grid_origin?;
        Some((pixels, translate(pixels, origin, config.offset, config.gravity)))
    }
}

/// State machine for drag transitions
pub struct StateMachine;

impl StateMachine {
    /// Processes one input event and returns the new state with its effects
    ///
    /// # Arguments
    /// * `state` - Current interaction state
    /// * `event` - Event to process
    /// * `config` - Session constants
    pub fn process_event(
        mut state: InteractionState,
        event: &InputEvent,
        config: &SessionConfig,
    ) -> (InteractionState, Vec<Effect>) {
        let mut effects = Vec::new();

        if state.is_finished() {
            return (state, effects);
        }

        match (state.phase, *event) {
            (_, InputEvent::OverlayConfigured { origin, width, height }) => {
                state.grid_origin = origin;
                state.cell_size = config.grid.cell_size(width, height).ok();
                effects.push(Effect::Redraw);
            }

            (Phase::Idle, InputEvent::PointerMotion { x, y }) => {
                if let Some(cell) = state.cell_under(&config.grid, x, y) {
                    state.cursor.set_anchor(cell);
                    effects.push(Effect::Redraw);
                }
            }

            (Phase::Dragging, InputEvent::PointerMotion { x, y }) => {
                if let Some(cell) = state.cell_under(&config.grid, x, y) {
                    state.cursor.update_far_corner(cell);

                    if config.live_preview {
                        if let Some((pixels, request)) = state.target_geometry(config) {
                            if state.last_emitted != Some(pixels) {
                                state.last_emitted = Some(pixels);
                                state.preview_applied = true;
                                effects.push(Effect::ApplyGeometry(request));
                            }
                        }
                    }
                }
                effects.push(Effect::Redraw);
            }

            (Phase::Idle, InputEvent::ButtonPress { button: PointerButton::Primary, x, y }) => {
                if !state.cursor.is_valid() {
                    if let Some(cell) = state.cell_under(&config.grid, x, y) {
                        state.cursor.set_anchor(cell);
                    }
                }
                state.phase = Phase::Dragging;
                effects.push(Effect::Redraw);
            }

            (Phase::Dragging, InputEvent::ButtonPress { button: PointerButton::Primary, .. }) => {}

            (_, InputEvent::ButtonPress { .. }) => {
                Self::cancel(&mut state, config, &mut effects);
            }

            (Phase::Dragging, InputEvent::ButtonRelease { button: PointerButton::Primary, .. }) => {
                match state.target_geometry(config) {
                    Some((_, request)) => {
                        let outcome = Outcome::Committed(request);
                        state.phase = Phase::Finished(outcome);
                        effects.push(Effect::ApplyGeometry(request));
                        effects.push(Effect::Finish(outcome));
                    }
                    None => {
                        // Origin or selection unknown: drop the gesture, let the user retry
                        state.phase = Phase::Idle;
                        effects.push(Effect::Redraw);
                    }
                }
            }

            (_, InputEvent::KeyPress(key)) if key.is_quit() => {
                Self::cancel(&mut state, config, &mut effects);
            }

            _ => {}
        }

        (state, effects)
    }

    fn cancel(state: &mut InteractionState, config: &SessionConfig, effects: &mut Vec<Effect>) {
        let restored = state.preview_applied;
        if restored {
            effects.push(Effect::RestoreGeometry(config.restore_request()));
        }

        let outcome = Outcome::Cancelled { restored };
        state.phase = Phase::Finished(outcome);
        effects.push(Effect::Finish(outcome));
    }
}
