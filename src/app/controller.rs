//! Session controller and coordination layer
//!
//! The controller runs the startup checks against the window manager and then
//! owns one interaction session: it feeds overlay input into the state machine
//! and executes the returned effects against the geometry mutator and the
//! drawing surface.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::state::{
    Effect, InputEvent, InteractionState, Outcome, SessionConfig, StateMachine,
};
use crate::config::Config;
use crate::domain::core::Rect;
use crate::domain::geometry::{GeometryRequest, GravityMode};
use crate::platform::{GeometryMutator, PlatformError, WindowQuery, WindowType};
use crate::ui::renderer::{DrawingSurface, OverlayPresenter, RendererError};

/// Errors that end the invocation before or during a session
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no active window to move")]
    NoActiveWindow,

    #[error("a compositing manager is required for the translucent overlay")]
    NoCompositor,

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Renderer(#[from] RendererError),

    #[cfg(windows)]
    #[error(transparent)]
    Overlay(#[from] crate::ui::overlay::OverlayError),
}

/// Result of the startup checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight<H> {
    /// The target is a normal window and the overlay can be shown
    Ready { target: H, original_geometry: Rect },
    /// The focused window is not a regular application window
    NotNormal(WindowType),
}

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(WindowType),
    Finished(Outcome),
}

/// Whether the session wants more input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finished(Outcome),
}

/// Resolves the target window and captures its starting geometry
///
/// The geometry is read in the convention of `gravity` so that re-sending it
/// with that gravity leaves the window where it was.
pub fn preflight<Q: WindowQuery>(
    wm: &Q,
    gravity: GravityMode,
) -> Result<Preflight<Q::Handle>, AppError> {
    let target = wm.active_window()?.ok_or(AppError::NoActiveWindow)?;

    let window_type = wm.window_type(&target)?;
    if !window_type.is_normal() {
        info!(?target, %window_type, "active window is not a normal window, nothing to do");
        return Ok(Preflight::NotNormal(window_type));
    }

    if !wm.is_composited()? {
        return Err(AppError::NoCompositor);
    }

    let original_geometry = wm.geometry(&target, gravity)?;
    debug!(?target, ?original_geometry, %gravity, "session target resolved");

    Ok(Preflight::Ready {
        target,
        original_geometry,
    })
}

/// Hands focus back to the target once the overlay is gone
pub fn refocus<Q: WindowQuery>(wm: &Q, target: &Q::Handle) {
    if let Err(e) = wm.activate(target) {
        warn!(error = %e, ?target, "failed to re-activate target window");
    }
}

/// One overlay session for a single target window
pub struct Session<M: GeometryMutator, S: DrawingSurface> {
    config: SessionConfig,
    state: InteractionState,
    presenter: OverlayPresenter,
    target: M::Handle,
    mutator: M,
    surface: S,
}

impl<M, S> Session<M, S>
where
    M: GeometryMutator,
    M::Handle: std::fmt::Debug,
    S: DrawingSurface,
{
    pub fn new(
        config: &Config,
        target: M::Handle,
        original_geometry: Rect,
        mutator: M,
        surface: S,
    ) -> Self {
        Self {
            config: SessionConfig::new(config, original_geometry),
            state: InteractionState::new(),
            presenter: OverlayPresenter::new(config),
            target,
            mutator,
            surface,
        }
    }

    /// Feeds one input event through the state machine and runs its effects
    pub fn dispatch(&mut self, event: &InputEvent) -> Result<SessionStatus, AppError> {
        if let InputEvent::OverlayConfigured { width, height, .. } = *event {
            if width > 0 && height > 0 {
                self.surface.resize(width, height)?;
            }
        }

        let state = std::mem::take(&mut self.state);
        let (state, effects) = StateMachine::process_event(state, event, &self.config);
        self.state = state;

        let mut status = SessionStatus::Running;
        for effect in effects {
            match effect {
                Effect::Redraw => self.surface.request_redraw(),
                Effect::ApplyGeometry(request) => self.apply(&request),
                Effect::RestoreGeometry(request) => self.restore(&request),
                Effect::Finish(outcome) => {
                    match outcome {
                        Outcome::Committed(request) => {
                            info!(rect = ?request.rect, "selection applied")
                        }
                        Outcome::Cancelled { restored } => info!(restored, "session cancelled"),
                    }
                    status = SessionStatus::Finished(outcome);
                }
            }
        }

        Ok(status)
    }

    /// Draws the current state onto the surface
    pub fn render(&mut self) {
        self.presenter.draw(&mut self.surface, &self.state);
    }

    fn apply(&mut self, request: &GeometryRequest) {
        let rect = request.rect;
        debug!(
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
            gravity = %request.gravity,
            "set_geometry"
        );

        if let Err(e) = self.mutator.set_geometry(&self.target, request) {
            warn!(error = %e, target = ?self.target, "failed to apply geometry");
        }
    }

    fn restore(&mut self, request: &GeometryRequest) {
        debug!(rect = ?request.rect, gravity = %request.gravity, "restore_geometry");

        if let Err(e) = self.mutator.restore_geometry(&self.target, request) {
            warn!(error = %e, target = ?self.target, "failed to restore geometry");
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::{Key, Phase, PointerButton};
    use crate::domain::core::Point;
    use crate::domain::geometry::{GravityMode, MoveResizeMask};
    use crate::domain::grid::GridSpec;
    use crate::testing::{DrawOp, FakeWindowManager, RecordingMutator, RecordingSurface};

    type TestSession = Session<RecordingMutator, RecordingSurface>;

    fn session(config: &Config, mutator: RecordingMutator) -> TestSession {
        Session::new(
            config,
            7,
            Rect::new(100, 100, 800, 600),
            mutator,
            RecordingSurface::default(),
        )
    }

    fn configure(session: &mut TestSession) {
        let event = InputEvent::OverlayConfigured {
            origin: Some(Point::new(50, 50)),
            width: 1600,
            height: 1000,
        };
        assert_eq!(session.dispatch(&event).unwrap(), SessionStatus::Running);
    }

    fn drag(session: &mut TestSession, path: &[(i32, i32)]) {
        let (x, y) = path[0];
        session.dispatch(&InputEvent::PointerMotion { x, y }).unwrap();
        session
            .dispatch(&InputEvent::ButtonPress {
                button: PointerButton::Primary,
                x,
                y,
            })
            .unwrap();
        for &(x, y) in &path[1..] {
            session.dispatch(&InputEvent::PointerMotion { x, y }).unwrap();
        }
    }

    #[test]
    fn preflight_captures_target_geometry() {
        let wm = FakeWindowManager::new();
        assert_eq!(
            preflight(&wm, GravityMode::Current).unwrap(),
            Preflight::Ready {
                target: 7,
                original_geometry: Rect::new(100, 100, 800, 600),
            }
        );
    }

    #[test]
    fn preflight_without_active_window_is_fatal() {
        let wm = FakeWindowManager {
            active: None,
            ..FakeWindowManager::new()
        };
        assert!(matches!(
            preflight(&wm, GravityMode::Current),
            Err(AppError::NoActiveWindow)
        ));
    }

    #[test]
    fn preflight_skips_non_normal_windows() {
        let wm = FakeWindowManager {
            window_type: WindowType::Dock,
            composited: false,
            ..FakeWindowManager::new()
        };
        assert_eq!(
            preflight(&wm, GravityMode::Current).unwrap(),
            Preflight::NotNormal(WindowType::Dock)
        );
    }

    #[test]
    fn preflight_requires_compositing() {
        let wm = FakeWindowManager {
            composited: false,
            ..FakeWindowManager::new()
        };
        assert!(matches!(
            preflight(&wm, GravityMode::Current),
            Err(AppError::NoCompositor)
        ));
    }

    #[test]
    fn configure_resizes_surface_and_requests_redraw() {
        let mut session = session(&Config::default(), RecordingMutator::new());
        configure(&mut session);
        assert_eq!(session.surface().size(), (1600, 1000));
        assert_eq!(session.surface().redraw_requests, 1);
        assert_eq!(session.state().grid_origin, Some(Point::new(50, 50)));
    }

    #[test]
    fn drag_and_release_commits_translated_geometry() {
        let mutator = RecordingMutator::new();
        let mut session = session(&Config::default(), mutator.clone());
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350)]);

        let status = session
            .dispatch(&InputEvent::ButtonRelease {
                button: PointerButton::Primary,
                x: 450,
                y: 350,
            })
            .unwrap();

        let expected = GeometryRequest::new(GravityMode::Current, Rect::new(250, 150, 300, 300));
        assert_eq!(status, SessionStatus::Finished(Outcome::Committed(expected)));
        assert_eq!(mutator.requests(), vec![expected]);
        assert_eq!(mutator.requests.borrow()[0].0, 7);
    }

    #[test]
    fn live_cancel_restores_original_geometry() {
        let config = Config {
            live_preview: true,
            ..Config::default()
        };
        let mutator = RecordingMutator::new();
        let mut session = session(&config, mutator.clone());
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350)]);

        let status = session
            .dispatch(&InputEvent::ButtonPress {
                button: PointerButton::Secondary,
                x: 450,
                y: 350,
            })
            .unwrap();

        assert_eq!(
            status,
            SessionStatus::Finished(Outcome::Cancelled { restored: true })
        );
        let last = *mutator.requests().last().unwrap();
        assert_eq!(last.rect, Rect::new(100, 100, 800, 600));
        assert_eq!(last.mask, MoveResizeMask::ALL);
        assert_eq!(last.gravity, GravityMode::Current);
        assert_eq!(mutator.restores(), vec![last]);
    }

    #[test]
    fn static_gravity_cancel_restores_client_origin() {
        // Client at (108,131) inside a frame with 8px left and 31px top extents
        let wm = FakeWindowManager {
            client: Rect::new(108, 131, 800, 600),
            ..FakeWindowManager::new()
        };
        let Preflight::Ready {
            target,
            original_geometry,
        } = preflight(&wm, GravityMode::Static).unwrap()
        else {
            panic!("normal window should be ready");
        };
        assert_eq!(original_geometry, Rect::new(108, 131, 800, 600));

        let config = Config {
            gravity: GravityMode::Static,
            live_preview: true,
            ..Config::default()
        };
        let mutator = RecordingMutator::new();
        let mut session = Session::new(
            &config,
            target,
            original_geometry,
            mutator.clone(),
            RecordingSurface::default(),
        );
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350)]);
        session
            .dispatch(&InputEvent::ButtonPress {
                button: PointerButton::Secondary,
                x: 450,
                y: 350,
            })
            .unwrap();

        assert_eq!(
            mutator.restores(),
            vec![GeometryRequest::new(GravityMode::Static, Rect::new(108, 131, 800, 600))]
        );
    }

    #[test]
    fn refocus_activates_target() {
        let wm = FakeWindowManager::new();
        refocus(&wm, &7);
        assert_eq!(*wm.activated.borrow(), vec![7]);
    }

    #[test]
    fn live_preview_suppresses_duplicate_rectangles() {
        let config = Config {
            live_preview: true,
            ..Config::default()
        };
        let mutator = RecordingMutator::new();
        let mut session = session(&config, mutator.clone());
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350), (460, 360), (470, 370)]);

        assert_eq!(mutator.requests().len(), 1);
    }

    #[test]
    fn mutator_failure_does_not_end_session() {
        let config = Config {
            live_preview: true,
            ..Config::default()
        };
        let mut session = session(&config, RecordingMutator::failing());
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350)]);

        assert_eq!(session.state().phase, Phase::Dragging);
        let status = session.dispatch(&InputEvent::PointerMotion { x: 650, y: 350 }).unwrap();
        assert_eq!(status, SessionStatus::Running);
    }

    #[test]
    fn quit_key_without_preview_applies_nothing() {
        let mutator = RecordingMutator::new();
        let mut session = session(&Config::default(), mutator.clone());
        configure(&mut session);
        drag(&mut session, &[(250, 150), (450, 350)]);

        let status = session.dispatch(&InputEvent::KeyPress(Key::Escape)).unwrap();
        assert_eq!(
            status,
            SessionStatus::Finished(Outcome::Cancelled { restored: false })
        );
        assert!(mutator.requests().is_empty());
        assert!(mutator.restores().is_empty());
    }

    #[test]
    fn render_draws_grid_and_selection() {
        let config = Config {
            grid: GridSpec::new(4, 2).unwrap(),
            ..Config::default()
        };
        let mut session = session(&config, RecordingMutator::new());
        session
            .dispatch(&InputEvent::OverlayConfigured {
                origin: None,
                width: 400,
                height: 200,
            })
            .unwrap();
        session.dispatch(&InputEvent::PointerMotion { x: 150, y: 50 }).unwrap();
        session.render();

        let ops = &session.surface().ops;
        assert_eq!(ops[0], DrawOp::Clear);
        let lines = ops.iter().filter(|op| matches!(op, DrawOp::Line(_))).count();
        assert_eq!(lines, 4);
        assert_eq!(
            ops.last(),
            Some(&DrawOp::Fill(Rect::new(100, 0, 100, 100), config.style.highlight_color))
        );
    }
}
