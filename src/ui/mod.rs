#[cfg(windows)]
pub mod overlay;
pub mod renderer;

#[cfg(windows)]
pub use overlay::{OverlayError, OverlayWindow};
pub use renderer::{DrawingSurface, OverlayPresenter, PixmapSurface, RendererError};
