use thiserror::Error;

use crate::app::{ImmediateShape, Rgba, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("failed to resize pixel buffer: {0}")]
    Resize(#[source] pixels::TextureError),
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
}

/// Drawing target a frame client renders into. `draw` rasterizes only; the host
/// presents once the frame is complete.
pub trait Surface {
    fn configure(&mut self, config: SurfaceConfig) -> Result<(), SurfaceError>;
    fn draw(&mut self, stage: &Stage, shapes: &[ImmediateShape]);
}
