mod raster;
mod renderer;
mod surface;
mod text;
mod transform;

pub(crate) use raster::{fill_rect, stroke_rect};
pub use renderer::Renderer;
pub use surface::{Surface, SurfaceConfig, SurfaceError};
pub(crate) use text::{draw_text_clipped, line_advance, text_width_px};
pub use transform::{render_to_surface_px, surface_px_to_render, Viewport};
