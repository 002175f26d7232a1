use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::app::tools::{draw_overlay, OverlayData};
use crate::app::{ImmediateShape, Rgba, Stage, VisualDesc, VisualKind, Vec2};

use super::raster::{clear, draw_line, fill_circle, fill_rect, stroke_circle, stroke_rect};
use super::text::{draw_text_clipped, text_width_px, GLYPH_HEIGHT};
use super::{
    render_to_surface_px, surface_px_to_render, Surface, SurfaceConfig, SurfaceError, Viewport,
};

const CLEAR_COLOR_IDLE: Rgba = [20, 22, 28, 255];
const LABEL_TEXT_SCALE: i32 = 3;
const DEFAULT_INK: Rgba = [0, 0, 0, 255];

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    background: Rgba,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);
        let surface = SurfaceTexture::new(width, height, Arc::clone(&window));
        let pixels = Pixels::new(width, height, surface)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport { width, height },
            background: CLEAR_COLOR_IDLE,
        })
    }

    /// Window size changed; the pixel buffer keeps its size and is rescaled.
    pub fn resize_window(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(SurfaceError::Resize)
    }

    pub fn begin_frame(&mut self) {
        clear(self.pixels.frame_mut(), self.background);
    }

    /// Window position to render space. `None` when the position falls outside
    /// the pixel buffer.
    pub fn window_pos_to_render(&self, window_px: Vec2) -> Option<Vec2> {
        let (x, y) = self
            .pixels
            .window_pos_to_pixel((window_px.x, window_px.y))
            .ok()?;
        Some(surface_px_to_render(
            Vec2 {
                x: x as f32,
                y: y as f32,
            },
            self.viewport,
        ))
    }

    pub(crate) fn present(&mut self, overlay: Option<&OverlayData>) -> Result<(), SurfaceError> {
        if let Some(overlay) = overlay {
            draw_overlay(
                self.pixels.frame_mut(),
                self.viewport.width,
                self.viewport.height,
                overlay,
            );
        }
        self.pixels.render().map_err(SurfaceError::Present)
    }
}

impl Surface for Renderer {
    fn configure(&mut self, config: SurfaceConfig) -> Result<(), SurfaceError> {
        if config.width == 0 || config.height == 0 {
            return Err(SurfaceError::ZeroSize {
                width: config.width,
                height: config.height,
            });
        }
        self.pixels
            .resize_buffer(config.width, config.height)
            .map_err(SurfaceError::Resize)?;
        self.viewport = Viewport {
            width: config.width,
            height: config.height,
        };
        self.background = config.background;
        clear(self.pixels.frame_mut(), self.background);

        let granted = self
            .window
            .request_inner_size(PhysicalSize::new(config.width, config.height));
        info!(
            width = config.width,
            height = config.height,
            window_resized_now = granted.is_some(),
            "surface_configured"
        );
        Ok(())
    }

    fn draw(&mut self, stage: &Stage, shapes: &[ImmediateShape]) {
        let viewport = self.viewport;
        rasterize_scene(
            self.pixels.frame_mut(),
            viewport,
            self.background,
            stage,
            shapes,
        );
        debug!(nodes = stage.node_count(), shapes = shapes.len(), "surface_drawn");
    }
}

pub(crate) fn rasterize_scene(
    frame: &mut [u8],
    viewport: Viewport,
    background: Rgba,
    stage: &Stage,
    shapes: &[ImmediateShape],
) {
    clear(frame, background);
    for node in stage.nodes() {
        if node.desc.visible {
            draw_visual(frame, viewport, &node.desc);
        }
    }
    for shape in shapes {
        match *shape {
            ImmediateShape::Dot {
                center,
                radius,
                color,
            } => {
                let center_px = render_to_surface_px(center, viewport);
                fill_circle(
                    frame,
                    viewport.width,
                    viewport.height,
                    center_px,
                    radius,
                    color,
                );
            }
        }
    }
}

fn draw_visual(frame: &mut [u8], viewport: Viewport, desc: &VisualDesc) {
    let Viewport { width, height } = viewport;
    let center = render_to_surface_px(desc.position, viewport);
    let style = desc.style;
    match &desc.kind {
        VisualKind::Disc { radius, spoke } => {
            if let Some(fill) = style.fill {
                fill_circle(frame, width, height, center, *radius, fill);
            }
            if let Some(stroke) = style.stroke {
                stroke_circle(frame, width, height, center, *radius, style.stroke_width, stroke);
            }
            if *spoke {
                let tip = spoke_tip(desc.position, *radius, desc.rotation_radians);
                draw_line(
                    frame,
                    width,
                    center,
                    render_to_surface_px(tip, viewport),
                    style.stroke.unwrap_or(DEFAULT_INK),
                );
            }
        }
        VisualKind::Ring { radius } => {
            if let Some(fill) = style.fill {
                fill_circle(frame, width, height, center, *radius, fill);
            }
            if let Some(stroke) = style.stroke {
                stroke_circle(frame, width, height, center, *radius, style.stroke_width, stroke);
            }
        }
        VisualKind::Frame { half_extent } => {
            let extent = (half_extent * 2.0).round() as i32;
            let left = center.0 - half_extent.round() as i32;
            let top = center.1 - half_extent.round() as i32;
            if let Some(fill) = style.fill {
                fill_rect(frame, width, height, left, top, extent, extent, fill);
            }
            if let Some(stroke) = style.stroke {
                let thickness = style.stroke_width.round().max(1.0) as i32;
                stroke_rect(frame, width, height, left, top, extent, extent, thickness, stroke);
            }
        }
        VisualKind::Label { text } => {
            let ink = style.fill.or(style.stroke).unwrap_or(DEFAULT_INK);
            let left = center.0 - text_width_px(text, LABEL_TEXT_SCALE) / 2;
            let top = center.1 - (GLYPH_HEIGHT * LABEL_TEXT_SCALE) / 2;
            draw_text_clipped(frame, width, height, left, top, text, LABEL_TEXT_SCALE, ink);
        }
    }
}

/// Zero rotation points the spoke straight up on screen; positive rotation turns it
/// clockwise.
fn spoke_tip(center: Vec2, radius: f32, rotation_radians: f32) -> Vec2 {
    Vec2 {
        x: center.x + radius * rotation_radians.sin(),
        y: center.y - radius * rotation_radians.cos(),
    }
}
