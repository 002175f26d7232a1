use crate::app::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    fn center(self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * 0.5,
            y: self.height as f32 * 0.5,
        }
    }
}

/// Render space shares the surface's axis directions; only the origin moves to the
/// surface centre.
pub fn render_to_surface_px(render: Vec2, viewport: Viewport) -> (i32, i32) {
    let center = viewport.center();
    let x = render.x + center.x;
    let y = render.y + center.y;
    (x.round() as i32, y.round() as i32)
}

pub fn surface_px_to_render(surface_px: Vec2, viewport: Viewport) -> Vec2 {
    let center = viewport.center();
    Vec2 {
        x: surface_px.x - center.x,
        y: surface_px.y - center.y,
    }
}
