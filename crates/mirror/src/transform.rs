use engine::Vec2;
use serde::{Deserialize, Serialize};

/// Point in the server's arena space: origin at the arena centre, Y up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    #[serde(alias = "X")]
    pub x: f64,
    #[serde(alias = "Y")]
    pub y: f64,
}

/// Point in render space: same origin, Y down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderPoint {
    pub x: f64,
    pub y: f64,
}

impl RenderPoint {
    pub fn distance_sq(self, other: RenderPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl From<RenderPoint> for Vec2 {
    fn from(point: RenderPoint) -> Self {
        Vec2 {
            x: point.x as f32,
            y: point.y as f32,
        }
    }
}

impl From<Vec2> for RenderPoint {
    fn from(point: Vec2) -> Self {
        RenderPoint {
            x: f64::from(point.x),
            y: f64::from(point.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTransform {
    arena_radius: f64,
}

impl ArenaTransform {
    pub fn new(arena_radius: f64) -> Self {
        Self { arena_radius }
    }

    pub fn arena_radius(&self) -> f64 {
        self.arena_radius
    }

    /// Side of the square drawing surface, in pixels.
    pub fn surface_extent(&self) -> u32 {
        (self.arena_radius * 2.0).ceil().max(1.0) as u32
    }

    pub fn to_render(&self, logical: LogicalPoint) -> RenderPoint {
        RenderPoint {
            x: logical.x,
            y: -logical.y,
        }
    }

    pub fn to_logical(&self, render: RenderPoint) -> LogicalPoint {
        LogicalPoint {
            x: render.x,
            y: -render.y,
        }
    }

    pub fn angle_to_render(&self, logical_radians: f64) -> f64 {
        -logical_radians
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_axis_is_reflected_and_x_is_identity() {
        let transform = ArenaTransform::new(100.0);
        let render = transform.to_render(LogicalPoint { x: 10.0, y: 20.0 });
        assert_eq!(render, RenderPoint { x: 10.0, y: -20.0 });
    }

    #[test]
    fn round_trip_is_exact_without_clamping() {
        let transform = ArenaTransform::new(50.0);
        let samples = [
            LogicalPoint { x: 0.0, y: 0.0 },
            LogicalPoint { x: -3.25, y: 7.125 },
            LogicalPoint {
                x: 1.0e9,
                y: -1.0e9,
            },
            LogicalPoint {
                x: 0.1 + 0.2,
                y: f64::MIN_POSITIVE,
            },
        ];
        for logical in samples {
            assert_eq!(transform.to_logical(transform.to_render(logical)), logical);
        }
        let render = RenderPoint { x: 3.0, y: -4.0 };
        assert_eq!(transform.to_render(transform.to_logical(render)), render);
    }

    #[test]
    fn surface_is_twice_the_radius() {
        assert_eq!(ArenaTransform::new(320.0).surface_extent(), 640);
        assert_eq!(ArenaTransform::new(100.5).surface_extent(), 201);
    }

    #[test]
    fn rotation_is_negated() {
        let transform = ArenaTransform::new(1.0);
        assert_eq!(transform.angle_to_render(0.75), -0.75);
    }

    #[test]
    fn logical_point_accepts_either_key_case() {
        let lower: LogicalPoint = serde_json::from_value(serde_json::json!({"x": 1.5, "y": -2}))
            .expect("lowercase point");
        let upper: LogicalPoint = serde_json::from_value(serde_json::json!({"X": 1.5, "Y": -2}))
            .expect("pascal point");
        assert_eq!(lower, upper);
        assert_eq!(
            serde_json::to_value(lower).expect("serialize"),
            serde_json::json!({"x": 1.5, "y": -2.0})
        );
    }
}
