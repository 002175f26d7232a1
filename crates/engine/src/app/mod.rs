mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod stage;
mod tools;

pub use input::PointerSnapshot;
pub use loop_runner::{run_app, AppError, FrameClient, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    render_to_surface_px, surface_px_to_render, Renderer, Surface, SurfaceConfig, SurfaceError,
    Viewport,
};
pub use stage::{
    ImmediateShape, Rgba, Stage, StageNode, Vec2, VisualBackend, VisualDesc, VisualId, VisualKind,
    VisualStyle,
};
