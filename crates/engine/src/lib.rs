pub mod app;

pub use app::{
    render_to_surface_px, run_app, surface_px_to_render, AppError, FrameClient, ImmediateShape,
    LoopConfig, LoopMetricsSnapshot, PointerSnapshot, Renderer, Rgba, Stage, StageNode, Surface,
    SurfaceConfig, SurfaceError, Vec2, Viewport, VisualBackend, VisualDesc, VisualId, VisualKind,
    VisualStyle,
};
