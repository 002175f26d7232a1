use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::input::InputCollector;
use super::metrics::MetricsAccumulator;
use super::tools::OverlayData;
use super::{PointerSnapshot, Renderer, Surface, SurfaceError};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub metrics_log_interval: Duration,
    pub overlay_visible: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Mirror".to_string(),
            window_width: 640,
            window_height: 640,
            metrics_log_interval: Duration::from_secs(1),
            overlay_visible: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Driven once per redraw on the event-loop thread. Whatever the client draws into
/// the surface is presented when `frame` returns.
pub trait FrameClient {
    fn frame(
        &mut self,
        surface: &mut dyn Surface,
        pointer: PointerSnapshot,
    ) -> Result<(), SurfaceError>;

    /// Extra status lines for the F3 overlay.
    fn overlay_lines(&self) -> Vec<String> {
        Vec::new()
    }

    fn shutdown(&mut self) {}
}

pub fn run_app<C: FrameClient>(config: LoopConfig, mut client: C) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        overlay_visible = config.overlay_visible,
        "loop_config"
    );

    let mut input = InputCollector::default();
    let mut last_frame_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut overlay_visible = config.overlay_visible;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize_window(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = renderer.resize_window(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_physical_key(event.physical_key, event.state);
                    if input.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input.take_overlay_toggle_pressed() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    renderer.begin_frame();
                    let position_render = input
                        .cursor_position_px()
                        .and_then(|px| renderer.window_pos_to_render(px));
                    let pointer = input.take_pointer_snapshot(position_render);
                    if let Err(error) = client.frame(&mut renderer, pointer) {
                        warn!(error = %error, "client_frame_failed");
                        window_target.exit();
                        return;
                    }

                    let overlay = overlay_visible.then(|| OverlayData {
                        metrics: metrics_accumulator.latest(),
                        client_lines: client.overlay_lines(),
                    });
                    if let Err(error) = renderer.present(overlay.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                client.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_metrics_interval_falls_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, fallback),
            fallback
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(250), fallback),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn default_config_starts_with_overlay_hidden() {
        let config = LoopConfig::default();
        assert!(!config.overlay_visible);
        assert_eq!(config.metrics_log_interval, Duration::from_secs(1));
    }
}
