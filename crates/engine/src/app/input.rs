use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::Vec2;

/// Pointer state handed to the client once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSnapshot {
    /// Render-space position, `None` while the pointer is off the drawing surface.
    pub position_render: Option<Vec2>,
    pub button_down: bool,
    /// The left button went down since the previous frame.
    pub button_pressed: bool,
}

#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    quit_requested: bool,
    overlay_toggle_is_down: bool,
    overlay_toggle_pressed_edge: bool,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    left_press_pending: bool,
}

impl InputCollector {
    pub(crate) fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        match key {
            PhysicalKey::Code(KeyCode::F3) => self.handle_overlay_toggle_key_state(state),
            PhysicalKey::Code(KeyCode::Escape) => {
                if state == ElementState::Pressed {
                    self.mark_quit_requested();
                }
            }
            _ => {}
        }
    }

    fn handle_overlay_toggle_key_state(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.overlay_toggle_is_down {
                    self.overlay_toggle_pressed_edge = true;
                }
                self.overlay_toggle_is_down = true;
            }
            ElementState::Released => self.overlay_toggle_is_down = false,
        }
    }

    pub(crate) fn take_overlay_toggle_pressed(&mut self) -> bool {
        let was_pressed = self.overlay_toggle_pressed_edge;
        self.overlay_toggle_pressed_edge = false;
        was_pressed
    }

    pub(crate) fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    /// Leaving the window also releases the button; a release outside it is never seen.
    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
        self.left_mouse_is_down = false;
    }

    pub(crate) fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub(crate) fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        let is_down = state == ElementState::Pressed;
        if is_down && !self.left_mouse_is_down {
            self.left_press_pending = true;
        }
        self.left_mouse_is_down = is_down;
    }

    /// Consumes the pending press edge. A click that goes down and up between two frames
    /// still reads as down for one frame.
    pub(crate) fn take_pointer_snapshot(&mut self, position_render: Option<Vec2>) -> PointerSnapshot {
        let button_pressed = std::mem::take(&mut self.left_press_pending);
        PointerSnapshot {
            position_render,
            button_down: self.left_mouse_is_down || button_pressed,
            button_pressed,
        }
    }

    #[cfg(test)]
    pub(crate) fn left_mouse_is_down(&self) -> bool {
        self.left_mouse_is_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f3_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();
        let f3 = PhysicalKey::Code(KeyCode::F3);

        input.handle_physical_key(f3, ElementState::Pressed);
        assert!(input.take_overlay_toggle_pressed());

        input.handle_physical_key(f3, ElementState::Pressed);
        assert!(!input.take_overlay_toggle_pressed());

        input.handle_physical_key(f3, ElementState::Released);
        input.handle_physical_key(f3, ElementState::Pressed);
        assert!(input.take_overlay_toggle_pressed());
    }

    #[test]
    fn escape_press_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Released);
        assert!(!input.quit_requested());
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested());
    }

    #[test]
    fn left_button_latches_until_release() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.left_mouse_is_down());
        input.handle_mouse_input(MouseButton::Right, ElementState::Released);
        assert!(input.left_mouse_is_down());
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        assert!(!input.left_mouse_is_down());
    }

    #[test]
    fn cursor_leave_clears_position_and_button() {
        let mut input = InputCollector::default();
        input.set_cursor_position_px(100.0, 200.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);

        let cursor = input.cursor_position_px().expect("cursor");
        assert!((cursor.x - 100.0).abs() < 0.0001);
        assert!((cursor.y - 200.0).abs() < 0.0001);

        input.clear_cursor_position();
        assert_eq!(input.cursor_position_px(), None);
        assert!(!input.left_mouse_is_down());
    }

    #[test]
    fn click_between_frames_reads_as_pressed_once() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);

        let first = input.take_pointer_snapshot(None);
        assert!(first.button_down);
        assert!(first.button_pressed);

        let second = input.take_pointer_snapshot(None);
        assert!(!second.button_down);
        assert!(!second.button_pressed);
    }

    #[test]
    fn held_button_reports_press_edge_only_on_first_frame() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.take_pointer_snapshot(None).button_pressed);

        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let held = input.take_pointer_snapshot(None);
        assert!(held.button_down);
        assert!(!held.button_pressed);
    }
}
