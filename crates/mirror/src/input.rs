use engine::PointerSnapshot;

use crate::protocol::OutboundInput;
use crate::transform::{ArenaTransform, LogicalPoint, RenderPoint};

pub const NO_TOUCH: i32 = -1;

/// Turns the host's pointer state into one outbound reading per tick. The last
/// on-surface position is kept and reused while the pointer is away.
#[derive(Debug, Clone)]
pub struct InputSampler {
    transform: ArenaTransform,
    last_pos: LogicalPoint,
    hovered_slot: Option<usize>,
}

impl InputSampler {
    pub fn new(transform: ArenaTransform) -> Self {
        Self {
            transform,
            last_pos: LogicalPoint::default(),
            hovered_slot: None,
        }
    }

    /// Logical position under the pointer, `None` when it is off the surface.
    pub fn sample(&self, pointer: &PointerSnapshot) -> Option<LogicalPoint> {
        pointer
            .position_render
            .map(|render| self.transform.to_logical(RenderPoint::from(render)))
    }

    /// `hovered_slot` is the slot under the pointer this tick. A touch is reported only on
    /// the tick the pointer enters a slot or presses on it; every other tick carries none.
    pub fn next_input(
        &mut self,
        pointer: &PointerSnapshot,
        hovered_slot: Option<usize>,
    ) -> OutboundInput {
        if let Some(pos) = self.sample(pointer) {
            self.last_pos = pos;
        }
        let entered = hovered_slot.is_some() && hovered_slot != self.hovered_slot;
        self.hovered_slot = hovered_slot;
        let touch = if entered || pointer.button_pressed {
            hovered_slot
        } else {
            None
        };
        OutboundInput {
            pos: self.last_pos,
            pressed: pointer.button_down,
            touch: touch_index(touch),
        }
    }
}

/// 0-based slot to the 1-based wire index.
fn touch_index(slot: Option<usize>) -> i32 {
    slot.and_then(|slot| slot.checked_add(1))
        .and_then(|index| i32::try_from(index).ok())
        .unwrap_or(NO_TOUCH)
}

#[cfg(test)]
mod tests {
    use engine::Vec2;

    use super::*;

    fn over(x: f32, y: f32, button_down: bool) -> PointerSnapshot {
        PointerSnapshot {
            position_render: Some(Vec2 { x, y }),
            button_down,
            button_pressed: false,
        }
    }

    fn away(button_down: bool) -> PointerSnapshot {
        PointerSnapshot {
            position_render: None,
            button_down,
            button_pressed: false,
        }
    }

    #[test]
    fn sample_reflects_render_y() {
        let sampler = InputSampler::new(ArenaTransform::new(100.0));
        assert_eq!(
            sampler.sample(&over(3.0, -4.0, false)),
            Some(LogicalPoint { x: 3.0, y: 4.0 })
        );
        assert_eq!(sampler.sample(&away(false)), None);
    }

    #[test]
    fn last_position_persists_after_pointer_leaves() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        let first = sampler.next_input(&over(3.0, -4.0, false), None);
        assert_eq!(first.pos, LogicalPoint { x: 3.0, y: 4.0 });

        for _ in 0..3 {
            let input = sampler.next_input(&away(false), None);
            assert_eq!(input.pos, LogicalPoint { x: 3.0, y: 4.0 });
        }
    }

    #[test]
    fn position_starts_at_origin() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        let input = sampler.next_input(&away(false), None);
        assert_eq!(input.pos, LogicalPoint::default());
        assert_eq!(input.touch, NO_TOUCH);
    }

    #[test]
    fn button_state_is_independent_of_position() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        assert!(sampler.next_input(&away(true), None).pressed);
        assert!(!sampler.next_input(&over(0.0, 0.0, false), None).pressed);
    }

    #[test]
    fn touch_index_is_one_based() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        assert_eq!(sampler.next_input(&away(false), Some(0)).touch, 1);
        assert_eq!(sampler.next_input(&away(false), Some(4)).touch, 5);
        assert_eq!(sampler.next_input(&away(false), None).touch, NO_TOUCH);
    }

    #[test]
    fn resting_on_a_slot_touches_once() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        let touches: Vec<i32> = (0..3)
            .map(|_| sampler.next_input(&over(0.0, 0.0, false), Some(0)).touch)
            .collect();
        assert_eq!(touches, vec![1, NO_TOUCH, NO_TOUCH]);
    }

    #[test]
    fn moving_to_another_slot_or_reentering_touches_again() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        assert_eq!(sampler.next_input(&away(false), Some(0)).touch, 1);
        assert_eq!(sampler.next_input(&away(false), Some(2)).touch, 3);
        assert_eq!(sampler.next_input(&away(false), None).touch, NO_TOUCH);
        assert_eq!(sampler.next_input(&away(false), Some(2)).touch, 3);
    }

    #[test]
    fn press_on_hovered_slot_touches_again() {
        let mut sampler = InputSampler::new(ArenaTransform::new(100.0));
        sampler.next_input(&over(0.0, 0.0, false), Some(1));
        let tap = PointerSnapshot {
            button_pressed: true,
            ..over(0.0, 0.0, true)
        };
        assert_eq!(sampler.next_input(&tap, Some(1)).touch, 2);
        assert_eq!(sampler.next_input(&over(0.0, 0.0, true), Some(1)).touch, NO_TOUCH);
        assert_eq!(sampler.next_input(&tap, None).touch, NO_TOUCH);
    }
}
