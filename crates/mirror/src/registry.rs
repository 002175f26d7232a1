use std::collections::BTreeMap;

use engine::{VisualBackend, VisualDesc, VisualId, VisualKind, VisualStyle};

use crate::protocol::{BallState, EntityId, EntityState};
use crate::style::{resolve_entity_style, score_ink, StyleError, INK};
use crate::transform::{ArenaTransform, RenderPoint};

const SELF_MARKER_COLOR: [u8; 4] = [250, 200, 0, 255];
const SELF_MARKER_GAP: f64 = 4.0;
const SELF_MARKER_STROKE_WIDTH: f32 = 3.0;
const ARENA_OUTLINE_INSET: f64 = 1.0;
const BALL_FILL: [u8; 4] = [220, 40, 40, 255];

/// Owned by exactly one registry; never cloned, so a visual cannot outlive its entry.
#[derive(Debug)]
struct VisualHandle {
    visual: VisualId,
    position: RenderPoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertOutcome {
    pub created: bool,
    pub style_fallbacks: Vec<StyleError>,
}

/// Id-keyed visuals for the arena variant, plus the arena decorations (outline, self
/// marker, score labels). The only writer to its backend.
#[derive(Debug)]
pub struct KeyedRegistry<B: VisualBackend> {
    backend: B,
    transform: ArenaTransform,
    player_radius: f64,
    handles: BTreeMap<EntityId, VisualHandle>,
    self_marker: VisualHandle,
    score_labels: BTreeMap<usize, VisualHandle>,
}

impl<B: VisualBackend> KeyedRegistry<B> {
    pub fn new(mut backend: B, transform: ArenaTransform, player_radius: f64) -> Self {
        let outline_radius = (transform.arena_radius() - ARENA_OUTLINE_INSET).max(0.0);
        backend.create_visual(VisualDesc::new(
            VisualKind::Ring {
                radius: outline_radius as f32,
            },
            VisualStyle::default(),
        ));

        let mut marker = self_marker_desc(player_radius);
        marker.visible = false;
        let marker_visual = backend.create_visual(marker);

        Self {
            backend,
            transform,
            player_radius,
            handles: BTreeMap::new(),
            self_marker: VisualHandle {
                visual: marker_visual,
                position: RenderPoint::default(),
            },
            score_labels: BTreeMap::new(),
        }
    }

    pub fn upsert(&mut self, id: &EntityId, state: &EntityState) -> UpsertOutcome {
        let resolved = resolve_entity_style(state.team, state.state, state.color.as_deref());
        let position = self.transform.to_render(state.pos);
        let desc = VisualDesc::new(
            VisualKind::Disc {
                radius: self.player_radius as f32,
                spoke: false,
            },
            resolved.style,
        )
        .at(position.into());

        let created = match self.handles.get_mut(id) {
            Some(handle) => {
                handle.position = position;
                self.backend.update_visual(handle.visual, desc);
                false
            }
            None => {
                let visual = self.backend.create_visual(desc);
                self.handles
                    .insert(id.clone(), VisualHandle { visual, position });
                true
            }
        };

        UpsertOutcome {
            created,
            style_fallbacks: resolved.fallbacks,
        }
    }

    /// Returns false when the id was not registered.
    pub fn remove(&mut self, id: &EntityId) -> bool {
        match self.handles.remove(id) {
            Some(handle) => {
                self.backend.remove_visual(handle.visual);
                true
            }
            None => false,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.handles.keys()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.handles.contains_key(id)
    }

    #[cfg(test)]
    pub fn visual_for(&self, id: &EntityId) -> Option<VisualId> {
        self.handles.get(id).map(|handle| handle.visual)
    }

    /// Rings the self entity and lifts it, then the ring, above everything else. Hides
    /// the ring while the id is not registered.
    pub fn mark_self(&mut self, id: &EntityId) -> bool {
        let mut marker = self_marker_desc(self.player_radius);
        let Some(handle) = self.handles.get(id) else {
            marker.visible = false;
            self.backend.update_visual(self.self_marker.visual, marker);
            return false;
        };

        self.self_marker.position = handle.position;
        self.backend.update_visual(
            self.self_marker.visual,
            marker.at(handle.position.into()),
        );
        self.backend.raise_to_top(handle.visual);
        self.backend.raise_to_top(self.self_marker.visual);
        true
    }

    pub fn set_score(&mut self, slot: usize, value: i64) {
        let position = score_label_position(self.transform.arena_radius(), slot);
        let desc = VisualDesc::new(
            VisualKind::Label {
                text: value.to_string(),
            },
            VisualStyle {
                fill: Some(score_ink(slot)),
                stroke: None,
                stroke_width: 0.0,
            },
        )
        .at(position.into());

        match self.score_labels.get(&slot) {
            Some(label) => self.backend.update_visual(label.visual, desc),
            None => {
                let visual = self.backend.create_visual(desc);
                self.score_labels
                    .insert(slot, VisualHandle { visual, position });
            }
        }
    }

    #[cfg(test)]
    pub fn score_visual(&self, slot: usize) -> Option<VisualId> {
        self.score_labels.get(&slot).map(|label| label.visual)
    }

    #[cfg(test)]
    pub fn self_marker_visual(&self) -> VisualId {
        self.self_marker.visual
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn self_marker_desc(player_radius: f64) -> VisualDesc {
    VisualDesc::new(
        VisualKind::Ring {
            radius: (player_radius + SELF_MARKER_GAP) as f32,
        },
        VisualStyle {
            fill: None,
            stroke: Some(SELF_MARKER_COLOR),
            stroke_width: SELF_MARKER_STROKE_WIDTH,
        },
    )
}

/// Even slots along the top-left, odd slots along the top-right.
fn score_label_position(arena_radius: f64, slot: usize) -> RenderPoint {
    let column = if slot % 2 == 0 { -0.8 } else { 0.8 };
    let row = (slot / 2) as f64;
    RenderPoint {
        x: arena_radius * column,
        y: arena_radius * (-0.85 + 0.15 * row),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
}

/// Index-keyed visuals for the physics variant. Slots are appended as the ball list
/// grows and are never removed.
#[derive(Debug)]
pub struct SlotRegistry<B: VisualBackend> {
    backend: B,
    transform: ArenaTransform,
    ball_radius: f64,
    slots: Vec<VisualHandle>,
}

impl<B: VisualBackend> SlotRegistry<B> {
    pub fn new(mut backend: B, transform: ArenaTransform, ball_radius: f64) -> Self {
        backend.create_visual(VisualDesc::new(
            VisualKind::Frame {
                half_extent: transform.arena_radius() as f32,
            },
            VisualStyle::default(),
        ));
        Self {
            backend,
            transform,
            ball_radius,
            slots: Vec::new(),
        }
    }

    pub fn sync(&mut self, balls: &[BallState]) -> SyncReport {
        let mut report = SyncReport::default();
        for (index, ball) in balls.iter().enumerate() {
            let position = self.transform.to_render(ball.pos);
            let mut desc = VisualDesc::new(
                VisualKind::Disc {
                    radius: self.ball_radius as f32,
                    spoke: true,
                },
                VisualStyle {
                    fill: Some(BALL_FILL),
                    stroke: Some(INK),
                    stroke_width: 2.0,
                },
            )
            .at(position.into());
            desc.rotation_radians = self.transform.angle_to_render(ball.angle) as f32;

            match self.slots.get_mut(index) {
                Some(slot) => {
                    slot.position = position;
                    self.backend.update_visual(slot.visual, desc);
                    report.updated += 1;
                }
                None => {
                    let visual = self.backend.create_visual(desc);
                    self.slots.push(VisualHandle { visual, position });
                    report.created += 1;
                }
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[cfg(test)]
    pub fn visual_for(&self, slot: usize) -> Option<VisualId> {
        self.slots.get(slot).map(|handle| handle.visual)
    }

    /// Topmost (latest) slot whose disc contains the point, 0-based.
    pub fn slot_at(&self, point: RenderPoint) -> Option<usize> {
        let radius_sq = self.ball_radius * self.ball_radius;
        self.slots
            .iter()
            .rposition(|slot| slot.position.distance_sq(point) <= radius_sq)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
