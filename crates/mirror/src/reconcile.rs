use std::collections::BTreeMap;
use std::time::Instant;

use engine::VisualBackend;
use tracing::{debug, warn};

use crate::protocol::{BallState, EntityId, EntityState};
use crate::registry::{KeyedRegistry, SlotRegistry, SyncReport};
use crate::style::StyleError;
use crate::throttle::WarnThrottle;

/// One arena snapshot: the complete live set plus the optional scoreboard.
#[derive(Debug, Clone, Copy)]
pub struct KeyedSnapshot<'a> {
    pub entities: &'a BTreeMap<EntityId, EntityState>,
    pub score: Option<&'a [i64]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub style_fallbacks: Vec<(EntityId, StyleError)>,
    pub self_marked: bool,
    pub score_slots: usize,
}

/// Upserts first, then removals, then the self marker, then the scoreboard.
pub fn reconcile_keyed<B: VisualBackend>(
    registry: &mut KeyedRegistry<B>,
    snapshot: KeyedSnapshot<'_>,
    self_id: Option<&EntityId>,
) -> KeyedReport {
    let mut report = KeyedReport::default();

    for (id, state) in snapshot.entities {
        let outcome = registry.upsert(id, state);
        if outcome.created {
            report.created += 1;
        } else {
            report.updated += 1;
        }
        report.style_fallbacks.extend(
            outcome
                .style_fallbacks
                .into_iter()
                .map(|error| (id.clone(), error)),
        );
    }

    let stale: Vec<EntityId> = registry
        .ids()
        .filter(|id| !snapshot.entities.contains_key(*id))
        .cloned()
        .collect();
    for id in &stale {
        if registry.remove(id) {
            report.removed += 1;
        }
    }

    if let Some(self_id) = self_id {
        report.self_marked = registry.mark_self(self_id);
    }

    if let Some(score) = snapshot.score {
        for (slot, value) in score.iter().enumerate() {
            registry.set_score(slot, *value);
        }
        report.score_slots = score.len();
    }

    debug!(
        created = report.created,
        updated = report.updated,
        removed = report.removed,
        style_fallbacks = report.style_fallbacks.len(),
        self_marked = report.self_marked,
        score_slots = report.score_slots,
        live = registry.len(),
        "keyed_reconcile"
    );
    report
}

/// One warning per pass at most, rate limited across passes. Returns whether it was logged.
pub(crate) fn warn_style_fallbacks(
    throttle: &mut WarnThrottle,
    fallbacks: &[(EntityId, StyleError)],
    now: Instant,
) -> bool {
    let Some((id, error)) = fallbacks.first() else {
        return false;
    };
    let Some(suppressed) = throttle.check(now) else {
        return false;
    };
    warn!(
        id = %id,
        error = %error,
        entities = fallbacks.len(),
        suppressed,
        "style_fallback_applied"
    );
    true
}

pub fn reconcile_positional<B: VisualBackend>(
    registry: &mut SlotRegistry<B>,
    balls: &[BallState],
) -> SyncReport {
    let report = registry.sync(balls);
    debug!(
        created = report.created,
        updated = report.updated,
        live = registry.len(),
        "positional_reconcile"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registry::tests::{entity, BackendCall, RecordingBackend};
    use crate::transform::{ArenaTransform, LogicalPoint};

    fn registry() -> KeyedRegistry<RecordingBackend> {
        KeyedRegistry::new(RecordingBackend::default(), ArenaTransform::new(100.0), 5.0)
    }

    fn snapshot_of(ids: &[&str]) -> BTreeMap<EntityId, EntityState> {
        ids.iter()
            .enumerate()
            .map(|(index, id)| (EntityId::new(*id), entity(index as f64, 0.0, 0, 0)))
            .collect()
    }

    fn live_ids(registry: &KeyedRegistry<RecordingBackend>) -> Vec<String> {
        registry.ids().map(|id| id.as_str().to_string()).collect()
    }

    fn flat(entities: &BTreeMap<EntityId, EntityState>) -> KeyedSnapshot<'_> {
        KeyedSnapshot {
            entities,
            score: None,
        }
    }

    #[test]
    fn registry_matches_snapshot_after_each_pass() {
        let mut registry = registry();
        for ids in [
            vec!["a", "b", "c"],
            vec!["b", "d"],
            vec![],
            vec!["a"],
        ] {
            let entities = snapshot_of(&ids);
            reconcile_keyed(&mut registry, flat(&entities), None);
            let mut expected: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            expected.sort();
            assert_eq!(live_ids(&registry), expected);
        }
    }

    #[test]
    fn persisting_ids_keep_their_handle() {
        let mut registry = registry();
        let first = snapshot_of(&["a", "b"]);
        reconcile_keyed(&mut registry, flat(&first), None);
        let b_visual = registry.visual_for(&EntityId::new("b"));

        let second = snapshot_of(&["b", "c"]);
        let report = reconcile_keyed(&mut registry, flat(&second), None);

        assert_eq!(registry.visual_for(&EntityId::new("b")), b_visual);
        assert_eq!(
            (report.created, report.updated, report.removed),
            (1, 1, 1)
        );
        let b_visual = b_visual.expect("b visual");
        assert!(!registry
            .backend()
            .calls
            .contains(&BackendCall::Remove(b_visual)));
    }

    #[test]
    fn removals_run_after_all_upserts() {
        let mut registry = registry();
        let first = snapshot_of(&["a"]);
        reconcile_keyed(&mut registry, flat(&first), None);
        let calls_before = registry.backend().calls.len();

        let second = snapshot_of(&["b", "c"]);
        reconcile_keyed(&mut registry, flat(&second), None);

        let pass: Vec<_> = registry.backend().calls[calls_before..].to_vec();
        let first_remove = pass
            .iter()
            .position(|call| matches!(call, BackendCall::Remove(_)))
            .expect("a removed");
        let last_create = pass
            .iter()
            .rposition(|call| matches!(call, BackendCall::Create(_)))
            .expect("b, c created");
        assert!(last_create < first_remove);
    }

    #[test]
    fn scenario_single_entity_then_empty() {
        let mut registry = registry();
        let mut entities = BTreeMap::new();
        entities.insert(EntityId::new("a"), entity(10.0, 20.0, 0, 0));
        reconcile_keyed(&mut registry, flat(&entities), None);

        assert_eq!(registry.len(), 1);
        let visual = registry.visual_for(&EntityId::new("a")).expect("a");
        let desc = &registry.backend().live[&visual];
        assert_eq!(desc.position, engine::Vec2 { x: 10.0, y: -20.0 });

        let empty = BTreeMap::new();
        reconcile_keyed(&mut registry, flat(&empty), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn score_slots_are_assigned_by_index() {
        let mut registry = registry();
        let players = BTreeMap::new();
        let score = [3, 5];
        let report = reconcile_keyed(
            &mut registry,
            KeyedSnapshot {
                entities: &players,
                score: Some(&score),
            },
            None,
        );
        assert_eq!(report.score_slots, 2);

        let live = &registry.backend().live;
        for (slot, text) in [(0, "3"), (1, "5")] {
            let visual = registry.score_visual(slot).expect("label");
            assert_eq!(
                live[&visual].kind,
                engine::VisualKind::Label {
                    text: text.to_string()
                }
            );
        }
    }

    #[test]
    fn self_marker_follows_self_entity_each_pass() {
        let mut registry = registry();
        let me = EntityId::new("me");
        let mut entities = BTreeMap::new();
        entities.insert(me.clone(), entity(1.0, 1.0, 0, 0));
        entities.insert(EntityId::new("zz"), entity(2.0, 2.0, 1, 0));
        let report = reconcile_keyed(&mut registry, flat(&entities), Some(&me));
        assert!(report.self_marked);

        entities.insert(me.clone(), entity(7.0, -3.0, 0, 0));
        reconcile_keyed(&mut registry, flat(&entities), Some(&me));
        let marker = &registry.backend().live[&registry.self_marker_visual()];
        assert_eq!(marker.position, engine::Vec2 { x: 7.0, y: 3.0 });
        assert_eq!(
            registry.backend().calls.last(),
            Some(&BackendCall::Raise(registry.self_marker_visual()))
        );

        entities.remove(&me);
        let report = reconcile_keyed(&mut registry, flat(&entities), Some(&me));
        assert!(!report.self_marked);
        assert!(!registry.backend().live[&registry.self_marker_visual()].visible);
    }

    #[test]
    fn unknown_codes_are_reported_not_fatal() {
        let mut registry = registry();
        let mut entities = BTreeMap::new();
        entities.insert(EntityId::new("odd"), entity(0.0, 0.0, 0, 42));
        let report = reconcile_keyed(&mut registry, flat(&entities), None);
        assert_eq!(
            report.style_fallbacks,
            vec![(EntityId::new("odd"), StyleError::UnknownState(42))]
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn style_fallback_warnings_are_rate_limited() {
        let mut throttle = WarnThrottle::new(Duration::from_secs(2));
        let base = Instant::now();
        let fallbacks = vec![
            (EntityId::new("a"), StyleError::UnknownTeam(7)),
            (EntityId::new("b"), StyleError::UnknownState(9)),
        ];

        assert!(!warn_style_fallbacks(&mut throttle, &[], base));
        assert!(warn_style_fallbacks(&mut throttle, &fallbacks, base));
        for frame in 1..24 {
            let now = base + Duration::from_millis(frame * 40);
            assert!(!warn_style_fallbacks(&mut throttle, &fallbacks, now));
        }
        assert!(warn_style_fallbacks(
            &mut throttle,
            &fallbacks,
            base + Duration::from_secs(2)
        ));
    }

    #[test]
    fn positional_sync_grows_only() {
        let mut registry =
            SlotRegistry::new(RecordingBackend::default(), ArenaTransform::new(50.0), 10.0);
        let ball = |x: f64| BallState {
            pos: LogicalPoint { x, y: 0.0 },
            angle: 0.0,
        };
        reconcile_positional(&mut registry, &[ball(0.0), ball(1.0)]);
        let report = reconcile_positional(&mut registry, &[]);
        assert_eq!(report, SyncReport::default());
        assert_eq!(registry.len(), 2);
    }
}
