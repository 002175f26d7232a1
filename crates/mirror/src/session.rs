use std::time::Instant;

use engine::{FrameClient, ImmediateShape, PointerSnapshot, Stage, Surface, SurfaceConfig, SurfaceError};
use tracing::{info, warn};

use crate::config::Variant;
use crate::connection::{ConnectionManager, Transport};
use crate::input::InputSampler;
use crate::protocol::{ArenaConfig, OutboundEncoding, ServerMessage, StatePayload};
use crate::reconcile::{reconcile_keyed, reconcile_positional, warn_style_fallbacks, KeyedSnapshot};
use crate::registry::{KeyedRegistry, SlotRegistry};
use crate::style::{BACKGROUND, INK};
use crate::throttle::WarnThrottle;
use crate::transform::{ArenaTransform, LogicalPoint, RenderPoint};

const CURSOR_DOT_RADIUS: f32 = 5.0;

/// One connection's worth of client state, handed to the engine loop.
pub struct Session<T: Transport> {
    connection: ConnectionManager<T>,
    variant: Variant,
    outbound: OutboundEncoding,
    state: FrameState,
    pending: Vec<ServerMessage>,
    early_state_warnings: WarnThrottle,
    mismatch_warnings: WarnThrottle,
    style_warnings: WarnThrottle,
}

enum FrameState {
    Uninitialized,
    Running(Box<RunningSession>),
}

struct RunningSession {
    config: ArenaConfig,
    sampler: InputSampler,
    mirror: Mirror,
}

enum Mirror {
    Arena(KeyedRegistry<Stage>),
    Physics {
        registry: SlotRegistry<Stage>,
        cursors: Vec<LogicalPoint>,
    },
}

impl Mirror {
    fn stage(&self) -> &Stage {
        match self {
            Mirror::Arena(registry) => registry.backend(),
            Mirror::Physics { registry, .. } => registry.backend(),
        }
    }
}

impl<T: Transport> Session<T> {
    pub fn new(connection: ConnectionManager<T>, variant: Variant, outbound: OutboundEncoding) -> Self {
        Self {
            connection,
            variant,
            outbound,
            state: FrameState::Uninitialized,
            pending: Vec::new(),
            early_state_warnings: WarnThrottle::default(),
            mismatch_warnings: WarnThrottle::default(),
            style_warnings: WarnThrottle::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, FrameState::Running(_))
    }

    fn handle_message(
        &mut self,
        surface: &mut dyn Surface,
        message: ServerMessage,
    ) -> Result<(), SurfaceError> {
        match message {
            ServerMessage::Config(config) => self.apply_config(surface, config),
            ServerMessage::State(payload) => {
                self.apply_state(payload);
                Ok(())
            }
        }
    }

    fn apply_config(
        &mut self,
        surface: &mut dyn Surface,
        config: ArenaConfig,
    ) -> Result<(), SurfaceError> {
        if self.is_running() {
            warn!(arena_radius = config.arena_radius, "duplicate_config_ignored");
            return Ok(());
        }

        let transform = ArenaTransform::new(config.arena_radius);
        let extent = transform.surface_extent();
        surface.configure(SurfaceConfig {
            width: extent,
            height: extent,
            background: BACKGROUND,
        })?;

        let mirror = match self.variant {
            Variant::Arena => Mirror::Arena(KeyedRegistry::new(
                Stage::new(),
                transform,
                config.player_radius,
            )),
            Variant::Physics => Mirror::Physics {
                registry: SlotRegistry::new(Stage::new(), transform, config.player_radius),
                cursors: Vec::new(),
            },
        };
        info!(
            variant = self.variant.as_str(),
            arena_radius = config.arena_radius,
            player_radius = config.player_radius,
            self_id = config.self_id.as_ref().map(|id| id.as_str()),
            surface_extent = extent,
            "config_applied"
        );
        self.state = FrameState::Running(Box::new(RunningSession {
            config,
            sampler: InputSampler::new(transform),
            mirror,
        }));
        Ok(())
    }

    fn apply_state(&mut self, payload: StatePayload) {
        let FrameState::Running(running) = &mut self.state else {
            if let Some(suppressed) = self.early_state_warnings.check(Instant::now()) {
                warn!(suppressed, "state_before_config_ignored");
            }
            return;
        };
        let self_id = running.config.self_id.as_ref();

        match (&mut running.mirror, payload) {
            (Mirror::Arena(registry), StatePayload::Flat(entities)) => {
                let snapshot = KeyedSnapshot {
                    entities: &entities,
                    score: None,
                };
                let report = reconcile_keyed(registry, snapshot, self_id);
                warn_style_fallbacks(&mut self.style_warnings, &report.style_fallbacks, Instant::now());
            }
            (Mirror::Arena(registry), StatePayload::Scored(scored)) => {
                let snapshot = KeyedSnapshot {
                    entities: &scored.players,
                    score: scored.score.as_deref(),
                };
                let report = reconcile_keyed(registry, snapshot, self_id);
                warn_style_fallbacks(&mut self.style_warnings, &report.style_fallbacks, Instant::now());
            }
            (Mirror::Physics { registry, cursors }, StatePayload::Physics(physics)) => {
                reconcile_positional(registry, &physics.balls);
                *cursors = physics.cursors;
            }
            (_, payload) => {
                if let Some(suppressed) = self.mismatch_warnings.check(Instant::now()) {
                    warn!(
                        variant = self.variant.as_str(),
                        payload = payload_kind(&payload),
                        suppressed,
                        "state_shape_mismatch_dropped"
                    );
                }
            }
        }
    }

    fn node_count(&self) -> usize {
        match &self.state {
            FrameState::Uninitialized => 0,
            FrameState::Running(running) => running.mirror.stage().node_count(),
        }
    }
}

fn payload_kind(payload: &StatePayload) -> &'static str {
    match payload {
        StatePayload::Physics(_) => "physics",
        StatePayload::Scored(_) => "scored",
        StatePayload::Flat(_) => "flat",
    }
}

impl<T: Transport> FrameClient for Session<T> {
    fn frame(
        &mut self,
        surface: &mut dyn Surface,
        pointer: PointerSnapshot,
    ) -> Result<(), SurfaceError> {
        let pending = &mut self.pending;
        self.connection.drain(|message| pending.push(message));
        let mut messages = std::mem::take(&mut self.pending);
        for message in messages.drain(..) {
            self.handle_message(surface, message)?;
        }
        self.pending = messages;

        let FrameState::Running(running) = &mut self.state else {
            return Ok(());
        };

        let (shapes, hovered_slot) = match &running.mirror {
            Mirror::Arena(_) => (Vec::new(), None),
            Mirror::Physics { registry, cursors } => {
                let transform = ArenaTransform::new(running.config.arena_radius);
                let shapes: Vec<ImmediateShape> = cursors
                    .iter()
                    .map(|cursor| ImmediateShape::Dot {
                        center: transform.to_render(*cursor).into(),
                        radius: CURSOR_DOT_RADIUS,
                        color: INK,
                    })
                    .collect();
                let hovered_slot = pointer
                    .position_render
                    .and_then(|render| registry.slot_at(RenderPoint::from(render)));
                (shapes, hovered_slot)
            }
        };
        surface.draw(running.mirror.stage(), &shapes);

        let input = running.sampler.next_input(&pointer, hovered_slot);
        self.connection.send(&self.outbound.encode(&input));
        Ok(())
    }

    fn overlay_lines(&self) -> Vec<String> {
        let stats = self.connection.stats();
        let link = if self.connection.is_open() { "open" } else { "closed" };
        let phase = if self.is_running() { "running" } else { "waiting for config" };
        vec![
            format!("Variant: {} ({})", self.variant, self.outbound.as_str()),
            format!("Link: {link}, {phase}"),
            format!("In: {} msgs {} bytes", stats.messages_in, stats.bytes_in),
            format!("Out: {} msgs {} bytes", stats.messages_out, stats.bytes_out),
            format!(
                "Dropped: {} malformed {} full",
                stats.malformed_dropped, stats.write_buffer_drops
            ),
            format!("Nodes: {}", self.node_count()),
        ]
    }

    fn shutdown(&mut self) {
        self.connection.close();
    }
}
