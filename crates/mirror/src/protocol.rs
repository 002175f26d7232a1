use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::transform::LogicalPoint;

const DEFAULT_PLAYER_RADIUS: f64 = 10.0;

/// Server-assigned key. Numeric ids are folded into their decimal text so `7` and `"7"`
/// name the same entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntityIdVisitor;

        impl Visitor<'_> for EntityIdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer entity id")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<EntityId, E> {
                Ok(EntityId::new(value))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<EntityId, E> {
                Ok(EntityId(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<EntityId, E> {
                Ok(EntityId(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<EntityId, E> {
                Ok(EntityId(value.to_string()))
            }
        }

        deserializer.deserialize_any(EntityIdVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArenaConfig {
    #[serde(rename = "arenaRadius", alias = "ArenaRadius")]
    pub arena_radius: f64,
    #[serde(
        rename = "playerRadius",
        alias = "PlayerRadius",
        default = "default_player_radius"
    )]
    pub player_radius: f64,
    #[serde(rename = "selfId", alias = "SelfId", default)]
    pub self_id: Option<EntityId>,
}

fn default_player_radius() -> f64 {
    DEFAULT_PLAYER_RADIUS
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityState {
    #[serde(alias = "Pos")]
    pub pos: LogicalPoint,
    #[serde(default, alias = "Team")]
    pub team: i64,
    #[serde(default, alias = "State")]
    pub state: i64,
    #[serde(default, alias = "Color")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BallState {
    #[serde(alias = "Pos")]
    pub pos: LogicalPoint,
    #[serde(default, alias = "Angle")]
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhysicsSnapshot {
    pub balls: Vec<BallState>,
    #[serde(default)]
    pub cursors: Vec<LogicalPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredSnapshot {
    #[serde(rename = "Players", alias = "players")]
    pub players: BTreeMap<EntityId, EntityState>,
    #[serde(rename = "Score", alias = "score", default)]
    pub score: Option<Vec<i64>>,
}

/// The three `state` payload shapes, told apart by their top-level keys and the shape of
/// the values under them. Ids are opaque, so a flat map may hold an entity keyed
/// `players` or `balls`.
#[derive(Debug, Clone, PartialEq)]
pub enum StatePayload {
    Physics(PhysicsSnapshot),
    Scored(ScoredSnapshot),
    Flat(BTreeMap<EntityId, EntityState>),
}

impl<'de> Deserialize<'de> for StatePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        let shape = PayloadShape::classify(&object);
        let value = Value::Object(object);
        match shape {
            PayloadShape::Physics => nested(value).map(StatePayload::Physics),
            PayloadShape::Scored => nested(value).map(StatePayload::Scored),
            PayloadShape::Flat => nested(value).map(StatePayload::Flat),
        }
    }
}

enum PayloadShape {
    Physics,
    Scored,
    Flat,
}

impl PayloadShape {
    fn classify(object: &Map<String, Value>) -> Self {
        if matches!(object.get("balls"), Some(Value::Array(_))) {
            return PayloadShape::Physics;
        }

        let players = object.get("Players").or_else(|| object.get("players"));
        let score = object.get("Score").or_else(|| object.get("score"));
        let players_is_map = matches!(players, Some(Value::Object(map)) if !is_entity_body(map));
        let score_fits = matches!(score, None | Some(Value::Array(_) | Value::Null));
        if players_is_map && score_fits {
            PayloadShape::Scored
        } else {
            PayloadShape::Flat
        }
    }
}

/// A `pos` object holding coordinates. A player map keyed `pos` maps it to a whole
/// entity instead.
fn is_entity_body(map: &Map<String, Value>) -> bool {
    ["pos", "Pos"].iter().any(|key| {
        map.get(*key)
            .and_then(Value::as_object)
            .is_some_and(|pos| pos.contains_key("x") || pos.contains_key("X"))
    })
}

/// Decodes an already-buffered value, keeping the inner JSON path in the message.
fn nested<T, E>(value: Value) -> Result<T, E>
where
    T: for<'a> Deserialize<'a>,
    E: de::Error,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        if path.is_empty() || path == "." {
            E::custom(source)
        } else {
            E::custom(format!("at {path}: {source}"))
        }
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    Config(ArenaConfig),
    #[serde(alias = "message")]
    State(StatePayload),
}

impl ServerMessage {
    #[cfg(test)]
    pub fn tag(&self) -> &'static str {
        match self {
            ServerMessage::Config(_) => "config",
            ServerMessage::State(_) => "state",
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("binary frame is not UTF-8")]
    NonUtf8Binary,
    #[error("arenaRadius must be finite and positive, got {0}")]
    InvalidArenaRadius(f64),
}

pub fn decode_server_message(raw: &str) -> Result<ServerMessage, DecodeError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let message = serde_path_to_error::deserialize::<_, ServerMessage>(&mut deserializer)
        .map_err(|error| DecodeError::Json {
            path: error.path().to_string(),
            source: error.into_inner(),
        })?;
    deserializer.end().map_err(|source| DecodeError::Json {
        path: ".".to_string(),
        source,
    })?;

    if let ServerMessage::Config(config) = &message {
        if !(config.arena_radius.is_finite() && config.arena_radius > 0.0) {
            return Err(DecodeError::InvalidArenaRadius(config.arena_radius));
        }
    }
    Ok(message)
}

/// Upstream wire shape; has to match what the paired server reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutboundEncoding {
    #[default]
    Player,
    PlayerPressed,
    Touch,
    Bare,
}

impl OutboundEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboundEncoding::Player => "player",
            OutboundEncoding::PlayerPressed => "player-pressed",
            OutboundEncoding::Touch => "touch",
            OutboundEncoding::Bare => "bare",
        }
    }

    pub fn encode(self, input: &OutboundInput) -> OutboundFrame {
        match self {
            OutboundEncoding::Player => OutboundFrame::Tagged {
                kind: "player",
                data: PlayerData {
                    pos: input.pos,
                    pressed: None,
                },
            },
            OutboundEncoding::PlayerPressed => OutboundFrame::Tagged {
                kind: "player",
                data: PlayerData {
                    pos: input.pos,
                    pressed: Some(input.pressed),
                },
            },
            OutboundEncoding::Touch => OutboundFrame::Touch(input.touch, input.pos),
            OutboundEncoding::Bare => OutboundFrame::Bare {
                pos: input.pos,
                btn: input.pressed,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outbound encoding '{0}' (expected player, player-pressed, touch or bare)")]
pub struct UnknownEncoding(String);

impl FromStr for OutboundEncoding {
    type Err = UnknownEncoding;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(OutboundEncoding::Player),
            "player-pressed" => Ok(OutboundEncoding::PlayerPressed),
            "touch" => Ok(OutboundEncoding::Touch),
            "bare" => Ok(OutboundEncoding::Bare),
            _ => Err(UnknownEncoding(raw.to_string())),
        }
    }
}

/// One tick's worth of local input, before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutboundInput {
    pub pos: LogicalPoint,
    pub pressed: bool,
    /// 1-based ball slot under the pointer, `-1` for none.
    pub touch: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerData {
    pub pos: LogicalPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Tagged {
        #[serde(rename = "type")]
        kind: &'static str,
        data: PlayerData,
    },
    Touch(i32, LogicalPoint),
    Bare {
        pos: LogicalPoint,
        btn: bool,
    },
}
