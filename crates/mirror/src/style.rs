use engine::{Rgba, VisualStyle};
use thiserror::Error;

pub const BACKGROUND: Rgba = [240, 240, 236, 255];
pub const INK: Rgba = [0, 0, 0, 255];

const TEAM_FILLS: [Rgba; 2] = [[220, 80, 60, 255], [60, 120, 220, 255]];
const STATE_STROKES: [Rgba; 4] = [
    [20, 20, 20, 255],
    [230, 180, 40, 255],
    [230, 90, 40, 255],
    [140, 140, 140, 255],
];
const FALLBACK_FILL: Rgba = [160, 160, 160, 255];
const FALLBACK_STROKE: Rgba = STATE_STROKES[0];
const ENTITY_STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("unknown team code {0}")]
    UnknownTeam(i64),
    #[error("unknown state code {0}")]
    UnknownState(i64),
    #[error("invalid color '{0}'")]
    InvalidColor(String),
}

pub fn team_fill(team: i64) -> Result<Rgba, StyleError> {
    usize::try_from(team)
        .ok()
        .and_then(|index| TEAM_FILLS.get(index).copied())
        .ok_or(StyleError::UnknownTeam(team))
}

pub fn state_stroke(state: i64) -> Result<Rgba, StyleError> {
    usize::try_from(state)
        .ok()
        .and_then(|index| STATE_STROKES.get(index).copied())
        .ok_or(StyleError::UnknownState(state))
}

/// `#rrggbb` or `#rgb`, case-insensitive.
pub fn parse_color(raw: &str) -> Result<Rgba, StyleError> {
    let invalid = || StyleError::InvalidColor(raw.to_string());
    let hex = raw.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |text: &str| u8::from_str_radix(text, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ]),
        3 => {
            let mut rgba = [0, 0, 0, 255];
            for (slot, index) in rgba.iter_mut().zip(0..3) {
                let nibble = channel(&hex[index..index + 1])?;
                *slot = nibble * 17;
            }
            Ok(rgba)
        }
        _ => Err(invalid()),
    }
}

/// Team fill (or explicit color) and state stroke. Every failed lookup falls back to a
/// neutral style and is reported alongside the result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub style: VisualStyle,
    pub fallbacks: Vec<StyleError>,
}

pub fn resolve_entity_style(team: i64, state: i64, color: Option<&str>) -> ResolvedStyle {
    let mut fallbacks = Vec::new();
    let team_fill = team_fill(team).unwrap_or_else(|error| {
        fallbacks.push(error);
        FALLBACK_FILL
    });
    let fill = match color.map(parse_color) {
        Some(Ok(rgba)) => rgba,
        Some(Err(error)) => {
            fallbacks.push(error);
            team_fill
        }
        None => team_fill,
    };
    let stroke = state_stroke(state).unwrap_or_else(|error| {
        fallbacks.push(error);
        FALLBACK_STROKE
    });

    ResolvedStyle {
        style: VisualStyle {
            fill: Some(fill),
            stroke: Some(stroke),
            stroke_width: ENTITY_STROKE_WIDTH,
        },
        fallbacks,
    }
}

pub fn score_ink(slot: usize) -> Rgba {
    TEAM_FILLS.get(slot).copied().unwrap_or(INK)
}
