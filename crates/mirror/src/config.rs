use std::fmt;
use std::str::FromStr;

use tracing::warn;
use url::Url;

use crate::protocol::OutboundEncoding;

const SERVER_URL_ENV_VAR: &str = "MIRROR_SERVER_URL";
const VARIANT_ENV_VAR: &str = "MIRROR_VARIANT";
const OUTBOUND_ENV_VAR: &str = "MIRROR_OUTBOUND";
const WINDOW_TITLE_ENV_VAR: &str = "MIRROR_WINDOW_TITLE";
const OVERLAY_ENV_VAR: &str = "MIRROR_OVERLAY";

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000/bump/";
const DEFAULT_WINDOW_TITLE: &str = "Mirror";

/// Which snapshot family the paired server speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    /// Id-keyed entities, optional scoreboard and self id.
    #[default]
    Arena,
    /// Index-keyed balls plus cursors.
    Physics,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Arena => "arena",
            Variant::Physics => "physics",
        }
    }

    pub fn default_outbound(self) -> OutboundEncoding {
        match self {
            Variant::Arena => OutboundEncoding::Player,
            Variant::Physics => OutboundEncoding::Touch,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "arena" => Ok(Variant::Arena),
            "physics" => Ok(Variant::Physics),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: Url,
    pub variant: Variant,
    pub outbound: OutboundEncoding,
    pub window_title: String,
    pub overlay_visible: bool,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, url::ParseError> {
        let cli_url = std::env::args().nth(1);
        Self::from_lookup(cli_url.as_deref(), |key| std::env::var(key).ok())
    }

    /// The environment variable wins over the positional argument.
    fn from_lookup<F>(cli_url: Option<&str>, lookup: F) -> Result<Self, url::ParseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_url = lookup(SERVER_URL_ENV_VAR);
        let server_url = resolve_server_url(env_url.as_deref(), cli_url)?;

        let variant = match lookup(VARIANT_ENV_VAR) {
            Some(value) => value.parse::<Variant>().unwrap_or_else(|()| {
                warn!(
                    value = %value,
                    fallback = Variant::default().as_str(),
                    "invalid_variant_using_default"
                );
                Variant::default()
            }),
            None => Variant::default(),
        };

        let outbound = match lookup(OUTBOUND_ENV_VAR) {
            Some(value) => value.parse::<OutboundEncoding>().unwrap_or_else(|err| {
                let fallback = variant.default_outbound();
                warn!(error = %err, fallback = fallback.as_str(), "invalid_outbound_using_default");
                fallback
            }),
            None => variant.default_outbound(),
        };

        let window_title = lookup(WINDOW_TITLE_ENV_VAR)
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string());

        Ok(Self {
            server_url,
            variant,
            outbound,
            window_title,
            overlay_visible: parse_enabled_flag(lookup(OVERLAY_ENV_VAR).as_deref()),
        })
    }
}

fn parse_enabled_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1"))
}

/// First valid candidate of env, then CLI, then the built-in default.
fn resolve_server_url(
    env_url: Option<&str>,
    cli_url: Option<&str>,
) -> Result<Url, url::ParseError> {
    for (source, candidate) in [("env", env_url), ("cli", cli_url)] {
        let Some(value) = candidate else {
            continue;
        };
        match Url::parse(value.trim()) {
            Ok(url) => return Ok(url),
            Err(err) => warn!(source, value, error = %err, "invalid_server_url_skipped"),
        }
    }
    Url::parse(DEFAULT_SERVER_URL)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(cli_url: Option<&str>, vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ClientConfig::from_lookup(cli_url, |key| vars.get(key).cloned()).expect("config")
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(None, &[]);
        assert_eq!(config.server_url.as_str(), DEFAULT_SERVER_URL);
        assert_eq!(config.variant, Variant::Arena);
        assert_eq!(config.outbound, OutboundEncoding::Player);
        assert_eq!(config.window_title, "Mirror");
        assert!(!config.overlay_visible);
    }

    #[test]
    fn env_url_overrides_cli_argument() {
        let config = config_from(
            Some("ws://cli.invalid:1/"),
            &[(SERVER_URL_ENV_VAR, "ws://env.invalid:2/ws")],
        );
        assert_eq!(config.server_url.as_str(), "ws://env.invalid:2/ws");

        let config = config_from(Some("ws://cli.invalid:1/"), &[]);
        assert_eq!(config.server_url.as_str(), "ws://cli.invalid:1/");
    }

    #[test]
    fn invalid_env_url_falls_back_to_cli_argument() {
        let config = config_from(
            Some("ws://cli.invalid:1/"),
            &[(SERVER_URL_ENV_VAR, "::not a url::")],
        );
        assert_eq!(config.server_url.as_str(), "ws://cli.invalid:1/");

        let config = config_from(Some("also bad"), &[(SERVER_URL_ENV_VAR, "bad")]);
        assert_eq!(config.server_url.as_str(), DEFAULT_SERVER_URL);
    }

    #[test]
    fn physics_variant_defaults_to_touch_encoding() {
        let config = config_from(None, &[(VARIANT_ENV_VAR, "Physics")]);
        assert_eq!(config.variant, Variant::Physics);
        assert_eq!(config.outbound, OutboundEncoding::Touch);

        let config = config_from(
            None,
            &[(VARIANT_ENV_VAR, "physics"), (OUTBOUND_ENV_VAR, "bare")],
        );
        assert_eq!(config.outbound, OutboundEncoding::Bare);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(
            Some("not a url"),
            &[
                (VARIANT_ENV_VAR, "pinball"),
                (OUTBOUND_ENV_VAR, "carrier-pigeon"),
                (WINDOW_TITLE_ENV_VAR, "   "),
                (OVERLAY_ENV_VAR, "yes"),
            ],
        );
        assert_eq!(config.server_url.as_str(), DEFAULT_SERVER_URL);
        assert_eq!(config.variant, Variant::Arena);
        assert_eq!(config.outbound, OutboundEncoding::Player);
        assert_eq!(config.window_title, "Mirror");
        assert!(!config.overlay_visible);
    }

    #[test]
    fn overlay_flag_only_accepts_one() {
        assert!(parse_enabled_flag(Some("1")));
        assert!(!parse_enabled_flag(Some("0")));
        assert!(!parse_enabled_flag(None));
    }
}
