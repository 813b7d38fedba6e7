//! Environment-backed runtime configuration for `quantum-chat`.

use std::{env, path::PathBuf};

use chat_core::{
    DEFAULT_MOBILE_BREAKPOINT_PX, LifecycleSettings, SessionSettings,
    lifecycle::{DEFAULT_DELIVER_AFTER_MS, DEFAULT_REPLY_AFTER_MS, DEFAULT_REPLY_TEXT},
};
use thiserror::Error;

const DEFAULT_VIEWPORT_WIDTH_PX: u32 = 1_440;
const DEFAULT_SESSION_PATH: &str = "./.quantum-chat/session.json";

/// Runtime configuration used by the terminal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Viewport widths strictly below this value use the single-panel layout.
    pub mobile_breakpoint_px: u32,
    pub deliver_after_ms: u64,
    pub reply_after_ms: u64,
    pub reply_text: String,
    /// Width the session starts with before the first `resize`.
    pub viewport_width_px: u32,
    /// Where the signed-in user is remembered between launches.
    pub session_path: PathBuf,
    /// Start with the demo chats instead of an empty sidebar.
    pub seed: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint_px: DEFAULT_MOBILE_BREAKPOINT_PX,
            deliver_after_ms: DEFAULT_DELIVER_AFTER_MS,
            reply_after_ms: DEFAULT_REPLY_AFTER_MS,
            reply_text: DEFAULT_REPLY_TEXT.to_owned(),
            viewport_width_px: DEFAULT_VIEWPORT_WIDTH_PX,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            seed: true,
        }
    }
}

impl ChatConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mobile_breakpoint_px = parse_u32(
            "QUANTUM_CHAT_MOBILE_BREAKPOINT_PX",
            defaults.mobile_breakpoint_px,
            &mut lookup,
        )?;
        let deliver_after_ms = parse_u64(
            "QUANTUM_CHAT_DELIVER_AFTER_MS",
            defaults.deliver_after_ms,
            &mut lookup,
        )?;
        let reply_after_ms = parse_u64(
            "QUANTUM_CHAT_REPLY_AFTER_MS",
            defaults.reply_after_ms,
            &mut lookup,
        )?;
        let reply_text = optional_trimmed_env("QUANTUM_CHAT_REPLY_TEXT", &mut lookup)
            .unwrap_or(defaults.reply_text);
        let viewport_width_px = parse_u32(
            "QUANTUM_CHAT_VIEWPORT_WIDTH_PX",
            defaults.viewport_width_px,
            &mut lookup,
        )?;
        let session_path = optional_trimmed_env("QUANTUM_CHAT_SESSION_PATH", &mut lookup)
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);
        let seed = parse_bool("QUANTUM_CHAT_SEED", defaults.seed, &mut lookup)?;

        if mobile_breakpoint_px == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUANTUM_CHAT_MOBILE_BREAKPOINT_PX",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        if reply_after_ms <= deliver_after_ms {
            return Err(ConfigError::InvalidValue {
                key: "QUANTUM_CHAT_REPLY_AFTER_MS",
                value: reply_after_ms.to_string(),
                reason: format!("must be greater than the delivery delay ({deliver_after_ms} ms)"),
            });
        }

        Ok(Self {
            mobile_breakpoint_px,
            deliver_after_ms,
            reply_after_ms,
            reply_text,
            viewport_width_px,
            session_path,
            seed,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            lifecycle: LifecycleSettings {
                deliver_after_ms: self.deliver_after_ms,
                reply_after_ms: self.reply_after_ms,
                reply_text: self.reply_text.clone(),
            },
            mobile_breakpoint_px: self.mobile_breakpoint_px,
            initial_width_px: self.viewport_width_px,
        }
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed or is out of range.
    #[error("invalid {key}='{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_u32<F>(key: &'static str, default: u32, lookup: &mut F) -> Result<u32, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(default);
    };
    value
        .parse::<u32>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_u64<F>(key: &'static str, default: u64, lookup: &mut F) -> Result<u64, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(default);
    };
    value
        .parse::<u64>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_bool<F>(key: &'static str, default: bool, lookup: &mut F) -> Result<bool, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false".to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Result<ChatConfig, ConfigError> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        ChatConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = config_from_pairs(&[]).expect("config should parse");
        assert_eq!(cfg, ChatConfig::default());
        assert_eq!(cfg.mobile_breakpoint_px, 1024);
        assert_eq!(cfg.deliver_after_ms, 1000);
        assert_eq!(cfg.reply_after_ms, 3000);
        assert!(cfg.seed);
    }

    #[test]
    fn parses_overrides() {
        let cfg = config_from_pairs(&[
            ("QUANTUM_CHAT_MOBILE_BREAKPOINT_PX", "768"),
            ("QUANTUM_CHAT_DELIVER_AFTER_MS", "200"),
            ("QUANTUM_CHAT_REPLY_AFTER_MS", " 500 "),
            ("QUANTUM_CHAT_REPLY_TEXT", "ok"),
            ("QUANTUM_CHAT_VIEWPORT_WIDTH_PX", "390"),
            ("QUANTUM_CHAT_SESSION_PATH", "/tmp/qc/session.json"),
            ("QUANTUM_CHAT_SEED", "false"),
        ])
        .expect("config should parse");

        assert_eq!(cfg.mobile_breakpoint_px, 768);
        assert_eq!(cfg.reply_after_ms, 500);
        assert_eq!(cfg.session_path, PathBuf::from("/tmp/qc/session.json"));
        assert!(!cfg.seed);

        let settings = cfg.session_settings();
        assert_eq!(settings.lifecycle.deliver_after_ms, 200);
        assert_eq!(settings.lifecycle.reply_text, "ok");
        assert_eq!(settings.initial_width_px, 390);
    }

    #[test]
    fn blank_reply_text_falls_back_to_default() {
        let cfg = config_from_pairs(&[("QUANTUM_CHAT_REPLY_TEXT", "   ")])
            .expect("config should parse");
        assert_eq!(cfg.reply_text, DEFAULT_REPLY_TEXT);
    }

    #[test]
    fn rejects_invalid_numeric_values() {
        let err = config_from_pairs(&[("QUANTUM_CHAT_DELIVER_AFTER_MS", "soon")])
            .expect_err("invalid delay should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "QUANTUM_CHAT_DELIVER_AFTER_MS",
                ..
            }
        ));
    }

    #[test]
    fn reply_must_come_after_delivery() {
        let err = config_from_pairs(&[
            ("QUANTUM_CHAT_DELIVER_AFTER_MS", "3000"),
            ("QUANTUM_CHAT_REPLY_AFTER_MS", "3000"),
        ])
        .expect_err("equal delays should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "QUANTUM_CHAT_REPLY_AFTER_MS",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_breakpoint_and_unknown_bool() {
        assert!(config_from_pairs(&[("QUANTUM_CHAT_MOBILE_BREAKPOINT_PX", "0")]).is_err());
        let err = config_from_pairs(&[("QUANTUM_CHAT_SEED", "maybe")])
            .expect_err("unknown bool should fail");
        assert_eq!(err.to_string(), "invalid QUANTUM_CHAT_SEED='maybe': expected true or false");
    }
}
