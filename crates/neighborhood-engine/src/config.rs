use std::time::Duration;

use tracing::warn;

use neighborhood_types::models::Channel;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_PROVIDER_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TEMPERATURE: f32 = 1.2;
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

/// Environment variables checked for the provider credential, in order.
const API_KEY_VARS: &[&str] = &["NEIGHBORHOOD_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// What to do when part of a provider batch fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropPolicy {
    /// Any malformed item discards the whole batch.
    #[default]
    WholeBatch,
    /// Malformed items are dropped, valid siblings are kept.
    PerItem,
}

impl DropPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "batch" | "whole_batch" => Some(Self::WholeBatch),
            "item" | "per_item" => Some(Self::PerItem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Provider credential. `None` runs the adapter in degraded mode.
    pub api_key: Option<String>,
    pub model: String,
    pub provider_url: String,
    pub temperature: f32,
    /// Delay before the first reply; reply `i` lands at `reply_delay * (i + 1)`.
    pub reply_delay: Duration,
    pub drop_policy: DropPolicy,
    pub channel: Channel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            provider_url: DEFAULT_PROVIDER_URL.into(),
            temperature: DEFAULT_TEMPERATURE,
            reply_delay: DEFAULT_REPLY_DELAY,
            drop_policy: DropPolicy::default(),
            channel: Channel::default(),
        }
    }
}

impl EngineConfig {
    /// Read the engine settings from the process environment.
    ///
    /// Never fails: a missing credential is a supported mode, and values that
    /// don't parse fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());

        let model = lookup("NEIGHBORHOOD_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.model);
        let provider_url = lookup("NEIGHBORHOOD_PROVIDER_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.provider_url);

        let temperature = parse_or("NEIGHBORHOOD_TEMPERATURE", &lookup, defaults.temperature);
        let reply_delay = lookup("NEIGHBORHOOD_REPLY_DELAY_MS")
            .map(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!("NEIGHBORHOOD_REPLY_DELAY_MS='{}' is not a number, using default", raw);
                    defaults.reply_delay
                }
            })
            .unwrap_or(defaults.reply_delay);
        let drop_policy = lookup("NEIGHBORHOOD_DROP_POLICY")
            .map(|raw| {
                DropPolicy::parse(&raw).unwrap_or_else(|| {
                    warn!("NEIGHBORHOOD_DROP_POLICY='{}' is not 'batch' or 'item', using default", raw);
                    defaults.drop_policy
                })
            })
            .unwrap_or(defaults.drop_policy);

        Self {
            api_key,
            model,
            provider_url,
            temperature,
            reply_delay,
            drop_policy,
            channel: defaults.channel,
        }
    }
}

fn parse_or<F>(key: &str, lookup: &F, default: f32) -> f32
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}='{}' is not a number, using default", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> EngineConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.reply_delay, Duration::from_millis(500));
        assert_eq!(config.drop_policy, DropPolicy::WholeBatch);
        assert_eq!(config.channel.name, "Neighborhood");
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = config_from(&[("NEIGHBORHOOD_API_KEY", "   ")]);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn credential_falls_back_through_aliases() {
        let config = config_from(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "gemini")]);
        assert_eq!(config.api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = config_from(&[
            ("NEIGHBORHOOD_TEMPERATURE", "hot"),
            ("NEIGHBORHOOD_REPLY_DELAY_MS", "soon"),
            ("NEIGHBORHOOD_DROP_POLICY", "sometimes"),
        ]);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.reply_delay, DEFAULT_REPLY_DELAY);
        assert_eq!(config.drop_policy, DropPolicy::WholeBatch);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("NEIGHBORHOOD_MODEL", "gemini-2.0-pro"),
            ("NEIGHBORHOOD_PROVIDER_URL", "http://127.0.0.1:9000/models/"),
            ("NEIGHBORHOOD_REPLY_DELAY_MS", "250"),
            ("NEIGHBORHOOD_DROP_POLICY", "item"),
        ]);
        assert_eq!(config.model, "gemini-2.0-pro");
        assert_eq!(config.provider_url, "http://127.0.0.1:9000/models");
        assert_eq!(config.reply_delay, Duration::from_millis(250));
        assert_eq!(config.drop_policy, DropPolicy::PerItem);
    }
}
