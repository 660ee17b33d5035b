use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smsgate_core::{AliasRules, SubscriptionId};

/// Default wait budget for the outcome of every segment of one send.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// How a multi-segment message is handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchStrategy {
    /// One `send_multipart_text` call carrying every segment.
    #[default]
    Multipart,
    /// One `send_text` call per segment, for carriers without concatenated SMS.
    SeparateMessages,
}

/// Whether an empty body may be sent.
///
/// Deserializes from its camelCase name or from the carrier's integer flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EmptyMessageModeRepr")]
pub enum EmptyMessageMode {
    /// Empty bodies are rejected before dispatch.
    #[default]
    Disabled,
    /// Empty bodies are sent; the UI shows a placeholder for them.
    AllowWithPlaceholder,
    /// Empty bodies are sent as-is.
    AllowAsIs,
}

impl EmptyMessageMode {
    /// Maps the carrier's integer flag: 1 and 2 allow empty bodies, anything
    /// else disables them.
    #[must_use]
    pub fn from_flag(flag: i32) -> Self {
        match flag {
            1 => Self::AllowWithPlaceholder,
            2 => Self::AllowAsIs,
            _ => Self::Disabled,
        }
    }

    #[must_use]
    pub fn allows_empty(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmptyMessageModeRepr {
    Flag(i32),
    Name(String),
}

impl TryFrom<EmptyMessageModeRepr> for EmptyMessageMode {
    type Error = String;

    fn try_from(repr: EmptyMessageModeRepr) -> Result<Self, Self::Error> {
        match repr {
            EmptyMessageModeRepr::Flag(flag) => Ok(Self::from_flag(flag)),
            EmptyMessageModeRepr::Name(name) => match name.as_str() {
                "disabled" => Ok(Self::Disabled),
                "allowWithPlaceholder" => Ok(Self::AllowWithPlaceholder),
                "allowAsIs" => Ok(Self::AllowAsIs),
                other => Err(format!("unknown empty message mode `{other}`")),
            },
        }
    }
}

/// Carrier-dependent settings of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubscriptionConfig {
    /// Number that relays SMS to email addresses and aliases, if the carrier
    /// offers one.
    pub email_gateway: Option<String>,
    /// Alias rules for destinations routed through the email gateway.
    pub alias: AliasRules,
    pub empty_message_mode: EmptyMessageMode,
    pub dispatch_strategy: DispatchStrategy,
    /// Maximum recipients for one quick-reply send. `None` means unlimited.
    pub recipient_limit: Option<usize>,
    /// Notify the user once every segment of a send was accepted.
    pub send_confirmation: bool,
    /// Carrier display name used in failure notices.
    pub carrier_name: Option<String>,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            email_gateway: None,
            alias: AliasRules::default(),
            empty_message_mode: EmptyMessageMode::Disabled,
            dispatch_strategy: DispatchStrategy::Multipart,
            recipient_limit: None,
            send_confirmation: false,
            carrier_name: None,
        }
    }
}

impl SubscriptionConfig {
    /// The email gateway, ignoring blank values.
    #[must_use]
    pub fn email_gateway(&self) -> Option<&str> {
        self.email_gateway
            .as_deref()
            .filter(|gateway| !gateway.trim().is_empty())
    }
}

/// Errors from loading a [`SenderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration of the SMS sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SenderConfig {
    /// Wait budget for the outcomes of all segments of one send, in
    /// milliseconds. Measured from dispatch; partial progress does not
    /// extend it.
    pub send_timeout_ms: u64,
    /// Settings used for subscriptions without an explicit entry.
    pub default_subscription: SubscriptionConfig,
    /// Per-subscription overrides.
    pub subscriptions: HashMap<SubscriptionId, SubscriptionConfig>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
            default_subscription: SubscriptionConfig::default(),
            subscriptions: HashMap::new(),
        }
    }
}

impl SenderConfig {
    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::Invalid` when a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`SenderConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid("sendTimeoutMs must be positive".into()));
        }
        let all = std::iter::once((None, &self.default_subscription))
            .chain(self.subscriptions.iter().map(|(id, sub)| (Some(*id), sub)));
        for (id, sub) in all {
            let label = id.map_or_else(|| "default".to_string(), |id| id.to_string());
            if sub.alias.min_chars > sub.alias.max_chars {
                return Err(ConfigError::Invalid(format!(
                    "subscription {label}: alias minChars exceeds maxChars"
                )));
            }
            if sub.recipient_limit == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "subscription {label}: recipientLimit must be positive"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Settings for `subscription_id`, falling back to the default entry.
    #[must_use]
    pub fn subscription(&self, subscription_id: SubscriptionId) -> &SubscriptionConfig {
        self.subscriptions
            .get(&subscription_id)
            .unwrap_or(&self.default_subscription)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn sender_config_defaults() {
        let config = SenderConfig::default();
        assert_eq!(config.send_timeout_ms, 300_000);
        assert_eq!(config.send_timeout(), Duration::from_secs(300));
        assert!(config.subscriptions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn subscription_config_defaults() {
        let sub = SubscriptionConfig::default();
        assert!(sub.email_gateway().is_none());
        assert!(!sub.alias.enabled);
        assert_eq!(sub.empty_message_mode, EmptyMessageMode::Disabled);
        assert_eq!(sub.dispatch_strategy, DispatchStrategy::Multipart);
        assert!(sub.recipient_limit.is_none());
        assert!(!sub.send_confirmation);
    }

    #[test]
    fn blank_gateway_counts_as_unset() {
        let sub = SubscriptionConfig {
            email_gateway: Some("  ".into()),
            ..SubscriptionConfig::default()
        };
        assert!(sub.email_gateway().is_none());
    }

    #[test]
    fn empty_message_flag_mapping() {
        assert_eq!(EmptyMessageMode::from_flag(-1), EmptyMessageMode::Disabled);
        assert_eq!(EmptyMessageMode::from_flag(0), EmptyMessageMode::Disabled);
        assert_eq!(
            EmptyMessageMode::from_flag(1),
            EmptyMessageMode::AllowWithPlaceholder
        );
        assert_eq!(EmptyMessageMode::from_flag(2), EmptyMessageMode::AllowAsIs);
        assert!(!EmptyMessageMode::Disabled.allows_empty());
        assert!(EmptyMessageMode::AllowAsIs.allows_empty());
    }

    #[test]
    fn empty_message_mode_loads_from_carrier_flag() {
        let json = r#"{
            "defaultSubscription": { "emptyMessageMode": 1 },
            "subscriptions": {
                "2": { "emptyMessageMode": 2 },
                "3": { "emptyMessageMode": 0 }
            }
        }"#;
        let config = SenderConfig::from_json_str(json).unwrap();
        assert_eq!(
            config.default_subscription.empty_message_mode,
            EmptyMessageMode::AllowWithPlaceholder
        );
        assert_eq!(
            config.subscription(SubscriptionId(2)).empty_message_mode,
            EmptyMessageMode::AllowAsIs
        );
        assert_eq!(
            config.subscription(SubscriptionId(3)).empty_message_mode,
            EmptyMessageMode::Disabled
        );
    }

    #[test]
    fn unknown_empty_message_mode_name_is_rejected() {
        let json = r#"{ "defaultSubscription": { "emptyMessageMode": "sometimes" } }"#;
        let err = SenderConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_message_mode_serializes_by_name() {
        let json = serde_json::to_string(&EmptyMessageMode::AllowWithPlaceholder).unwrap();
        assert_eq!(json, r#""allowWithPlaceholder""#);
    }

    #[test]
    fn parses_json_with_per_subscription_overrides() {
        let json = r#"{
            "sendTimeoutMs": 1500,
            "defaultSubscription": { "carrierName": "Acme" },
            "subscriptions": {
                "2": {
                    "emailGateway": "6245",
                    "alias": { "enabled": true },
                    "emptyMessageMode": "allowAsIs",
                    "dispatchStrategy": "separateMessages",
                    "recipientLimit": 10
                }
            }
        }"#;
        let config = SenderConfig::from_json_str(json).unwrap();
        assert_eq!(config.send_timeout(), Duration::from_millis(1500));

        let sub = config.subscription(SubscriptionId(2));
        assert_eq!(sub.email_gateway(), Some("6245"));
        assert!(sub.alias.enabled);
        assert_eq!(sub.alias.max_chars, 48);
        assert_eq!(sub.empty_message_mode, EmptyMessageMode::AllowAsIs);
        assert_eq!(sub.dispatch_strategy, DispatchStrategy::SeparateMessages);
        assert_eq!(sub.recipient_limit, Some(10));

        let fallback = config.subscription(SubscriptionId(7));
        assert_eq!(fallback.carrier_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = SenderConfig::from_json_str(r#"{ "sendTimeoutMs": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_alias_bounds() {
        let json = r#"{ "subscriptions": { "1": { "alias": { "minChars": 9, "maxChars": 3 } } } }"#;
        let err = SenderConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("subscription 1"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SenderConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "sendTimeoutMs": 250 }}"#).unwrap();
        let config = SenderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.send_timeout_ms, 250);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SenderConfig::from_json_file("/nonexistent/smsgate.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
