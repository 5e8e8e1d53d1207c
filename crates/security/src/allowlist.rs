//! Allowlist policies — sender validation per channel.
//!
//! Every channel carries an `allowed_users` list in its configuration.
//! Phone numbers for SMS/WhatsApp, caller ids for calls, free-form ids on
//! the web endpoint.

use relaybot_config::ChannelConfig;
use relaybot_core::error::ChannelError;
use tracing::warn;

/// Result of checking a sender against the allowlist.
#[derive(Debug, Clone, PartialEq)]
pub enum SenderCheckResult {
    /// Sender is allowed
    Allowed,
    /// Sender is denied
    Denied { sender_id: String, reason: String },
    /// The channel is switched off entirely
    ChannelDisabled,
}

/// Unified allowlist policy enforcement.
pub struct AllowlistPolicy;

impl AllowlistPolicy {
    /// Check if a sender is allowed for a given channel configuration.
    ///
    /// Rules:
    /// - If the channel is disabled → deny
    /// - If `allowed_users` is empty → deny all
    /// - If `allowed_users` contains `"*"` → allow all
    /// - Otherwise, sender must be in the list
    pub fn check_sender(config: &ChannelConfig, sender_id: &str) -> SenderCheckResult {
        if !config.enabled {
            return SenderCheckResult::ChannelDisabled;
        }

        if config.allowed_users.is_empty() {
            return SenderCheckResult::Denied {
                sender_id: sender_id.into(),
                reason: "No users configured (deny by default)".into(),
            };
        }

        if config.allowed_users.iter().any(|u| u == "*") {
            return SenderCheckResult::Allowed;
        }

        if config.allowed_users.iter().any(|u| u == sender_id) {
            SenderCheckResult::Allowed
        } else {
            SenderCheckResult::Denied {
                sender_id: sender_id.into(),
                reason: format!(
                    "Sender '{}' not in allowlist ({} users configured)",
                    sender_id,
                    config.allowed_users.len()
                ),
            }
        }
    }

    /// Like [`check_sender`](Self::check_sender), but as a channel error.
    pub fn ensure_sender(
        channel: &str,
        config: &ChannelConfig,
        sender_id: &str,
    ) -> Result<(), ChannelError> {
        match Self::check_sender(config, sender_id) {
            SenderCheckResult::Allowed => Ok(()),
            SenderCheckResult::ChannelDisabled => Err(ChannelError::Disabled(channel.into())),
            SenderCheckResult::Denied { sender_id, reason } => {
                warn!(channel, sender_id = %sender_id, %reason, "Sender rejected");
                Err(ChannelError::Unauthorized {
                    channel: channel.into(),
                    sender_id,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(enabled: bool, users: Vec<&str>) -> ChannelConfig {
        ChannelConfig {
            enabled,
            allowed_users: users.into_iter().map(String::from).collect(),
            ..ChannelConfig::default()
        }
    }

    #[test]
    fn empty_allowlist_denies_all() {
        let config = make_config(true, vec![]);
        let result = AllowlistPolicy::check_sender(&config, "+919800000001");
        assert_eq!(
            result,
            SenderCheckResult::Denied {
                sender_id: "+919800000001".into(),
                reason: "No users configured (deny by default)".into(),
            }
        );
    }

    #[test]
    fn wildcard_allows_all() {
        let config = make_config(true, vec!["*"]);
        assert_eq!(
            AllowlistPolicy::check_sender(&config, "anyone"),
            SenderCheckResult::Allowed
        );
    }

    #[test]
    fn specific_user_allowed() {
        let config = make_config(true, vec!["+919800000001", "+919800000002"]);
        assert_eq!(
            AllowlistPolicy::check_sender(&config, "+919800000002"),
            SenderCheckResult::Allowed
        );
    }

    #[test]
    fn unknown_user_denied() {
        let config = make_config(true, vec!["+919800000001"]);
        match AllowlistPolicy::check_sender(&config, "+15550000000") {
            SenderCheckResult::Denied { sender_id, .. } => {
                assert_eq!(sender_id, "+15550000000");
            }
            other => panic!("Expected denied, got {other:?}"),
        }
    }

    #[test]
    fn disabled_channel_denies() {
        let config = make_config(false, vec!["*"]);
        assert_eq!(
            AllowlistPolicy::check_sender(&config, "user123"),
            SenderCheckResult::ChannelDisabled
        );
    }

    #[test]
    fn ensure_sender_maps_to_channel_errors() {
        let disabled = make_config(false, vec!["*"]);
        assert!(matches!(
            AllowlistPolicy::ensure_sender("sms", &disabled, "x"),
            Err(ChannelError::Disabled(name)) if name == "sms"
        ));

        let closed = make_config(true, vec!["alice"]);
        assert!(matches!(
            AllowlistPolicy::ensure_sender("web", &closed, "mallory"),
            Err(ChannelError::Unauthorized { .. })
        ));
        assert!(AllowlistPolicy::ensure_sender("web", &closed, "alice").is_ok());
    }
}
