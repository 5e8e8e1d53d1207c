//! Channel types — the transports a user message can arrive through.
//!
//! Channel adapters translate their transport (JSON, form webhooks,
//! uploaded audio) into a plain [`InboundMessage`] and wrap the pipeline's
//! text reply back into the transport's representation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The transport a message arrived through.
///
/// Informational only: the pipeline logs it but does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Web,
    Sms,
    Whatsapp,
    Call,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Web,
        ChannelKind::Sms,
        ChannelKind::Whatsapp,
        ChannelKind::Call,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Web => "web",
            ChannelKind::Sms => "sms",
            ChannelKind::Whatsapp => "whatsapp",
            ChannelKind::Call => "call",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(ChannelKind::Web),
            "sms" => Ok(ChannelKind::Sms),
            "whatsapp" => Ok(ChannelKind::Whatsapp),
            "call" | "voice" => Ok(ChannelKind::Call),
            other => Err(format!("unknown channel '{other}'")),
        }
    }
}

/// A user message, stripped of all transport detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Stable identifier of the user (phone number, web session, caller)
    pub user_id: String,

    /// The utterance text
    pub message: String,

    /// Where it came from
    pub channel: ChannelKind,
}

impl InboundMessage {
    pub fn new(
        user_id: impl Into<String>,
        message: impl Into<String>,
        channel: ChannelKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_kind_parses_case_insensitively() {
        assert_eq!("WhatsApp".parse::<ChannelKind>().unwrap(), ChannelKind::Whatsapp);
        assert_eq!("voice".parse::<ChannelKind>().unwrap(), ChannelKind::Call);
        assert!("fax".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn channel_kind_display_matches_serde() {
        for kind in ChannelKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
