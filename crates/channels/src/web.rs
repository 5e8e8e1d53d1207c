//! Web channel adapter.
//!
//! Accepts a JSON `{user_id, message}` body and answers with `{reply}`.

use relaybot_config::ChannelConfig;
use relaybot_core::channel::ChannelKind;
use relaybot_core::error::{ChannelError, Error};
use relaybot_pipeline::MessagePipeline;
use relaybot_security::AllowlistPolicy;
use serde::{Deserialize, Serialize};

/// Body of `POST /web`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebRequest {
    pub user_id: String,
    pub message: String,
}

/// Response of `POST /web`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebReply {
    pub reply: String,
}

/// Web channel adapter.
pub struct WebChannel {
    config: ChannelConfig,
}

impl WebChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    pub async fn handle(
        &self,
        pipeline: &MessagePipeline,
        request: WebRequest,
    ) -> Result<WebReply, Error> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(ChannelError::InvalidPayload("user_id is required".into()).into());
        }
        if request.message.trim().is_empty() {
            return Err(ChannelError::InvalidPayload("message is required".into()).into());
        }
        AllowlistPolicy::ensure_sender(ChannelKind::Web.as_str(), &self.config, user_id)?;

        let reply = pipeline
            .handle(user_id, &request.message, ChannelKind::Web)
            .await?;
        Ok(WebReply { reply })
    }
}
