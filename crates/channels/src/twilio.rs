//! SMS and WhatsApp adapters (Twilio webhooks).
//!
//! Twilio posts `From`/`Body` as a form and expects TwiML back. Direct
//! callers may instead pass `user_id`/`message` (form or query string) and
//! get the reply as JSON `{reply}`.

use crate::twiml;
use relaybot_config::ChannelConfig;
use relaybot_core::channel::{ChannelKind, InboundMessage};
use relaybot_core::error::{ChannelError, Error};
use relaybot_pipeline::MessagePipeline;
use relaybot_security::{AllowlistPolicy, TwilioSignature};
use tracing::{debug, warn};

/// How the reply should be rendered for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStyle {
    /// `<Response><Message>…</Message></Response>` for Twilio
    Twiml,
    /// `{"reply": …}` for direct callers
    Json,
}

/// One inbound webhook call, before parsing.
#[derive(Debug, Clone, Default)]
pub struct TwilioRequest {
    /// Decoded form body parameters
    pub form: Vec<(String, String)>,
    /// Decoded query string parameters
    pub query: Vec<(String, String)>,
    /// Raw query string, part of the signed URL
    pub raw_query: Option<String>,
    /// `X-Twilio-Signature` header value
    pub signature: Option<String>,
}

impl TwilioRequest {
    fn param(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .chain(self.query.iter())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A rendered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioReply {
    pub style: ReplyStyle,
    pub text: String,
}

impl TwilioReply {
    pub fn content_type(&self) -> &'static str {
        match self.style {
            ReplyStyle::Twiml => twiml::CONTENT_TYPE,
            ReplyStyle::Json => "application/json",
        }
    }

    pub fn body(&self) -> String {
        match self.style {
            ReplyStyle::Twiml => twiml::message_response(&self.text),
            ReplyStyle::Json => serde_json::json!({ "reply": self.text }).to_string(),
        }
    }
}

/// Adapter for one Twilio messaging channel (SMS or WhatsApp).
pub struct TwilioChannel {
    kind: ChannelKind,
    config: ChannelConfig,
    signature: Option<TwilioSignature>,
}

impl TwilioChannel {
    pub fn new(kind: ChannelKind, config: ChannelConfig) -> Self {
        let signature = config
            .auth_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(TwilioSignature::new);
        Self {
            kind,
            config,
            signature,
        }
    }

    pub fn sms(config: ChannelConfig) -> Self {
        Self::new(ChannelKind::Sms, config)
    }

    pub fn whatsapp(config: ChannelConfig) -> Self {
        Self::new(ChannelKind::Whatsapp, config)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// The route this channel is served on.
    pub fn path(&self) -> String {
        format!("/{}", self.kind.as_str())
    }

    /// Check `X-Twilio-Signature` when the channel has an auth token.
    pub fn verify_signature(&self, request: &TwilioRequest) -> Result<(), ChannelError> {
        let Some(signer) = &self.signature else {
            return Ok(());
        };
        let channel = self.kind.as_str();

        let Some(public_url) = self.config.public_url.as_deref() else {
            warn!(channel, "auth_token set without public_url, cannot verify signature");
            return Err(ChannelError::InvalidSignature(channel.into()));
        };
        let mut url = format!("{}{}", public_url.trim_end_matches('/'), self.path());
        if let Some(q) = request.raw_query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }

        match request.signature.as_deref() {
            Some(sig) if signer.verify(&url, &request.form, sig) => Ok(()),
            _ => {
                warn!(channel, "Rejected webhook with invalid signature");
                Err(ChannelError::InvalidSignature(channel.into()))
            }
        }
    }

    /// Extract the sender and text, and pick the reply style.
    pub fn parse(&self, request: &TwilioRequest) -> Result<(InboundMessage, ReplyStyle), ChannelError> {
        let (sender, text, style) = match (request.param("From"), request.param("Body")) {
            (Some(from), Some(body)) => (from, body, ReplyStyle::Twiml),
            _ => match (request.param("user_id"), request.param("message")) {
                (Some(user), Some(message)) => (user, message, ReplyStyle::Json),
                _ => {
                    return Err(ChannelError::InvalidPayload(
                        "expected From/Body or user_id/message".into(),
                    ));
                }
            },
        };

        let sender = sender.trim();
        let sender = sender.strip_prefix("whatsapp:").unwrap_or(sender);
        if sender.is_empty() {
            return Err(ChannelError::InvalidPayload("sender is empty".into()));
        }
        if text.trim().is_empty() {
            return Err(ChannelError::InvalidPayload("message is empty".into()));
        }

        Ok((InboundMessage::new(sender, text, self.kind), style))
    }

    /// Verify, parse, authorize, and run one turn.
    pub async fn handle(
        &self,
        pipeline: &MessagePipeline,
        request: &TwilioRequest,
    ) -> Result<TwilioReply, Error> {
        self.verify_signature(request)?;
        let (inbound, style) = self.parse(request)?;
        AllowlistPolicy::ensure_sender(self.kind.as_str(), &self.config, &inbound.user_id)?;
        debug!(channel = %self.kind, user_id = %inbound.user_id, ?style, "Webhook accepted");

        let turn = pipeline.process(&inbound).await?;
        Ok(TwilioReply {
            style,
            text: turn.reply,
        })
    }
}
