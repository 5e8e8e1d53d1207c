//! Voice call adapter: audio in, audio out.
//!
//! The uploaded recording is transcribed, the transcript runs through the
//! pipeline as an ordinary message, and the reply is synthesized back to
//! WAV. When nothing intelligible was heard the caller gets a fixed spoken
//! apology and no turn is recorded.

use relaybot_config::{ChannelConfig, SpeechConfig};
use relaybot_core::channel::{ChannelKind, InboundMessage};
use relaybot_core::error::{ChannelError, Error};
use relaybot_core::speech::{SpeechToText, TextToSpeech};
use relaybot_pipeline::MessagePipeline;
use relaybot_security::AllowlistPolicy;
use std::sync::Arc;
use tracing::{info, warn};

/// Spoken when the transcript is empty.
pub const UNINTELLIGIBLE_REPLY: &str = "Sorry, I could not understand.";

/// The result of one call turn.
#[derive(Debug, Clone)]
pub struct CallReply {
    /// What the caller said, if anything was recognised
    pub transcript: Option<String>,
    /// The reply text that was spoken
    pub reply: String,
    /// WAV audio of `reply`
    pub audio: Vec<u8>,
}

/// Voice call channel adapter.
pub struct CallChannel {
    config: ChannelConfig,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    language: String,
    default_user_id: String,
}

impl CallChannel {
    pub fn new(
        config: ChannelConfig,
        speech: &SpeechConfig,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        Self {
            config,
            stt,
            tts,
            language: speech.language.clone(),
            default_user_id: speech.call_user_id.clone(),
        }
    }

    /// Transcribe `audio`, run one turn, and synthesize the reply.
    ///
    /// `caller` identifies the user; without it all calls share the
    /// configured call user id.
    pub async fn handle(
        &self,
        pipeline: &MessagePipeline,
        audio: &[u8],
        caller: Option<&str>,
    ) -> Result<CallReply, Error> {
        if audio.is_empty() {
            return Err(ChannelError::InvalidPayload("audio upload is empty".into()).into());
        }
        let user_id = caller
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_user_id.as_str());
        AllowlistPolicy::ensure_sender(ChannelKind::Call.as_str(), &self.config, user_id)?;

        let transcript = self
            .stt
            .transcribe(audio, &self.language)
            .await
            .map_err(ChannelError::from)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let reply = match &transcript {
            Some(text) => {
                info!(user_id, chars = text.chars().count(), "Call transcribed");
                let inbound = InboundMessage::new(user_id, text.as_str(), ChannelKind::Call);
                pipeline.process(&inbound).await?.reply
            }
            None => {
                warn!(user_id, "Nothing recognised in call audio");
                UNINTELLIGIBLE_REPLY.to_string()
            }
        };

        let audio = self
            .tts
            .synthesize(&reply, &self.language)
            .await
            .map_err(ChannelError::from)?;

        Ok(CallReply {
            transcript,
            reply,
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::echo_pipeline;
    use async_trait::async_trait;
    use relaybot_core::error::SpeechError;
    use relaybot_core::memory::ConversationMemory;
    use std::sync::Mutex;

    struct FixedStt(Option<String>);

    #[async_trait]
    impl SpeechToText for FixedStt {
        async fn transcribe(&self, _audio: &[u8], _language: &str) -> Result<Option<String>, SpeechError> {
            Ok(self.0.clone())
        }
    }

    struct FailingStt;

    #[async_trait]
    impl SpeechToText for FailingStt {
        async fn transcribe(&self, _audio: &[u8], _language: &str) -> Result<Option<String>, SpeechError> {
            Err(SpeechError::ApiError {
                status_code: 400,
                message: "bad encoding".into(),
            })
        }
    }

    /// Returns the text bytes as "audio" and remembers what it spoke.
    #[derive(Default)]
    struct EchoTts {
        spoken: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TextToSpeech for EchoTts {
        async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SpeechError> {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), language.to_string()));
            Ok(text.as_bytes().to_vec())
        }
    }

    fn channel(stt: Arc<dyn SpeechToText>, tts: Arc<EchoTts>) -> CallChannel {
        CallChannel::new(ChannelConfig::default(), &SpeechConfig::default(), stt, tts)
    }

    #[tokio::test]
    async fn transcript_runs_turn_and_is_spoken() {
        let (pipeline, memory) = echo_pipeline();
        let tts = Arc::new(EchoTts::default());
        let call = channel(Arc::new(FixedStt(Some("bus kithe hai".into()))), tts.clone());

        let reply = call.handle(&pipeline, b"RIFF....", None).await.unwrap();

        assert_eq!(reply.transcript.as_deref(), Some("bus kithe hai"));
        assert_eq!(reply.reply, "echo: bus kithe hai");
        assert_eq!(reply.audio, b"echo: bus kithe hai".to_vec());
        assert_eq!(
            tts.spoken.lock().unwrap()[0],
            ("echo: bus kithe hai".to_string(), "pa-IN".to_string())
        );
        assert_eq!(memory.history("call_user").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn caller_field_selects_user() {
        let (pipeline, memory) = echo_pipeline();
        let call = channel(Arc::new(FixedStt(Some("hello".into()))), Arc::new(EchoTts::default()));

        call.handle(&pipeline, b"RIFF", Some("+911234")).await.unwrap();
        assert_eq!(memory.history("+911234").await.unwrap().len(), 1);
        assert!(memory.history("call_user").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn silence_gets_fixed_reply_without_turn() {
        let (pipeline, memory) = echo_pipeline();
        let call = channel(Arc::new(FixedStt(None)), Arc::new(EchoTts::default()));

        let reply = call.handle(&pipeline, b"RIFF", None).await.unwrap();
        assert_eq!(reply.transcript, None);
        assert_eq!(reply.reply, UNINTELLIGIBLE_REPLY);
        assert_eq!(memory.user_count().await, 0);
    }

    #[tokio::test]
    async fn blank_transcript_counts_as_silence() {
        let (pipeline, _) = echo_pipeline();
        let call = channel(Arc::new(FixedStt(Some("  ".into()))), Arc::new(EchoTts::default()));
        let reply = call.handle(&pipeline, b"RIFF", None).await.unwrap();
        assert_eq!(reply.reply, UNINTELLIGIBLE_REPLY);
    }

    #[tokio::test]
    async fn speech_failure_is_a_channel_error() {
        let (pipeline, _) = echo_pipeline();
        let call = channel(Arc::new(FailingStt), Arc::new(EchoTts::default()));
        let err = call.handle(&pipeline, b"RIFF", None).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Speech(_))));
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let (pipeline, _) = echo_pipeline();
        let call = channel(Arc::new(FixedStt(None)), Arc::new(EchoTts::default()));
        let err = call.handle(&pipeline, b"", None).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::InvalidPayload(_))));
    }
}
