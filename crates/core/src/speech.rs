//! Speech services used by the voice call channel.

use async_trait::async_trait;
use crate::error::SpeechError;

/// Transcribes recorded audio.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Returns `None` when the service recognised nothing.
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<Option<String>, SpeechError>;
}

/// Synthesizes speech audio from text.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Returns WAV (LINEAR16) bytes.
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SpeechError>;
}
