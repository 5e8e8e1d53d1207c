//! Google Cloud Speech REST client.
//!
//! Implements both speech traits:
//! - `speech:recognize` for call audio (LINEAR16, primary language plus
//!   alternatives)
//! - `text:synthesize` for the spoken reply (LINEAR16 WAV, neutral voice)
//!
//! Audio travels base64-encoded in the JSON bodies.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use relaybot_config::SpeechConfig;
use relaybot_core::error::SpeechError;
use relaybot_core::speech::{SpeechToText, TextToSpeech};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const STT_BASE_URL: &str = "https://speech.googleapis.com";
const TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";

pub struct GoogleSpeechClient {
    api_key: String,
    stt_base_url: String,
    tts_base_url: String,
    sample_rate_hertz: u32,
    alternative_languages: Vec<String>,
    client: reqwest::Client,
}

impl GoogleSpeechClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.into(),
            stt_base_url: STT_BASE_URL.into(),
            tts_base_url: TTS_BASE_URL.into(),
            sample_rate_hertz: 16000,
            alternative_languages: Vec::new(),
            client,
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        let mut client = Self::new(config.api_key.clone().unwrap_or_default());
        client.sample_rate_hertz = config.sample_rate_hertz;
        client.alternative_languages = config.alternative_languages.clone();
        if let Some(url) = &config.api_url {
            client = client.with_base_url(url);
        }
        client
    }

    /// Route both APIs through one base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.stt_base_url = base.clone();
        self.tts_base_url = base;
        self
    }

    fn require_key(&self) -> Result<(), SpeechError> {
        if self.api_key.is_empty() {
            return Err(SpeechError::NotConfigured(
                "speech API key missing (set AUDIO_API or [speech] api_key)".into(),
            ));
        }
        Ok(())
    }

    fn recognize_request(&self, audio: &[u8], language: &str) -> RecognizeRequest {
        RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.sample_rate_hertz,
                language_code: language.to_string(),
                alternative_language_codes: self
                    .alternative_languages
                    .iter()
                    .filter(|l| l.as_str() != language)
                    .cloned()
                    .collect(),
            },
            audio: RecognitionAudio {
                content: STANDARD.encode(audio),
            },
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, SpeechError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "Speech API returned error");
            return Err(SpeechError::ApiError {
                status_code: status,
                message,
            });
        }

        response.json().await.map_err(|e| SpeechError::ApiError {
            status_code: status,
            message: format!("Failed to parse response: {e}"),
        })
    }
}

/// Join the top alternative of every result segment.
fn transcript_of(response: RecognizeResponse) -> Option<String> {
    let transcript = response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if transcript.is_empty() {
        None
    } else {
        Some(transcript)
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeechClient {
    async fn transcribe(&self, audio: &[u8], language: &str) -> Result<Option<String>, SpeechError> {
        self.require_key()?;
        if audio.is_empty() {
            return Err(SpeechError::InvalidAudio("empty audio upload".into()));
        }

        let url = format!("{}/v1/speech:recognize", self.stt_base_url);
        let body = self.recognize_request(audio, language);
        debug!(bytes = audio.len(), language, "Sending recognize request");

        let response: RecognizeResponse = self.post(&url, &body).await?;
        Ok(transcript_of(response))
    }
}

#[async_trait]
impl TextToSpeech for GoogleSpeechClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SpeechError> {
        self.require_key()?;

        let url = format!("{}/v1/text:synthesize", self.tts_base_url);
        let body = SynthesizeRequest {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: VoiceSelection {
                language_code: language.to_string(),
                ssml_gender: "NEUTRAL",
            },
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16",
            },
        };
        debug!(chars = text.len(), language, "Sending synthesize request");

        let response: SynthesizeResponse = self.post(&url, &body).await?;
        STANDARD
            .decode(response.audio_content)
            .map_err(|e| SpeechError::InvalidAudio(format!("audioContent is not base64: {e}")))
    }
}

// --- API types ---

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternative_language_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest {
    input: SynthesisInput,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: String,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}
