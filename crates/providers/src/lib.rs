//! LLM provider and speech service implementations for RelayBot.
//!
//! All LLM providers implement the `relaybot_core::Provider` trait.
//! The router selects the correct provider based on configuration.

mod http;
pub mod gemini;
pub mod openai_compat;
pub mod router;
pub mod speech;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
pub use speech::GoogleSpeechClient;
