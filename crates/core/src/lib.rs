//! # RelayBot Core
//!
//! Domain types, traits, and error definitions for the RelayBot chat relay.
//! This crate has **no framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the message pipeline is a trait here:
//! the LLM (`Provider`), the classifier and formatter built on it, the
//! relational store (`QueryExecutor`), the conversation memory, and the
//! speech services. Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod channel;
pub mod memory;
pub mod intent;
pub mod reply;
pub mod query;
pub mod speech;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use channel::{ChannelKind, InboundMessage};
pub use memory::{ConversationMemory, Exchange, DEFAULT_HISTORY_CAPACITY};
pub use intent::{Classification, Classifier, Intent};
pub use reply::ReplyFormatter;
pub use query::{QueryExecutor, Row};
pub use speech::{SpeechToText, TextToSpeech};
