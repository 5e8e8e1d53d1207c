//! Error types for the RelayBot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum.

use thiserror::Error;

/// The top-level error type for all RelayBot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Query errors ---
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Speech errors ---
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty response from provider: {0}")]
    EmptyResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("No database configured")]
    NotConfigured,

    #[error("Query rejected: {0}")]
    Rejected(String),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("Query timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel disabled: {0}")]
    Disabled(String),

    #[error("Unauthorized sender: {sender_id} on {channel}")]
    Unauthorized { channel: String, sender_id: String },

    #[error("Invalid request signature on {0}")]
    InvalidSignature(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Speech processing failed: {0}")]
    Speech(#[from] SpeechError),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),

    #[error("Speech service not configured: {0}")]
    NotConfigured(String),
}
