//! Security module for RelayBot — allowlists, webhook signatures, and SQL guards.
//!
//! Provides:
//! - **Allowlists**: Sender validation per channel
//! - **Signatures**: Twilio `X-Twilio-Signature` verification
//! - **Query policy**: Optional read-only guard in front of the query executor
//! - **Admin token**: Bearer check for the operator routes

pub mod admin;
pub mod allowlist;
pub mod query_policy;
pub mod signature;

pub use admin::AdminToken;
pub use allowlist::{AllowlistPolicy, SenderCheckResult};
pub use query_policy::{Dialect, GuardedExecutor, ReadOnlyPolicy};
pub use signature::TwilioSignature;
