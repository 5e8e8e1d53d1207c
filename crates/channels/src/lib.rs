//! Channel adapters for RelayBot.
//!
//! Each adapter translates one transport into an inbound message for the
//! shared pipeline and renders the reply back into that transport.
//!
//! Available channels:
//! - **Web** — JSON `{user_id, message}` → `{reply}`
//! - **SMS / WhatsApp** — Twilio webhooks → TwiML
//! - **Call** — recorded audio → speech-to-text → pipeline → text-to-speech

pub mod call;
pub mod twilio;
pub mod twiml;
pub mod web;

#[cfg(test)]
mod test_support;

pub use call::{CallChannel, CallReply, UNINTELLIGIBLE_REPLY};
pub use twilio::{ReplyStyle, TwilioChannel, TwilioReply, TwilioRequest};
pub use web::{WebChannel, WebReply, WebRequest};
