//! Minimal TwiML rendering for SMS and WhatsApp replies.

/// Content type Twilio expects for a TwiML response.
pub const CONTENT_TYPE: &str = "application/xml";

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// A `<Response>` carrying one `<Message>` with `text`.
pub fn message_response(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message>{}</Message></Response>"#,
        escape_xml(text)
    )
}
