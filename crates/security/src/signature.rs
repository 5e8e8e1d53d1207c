//! Twilio webhook signature validation.
//!
//! Twilio signs every webhook with `X-Twilio-Signature`: the base64
//! HMAC-SHA1, keyed with the account auth token, of the full request URL
//! followed by each POST parameter name and value, sorted by name.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Signs and verifies Twilio webhook requests for one auth token.
#[derive(Clone)]
pub struct TwilioSignature {
    auth_token: String,
}

impl TwilioSignature {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    /// The signature Twilio would send for `url` and the form `params`.
    pub fn expected(&self, url: &str, params: &[(String, String)]) -> String {
        let mac = self.mac_for(url, params);
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Check a received `X-Twilio-Signature` value.
    ///
    /// Uses constant-time comparison.
    pub fn verify(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        let Ok(provided) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        self.mac_for(url, params).verify_slice(&provided).is_ok()
    }

    fn mac_for(&self, url: &str, params: &[(String, String)]) -> HmacSha1 {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut mac = <HmacSha1 as Mac>::new_from_slice(self.auth_token.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(url.as_bytes());
        for (name, value) in sorted {
            mac.update(name.as_bytes());
            mac.update(value.as_bytes());
        }
        mac
    }
}

impl std::fmt::Debug for TwilioSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSignature")
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}
