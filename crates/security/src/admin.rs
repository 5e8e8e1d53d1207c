//! Bearer token guarding the operator routes.

/// The configured operator token.
#[derive(Clone)]
pub struct AdminToken {
    token: String,
}

impl AdminToken {
    /// `None` for a missing or blank token.
    pub fn from_config(token: Option<&str>) -> Option<Self> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self {
                token: t.to_string(),
            })
    }

    /// Check an `Authorization` header value of the form `Bearer <token>`.
    ///
    /// Comparison time does not depend on where the values differ.
    pub fn verify_bearer(&self, authorization: Option<&str>) -> bool {
        let Some(provided) = authorization.and_then(|h| h.trim().strip_prefix("Bearer ")) else {
            return false;
        };
        let provided = provided.trim().as_bytes();
        let expected = self.token.as_bytes();
        if provided.len() != expected.len() {
            return false;
        }
        provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}
