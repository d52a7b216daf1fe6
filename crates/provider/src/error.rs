//! Provider error type.

/// Substrings in a provider error body that indicate a safety rejection.
pub const CONTENT_POLICY_MARKERS: &[&str] = &["content_policy", "safety", "rejected", "violation"];

/// Errors from the provider HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected provider response: {0}")]
    Parse(String),

    /// The provider answered successfully but with no usable content.
    #[error("Provider returned no content: {0}")]
    Empty(String),
}

impl ProviderError {
    /// Whether the provider refused the request on content-policy grounds.
    pub fn is_content_policy_violation(&self) -> bool {
        match self {
            Self::Api { body, .. } => {
                let body = body.to_lowercase();
                CONTENT_POLICY_MARKERS.iter().any(|m| body.contains(m))
            }
            _ => false,
        }
    }

    /// Whether the account must verify its organization before using the
    /// requested model (HTTP 403 mentioning "verify").
    pub fn is_verification_required(&self) -> bool {
        matches!(self, Self::Api { status: 403, body } if body.to_lowercase().contains("verify"))
    }
}
