use thiserror::Error;

/// Failure of a single user-triggered operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// Transport failure, non-2xx status, or a body that could not be decoded.
    #[error("{context}: {detail}")]
    Network { context: String, detail: String },

    /// The API answered with `success: false`.
    #[error("{context}: {message}")]
    Api { context: String, message: String },

    #[error("{0}")]
    Validation(String),

    /// Rejected credentials. The stored token is dropped when this is seen.
    #[error("{context}: {message}")]
    Auth { context: String, message: String },
}

pub type Result<T, E = DnsError> = std::result::Result<T, E>;

const AUTH_MARKERS: [&str; 4] = ["invalid", "authentication", "401", "403"];

impl DnsError {
    pub fn network(context: impl Into<String>, detail: impl ToString) -> Self {
        Self::Network {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Reinterprets a zone-listing failure as an authentication failure when
    /// its message carries one of the usual markers.
    pub fn promote_auth(self) -> Self {
        match self {
            Self::Api { context, message } if looks_like_auth_failure(&message) => {
                Self::Auth { context, message }
            }
            Self::Network { context, detail } if looks_like_auth_failure(&detail) => Self::Auth {
                context,
                message: detail,
            },
            other => other,
        }
    }
}

pub fn looks_like_auth_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    AUTH_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_markers_are_case_insensitive() {
        assert!(looks_like_auth_failure("Invalid API Token"));
        assert!(looks_like_auth_failure("Authentication error"));
        assert!(looks_like_auth_failure("HTTP 403 Forbidden"));
        assert!(!looks_like_auth_failure("Record quota exceeded"));
    }

    #[test]
    fn promote_only_touches_matching_remote_errors() {
        let api = DnsError::Api {
            context: "Zones".into(),
            message: "Invalid request headers".into(),
        };
        assert!(api.promote_auth().is_auth());

        let other = DnsError::Api {
            context: "Zones".into(),
            message: "rate limited".into(),
        };
        assert!(!other.promote_auth().is_auth());

        let validation = DnsError::validation("invalid input");
        assert_eq!(
            validation.clone().promote_auth(),
            validation,
            "local validation errors never evict credentials"
        );
    }
}
