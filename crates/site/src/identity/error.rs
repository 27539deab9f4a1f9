//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] club_core::EmailError),

    /// Wrong password or unknown account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password rejected by the provider.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account disabled by an administrator.
    #[error("account disabled")]
    UserDisabled,

    /// Provider throttled the caller.
    #[error("too many attempts")]
    TooManyAttempts,

    /// Cached credential is no longer valid.
    #[error("session expired")]
    SessionExpired,

    /// HTTP request to the provider failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider returned an error code this client does not map.
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider response could not be interpreted.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Map an Identity Toolkit error code (`EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be ...`) to an error.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Self {
        let (code, detail) = message
            .split_once(" : ")
            .map_or((message, None), |(code, detail)| (code, Some(detail)));

        match code.trim() {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "EMAIL_EXISTS" => Self::UserAlreadyExists,
            "INVALID_EMAIL" | "MISSING_EMAIL" => {
                Self::InvalidEmail(club_core::EmailError::BadSeparator)
            }
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::WeakPassword(
                detail
                    .unwrap_or("Password should be at least 6 characters")
                    .to_string(),
            ),
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" | "INVALID_ID_TOKEN" => {
                Self::SessionExpired
            }
            other => Self::Provider(other.to_string()),
        }
    }

    /// Message shown inline on the login and register forms.
    ///
    /// Internal details (transport, provider codes) are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::InvalidCredentials => {
                "Failed to log in. Please check your credentials.".to_string()
            }
            Self::UserAlreadyExists => "An account with this email already exists.".to_string(),
            Self::WeakPassword(detail) => detail.clone(),
            Self::UserDisabled => "This account has been disabled.".to_string(),
            Self::TooManyAttempts => {
                "Too many attempts. Please wait a moment and try again.".to_string()
            }
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::Transport(_) | Self::Provider(_) | Self::Malformed(_) | Self::PasswordHash => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes() {
        assert!(matches!(
            AuthError::from_provider_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from_provider_code("EMAIL_EXISTS"),
            AuthError::UserAlreadyExists
        ));
        assert!(matches!(
            AuthError::from_provider_code("TOKEN_EXPIRED"),
            AuthError::SessionExpired
        ));
        assert!(matches!(
            AuthError::from_provider_code("OPERATION_NOT_ALLOWED"),
            AuthError::Provider(code) if code == "OPERATION_NOT_ALLOWED"
        ));
    }

    #[test]
    fn test_weak_password_keeps_provider_detail() {
        let err = AuthError::from_provider_code(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        );
        assert_eq!(
            err.user_message(),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AuthError::Provider("PROJECT_NOT_FOUND".to_string());
        assert!(!err.user_message().contains("PROJECT"));
    }
}
