use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Lifecycle of an authentication session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Invalid authentication configuration: {0}")]
    Configuration(String),
    #[error("Provider discovery failed: {0}")]
    Discovery(String),
    #[error("Provider rejected the request: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Authorization response state does not match the request")]
    StateMismatch,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Authentication operation timed out")]
    Timeout,
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl PartialEq for AuthenticationError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Configuration(_), Self::Configuration(_)) => true,
            (Self::Discovery(_), Self::Discovery(_)) => true,
            (Self::Provider { error: a, .. }, Self::Provider { error: b, .. }) => a == b,
            (Self::Http(_), Self::Http(_)) => true,
            (Self::StateMismatch, Self::StateMismatch) => true,
            (Self::InvalidToken(_), Self::InvalidToken(_)) => true,
            (Self::Timeout, Self::Timeout) => true,
            (Self::UnexpectedError(_), Self::UnexpectedError(_)) => true,
            _ => false,
        }
    }
}

/// Port over an OpenID-Connect session.
///
/// Implementations own the redirect mechanics; callers only await the outcome.
/// Every failure is returned to the caller, nothing is retried here.
#[async_trait]
pub trait Authentication: Send + Sync {
    /// Interactive login.
    ///
    /// `callback_path` is where the session returns afterwards: an absolute URL is
    /// used as is, anything else is joined to the application origin.
    async fn login(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError>;

    /// Non-interactive re-authentication.
    async fn silent_login(&self) -> Result<(), AuthenticationError>;

    async fn logout(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError>;

    /// A currently valid access token, refreshed if it had expired.
    /// `None` when there is no session.
    async fn get_access_token(&self) -> Result<Option<String>, AuthenticationError>;

    /// Live connected signal. The receiver starts at the current token presence and
    /// changes on login, same-session logout and remote logout.
    fn is_authenticated(&self) -> watch::Receiver<bool>;

    fn session_state(&self) -> SessionState;
}
