use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect::Policy};
use stratum_core::AuthenticationError;
use url::Url;

use crate::config::oidc::MAX_REDIRECTS;

/// Parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationResponse {
    pub fn from_redirect(url: &Url) -> Self {
        let mut response = Self::default();
        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => response.code = value,
                "state" => response.state = value,
                "error" => response.error = value,
                "error_description" => response.error_description = value,
                _ => {}
            }
        }
        response
    }
}

/// Drives the user agent part of the authorization code flow.
#[async_trait]
pub trait AuthorizationAgent: Send + Sync {
    /// Opens `url` and waits until the provider redirects back to `redirect_uri`.
    async fn authorize(
        &self,
        url: Url,
        redirect_uri: &str,
    ) -> Result<AuthorizationResponse, AuthenticationError>;

    /// Opens the provider's end-session URL.
    async fn end_session(&self, url: Url) -> Result<(), AuthenticationError>;
}

/// Follows provider redirects over plain HTTP, keeping cookies between hops.
///
/// Only completes when the provider can answer without user interaction, e.g. an
/// existing provider session or `prompt=none`.
pub struct HttpRedirectAgent {
    http_client: reqwest::Client,
}

impl HttpRedirectAgent {
    pub fn new() -> Result<Self, AuthenticationError> {
        let http_client = reqwest::Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .build()
            .map_err(|e| AuthenticationError::Http(e.to_string()))?;
        Ok(Self { http_client })
    }

    async fn next_location(&self, url: &Url) -> Result<Option<Url>, AuthenticationError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuthenticationError::Http(e.to_string()))?;

        if !response.status().is_redirection() {
            return Ok(None);
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AuthenticationError::Http(format!("redirect from {url} without a location"))
            })?;
        url.join(location)
            .map(Some)
            .map_err(|e| AuthenticationError::Http(format!("invalid redirect `{location}`: {e}")))
    }
}

#[async_trait]
impl AuthorizationAgent for HttpRedirectAgent {
    #[tracing::instrument(name = "HttpRedirectAgent::authorize", skip_all)]
    async fn authorize(
        &self,
        url: Url,
        redirect_uri: &str,
    ) -> Result<AuthorizationResponse, AuthenticationError> {
        let mut current = url;
        for _ in 0..MAX_REDIRECTS {
            let Some(next) = self.next_location(&current).await? else {
                return Err(AuthenticationError::UnexpectedError(format!(
                    "authorization stopped at {} without redirecting back",
                    current.path()
                )));
            };
            if next.as_str().starts_with(redirect_uri) {
                return Ok(AuthorizationResponse::from_redirect(&next));
            }
            current = next;
        }
        Err(AuthenticationError::UnexpectedError(format!(
            "more than {MAX_REDIRECTS} redirects during authorization"
        )))
    }

    #[tracing::instrument(name = "HttpRedirectAgent::end_session", skip_all)]
    async fn end_session(&self, url: Url) -> Result<(), AuthenticationError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthenticationError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }
        Err(AuthenticationError::Http(format!(
            "end session returned {status}"
        )))
    }
}
