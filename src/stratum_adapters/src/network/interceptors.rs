use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use stratum_core::{Authentication, NetworkError};

use super::{Interception, OutgoingRequest, RequestInterceptor};

/// Adds `Authorization: Bearer <token>` when a session exists.
pub struct BearerTokenInterceptor {
    authentication: Arc<dyn Authentication>,
}

impl BearerTokenInterceptor {
    pub fn new(authentication: Arc<dyn Authentication>) -> Self {
        Self { authentication }
    }
}

#[async_trait]
impl RequestInterceptor for BearerTokenInterceptor {
    async fn intercept(&self, request: &mut OutgoingRequest) -> Result<Interception, NetworkError> {
        if let Some(token) = self.authentication.get_access_token().await? {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| NetworkError::Request(e.to_string()))?;
            request.headers.insert(AUTHORIZATION, value);
        }
        Ok(Interception::Continue)
    }
}

/// Answers requests from JSON files under `root`.
///
/// `GET /api/v1/user` is read from `{root}/api/v1/user/get.json`. A missing or
/// unreadable fixture lets the request through.
pub struct FixtureInterceptor {
    root: PathBuf,
}

impl FixtureInterceptor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn fixture_path(&self, request: &OutgoingRequest) -> PathBuf {
        self.root
            .join(request.url.path().trim_start_matches('/'))
            .join(format!("{}.json", request.method.as_str().to_lowercase()))
    }
}

#[async_trait]
impl RequestInterceptor for FixtureInterceptor {
    async fn intercept(&self, request: &mut OutgoingRequest) -> Result<Interception, NetworkError> {
        let path = self.fixture_path(request);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Fixture not readable");
                return Ok(Interception::Continue);
            }
        };

        match serde_json::from_slice(&contents) {
            Ok(body) => Ok(Interception::Respond(body)),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Fixture is not valid JSON");
                Ok(Interception::Continue)
            }
        }
    }
}
