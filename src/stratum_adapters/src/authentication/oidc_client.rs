use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header, jwk::JwkSet};
use secrecy::ExposeSecret;
use serde::Deserialize;
use stratum_core::{AuthenticationError, Broadcast, Subscription};
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use super::{AuthorizationResponse, OidcSettings, PkceChallenge};
use crate::config::oidc::EXPIRY_SKEW;

/// Discovery document fields used by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl TokenSet {
    pub fn expires_within(&self, skew: Duration) -> bool {
        let skew = TimeDelta::from_std(skew).unwrap_or(TimeDelta::zero());
        self.expires_at
            .is_some_and(|expires_at| expires_at - skew <= Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidcEvent {
    TokenAcquired,
    LogoutFromSameSession,
    LogoutFromAnotherSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidcNotification {
    pub event: OidcEvent,
    pub connected: bool,
}

/// An authorization request waiting for the provider's redirect.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub url: Url,
    pub state: String,
    pub nonce: String,
    pub verifier: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    nonce: Option<String>,
}

/// Authorization code + PKCE client for a single provider.
///
/// Holds the current [`TokenSet`] and publishes an [`OidcNotification`] whenever the
/// session starts or ends.
pub struct OidcClient {
    settings: OidcSettings,
    http_client: reqwest::Client,
    metadata: OnceCell<ProviderMetadata>,
    tokens: ArcSwapOption<TokenSet>,
    events: Broadcast<OidcNotification>,
    refresh_lock: Mutex<()>,
}

impl OidcClient {
    pub fn new(settings: OidcSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
            metadata: OnceCell::new(),
            tokens: ArcSwapOption::empty(),
            events: Broadcast::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &OidcSettings {
        &self.settings
    }

    pub fn tokens(&self) -> Option<Arc<TokenSet>> {
        self.tokens.load_full()
    }

    pub fn is_connected(&self) -> bool {
        self.tokens.load().is_some()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&OidcNotification) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    /// Fetches the discovery document once and caches it.
    pub async fn metadata(&self) -> Result<&ProviderMetadata, AuthenticationError> {
        self.metadata
            .get_or_try_init(|| async {
                let url = self.settings.discovery_url();
                tracing::debug!(%url, "Fetching provider metadata");
                let response = self
                    .http_client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AuthenticationError::Discovery(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(AuthenticationError::Discovery(format!(
                        "{url} returned {}",
                        response.status()
                    )));
                }
                response
                    .json::<ProviderMetadata>()
                    .await
                    .map_err(|e| AuthenticationError::Discovery(e.to_string()))
            })
            .await
    }

    pub async fn begin_authorization(
        &self,
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<PendingAuthorization, AuthenticationError> {
        let metadata = self.metadata().await?;
        let pkce = PkceChallenge::generate();
        let state = uuid::Uuid::new_v4().to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| AuthenticationError::Discovery(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.settings.client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.settings.scope)
                .append_pair("state", &state)
                .append_pair("nonce", &nonce)
                .append_pair("code_challenge", &pkce.challenge)
                .append_pair("code_challenge_method", PkceChallenge::METHOD);
            if let Some(prompt) = prompt {
                query.append_pair("prompt", prompt);
            }
        }

        Ok(PendingAuthorization {
            url,
            state,
            nonce,
            verifier: pkce.verifier,
            redirect_uri: redirect_uri.to_owned(),
        })
    }

    /// Validates the redirect parameters and exchanges the code for tokens.
    #[tracing::instrument(name = "OidcClient::complete_authorization", skip_all)]
    pub async fn complete_authorization(
        &self,
        pending: &PendingAuthorization,
        response: AuthorizationResponse,
    ) -> Result<Arc<TokenSet>, AuthenticationError> {
        if let Some(error) = response.error {
            return Err(AuthenticationError::Provider {
                error,
                description: response.error_description,
            });
        }
        if response.state.as_deref() != Some(pending.state.as_str()) {
            return Err(AuthenticationError::StateMismatch);
        }
        let code = response.code.ok_or_else(|| {
            AuthenticationError::UnexpectedError("authorization response has no code".to_owned())
        })?;

        let mut form = vec![
            ("grant_type", "authorization_code".to_owned()),
            ("code", code),
            ("redirect_uri", pending.redirect_uri.clone()),
            ("code_verifier", pending.verifier.clone()),
        ];
        self.append_client_credentials(&mut form);

        let tokens = self.request_tokens(&form).await?;
        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or_else(|| AuthenticationError::InvalidToken("missing id_token".to_owned()))?;
        self.verify_id_token(id_token, Some(&pending.nonce)).await?;

        Ok(self.store(tokens))
    }

    /// Exchanges the refresh token. Concurrent callers share one request.
    #[tracing::instrument(name = "OidcClient::refresh", skip_all)]
    pub async fn refresh(&self) -> Result<Arc<TokenSet>, AuthenticationError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens.load_full().ok_or_else(|| {
            AuthenticationError::UnexpectedError("no session to refresh".to_owned())
        })?;
        if !current.expires_within(EXPIRY_SKEW) && current.expires_at.is_some() {
            // Refreshed by another caller while this one waited.
            return Ok(current);
        }
        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            AuthenticationError::UnexpectedError("session has no refresh token".to_owned())
        })?;

        let mut form = vec![
            ("grant_type", "refresh_token".to_owned()),
            ("refresh_token", refresh_token),
        ];
        self.append_client_credentials(&mut form);

        let mut tokens = self.request_tokens(&form).await?;
        if let Some(id_token) = tokens.id_token.as_deref() {
            self.verify_id_token(id_token, None).await?;
        }
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = current.refresh_token.clone();
        }
        if tokens.id_token.is_none() {
            tokens.id_token = current.id_token.clone();
        }

        Ok(self.store(tokens))
    }

    /// Current access token, refreshed when it is about to expire.
    ///
    /// `None` when there is no session, or when it expired and cannot be refreshed.
    pub async fn valid_access_token(&self) -> Result<Option<String>, AuthenticationError> {
        let Some(tokens) = self.tokens.load_full() else {
            return Ok(None);
        };
        if !tokens.expires_within(EXPIRY_SKEW) {
            return Ok(Some(tokens.access_token.clone()));
        }
        if tokens.refresh_token.is_none() {
            tracing::debug!("Access token expired and no refresh token is available");
            return Ok(None);
        }
        let refreshed = self.refresh().await?;
        Ok(Some(refreshed.access_token.clone()))
    }

    /// Provider end-session URL, or `None` if the provider does not advertise one.
    pub async fn end_session_url(
        &self,
        post_logout_redirect_uri: &str,
    ) -> Result<Option<Url>, AuthenticationError> {
        let metadata = self.metadata().await?;
        let Some(endpoint) = metadata.end_session_endpoint.as_deref() else {
            return Ok(None);
        };

        let mut url =
            Url::parse(endpoint).map_err(|e| AuthenticationError::Discovery(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(id_token) = self.tokens.load().as_ref().and_then(|t| t.id_token.clone())
            {
                query.append_pair("id_token_hint", &id_token);
            }
            query
                .append_pair("post_logout_redirect_uri", post_logout_redirect_uri)
                .append_pair("client_id", &self.settings.client_id);
        }
        Ok(Some(url))
    }

    /// Drops the tokens and notifies subscribers.
    pub fn clear_session(&self, event: OidcEvent) {
        let had_session = self.tokens.swap(None).is_some();
        tracing::info!(?event, had_session, "Session cleared");
        self.events.publish(&OidcNotification {
            event,
            connected: false,
        });
    }

    /// The provider reported that the session ended elsewhere.
    pub fn notify_remote_logout(&self) {
        self.clear_session(OidcEvent::LogoutFromAnotherSession);
    }

    fn append_client_credentials(&self, form: &mut Vec<(&'static str, String)>) {
        form.push(("client_id", self.settings.client_id.clone()));
        if let Some(secret) = &self.settings.client_secret {
            form.push(("client_secret", secret.expose_secret().clone()));
        }
    }

    fn store(&self, response: TokenResponse) -> Arc<TokenSet> {
        let tokens = Arc::new(TokenSet {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_owned()),
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            expires_at: response
                .expires_in
                .map(|seconds| Utc::now() + TimeDelta::seconds(seconds)),
            scope: response.scope,
        });
        self.tokens.store(Some(Arc::clone(&tokens)));
        tracing::info!(expires_at = ?tokens.expires_at, "Tokens acquired");

        self.events.publish(&OidcNotification {
            event: OidcEvent::TokenAcquired,
            connected: true,
        });
        tokens
    }

    async fn request_tokens(
        &self,
        form: &[(&'static str, String)],
    ) -> Result<TokenResponse, AuthenticationError> {
        let token_endpoint = &self.metadata().await?.token_endpoint;
        let response = self
            .http_client
            .post(token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthenticationError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => AuthenticationError::Provider {
                    error: error.error,
                    description: error.error_description,
                },
                Err(_) => {
                    AuthenticationError::Http(format!("token endpoint returned {status}"))
                }
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthenticationError::InvalidToken(e.to_string()))
    }

    async fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: Option<&str>,
    ) -> Result<(), AuthenticationError> {
        let metadata = self.metadata().await?;
        let header =
            decode_header(id_token).map_err(|e| AuthenticationError::InvalidToken(e.to_string()))?;

        let jwks = self
            .http_client
            .get(&metadata.jwks_uri)
            .send()
            .await
            .map_err(|e| AuthenticationError::Http(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthenticationError::InvalidToken(format!("invalid jwks: {e}")))?;
        let jwk = match header.kid.as_deref() {
            Some(kid) => jwks.find(kid),
            None => jwks.keys.first(),
        }
        .ok_or_else(|| AuthenticationError::InvalidToken("no matching signing key".to_owned()))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| AuthenticationError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[metadata.issuer.as_str()]);
        validation.set_audience(&[self.settings.client_id.as_str()]);

        let claims = decode::<IdTokenClaims>(id_token, &key, &validation)
            .map_err(|e| AuthenticationError::InvalidToken(e.to_string()))?
            .claims;
        if expected_nonce.is_some_and(|expected| claims.nonce.as_deref() != Some(expected)) {
            return Err(AuthenticationError::InvalidToken("nonce mismatch".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex as StdMutex;

    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use stratum_core::Configuration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const SIGNING_KEY: &str = include_str!("../../fixtures/oidc/signing_key.pem");
    const SIGNING_KEY_N: &str = include_str!("../../fixtures/oidc/signing_key.n");
    pub(crate) const KID: &str = "test-key";

    pub(crate) fn id_token(issuer: &str, audience: &str, nonce: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KID.to_owned());
        let claims = json!({
            "iss": issuer,
            "aud": audience,
            "sub": "user-1",
            "exp": (Utc::now() + TimeDelta::hours(1)).timestamp(),
            "iat": Utc::now().timestamp(),
            "nonce": nonce,
        });
        encode(
            &header,
            &claims,
            &EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    /// Mounts discovery and JWKS for a provider served by `server`.
    pub(crate) async fn mount_provider(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": server.uri(),
                "authorization_endpoint": format!("{}/auth", server.uri()),
                "token_endpoint": format!("{}/token", server.uri()),
                "jwks_uri": format!("{}/certs", server.uri()),
                "end_session_endpoint": format!("{}/logout", server.uri()),
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{
                    "kty": "RSA",
                    "kid": KID,
                    "use": "sig",
                    "alg": "RS256",
                    "n": SIGNING_KEY_N.trim(),
                    "e": "AQAB",
                }]
            })))
            .mount(server)
            .await;
    }

    pub(crate) fn settings_for(server: &MockServer) -> OidcSettings {
        let mut configuration = Configuration::stub();
        configuration.authentication.authority = Some(server.uri());
        OidcSettings::from_configuration(&configuration).unwrap()
    }

    fn client_for(server: &MockServer) -> OidcClient {
        OidcClient::new(settings_for(server), reqwest::Client::new())
    }

    fn redirect_for(pending: &PendingAuthorization) -> AuthorizationResponse {
        AuthorizationResponse {
            code: Some("code-1".to_owned()),
            state: Some(pending.state.clone()),
            ..Default::default()
        }
    }

    async fn mount_token(server: &MockServer, grant: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("grant_type={grant}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_authorization_url_carries_pkce_and_state() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);

        let pending = client
            .begin_authorization("http://localhost:5173/", Some("none"))
            .await
            .unwrap();
        let query: std::collections::HashMap<String, String> =
            pending.url.query_pairs().into_owned().collect();

        assert_eq!(pending.url.path(), "/auth");
        assert_eq!(query["client_id"], "client-id");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["state"], pending.state);
        assert_eq!(query["nonce"], pending.nonce);
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(
            query["code_challenge"],
            PkceChallenge::challenge_for(&pending.verifier)
        );
        assert_eq!(query["prompt"], "none");
    }

    #[tokio::test]
    async fn test_code_exchange_stores_tokens_and_notifies() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", None)
            .await
            .unwrap();
        mount_token(
            &server,
            "authorization_code",
            json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "refresh_token": "refresh-1",
                "expires_in": 300,
                "id_token": id_token(&server.uri(), "client-id", Some(&pending.nonce)),
            }),
        )
        .await;

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = client.subscribe(move |n| sink.lock().unwrap().push(*n));

        client
            .complete_authorization(&pending, redirect_for(&pending))
            .await
            .unwrap();

        assert!(client.is_connected());
        assert_eq!(
            client.valid_access_token().await.unwrap().as_deref(),
            Some("access-1")
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![OidcNotification {
                event: OidcEvent::TokenAcquired,
                connected: true
            }]
        );
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", None)
            .await
            .unwrap();

        let response = AuthorizationResponse {
            code: Some("code-1".to_owned()),
            state: Some("forged".to_owned()),
            ..Default::default()
        };
        let result = client.complete_authorization(&pending, response).await;

        assert_eq!(result.unwrap_err(), AuthenticationError::StateMismatch);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", Some("none"))
            .await
            .unwrap();

        let response = AuthorizationResponse {
            error: Some("login_required".to_owned()),
            state: Some(pending.state.clone()),
            ..Default::default()
        };
        let result = client.complete_authorization(&pending, response).await;

        assert!(matches!(
            result,
            Err(AuthenticationError::Provider { ref error, .. }) if error == "login_required"
        ));
    }

    #[tokio::test]
    async fn test_nonce_mismatch_is_rejected() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", None)
            .await
            .unwrap();
        mount_token(
            &server,
            "authorization_code",
            json!({
                "access_token": "access-1",
                "id_token": id_token(&server.uri(), "client-id", Some("another-nonce")),
            }),
        )
        .await;

        let result = client
            .complete_authorization(&pending, redirect_for(&pending))
            .await;

        assert!(matches!(result, Err(AuthenticationError::InvalidToken(_))));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", None)
            .await
            .unwrap();
        mount_token(
            &server,
            "authorization_code",
            json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 0,
                "id_token": id_token(&server.uri(), "client-id", Some(&pending.nonce)),
            }),
        )
        .await;
        mount_token(
            &server,
            "refresh_token",
            json!({ "access_token": "access-2", "expires_in": 300 }),
        )
        .await;
        client
            .complete_authorization(&pending, redirect_for(&pending))
            .await
            .unwrap();

        let token = client.valid_access_token().await.unwrap();

        assert_eq!(token.as_deref(), Some("access-2"));
        let tokens = client.tokens().unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert!(tokens.id_token.is_some());
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_token_is_absent() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);
        let pending = client
            .begin_authorization("http://localhost:5173/", None)
            .await
            .unwrap();
        mount_token(
            &server,
            "authorization_code",
            json!({
                "access_token": "access-1",
                "expires_in": 0,
                "id_token": id_token(&server.uri(), "client-id", Some(&pending.nonce)),
            }),
        )
        .await;
        client
            .complete_authorization(&pending, redirect_for(&pending))
            .await
            .unwrap();

        assert_eq!(client.valid_access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remote_logout_disconnects() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = client.subscribe(move |n| sink.lock().unwrap().push(*n));

        client.notify_remote_logout();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![OidcNotification {
                event: OidcEvent::LogoutFromAnotherSession,
                connected: false
            }]
        );
        assert_eq!(client.valid_access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_end_session_url() {
        let server = MockServer::start().await;
        mount_provider(&server).await;
        let client = client_for(&server);

        let url = client
            .end_session_url("http://localhost:5173/portal/")
            .await
            .unwrap()
            .unwrap();
        let query: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/logout");
        assert_eq!(query["post_logout_redirect_uri"], "http://localhost:5173/portal/");
        assert!(!query.contains_key("id_token_hint"));
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let result = client.metadata().await;

        assert!(matches!(result, Err(AuthenticationError::Discovery(_))));
    }
}
