use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use stratum_core::{
    Authentication, AuthenticationError, Configuration, Injectable, InjectionError, Resolver,
    SessionState, Subscription, identifiers,
};
use tokio::sync::watch;

use super::{AuthorizationAgent, HttpRedirectAgent, OidcClient, OidcEvent, OidcSettings};
use crate::config::prod::HTTP_TIMEOUT;

/// Counts an operation as in flight until dropped, including when the caller
/// abandons the future.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// [`Authentication`] backed by an OpenID-Connect provider.
pub struct OidcAuthentication {
    configuration: Arc<Configuration>,
    client: Arc<OidcClient>,
    agent: Arc<dyn AuthorizationAgent>,
    connected: Arc<watch::Sender<bool>>,
    in_flight: AtomicUsize,
    return_url: ArcSwapOption<String>,
    timeout: Option<Duration>,
    _events: Subscription,
}

impl OidcAuthentication {
    pub fn new(
        configuration: Arc<Configuration>,
        client: Arc<OidcClient>,
        agent: Arc<dyn AuthorizationAgent>,
    ) -> Self {
        let connected = Arc::new(watch::Sender::new(client.is_connected()));
        let sink = Arc::clone(&connected);
        let events = client.subscribe(move |notification| {
            sink.send_replace(notification.connected);
        });

        Self {
            configuration,
            client,
            agent,
            connected,
            in_flight: AtomicUsize::new(0),
            return_url: ArcSwapOption::empty(),
            timeout: None,
            _events: events,
        }
    }

    /// Builds the client and a [`HttpRedirectAgent`] from `configuration`.
    pub fn from_configuration(
        configuration: Arc<Configuration>,
    ) -> Result<Self, AuthenticationError> {
        let settings = OidcSettings::from_configuration(&configuration)?;
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AuthenticationError::Http(e.to_string()))?;
        let client = Arc::new(OidcClient::new(settings, http_client));
        let agent = Arc::new(HttpRedirectAgent::new()?);
        Ok(Self::new(configuration, client, agent))
    }

    /// Fails any operation that takes longer than `timeout` with
    /// [`AuthenticationError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn client(&self) -> &Arc<OidcClient> {
        &self.client
    }

    /// Where the application continues after the last interactive login.
    pub fn return_url(&self) -> Option<Arc<String>> {
        self.return_url.load_full()
    }

    /// The provider reported that the session ended in another application.
    pub fn handle_remote_logout(&self) {
        self.client.notify_remote_logout();
    }

    async fn bounded<F, T>(&self, operation: F) -> Result<T, AuthenticationError>
    where
        F: Future<Output = Result<T, AuthenticationError>>,
    {
        let _in_flight = InFlight::enter(&self.in_flight);
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, operation)
                .await
                .unwrap_or(Err(AuthenticationError::Timeout)),
            None => operation.await,
        }
    }

    async fn interactive(
        &self,
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<(), AuthenticationError> {
        let pending = self.client.begin_authorization(redirect_uri, prompt).await?;
        let response = self
            .agent
            .authorize(pending.url.clone(), &pending.redirect_uri)
            .await?;
        self.client.complete_authorization(&pending, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Authentication for OidcAuthentication {
    #[tracing::instrument(name = "OidcAuthentication::login", skip(self))]
    async fn login(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError> {
        let return_url = self.configuration.origin_url(callback_path);
        self.return_url.store(Some(Arc::new(return_url)));

        let redirect_uri = self.client.settings().redirect_uri.clone();
        self.bounded(self.interactive(&redirect_uri, None)).await
    }

    #[tracing::instrument(name = "OidcAuthentication::silent_login", skip(self))]
    async fn silent_login(&self) -> Result<(), AuthenticationError> {
        self.bounded(async {
            let can_refresh = self
                .client
                .tokens()
                .is_some_and(|tokens| tokens.refresh_token.is_some());
            if can_refresh {
                match self.client.refresh().await {
                    Ok(_) => return Ok(()),
                    Err(e) => tracing::warn!(error = %e, "Refresh failed, retrying silently"),
                }
            }

            let redirect_uri = self.client.settings().silent_redirect_uri.clone();
            self.interactive(&redirect_uri, Some("none")).await
        })
        .await
    }

    #[tracing::instrument(name = "OidcAuthentication::logout", skip(self))]
    async fn logout(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError> {
        let post_logout_redirect_uri = match callback_path {
            Some(_) => self.configuration.origin_url(callback_path),
            None => self.client.settings().post_logout_redirect_uri.clone(),
        };

        self.bounded(async {
            // The id token hint must be read before the session is cleared.
            let end_session = self.client.end_session_url(&post_logout_redirect_uri).await;
            self.client.clear_session(OidcEvent::LogoutFromSameSession);

            if let Some(url) = end_session? {
                self.agent.end_session(url).await?;
            }
            Ok(())
        })
        .await
    }

    async fn get_access_token(&self) -> Result<Option<String>, AuthenticationError> {
        self.bounded(self.client.valid_access_token()).await
    }

    fn is_authenticated(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    fn session_state(&self) -> SessionState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SessionState::Authenticating
        } else if self.client.is_connected() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }
}

impl Injectable for OidcAuthentication {
    const IDENTIFIER: &'static str = identifiers::AUTHENTICATION;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        let configuration = resolver.resolve::<Configuration>(identifiers::CONFIGURATION)?;
        Self::from_configuration(configuration).map_err(|e| InjectionError::Construction {
            identifier: Self::IDENTIFIER.to_owned(),
            reason: e.to_string(),
        })
    }
}
