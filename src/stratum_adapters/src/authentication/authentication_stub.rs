use std::time::Duration;

use async_trait::async_trait;
use stratum_core::{Authentication, AuthenticationError, SessionState};
use tokio::sync::watch;

use crate::config::test::{ACCESS_TOKEN, SIMULATED_DELAY};

/// In-memory [`Authentication`] for the test flavor. Every call succeeds after a
/// short simulated delay.
pub struct AuthenticationStub {
    connected: watch::Sender<bool>,
    delay: Duration,
}

impl Default for AuthenticationStub {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationStub {
    pub fn new() -> Self {
        Self::with_delay(SIMULATED_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            connected: watch::Sender::new(false),
            delay,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Overrides the connected flag without going through login or logout.
    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }
}

#[async_trait]
impl Authentication for AuthenticationStub {
    async fn login(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError> {
        tracing::debug!(?callback_path, "Stub login");
        self.set_connected(true);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn silent_login(&self) -> Result<(), AuthenticationError> {
        self.set_connected(true);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn logout(&self, callback_path: Option<&str>) -> Result<(), AuthenticationError> {
        tracing::debug!(?callback_path, "Stub logout");
        self.set_connected(false);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn get_access_token(&self) -> Result<Option<String>, AuthenticationError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(ACCESS_TOKEN.to_owned()))
    }

    fn is_authenticated(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    fn session_state(&self) -> SessionState {
        if self.is_connected() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_login_sets_signal_before_delay() {
        let stub = Arc::new(AuthenticationStub::new());
        let login = tokio::spawn({
            let stub = Arc::clone(&stub);
            async move { stub.login(None).await }
        });

        tokio::task::yield_now().await;
        tokio::time::advance(SIMULATED_DELAY / 2).await;

        assert!(stub.is_connected());
        assert!(*stub.is_authenticated().borrow());
        assert!(!login.is_finished());

        login.await.unwrap().unwrap();
    }

    #[test]
    fn test_set_connected_is_visible_immediately() {
        let stub = AuthenticationStub::new();
        let signal = stub.is_authenticated();

        stub.set_connected(true);

        assert!(*signal.borrow());
        assert!(*stub.is_authenticated().borrow());

        stub.set_connected(false);

        assert!(!*signal.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_resolves_after_delay() {
        let stub = AuthenticationStub::new();
        let mut signal = stub.is_authenticated();
        assert!(!*signal.borrow_and_update());

        let started = tokio::time::Instant::now();
        stub.login(None).await.unwrap();

        assert!(started.elapsed() >= SIMULATED_DELAY);
        assert!(signal.has_changed().unwrap());
        assert!(*signal.borrow_and_update());
        assert_eq!(stub.session_state(), SessionState::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_signal() {
        let stub = AuthenticationStub::new();
        stub.set_connected(true);

        stub.logout(Some("/portal")).await.unwrap();

        assert!(!stub.is_connected());
        assert_eq!(stub.session_state(), SessionState::Anonymous);
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_token_is_fixed() {
        let stub = AuthenticationStub::new();

        assert_eq!(
            stub.get_access_token().await.unwrap().as_deref(),
            Some("access-token")
        );
    }
}
