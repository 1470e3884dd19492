use std::sync::Arc;

use async_trait::async_trait;
use stratum_core::{
    Authentication, Injectable, InjectionError, LoginRepository, LoginRepositoryError, Resolver,
    identifiers,
};

/// Starts an interactive login that returns to the application root.
pub struct AuthenticationLoginRepository {
    authentication: Arc<dyn Authentication>,
}

impl AuthenticationLoginRepository {
    pub fn new(authentication: Arc<dyn Authentication>) -> Self {
        Self { authentication }
    }
}

#[async_trait]
impl LoginRepository for AuthenticationLoginRepository {
    #[tracing::instrument(name = "AuthenticationLoginRepository::call", skip(self))]
    async fn call(&self) -> Result<(), LoginRepositoryError> {
        Ok(self.authentication.login(Some("/")).await?)
    }
}

impl Injectable for AuthenticationLoginRepository {
    const IDENTIFIER: &'static str = identifiers::LOGIN_REPOSITORY;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(
            resolver.resolve::<dyn Authentication>(identifiers::AUTHENTICATION)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::AuthenticationStub;

    #[tokio::test]
    async fn test_login_connects_session() {
        let stub = Arc::new(AuthenticationStub::with_delay(Duration::ZERO));
        let repository = AuthenticationLoginRepository::new(stub.clone());

        repository.call().await.unwrap();

        assert!(stub.is_connected());
    }
}
