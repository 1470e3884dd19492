use std::sync::Arc;

use async_trait::async_trait;
use stratum_core::{
    Injectable, InjectionError, Network, Resolver, UserDto, UserRepository, UserRepositoryError,
    identifiers,
};

/// Fetches the current user through the [`Network`] user service.
pub struct NetworkUserRepository {
    network: Arc<dyn Network>,
}

impl NetworkUserRepository {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self { network }
    }
}

#[async_trait]
impl UserRepository for NetworkUserRepository {
    #[tracing::instrument(name = "NetworkUserRepository::call", skip(self))]
    async fn call(&self) -> Result<UserDto, UserRepositoryError> {
        Ok(self.network.user_service().get_user().await?)
    }
}

impl Injectable for NetworkUserRepository {
    const IDENTIFIER: &'static str = identifiers::USER_REPOSITORY;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(resolver.resolve::<dyn Network>(identifiers::NETWORK)?))
    }
}
