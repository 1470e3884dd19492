use std::sync::Arc;

use stratum_core::{
    Injectable, InjectionError, LoginRepository, LoginRepositoryError, Resolver, identifiers,
};

/// Error types specific to login use case
#[derive(Debug, thiserror::Error)]
pub enum LoginUseCaseError {
    #[error("Login repository error: {0}")]
    LoginRepositoryError(#[from] LoginRepositoryError),
}

/// Login use case - starts an interactive login
pub struct LoginUseCase<L>
where
    L: LoginRepository,
{
    login_repository: L,
}

impl<L> LoginUseCase<L>
where
    L: LoginRepository,
{
    pub fn new(login_repository: L) -> Self {
        Self { login_repository }
    }

    /// Execute the login use case
    ///
    /// Resolves once the login flow has completed.
    #[tracing::instrument(name = "LoginUseCase::call", skip(self))]
    pub async fn call(&self) -> Result<(), LoginUseCaseError> {
        self.login_repository.call().await?;
        Ok(())
    }
}

impl Injectable for LoginUseCase<Arc<dyn LoginRepository>> {
    const IDENTIFIER: &'static str = identifiers::LOGIN_USE_CASE;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(
            resolver.resolve::<dyn LoginRepository>(identifiers::LOGIN_REPOSITORY)?,
        ))
    }
}
