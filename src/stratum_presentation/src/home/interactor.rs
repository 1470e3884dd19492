use std::sync::Arc;

use stratum_application::{LoginUseCase, RegisteredLoginUseCase, RegisteredUserUseCase, UserUseCase};
use stratum_core::{
    Injectable, InjectionError, LoginRepository, Resolver, Subscription, User, UserRepository,
    identifiers,
};

use super::HomeError;

/// Binds the user and login use cases for the home screen.
pub struct HomeInteractor<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    user_use_case: Arc<UserUseCase<U>>,
    login_use_case: Arc<LoginUseCase<L>>,
}

impl<U, L> HomeInteractor<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    pub fn new(user_use_case: Arc<UserUseCase<U>>, login_use_case: Arc<LoginUseCase<L>>) -> Self {
        Self {
            user_use_case,
            login_use_case,
        }
    }

    /// Name of every user the user use case publishes from now on.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.user_use_case
            .stream()
            .subscribe(move |user: &User| callback(user.name()))
    }

    #[tracing::instrument(name = "HomeInteractor::call", skip(self))]
    pub async fn call(&self) -> Result<(), HomeError> {
        Ok(self.user_use_case.call().await?)
    }

    #[tracing::instrument(name = "HomeInteractor::login", skip(self))]
    pub async fn login(&self) -> Result<(), HomeError> {
        Ok(self.login_use_case.call().await?)
    }
}

impl Injectable for HomeInteractor<Arc<dyn UserRepository>, Arc<dyn LoginRepository>> {
    const IDENTIFIER: &'static str = identifiers::HOME_INTERACTOR;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(
            resolver.resolve::<RegisteredUserUseCase>(identifiers::USER_USE_CASE)?,
            resolver.resolve::<RegisteredLoginUseCase>(identifiers::LOGIN_USE_CASE)?,
        ))
    }
}
