use std::sync::Arc;

use stratum_core::{
    Injectable, InjectionError, LoginRepository, Resolver, Subscription, UserRepository,
    identifiers,
};

use super::{HomeError, HomeInteractor, RegisteredHomeInteractor};

pub struct HomeModel<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    interactor: Arc<HomeInteractor<U, L>>,
}

impl<U, L> HomeModel<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    pub fn new(interactor: Arc<HomeInteractor<U, L>>) -> Self {
        Self { interactor }
    }

    pub async fn refresh(&self) -> Result<(), HomeError> {
        self.interactor.call().await
    }

    pub async fn login(&self) -> Result<(), HomeError> {
        self.interactor.login().await
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.interactor.subscribe(callback)
    }
}

impl Injectable for HomeModel<Arc<dyn UserRepository>, Arc<dyn LoginRepository>> {
    const IDENTIFIER: &'static str = identifiers::HOME_MODEL;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        Ok(Self::new(
            resolver.resolve::<RegisteredHomeInteractor>(identifiers::HOME_INTERACTOR)?,
        ))
    }
}
