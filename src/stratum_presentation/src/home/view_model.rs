use std::sync::Arc;

use stratum_core::{
    Injection, InjectionError, LoginRepository, ServiceRegistry, Subscription, UserRepository,
    identifiers,
};
use tokio::sync::watch;

use super::{HomeError, HomeModel, RegisteredHomeModel, RegisteredHomeViewModel};

/// Headless state of the home screen.
///
/// Holds the latest user name published while it is alive. Without a model every
/// action is a no-op and the name stays empty.
pub struct HomeViewModel<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    model: Option<Arc<HomeModel<U, L>>>,
    user_name: Arc<watch::Sender<String>>,
    _subscription: Option<Subscription>,
}

impl<U, L> HomeViewModel<U, L>
where
    U: UserRepository,
    L: LoginRepository,
{
    pub fn new(model: Option<Arc<HomeModel<U, L>>>) -> Self {
        let user_name = Arc::new(watch::Sender::new(String::new()));
        let subscription = model.as_ref().map(|model| {
            let sink = Arc::clone(&user_name);
            model.subscribe(move |name| {
                sink.send_replace(name.to_owned());
            })
        });

        Self {
            model,
            user_name,
            _subscription: subscription,
        }
    }

    pub fn user_name(&self) -> String {
        self.user_name.borrow().clone()
    }

    /// Receiver notified on every name change.
    pub fn changes(&self) -> watch::Receiver<String> {
        self.user_name.subscribe()
    }

    pub fn greeting(&self) -> String {
        format!("Bonjour {}", *self.user_name.borrow())
    }

    pub async fn refresh(&self) -> Result<(), HomeError> {
        match &self.model {
            Some(model) => model.refresh().await,
            None => Ok(()),
        }
    }

    pub async fn login(&self) -> Result<(), HomeError> {
        match &self.model {
            Some(model) => model.login().await,
            None => Ok(()),
        }
    }

    /// Logs in, then refreshes the user.
    pub async fn start(&self) -> Result<(), HomeError> {
        self.login().await?;
        self.refresh().await
    }
}

impl RegisteredHomeViewModel {
    pub fn from_registry(registry: &ServiceRegistry) -> Result<Self, InjectionError> {
        Ok(Self::new(
            registry.get::<RegisteredHomeModel>(identifiers::HOME_MODEL)?,
        ))
    }

    /// Resolves the model from the installed [`Injection`] registry.
    pub fn from_injection() -> Result<Self, InjectionError> {
        Ok(Self::new(Injection::get::<RegisteredHomeModel>(
            identifiers::HOME_MODEL,
        )?))
    }
}
