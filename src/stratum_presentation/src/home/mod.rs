pub mod interactor;
pub mod model;
pub mod view_model;

use std::sync::Arc;

use stratum_application::{LoginUseCaseError, UserUseCaseError};
use stratum_core::{LoginRepository, UserRepository};

pub use interactor::HomeInteractor;
pub use model::HomeModel;
pub use view_model::HomeViewModel;

pub type RegisteredHomeInteractor =
    HomeInteractor<Arc<dyn UserRepository>, Arc<dyn LoginRepository>>;
pub type RegisteredHomeModel = HomeModel<Arc<dyn UserRepository>, Arc<dyn LoginRepository>>;
pub type RegisteredHomeViewModel =
    HomeViewModel<Arc<dyn UserRepository>, Arc<dyn LoginRepository>>;

#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("Refresh failed: {0}")]
    Refresh(#[from] UserUseCaseError),
    #[error("Login failed: {0}")]
    Login(#[from] LoginUseCaseError),
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use stratum_core::{
        AuthenticationError, LoginRepository, LoginRepositoryError, UserDto, UserRepository,
        UserRepositoryError,
    };

    /// Returns `Alice <n>` where `n` counts previous calls.
    #[derive(Default)]
    pub struct MockUserRepository {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn call(&self) -> Result<UserDto, UserRepositoryError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UserDto::new(format!("Alice {n}"), "alice@example.com"))
        }
    }

    #[derive(Default)]
    pub struct MockLoginRepository {
        pub calls: AtomicUsize,
        pub reject: bool,
    }

    #[async_trait]
    impl LoginRepository for MockLoginRepository {
        async fn call(&self) -> Result<(), LoginRepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(AuthenticationError::Provider {
                    error: "access_denied".to_owned(),
                    description: None,
                }
                .into());
            }
            Ok(())
        }
    }
}
