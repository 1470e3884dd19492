pub mod use_cases;

use std::sync::Arc;

use stratum_core::{LoginRepository, ServiceRegistry, UserRepository};

pub use use_cases::{
    login::{LoginUseCase, LoginUseCaseError},
    user::{UserUseCase, UserUseCaseError},
};

/// `UserUseCase` as bound in the registry.
pub type RegisteredUserUseCase = UserUseCase<Arc<dyn UserRepository>>;
/// `LoginUseCase` as bound in the registry.
pub type RegisteredLoginUseCase = LoginUseCase<Arc<dyn LoginRepository>>;

/// Registers the use cases. Their repositories must be registered separately.
pub fn register_injections(registry: &ServiceRegistry) {
    registry.register_self::<RegisteredUserUseCase>(stratum_core::Lifetime::Singleton);
    registry.register_self::<RegisteredLoginUseCase>(stratum_core::Lifetime::Singleton);
}
