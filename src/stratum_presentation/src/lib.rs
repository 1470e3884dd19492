pub mod home;

use stratum_core::{Lifetime, ServiceRegistry};

pub use home::{
    HomeError, HomeInteractor, HomeModel, HomeViewModel, RegisteredHomeInteractor,
    RegisteredHomeModel, RegisteredHomeViewModel,
};

/// Registers the presentation bindings. The use cases must be registered separately.
pub fn register_injections(registry: &ServiceRegistry) {
    registry.register_self::<RegisteredHomeInteractor>(Lifetime::Singleton);
    registry.register_self::<RegisteredHomeModel>(Lifetime::Singleton);
}
