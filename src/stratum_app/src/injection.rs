use std::path::PathBuf;
use std::sync::Arc;

use stratum_adapters::{
    AuthenticationLoginRepository, AuthenticationStub, ConfigurationLoader, NetworkImpl,
    NetworkStub, NetworkUserRepository, OidcAuthentication,
};
use stratum_core::{
    Authentication, Configuration, Flavor, Injectable, Injection, InjectionError, Lifetime,
    LoginRepository, Network, ServiceRegistry, UserRepository, identifiers,
};

/// Selects the flavor for binaries: `release` or `test`.
pub const FLAVOR_ENV_VAR: &str = "STRATUM_FLAVOR";

/// JSON responses served by the test flavor's network.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

/// Registers configuration, authentication, network and repositories for `flavor`.
pub fn configure_injection(registry: &ServiceRegistry, flavor: Flavor) {
    tracing::info!(%flavor, "Configuring injection");

    match flavor {
        Flavor::Release => {
            registry.register::<Configuration, _>(
                identifiers::CONFIGURATION,
                Lifetime::Singleton,
                |_| {
                    ConfigurationLoader::load()
                        .map(Arc::new)
                        .map_err(|e| InjectionError::Construction {
                            identifier: identifiers::CONFIGURATION.to_owned(),
                            reason: e.to_string(),
                        })
                },
            );
            registry.register::<dyn Authentication, _>(
                identifiers::AUTHENTICATION,
                Lifetime::Singleton,
                |resolver| {
                    Ok(Arc::new(OidcAuthentication::inject(resolver)?) as Arc<dyn Authentication>)
                },
            );
            registry.register::<dyn Network, _>(
                identifiers::NETWORK,
                Lifetime::Singleton,
                |resolver| Ok(Arc::new(NetworkImpl::inject(resolver)?) as Arc<dyn Network>),
            );
        }
        Flavor::Test => {
            registry.register_instance::<Configuration>(
                identifiers::CONFIGURATION,
                Arc::new(Configuration::stub()),
            );
            registry.register::<dyn Authentication, _>(
                identifiers::AUTHENTICATION,
                Lifetime::Singleton,
                |_| Ok(Arc::new(AuthenticationStub::new()) as Arc<dyn Authentication>),
            );
            registry.register::<dyn Network, _>(
                identifiers::NETWORK,
                Lifetime::Singleton,
                |resolver| {
                    let configuration =
                        resolver.resolve::<Configuration>(identifiers::CONFIGURATION)?;
                    Ok(Arc::new(NetworkStub::new(configuration, fixtures_dir())) as Arc<dyn Network>)
                },
            );
        }
    }

    registry.register::<dyn UserRepository, _>(
        identifiers::USER_REPOSITORY,
        Lifetime::Factory,
        |resolver| {
            Ok(Arc::new(NetworkUserRepository::inject(resolver)?) as Arc<dyn UserRepository>)
        },
    );
    registry.register::<dyn LoginRepository, _>(
        identifiers::LOGIN_REPOSITORY,
        Lifetime::Factory,
        |resolver| {
            Ok(Arc::new(AuthenticationLoginRepository::inject(resolver)?)
                as Arc<dyn LoginRepository>)
        },
    );
}

/// Builds a fresh registry for `flavor`, installs it as the process-wide
/// [`Injection`] registry and returns it. Nothing carries over from a previous call.
pub fn initiate(flavor: Flavor) -> Arc<ServiceRegistry> {
    let registry = Arc::new(ServiceRegistry::new());

    configure_injection(&registry, flavor);
    stratum_application::register_injections(&registry);
    stratum_presentation::register_injections(&registry);

    Injection::install(Arc::clone(&registry));
    tracing::debug!(registrations = registry.len(), "Registry installed");
    registry
}
