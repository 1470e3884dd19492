//! # Stratum
//!
//! Facade crate that re-exports the public APIs of the workspace layers.
//!
//! ## Structure
//!
//! - **Core**: `User`, `UserDto`, `Configuration`, the port traits, `ServiceRegistry`
//! - **Use cases**: `UserUseCase`, `LoginUseCase`
//! - **Adapters**: `OidcAuthentication`, `NetworkImpl`, repositories and their stubs
//! - **Presentation**: `HomeInteractor`, `HomeModel`, `HomeViewModel`
//! - **Composition**: `initiate` builds and installs the registry for a `Flavor`

// ============================================================================
// Core Domain Types
// ============================================================================

/// Domain types, ports and the service registry
pub mod core {
    pub use stratum_core::*;
}

pub use stratum_core::{
    Broadcast, Configuration, Flavor, Injection, InjectionError, Lifetime, ServiceRegistry,
    Subscription, User, UserDto, UserProtocol,
};

// ============================================================================
// Ports
// ============================================================================

pub use stratum_core::{
    Authentication, AuthenticationError, LoginRepository, LoginRepositoryError, Network,
    NetworkError, SessionState, UserRepository, UserRepositoryError, UserService,
};

// ============================================================================
// Use Cases (Application Layer)
// ============================================================================

/// Application use cases
pub mod use_cases {
    pub use stratum_application::*;
}

pub use stratum_application::{LoginUseCase, UserUseCase};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// OpenID-Connect session and its test stub
    pub mod authentication {
        pub use stratum_adapters::authentication::*;
    }

    /// REST client, interceptors and network implementations
    pub mod network {
        pub use stratum_adapters::network::*;
    }

    /// Repository implementations
    pub mod repositories {
        pub use stratum_adapters::repositories::*;
    }

    /// Configuration loading
    pub mod config {
        pub use stratum_adapters::config::*;
    }
}

pub use stratum_adapters::{
    AuthenticationStub, ConfigurationLoader, NetworkImpl, NetworkStub, OidcAuthentication,
};

// ============================================================================
// Presentation
// ============================================================================

pub use stratum_presentation::{
    HomeError, HomeInteractor, HomeModel, HomeViewModel, RegisteredHomeModel,
    RegisteredHomeViewModel,
};

// ============================================================================
// Composition
// ============================================================================

pub use stratum_app::{FLAVOR_ENV_VAR, configure_injection, init_tracing, initiate};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing the port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};
