pub mod broadcast;
pub mod configuration;
pub mod domain;
pub mod flavor;
pub mod injection;
pub mod ports;
pub mod protocols;

// Re-export commonly used types for convenience
pub use domain::user::User;

pub use protocols::{user_dto::UserDto, user_protocol::UserProtocol};

pub use ports::{
    authentication::{Authentication, AuthenticationError, SessionState},
    network::{Network, NetworkError, UserService},
    repositories::{LoginRepository, LoginRepositoryError, UserRepository, UserRepositoryError},
};

pub use broadcast::{Broadcast, Subscription};
pub use configuration::{
    ApiConfiguration, ApplicationConfiguration, AuthenticationConfiguration, Configuration,
    resolve_callback_url,
};
pub use flavor::Flavor;
pub use injection::{
    Injectable, Injection, InjectionError, Lifetime, Resolver, ServiceRegistry, identifiers,
};
