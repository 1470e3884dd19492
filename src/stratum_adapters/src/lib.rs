pub mod authentication;
pub mod config;
pub mod network;
pub mod repositories;

pub use authentication::{
    AuthenticationStub, AuthorizationAgent, HttpRedirectAgent, OidcAuthentication, OidcClient,
    OidcSettings,
};
pub use config::{ConfigurationError, ConfigurationLoader};
pub use network::{NetworkImpl, NetworkStub, ResponseCache, RestClient};
pub use repositories::{AuthenticationLoginRepository, NetworkUserRepository};
