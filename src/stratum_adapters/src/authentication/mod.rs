pub mod authentication_stub;
pub mod authorization_agent;
pub mod oidc_authentication;
pub mod oidc_client;
pub mod oidc_settings;
pub mod pkce;

pub use authentication_stub::AuthenticationStub;
pub use authorization_agent::{AuthorizationAgent, AuthorizationResponse, HttpRedirectAgent};
pub use oidc_authentication::OidcAuthentication;
pub use oidc_client::{OidcClient, OidcEvent, OidcNotification, ProviderMetadata, TokenSet};
pub use oidc_settings::OidcSettings;
pub use pkce::PkceChallenge;
