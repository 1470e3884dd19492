use secrecy::Secret;
use stratum_core::{AuthenticationError, Configuration};
use url::Url;

use crate::config::oidc::DEFAULT_SCOPE;

/// OIDC client settings derived from the application [`Configuration`].
#[derive(Debug, Clone)]
pub struct OidcSettings {
    pub client_id: String,
    pub client_secret: Option<Secret<String>>,
    pub authority: Url,
    pub redirect_uri: String,
    pub silent_redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub scope: String,
}

impl OidcSettings {
    /// Client id and authority are required; every redirect URI falls back to the
    /// origin root when its suffix is unset.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, AuthenticationError> {
        let authentication = &configuration.authentication;

        let client_id = authentication.client_id.clone().ok_or_else(|| {
            AuthenticationError::Configuration("client id is not set".to_owned())
        })?;
        let authority = authentication.authority.as_deref().ok_or_else(|| {
            AuthenticationError::Configuration("authority is not set".to_owned())
        })?;
        let authority = Url::parse(authority).map_err(|e| {
            AuthenticationError::Configuration(format!("invalid authority `{authority}`: {e}"))
        })?;

        Ok(Self {
            client_id,
            client_secret: authentication.client_secret.clone(),
            authority,
            redirect_uri: configuration.origin_url(authentication.redirect_uri_suffix.as_deref()),
            silent_redirect_uri: configuration
                .origin_url(authentication.silent_redirect_uri_suffix.as_deref()),
            post_logout_redirect_uri: configuration
                .origin_url(authentication.post_logout_redirect_uri_suffix.as_deref()),
            scope: DEFAULT_SCOPE.to_owned(),
        })
    }

    /// `{authority}/.well-known/openid-configuration`, keeping any realm path.
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/{}",
            self.authority.as_str().trim_end_matches('/'),
            crate::config::oidc::DISCOVERY_PATH
        )
    }
}
