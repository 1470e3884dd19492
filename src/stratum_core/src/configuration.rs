use secrecy::Secret;
use serde::Deserialize;

pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Static application configuration, created once at startup and never mutated.
///
/// Every field except the origin may be unset; consumers decide which ones they need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub authentication: AuthenticationConfiguration,
    #[serde(default)]
    pub api: ApiConfiguration,
    #[serde(default)]
    pub application: ApplicationConfiguration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthenticationConfiguration {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub authority: Option<String>,
    pub post_logout_redirect_uri_suffix: Option<String>,
    pub silent_redirect_uri_suffix: Option<String>,
    pub redirect_uri_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfiguration {
    pub api_url: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfiguration {
    /// Origin the application is served from, used to build redirect URIs.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for ApplicationConfiguration {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_owned()
}

impl Configuration {
    /// Fixed values used by the test flavor.
    pub fn stub() -> Self {
        Self {
            authentication: AuthenticationConfiguration {
                client_id: Some("client-id".to_owned()),
                client_secret: Some(Secret::new("secret".to_owned())),
                authority: Some("https://example.com".to_owned()),
                post_logout_redirect_uri_suffix: Some("portal/".to_owned()),
                silent_redirect_uri_suffix: Some("silent-renewal/".to_owned()),
                redirect_uri_suffix: None,
            },
            api: ApiConfiguration {
                api_url: Some("https://api.example.com".to_owned()),
                api_version: None,
            },
            application: ApplicationConfiguration::default(),
        }
    }

    /// Joins `suffix` to the application origin. See [`resolve_callback_url`].
    pub fn origin_url(&self, suffix: Option<&str>) -> String {
        resolve_callback_url(&self.application.origin, suffix)
    }
}

/// Resolves a callback destination against the application origin.
///
/// - an absolute `http(s)` URL is returned verbatim
/// - a leading `/` is stripped and the rest joined to the origin
/// - any other value is a suffix joined to the origin
/// - `None` is the origin root
pub fn resolve_callback_url(origin: &str, callback_path: Option<&str>) -> String {
    let origin = origin.trim_end_matches('/');
    match callback_path {
        Some(path) if path.starts_with("http://") || path.starts_with("https://") => {
            path.to_owned()
        }
        Some(path) => {
            let suffix = path.strip_prefix('/').unwrap_or(path);
            format!("{origin}/{suffix}")
        }
        None => format!("{origin}/"),
    }
}
