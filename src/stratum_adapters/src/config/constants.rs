use std::time::Duration;

pub mod env {
    pub const OIDC_CLIENT_ID_ENV_VAR: &str = "OIDC_CLIENT_ID";
    pub const OIDC_CLIENT_SECRET_ENV_VAR: &str = "OIDC_CLIENT_SECRET";
    pub const OIDC_AUTHORITY_ENV_VAR: &str = "OIDC_AUTHORITY";
    pub const OIDC_POST_LOGOUT_REDIRECT_URI_SUFFIX_ENV_VAR: &str =
        "OIDC_POST_LOGOUT_REDIRECT_URI_SUFFIX";
    pub const OIDC_SILENT_REDIRECT_URI_SUFFIX_ENV_VAR: &str = "OIDC_SILENT_REDIRECT_URI_SUFFIX";
    pub const OIDC_REDIRECT_URI_SUFFIX_ENV_VAR: &str = "OIDC_REDIRECT_URI_SUFFIX";
    pub const API_URL_ENV_VAR: &str = "API_URL";
    pub const API_VERSION_ENV_VAR: &str = "API_VERSION";
    pub const APP_ORIGIN_ENV_VAR: &str = "APP_ORIGIN";
}

/// Optional JSON file layered under the environment.
pub const CONFIGURATION_FILE: &str = "config/stratum.json";

pub mod oidc {
    use std::time::Duration;

    pub const DEFAULT_SCOPE: &str = "openid profile email api offline_access";
    pub const DISCOVERY_PATH: &str = ".well-known/openid-configuration";
    /// Tokens this close to expiry are treated as expired.
    pub const EXPIRY_SKEW: Duration = Duration::from_secs(30);
    pub const MAX_REDIRECTS: usize = 10;
}

pub mod api {
    pub const BASE_PATH: &str = "/api";
    pub const DEFAULT_VERSION: &str = "v1";
}

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Upper bound on how long a response may stay cached, whatever the server asks for.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub mod prod {
    use std::time::Duration;

    pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
}

pub mod test {
    use std::time::Duration;

    pub const SIMULATED_DELAY: Duration = Duration::from_millis(100);
    pub const ACCESS_TOKEN: &str = "access-token";
}
