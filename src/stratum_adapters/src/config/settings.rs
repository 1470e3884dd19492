use std::path::{Path, PathBuf};

use ::config::{Config, ConfigError, File, FileFormat};
use stratum_core::Configuration;

use super::constants::{CONFIGURATION_FILE, env};

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
}

/// Builds the release [`Configuration`] from an optional JSON file overlaid with
/// environment variables. A `.env` file in the working directory is honoured.
pub struct ConfigurationLoader {
    file: PathBuf,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new(CONFIGURATION_FILE)
    }
}

impl ConfigurationLoader {
    pub fn new(file: impl AsRef<Path>) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
        }
    }

    /// Load from the default file and the process environment.
    pub fn load() -> Result<Configuration, ConfigurationError> {
        dotenvy::dotenv().ok();
        Self::default().load_with(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read environment variables.
    pub fn load_with<F>(&self, lookup: F) -> Result<Configuration, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            ("authentication.client_id", env::OIDC_CLIENT_ID_ENV_VAR),
            ("authentication.client_secret", env::OIDC_CLIENT_SECRET_ENV_VAR),
            ("authentication.authority", env::OIDC_AUTHORITY_ENV_VAR),
            (
                "authentication.post_logout_redirect_uri_suffix",
                env::OIDC_POST_LOGOUT_REDIRECT_URI_SUFFIX_ENV_VAR,
            ),
            (
                "authentication.silent_redirect_uri_suffix",
                env::OIDC_SILENT_REDIRECT_URI_SUFFIX_ENV_VAR,
            ),
            (
                "authentication.redirect_uri_suffix",
                env::OIDC_REDIRECT_URI_SUFFIX_ENV_VAR,
            ),
            ("api.api_url", env::API_URL_ENV_VAR),
            ("api.api_version", env::API_VERSION_ENV_VAR),
            ("application.origin", env::APP_ORIGIN_ENV_VAR),
        ];

        let mut builder = Config::builder().add_source(
            File::from(self.file.as_path())
                .format(FileFormat::Json)
                .required(false),
        );
        for (key, variable) in overrides {
            builder = builder.set_override_option(key, lookup(variable))?;
        }

        let configuration = builder.build()?.try_deserialize::<Configuration>()?;
        tracing::debug!(file = %self.file.display(), "Configuration loaded");
        Ok(configuration)
    }
}
