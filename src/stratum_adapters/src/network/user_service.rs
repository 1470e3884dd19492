use async_trait::async_trait;
use stratum_core::{ApiConfiguration, NetworkError, UserDto, UserService};

use super::RestClient;
use crate::config::api::{BASE_PATH, DEFAULT_VERSION};

pub struct RestUserService {
    client: RestClient,
    path: String,
}

impl RestUserService {
    pub fn new(client: RestClient, api: &ApiConfiguration) -> Self {
        let version = api.api_version.as_deref().unwrap_or(DEFAULT_VERSION);
        Self {
            client,
            path: format!("{BASE_PATH}/{version}/user"),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl UserService for RestUserService {
    async fn get_user(&self) -> Result<UserDto, NetworkError> {
        self.client.get_json(&self.path).await
    }
}
