use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{AuthenticationError, UserDto};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Invalid base url `{0}`")]
    InvalidBaseUrl(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),
}

/// `GET /api/v1/user`.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self) -> Result<UserDto, NetworkError>;
}

/// Entry point to the HTTP services of the backend.
pub trait Network: Send + Sync {
    fn user_service(&self) -> Arc<dyn UserService>;
}
