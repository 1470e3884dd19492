use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{AuthenticationError, NetworkError, UserDto};

// UserRepository port trait and errors
#[derive(Debug, Error)]
pub enum UserRepositoryError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn call(&self) -> Result<UserDto, UserRepositoryError>;
}

#[async_trait]
impl<R: UserRepository + ?Sized> UserRepository for Arc<R> {
    async fn call(&self) -> Result<UserDto, UserRepositoryError> {
        (**self).call().await
    }
}

// LoginRepository port trait and errors
#[derive(Debug, Error)]
pub enum LoginRepositoryError {
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),
}

#[async_trait]
pub trait LoginRepository: Send + Sync {
    async fn call(&self) -> Result<(), LoginRepositoryError>;
}

#[async_trait]
impl<L: LoginRepository + ?Sized> LoginRepository for Arc<L> {
    async fn call(&self) -> Result<(), LoginRepositoryError> {
        (**self).call().await
    }
}
