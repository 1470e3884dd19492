use serde::{Deserialize, Serialize};

/// Wire representation of `GET /api/v1/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub name: String,
    pub email: String,
}

impl UserDto {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}
