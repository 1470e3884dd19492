use crate::{User, UserDto};

/// Maps between the wire format and the domain.
pub struct UserProtocol;

impl UserProtocol {
    pub fn to_domain(dto: UserDto) -> User {
        User::new(dto.name, dto.email)
    }

    pub fn from_domain(user: &User) -> UserDto {
        UserDto::new(user.name(), user.email())
    }
}
