pub mod user_dto;
pub mod user_protocol;
