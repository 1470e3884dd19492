pub mod authentication;
pub mod network;
pub mod repositories;
