pub mod login_repository;
pub mod user_repository;

pub use login_repository::AuthenticationLoginRepository;
pub use user_repository::NetworkUserRepository;
