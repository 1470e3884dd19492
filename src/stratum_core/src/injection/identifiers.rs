//! Identifiers the application's registrations are bound under.

pub const CONFIGURATION: &str = "Configuration";
pub const AUTHENTICATION: &str = "Authentication";
pub const NETWORK: &str = "Network";

pub const USER_REPOSITORY: &str = "UserRepository";
pub const LOGIN_REPOSITORY: &str = "LoginRepository";

pub const USER_USE_CASE: &str = "UserUseCase";
pub const LOGIN_USE_CASE: &str = "LoginUseCase";

pub const HOME_INTERACTOR: &str = "HomeInteractor";
pub const HOME_MODEL: &str = "HomeModel";
