pub mod injection;
pub mod telemetry;

pub use injection::{FLAVOR_ENV_VAR, configure_injection, fixtures_dir, initiate};
pub use telemetry::init_tracing;
