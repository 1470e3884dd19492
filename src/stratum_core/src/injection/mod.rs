pub mod global;
pub mod identifiers;
pub mod registry;

pub use global::Injection;
pub use registry::{Injectable, InjectionError, Lifetime, Resolver, ServiceRegistry};
