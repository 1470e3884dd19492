pub mod interceptors;
pub mod network_impl;
pub mod network_stub;
pub mod response_cache;
pub mod rest_client;
pub mod user_service;

pub use interceptors::{BearerTokenInterceptor, FixtureInterceptor};
pub use network_impl::NetworkImpl;
pub use network_stub::NetworkStub;
pub use response_cache::ResponseCache;
pub use rest_client::{
    CachePolicy, Interception, OutgoingRequest, RequestInterceptor, RestClient, RestClientBuilder,
};
pub use user_service::RestUserService;
