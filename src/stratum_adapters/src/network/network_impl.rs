use std::sync::{Arc, OnceLock};

use stratum_core::{
    Authentication, Configuration, Injectable, InjectionError, Network, Resolver, UserService,
    identifiers,
};

use super::{BearerTokenInterceptor, ResponseCache, RestClient, RestUserService};
use crate::config::prod::HTTP_TIMEOUT;

/// [`Network`] against the configured API, authenticated with the session's bearer
/// token. Services are created on first use and then shared.
pub struct NetworkImpl {
    configuration: Arc<Configuration>,
    authentication: Arc<dyn Authentication>,
    http_client: reqwest::Client,
    cache: ResponseCache,
    user_service: OnceLock<Arc<dyn UserService>>,
}

impl NetworkImpl {
    pub fn new(
        configuration: Arc<Configuration>,
        authentication: Arc<dyn Authentication>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            configuration,
            authentication,
            http_client,
            cache: ResponseCache::default(),
            user_service: OnceLock::new(),
        }
    }

    fn rest_client(&self) -> RestClient {
        let base_url = self.configuration.api.api_url.clone().unwrap_or_default();
        RestClient::builder(base_url)
            .http_client(self.http_client.clone())
            .interceptor(Arc::new(BearerTokenInterceptor::new(Arc::clone(
                &self.authentication,
            ))))
            .cache(self.cache.clone())
            .build()
    }
}

impl Network for NetworkImpl {
    fn user_service(&self) -> Arc<dyn UserService> {
        let service = self.user_service.get_or_init(|| {
            Arc::new(RestUserService::new(
                self.rest_client(),
                &self.configuration.api,
            )) as Arc<dyn UserService>
        });
        Arc::clone(service)
    }
}

impl Injectable for NetworkImpl {
    const IDENTIFIER: &'static str = identifiers::NETWORK;

    fn inject(resolver: &Resolver<'_>) -> Result<Self, InjectionError> {
        let configuration = resolver.resolve::<Configuration>(identifiers::CONFIGURATION)?;
        let authentication =
            resolver.resolve::<dyn Authentication>(identifiers::AUTHENTICATION)?;
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| InjectionError::Construction {
                identifier: Self::IDENTIFIER.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(configuration, authentication, http_client))
    }
}
