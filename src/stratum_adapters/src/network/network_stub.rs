use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use stratum_core::{Configuration, Network, UserService};

use super::{FixtureInterceptor, RestClient, RestUserService};

/// [`Network`] for the test flavor. Requests are answered from JSON fixtures and
/// only reach the network when no fixture matches.
pub struct NetworkStub {
    configuration: Arc<Configuration>,
    fixtures: PathBuf,
    user_service: OnceLock<Arc<dyn UserService>>,
}

impl NetworkStub {
    pub fn new(configuration: Arc<Configuration>, fixtures: impl Into<PathBuf>) -> Self {
        Self {
            configuration,
            fixtures: fixtures.into(),
            user_service: OnceLock::new(),
        }
    }

    fn rest_client(&self) -> RestClient {
        let base_url = self.configuration.api.api_url.clone().unwrap_or_default();
        RestClient::builder(base_url)
            .interceptor(Arc::new(FixtureInterceptor::new(self.fixtures.clone())))
            .build()
    }
}

impl Network for NetworkStub {
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
