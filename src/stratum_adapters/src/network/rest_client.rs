use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use stratum_core::NetworkError;

use super::ResponseCache;
use crate::config::MAX_CACHE_TTL;

/// A request as seen by interceptors before it is sent.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl OutgoingRequest {
    /// The URL, suffixed with a digest of the `Authorization` header when one is set,
    /// so cached bodies never cross sessions.
    pub fn cache_key(&self) -> String {
        match self.headers.get(AUTHORIZATION) {
            Some(credentials) => format!(
                "{}#{}",
                self.url,
                URL_SAFE_NO_PAD.encode(Sha256::digest(credentials.as_bytes()))
            ),
            None => self.url.to_string(),
        }
    }
}

/// What an interceptor decided for a request.
#[derive(Debug)]
pub enum Interception {
    Continue,
    /// Short-circuits the request with this body.
    Respond(serde_json::Value),
}

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: &mut OutgoingRequest) -> Result<Interception, NetworkError>;
}

/// Caching behaviour requested by a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoStore,
    MaxAge(Duration),
    Default,
}

impl CachePolicy {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(value) = headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) else {
            return Self::Default;
        };

        let mut policy = Self::Default;
        for directive in value.split(',').map(|d| d.trim().to_ascii_lowercase()) {
            match directive.as_str() {
                "no-store" | "no-cache" => return Self::NoStore,
                _ => {
                    if let Some(seconds) = directive
                        .strip_prefix("max-age=")
                        .and_then(|s| s.parse::<u64>().ok())
                    {
                        if seconds == 0 {
                            return Self::NoStore;
                        }
                        policy =
                            Self::MaxAge(Duration::from_secs(seconds).min(MAX_CACHE_TTL));
                    }
                }
            }
        }
        policy
    }
}

/// JSON over HTTP against one base URL.
///
/// Requests go through the interceptors in order, then the cache, then the network.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    http_client: reqwest::Client,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    cache: Option<ResponseCache>,
}

#[derive(Default)]
pub struct RestClientBuilder {
    base_url: String,
    http_client: Option<reqwest::Client>,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    cache: Option<ResponseCache>,
}

impl RestClientBuilder {
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> RestClient {
        RestClient {
            base_url: self.base_url,
            http_client: self.http_client.unwrap_or_default(),
            interceptors: self.interceptors,
            cache: self.cache,
        }
    }
}

impl RestClient {
    pub fn builder(base_url: impl Into<String>) -> RestClientBuilder {
        RestClientBuilder {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn url_for(&self, path: &str) -> Result<Url, NetworkError> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(NetworkError::InvalidBaseUrl(self.base_url.clone()));
        }
        let url = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&url).map_err(|_| NetworkError::InvalidBaseUrl(self.base_url.clone()))
    }

    /// `GET {base_url}{path}` decoded as `T`.
    #[tracing::instrument(name = "RestClient::get_json", skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let mut request = OutgoingRequest {
            method: Method::GET,
            url: self.url_for(path)?,
            headers: HeaderMap::new(),
        };
        request
            .headers
            .insert("accept", HeaderValue::from_static("application/json"));

        for interceptor in &self.interceptors {
            if let Interception::Respond(body) = interceptor.intercept(&mut request).await? {
                tracing::debug!(url = %request.url, "Request answered by interceptor");
                return serde_json::from_value(body).map_err(|e| NetworkError::Decode(e.to_string()));
            }
        }

        let cache_key = request.cache_key();
        if let Some(body) = self.cache.as_ref().and_then(|cache| cache.get(&cache_key)) {
            tracing::debug!(url = %request.url, "Cache hit");
            return serde_json::from_slice(&body).map_err(|e| NetworkError::Decode(e.to_string()));
        }

        let response = self
            .http_client
            .request(request.method, request.url.clone())
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| NetworkError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: request.url.to_string(),
            });
        }

        let policy = CachePolicy::from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Request(e.to_string()))?;
        let value = serde_json::from_slice(&body).map_err(|e| NetworkError::Decode(e.to_string()))?;

        if let Some(cache) = &self.cache {
            match policy {
                CachePolicy::NoStore => {}
                CachePolicy::MaxAge(ttl) => cache.store(cache_key, body.to_vec(), ttl),
                CachePolicy::Default => cache.store(cache_key, body.to_vec(), cache.default_ttl()),
            }
        }
        Ok(value)
    }
}
