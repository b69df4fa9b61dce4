//! HTTP request executor.
//!
//! Requests are sent with `reqwest`. A [`ClientRegistry`] holds the default
//! client plus any named clients a round trip may select through its
//! `client` field.

pub mod config;
pub mod error;

pub use config::ExecutionConfig;
pub use error::RequestError;

use crate::models::request::HttpRequest;
use crate::models::response::HttpResponse;
use std::collections::HashMap;
use std::time::Instant;

/// A reqwest client that speaks in [`HttpRequest`] / [`HttpResponse`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Builds a client with the configured timeout.
    pub fn new(config: &ExecutionConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Sends the request and reads the whole response body.
    ///
    /// Any status code is a successful execution; only transport failures
    /// are errors.
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, RequestError> {
        let url = request.url()?;
        log::debug!("{} {}", request.method, url);

        let start_time = Instant::now();
        let mut req_builder = self.client.request(request.method.to_reqwest(), url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().await?;

        let mut http_response = HttpResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                http_response.add_header(name.as_str(), value_str);
            }
        }

        http_response.body = response.bytes().await?.to_vec();
        http_response.duration = start_time.elapsed();

        log::debug!(
            "{} -> {} in {:?}",
            request,
            http_response.status_code,
            http_response.duration
        );
        Ok(http_response)
    }
}

/// The default client plus named clients.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    default: HttpClient,
    named: HashMap<String, HttpClient>,
}

impl ClientRegistry {
    pub fn new(default: HttpClient) -> Self {
        Self {
            default,
            named: HashMap::new(),
        }
    }

    /// Registers a named client. Returns `false` if the name is taken.
    pub fn register(&mut self, name: impl Into<String>, client: HttpClient) -> bool {
        let name = name.into();
        if self.named.contains_key(&name) {
            return false;
        }
        self.named.insert(name, client);
        true
    }

    /// Looks a client up. `None` and the empty name select the default.
    pub fn get(&self, name: Option<&str>) -> Result<&HttpClient, RequestError> {
        match name {
            None | Some("") => Ok(&self.default),
            Some(name) => self
                .named
                .get(name)
                .ok_or_else(|| RequestError::UnknownClient(name.to_string())),
        }
    }
}
