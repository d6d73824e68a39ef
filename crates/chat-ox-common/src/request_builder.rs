use crate::{
    error::{self, CommonRequestError},
    streaming::ByteStream,
};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::{Method, RequestBuilder as ReqwestRequestBuilder};
use serde_json::Value;
use std::collections::HashMap;

/// HTTP method for API endpoints. Every chat endpoint takes a JSON POST.
#[derive(Debug, Clone, Copy)]
pub enum HttpMethod {
    Post,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => Method::POST,
        }
    }
}

/// Authentication method for API requests
#[derive(Clone)]
pub enum AuthMethod {
    /// Bearer token authentication (Authorization: Bearer <token>)
    Bearer(String),
    /// API key header (e.g., x-api-key: <key>)
    ApiKey { header_name: String, key: String },
    /// Query parameter authentication (e.g., ?key=<key>)
    QueryParam(String, String),
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            AuthMethod::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("key", &"[REDACTED]")
                .finish(),
            AuthMethod::QueryParam(name, _) => {
                f.debug_tuple("QueryParam").field(name).field(&"[REDACTED]").finish()
            }
        }
    }
}

/// Represents an API endpoint with its configuration
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub extra_headers: Option<HashMap<String, String>>,
    pub query_params: Option<Vec<(String, String)>>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            extra_headers: None,
            query_params: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = self.extra_headers.unwrap_or_default();
        headers.insert(key.into(), value.into());
        self.extra_headers = Some(headers);
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .get_or_insert_default()
            .push((key.into(), value.into()));
        self
    }
}

/// Configuration for request building
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub auth: Option<AuthMethod>,
    pub default_headers: HashMap<String, String>,
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            default_headers: HashMap::new(),
        }
    }

    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

/// Generic request builder that handles the HTTP plumbing every adapter shares
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    config: RequestConfig,
}

impl RequestBuilder {
    pub fn new(client: reqwest::Client, config: RequestConfig) -> Self {
        Self { client, config }
    }

    /// Full URL for the given endpoint
    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path.trim_start_matches('/')
        )
    }

    /// Build a reqwest RequestBuilder for the given endpoint
    pub fn build_request(&self, endpoint: &Endpoint) -> ReqwestRequestBuilder {
        let method: Method = endpoint.method.into();
        let mut req = self.client.request(method, self.url(endpoint));

        if let Some(ref params) = endpoint.query_params {
            req = req.query(&params);
        }

        if let Some(ref auth) = self.config.auth {
            req = match auth {
                AuthMethod::Bearer(token) => req.bearer_auth(token),
                AuthMethod::ApiKey { header_name, key } => req.header(header_name, key),
                AuthMethod::QueryParam(param_name, value) => req.query(&[(param_name, value)]),
            };
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(ref headers) = endpoint.extra_headers {
            for (key, value) in headers {
                req = req.header(key, value);
            }
        }

        req.header("content-type", "application/json")
    }

    /// POST a JSON body and hand back the raw response body as a byte stream.
    ///
    /// A non-2xx status is turned into [`CommonRequestError::Api`] carrying the
    /// status code and the raw body; the body is only streamed on success.
    pub async fn send_raw(
        &self,
        endpoint: &Endpoint,
        body: &Value,
    ) -> Result<ByteStream, CommonRequestError> {
        log::debug!("POST {}", endpoint.path);

        let response = self.build_request(endpoint).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let bytes = response.bytes().await?;
            return Err(error::parse_error_response(status, bytes));
        }

        Ok(response.bytes_stream().map_err(CommonRequestError::from).boxed())
    }
}
