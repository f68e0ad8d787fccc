//! Blocking HTTP client for the identity service.

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{KapError, Result};

use super::device::{DeviceAuthorization, TokenExchange};
use super::token::{Grant, TokenResponse};

/// Identity service location and the OAuth client registered there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub client_id: String,
}

impl ServiceEndpoint {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client bound to one identity service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: ServiceEndpoint,
}

impl ApiClient {
    /// Create a client with a fresh connection pool.
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self> {
        Ok(Self::with_client(build_client()?, endpoint))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(client: Client, endpoint: ServiceEndpoint) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// POST a form to `path`. A 404 is reported as [`KapError::NotFound`].
    pub fn post_form<T: DeserializeOwned>(&self, path: &str, fields: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint.url(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(encode_form(fields))
            .send()?;

        read_json(response)?.ok_or_else(|| KapError::not_found(url))
    }

    /// GET `path` with a bearer token. A 404 resolves to `None`.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str, access_token: &str) -> Result<Option<T>> {
        let url = self.endpoint.url(path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()?;

        read_json(response)
    }
}

impl TokenExchange for ApiClient {
    fn request_device_code(&self) -> Result<DeviceAuthorization> {
        self.post_form(
            "/oauth2/device/code",
            &[("client_id", self.endpoint.client_id.as_str())],
        )
    }

    fn exchange(&self, grant: &Grant) -> Result<TokenResponse> {
        let mut fields = grant.form_fields();
        fields.push(("client_id", self.endpoint.client_id.as_str()));
        self.post_form("/oauth2/token", &fields)
    }
}

/// Build the shared HTTP client.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("kap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(KapError::from)
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let body = response.text()?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| KapError::transport(format!("unexpected response body: {}", e)));
    }

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => Err(KapError::Service {
            status: status.as_u16(),
            error: err.error,
            description: err.error_description,
        }),
        Err(_) => Err(KapError::transport(format!(
            "HTTP {}: {}",
            status,
            body.trim()
        ))),
    }
}
