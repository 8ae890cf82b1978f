//! Shared HTTP plumbing for the resource clients

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiResult;
use crate::config::{AuthConfig, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::normalize::{error_message, normalize_bytes};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Thin wrapper over a `reqwest::Client` bound to the API base URL.
///
/// Cloning is cheap; all resource clients of one run share the same
/// connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Build a client from configuration (base URL, timeout, auth headers)
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(auth_headers(&config.auth)?)
            .build()
            .map_err(|e| HarnessError::ClientSetup(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Issue one request and normalize whatever comes back.
    ///
    /// The payload is `None` for 204 and for empty bodies. Statuses >= 400
    /// become `Failure` with the best message the body offers.
    pub async fn call(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> ApiResult<Option<Value>> {
        let url = self.url(segments);

        debug!(
            method = %method,
            path = url.path(),
            query = ?query,
            body = %display_body(body.as_ref()),
            "request"
        );

        let mut request = self.http.request(method.clone(), url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %method, path = url.path(), error = %e, "transport failure");
                return match e.status() {
                    Some(status) => ApiResult::err(status.as_u16(), e.to_string()),
                    None => ApiResult::transport(e.to_string()),
                };
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(method = %method, path = url.path(), error = %e, "failed to read response body");
                return ApiResult::err(status.as_u16(), format!("failed to read response body: {}", e));
            }
        };

        let payload = if status == StatusCode::NO_CONTENT {
            None
        } else {
            normalize_bytes(&bytes)
        };

        debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            body = %display_body(payload.as_ref()),
            "response"
        );

        if status.is_client_error() || status.is_server_error() {
            let message = error_message(payload.as_ref())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("HTTP error").to_string());
            ApiResult::Failure {
                status: status.as_u16(),
                message,
                body: payload,
            }
        } else {
            ApiResult::Success {
                status: status.as_u16(),
                data: payload.clone(),
                body: payload,
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> ApiResult<T> {
        self.call(Method::GET, segments, query, None).await.decode()
    }

    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, segments, body).await
    }

    pub async fn patch<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, segments, body).await
    }

    /// DELETE ignores whatever body the backend sends back.
    pub async fn delete(&self, segments: &[&str]) -> ApiResult<()> {
        self.call(Method::DELETE, segments, &[], None).await.map(|_| ())
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        match serde_json::to_value(body) {
            Ok(body) => self.call(method, segments, &[], Some(body)).await.decode(),
            Err(e) => ApiResult::transport(format!("failed to encode request body: {}", e)),
        }
    }
}

fn parse_base_url(raw: &str) -> HarnessResult<Url> {
    let url = Url::parse(raw).map_err(|e| HarnessError::InvalidConfig(format!("base_url {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(HarnessError::InvalidConfig(format!("base_url {} cannot be a base", raw)));
    }
    Ok(url)
}

fn auth_headers(auth: &AuthConfig) -> HarnessResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    match auth {
        AuthConfig::None => {}
        AuthConfig::Bearer { token } => {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| HarnessError::InvalidConfig(format!("bearer token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        AuthConfig::ApiKey { key } => {
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| HarnessError::InvalidConfig(format!("api key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
    }
    Ok(headers)
}

fn display_body(body: Option<&Value>) -> String {
    match body {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}
