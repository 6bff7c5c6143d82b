//! Request Client for the Books/Authors API.
//!
//! # Design
//! `ApiClient` is built once per run from `Settings` and passed by reference
//! to everything that talks to the service. Each call is split into a pure
//! `build_request` step and an `execute` step that does the blocking round
//! trip, so the request shape stays testable without a network.
//!
//! The underlying agent never turns HTTP error statuses into errors: a 404
//! or a 500 comes back as an ordinary `HttpResponse`. Only failing to get a
//! response at all yields `TransportError`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::resource::{Authors, Books, Resource, ResourceApi};
use crate::settings::{ApiSettings, Settings, TimeoutSettings};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Client with default headers and timeouts against `base_url`, which
    /// should already include the API prefix (e.g. `.../api/v1`).
    pub fn new(base_url: &str) -> Self {
        Self::with_parts(base_url, &ApiSettings::default(), &TimeoutSettings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_parts(&settings.api.base_api_url(), &settings.api, &settings.timeouts)
    }

    fn with_parts(base_url: &str, api: &ApiSettings, timeouts: &TimeoutSettings) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(Duration::from_millis(timeouts.request_timeout_ms)))
            .timeout_send_request(Some(Duration::from_millis(timeouts.request_timeout_ms)))
            .timeout_recv_response(Some(Duration::from_millis(timeouts.response_timeout_ms)))
            .build()
            .new_agent();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: api
                .default_headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
                .collect(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn books(&self) -> ResourceApi<'_, Books> {
        ResourceApi::new(self)
    }

    pub fn authors(&self) -> ResourceApi<'_, Authors> {
        ResourceApi::new(self)
    }

    pub fn resource<R: Resource>(&self) -> ResourceApi<'_, R> {
        ResourceApi::new(self)
    }

    /// Describe a request without sending it. `content-type` is only set
    /// when there is a body.
    pub fn build_request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> HttpRequest {
        self.build_request_with(method, path, body, &RequestOptions::default())
    }

    /// `build_request` with per-call headers and timeout merged in.
    pub fn build_request_with(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> HttpRequest {
        let mut headers = self.default_headers.clone();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        for (name, value) in &options.headers {
            let name = name.to_ascii_lowercase();
            headers.retain(|(existing, _)| *existing != name);
            headers.push((name, value.clone()));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: body.map(Value::to_string),
            timeout: options.timeout,
        }
    }

    /// Perform the round trip. Never fails on an HTTP status.
    pub fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let started = Instant::now();
        let result = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(self.agent.get(&req.url), req).call(),
            (HttpMethod::Delete, _) => prepare(self.agent.delete(&req.url), req).call(),
            (HttpMethod::Post, Some(body)) => prepare(self.agent.post(&req.url), req).send(body),
            (HttpMethod::Post, None) => prepare(self.agent.post(&req.url), req).send_empty(),
            (HttpMethod::Put, Some(body)) => prepare(self.agent.put(&req.url), req).send(body),
            (HttpMethod::Put, None) => prepare(self.agent.put(&req.url), req).send_empty(),
        };
        let transport = |source: ureq::Error| TransportError {
            method: req.method,
            url: req.url.clone(),
            source,
        };

        let mut response = result.map_err(transport)?;
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let raw = response.body_mut().read_to_vec().map_err(transport)?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            method = %req.method,
            url = %req.url,
            status,
            duration_ms,
            "request completed"
        );
        Ok(HttpResponse::from_bytes(req.url.clone(), status, headers, &raw, duration_ms))
    }

    pub fn request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<HttpResponse, TransportError> {
        self.request_with(method, path, body, &RequestOptions::default())
    }

    pub fn request_with(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let req = self.build_request_with(method, path, body, options);
        self.execute(&req).inspect_err(|err| {
            tracing::warn!(error = %err, "transport failure");
        })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, req: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match req.timeout {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}
