// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Cellarium REST API.
//!
//! Provides [`CellarHttpClient`], which builds URLs, attaches the bearer
//! token, parses bodies leniently, and recovers from an expired access token
//! with exactly one refresh-and-retry per call.

use std::sync::Arc;
use std::time::Duration;

use cellarium_core::{CellarError, HttpFailure, ResponseBody};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::AuthGateway;

/// Request body variants. Multipart bodies are kept as plain data so the
/// form can be rebuilt for the retry after a refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

#[derive(Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl MultipartBody {
    fn to_form(&self) -> Result<Form, CellarError> {
        let mut form = Form::new();
        for (key, value) in &self.fields {
            form = form.text(key.clone(), value.clone());
        }
        for file in &self.files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type).map_err(|e| {
                    CellarError::Config(format!("invalid content type `{content_type}`: {e}"))
                })?;
            }
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}

/// Everything a caller may vary about one request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Query parameters; `None` and empty values are dropped from the URL.
    pub query: Vec<(String, Option<String>)>,
    /// Applied after the defaults, so they can override `Content-Type`.
    pub headers: Vec<(String, String)>,
    /// Suppresses the default `Content-Type: application/json`.
    pub skip_content_type: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: RequestBody::Empty,
            query: Vec::new(),
            headers: Vec::new(),
            skip_content_type: false,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, CellarError> {
        let value = serde_json::to_value(body)
            .map_err(|e| CellarError::Internal(format!("failed to serialize request: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Multipart bodies never carry our content type: the transport sets
    /// `multipart/form-data` with its own boundary.
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self.skip_content_type = true;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.query.push((key.into(), value.map(Into::into)));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn without_content_type(mut self) -> Self {
        self.skip_content_type = true;
        self
    }
}

/// Whether a request is the caller's original attempt or the single retry
/// issued after a token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retry,
}

enum Exchange {
    Complete(Result<ResponseBody, CellarError>),
    RetryAfterRefresh,
}

/// Authenticated, refresh-aware HTTP client.
#[derive(Debug, Clone)]
pub struct CellarHttpClient {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<AuthGateway>,
}

/// Builds the shared `reqwest` client with the configured timeout.
pub fn build_reqwest_client(timeout: Duration) -> Result<reqwest::Client, CellarError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CellarError::Config(format!("failed to build HTTP client: {e}")))
}

impl CellarHttpClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, auth: Arc<AuthGateway>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &Arc<AuthGateway> {
        &self.auth
    }

    /// Sends a request and returns the parsed body.
    ///
    /// A 401 on the first attempt triggers one token refresh and one retry
    /// of the identical request. If the refresh fails, tokens are cleared
    /// (raising "auth required") and the original 401 is returned.
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ResponseBody, CellarError> {
        let mut attempt = Attempt::First;
        loop {
            match self.execute(path, options, attempt).await? {
                Exchange::Complete(body) => return body,
                // Only ever returned for `Attempt::First`, so this loops once at most.
                Exchange::RetryAfterRefresh => attempt = Attempt::Retry,
            }
        }
    }

    /// One HTTP exchange. Transport failures are the outer error; the inner
    /// result carries the parsed body or the structured HTTP failure.
    async fn execute(
        &self,
        path: &str,
        options: &RequestOptions,
        attempt: Attempt,
    ) -> Result<Exchange, CellarError> {
        let url = self.build_url(path, &options.query)?;
        let token = self.auth.tokens().access_token();
        let headers = build_headers(options, token.as_ref())?;

        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .headers(headers);
        builder = match &options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(
                serde_json::to_vec(value)
                    .map_err(|e| CellarError::Internal(format!("failed to encode body: {e}")))?,
            ),
            RequestBody::Multipart(body) => builder.multipart(body.to_form()?),
        };

        debug!(method = %options.method, path, ?attempt, "sending request");
        let response = builder.send().await.map_err(|e| {
            warn!(path, error = %e, "request failed before a response");
            CellarError::network(e)
        })?;

        let status = response.status();
        debug!(path, status = status.as_u16(), ?attempt, "response received");

        if status == StatusCode::NO_CONTENT {
            return Ok(Exchange::Complete(Ok(ResponseBody::NoContent)));
        }

        let text = response.text().await.map_err(CellarError::network)?;

        if status == StatusCode::UNAUTHORIZED && attempt == Attempt::First {
            info!(path, "access token rejected, refreshing");
            let rejected = token.as_ref().map(|t| t.expose_secret());
            match self.auth.refresh_after_rejection(rejected).await {
                Ok(_) => return Ok(Exchange::RetryAfterRefresh),
                Err(e) => {
                    warn!(path, error = %e, "token refresh failed, clearing credentials");
                    self.auth.clear_tokens();
                }
            }
        }

        let body = ResponseBody::parse(&text);
        Ok(Exchange::Complete(if status.is_success() {
            Ok(body)
        } else {
            Err(HttpFailure::new(status.as_u16(), body, &text).into())
        }))
    }

    fn build_url(&self, path: &str, query: &[(String, Option<String>)]) -> Result<Url, CellarError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw)
            .map_err(|e| CellarError::Config(format!("invalid request URL `{raw}`: {e}")))?;

        let present: Vec<_> = query
            .iter()
            .filter_map(|(k, v)| v.as_deref().filter(|v| !v.is_empty()).map(|v| (k, v)))
            .collect();
        if !present.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in present {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn build_headers(
    options: &RequestOptions,
    token: Option<&SecretString>,
) -> Result<HeaderMap, CellarError> {
    let mut headers = HeaderMap::new();
    if !options.skip_content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| CellarError::Config(format!("invalid access token header: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CellarError::Config(format!("invalid header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CellarError::Config(format!("invalid header value: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
