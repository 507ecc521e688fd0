// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login, token refresh, and the "auth required" signal.
//!
//! Login and refresh talk to the backend with a bare `reqwest` call rather
//! than through [`CellarHttpClient`](crate::http::CellarHttpClient): a
//! rejected refresh must never itself trigger a refresh.

use std::sync::Arc;

use cellarium_core::{AuthObserver, CellarError, HttpFailure, ResponseBody};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::token_store::{TokenPair, TokenStore, TokenUpdate};

const LOGIN_PATH: &str = "/api/auth/token/";
const REFRESH_PATH: &str = "/api/auth/token/refresh/";

/// Username and password for [`AuthGateway::login`].
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Owns the token lifecycle for one backend.
pub struct AuthGateway {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    observer: Arc<dyn AuthObserver>,
    /// Serializes refreshes so concurrent 401s share one refresh call.
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
        observer: Arc<dyn AuthObserver>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            observer,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Exchanges credentials for a token pair and persists it.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, CellarError> {
        let body = LoginRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
        };
        let response: LoginResponse = self.post(LOGIN_PATH, &body, "login").await?;

        self.tokens
            .save(TokenUpdate::both(&response.access, &response.refresh))?;
        info!(username = %credentials.username, "logged in");
        Ok(TokenPair::new(response.access, response.refresh))
    }

    /// Mints a new access token from the stored refresh token.
    ///
    /// Only the access token is persisted; the refresh token is kept.
    pub async fn refresh_access_token(&self) -> Result<SecretString, CellarError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh on behalf of a request whose `rejected` token got a 401.
    ///
    /// If another caller already replaced that token while this one waited
    /// for the lock, the newer token is returned without a second refresh.
    pub async fn refresh_after_rejection(
        &self,
        rejected: Option<&str>,
    ) -> Result<SecretString, CellarError> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.tokens.access_token()
            && Some(current.expose_secret()) != rejected
        {
            debug!("access token already refreshed by a concurrent request");
            return Ok(current);
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<SecretString, CellarError> {
        let refresh = self.tokens.refresh_token().ok_or_else(|| CellarError::Auth {
            message: "no refresh token".to_string(),
            status: None,
        })?;

        let body = RefreshRequest {
            refresh: refresh.expose_secret(),
        };
        let response: RefreshResponse = self.post(REFRESH_PATH, &body, "token refresh").await?;

        self.tokens.save(TokenUpdate::access(&response.access))?;
        info!("access token refreshed");
        Ok(SecretString::from(response.access))
    }

    /// Raises the "auth required" signal. Safe to call repeatedly.
    pub fn notify_auth_required(&self) {
        debug!("auth required");
        self.observer.auth_required();
    }

    /// Clears stored tokens and always notifies, even if the clear failed.
    pub fn clear_tokens(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear stored tokens");
        }
        self.notify_auth_required();
    }

    pub fn logout(&self) {
        info!("logging out");
        self.clear_tokens();
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    async fn post<B, T>(&self, path: &str, body: &B, what: &str) -> Result<T, CellarError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(CellarError::network)?;

        let status = response.status();
        let text = response.text().await.map_err(CellarError::network)?;
        debug!(path, status = status.as_u16(), "{what} response received");

        let parsed = ResponseBody::parse(&text);
        if !status.is_success() {
            let failure = HttpFailure::new(status.as_u16(), parsed, &text);
            warn!(path, status = failure.status, "{what} rejected");
            return Err(CellarError::Auth {
                message: failure.message,
                status: Some(failure.status),
            });
        }
        parsed.decode(what)
    }
}
