// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP access to the Cellarium backend.
//!
//! Layers, bottom up: [`TokenStore`] persists the token pair, [`AuthGateway`]
//! logs in and refreshes, [`CellarHttpClient`] performs authenticated calls
//! with a single refresh-and-retry on 401, and [`CellarApiClient`] maps
//! endpoints onto the [`CatalogApi`](cellarium_core::CatalogApi) trait.

pub mod api;
pub mod auth;
pub mod http;
pub mod token_store;

use std::sync::Arc;

use cellarium_config::CellarConfig;
use cellarium_core::{AuthObserver, CellarError};
use tracing::debug;

pub use api::CellarApiClient;
pub use auth::{AuthGateway, Credentials};
pub use http::{
    Attempt, CellarHttpClient, FilePart, MultipartBody, RequestBody, RequestOptions,
    build_reqwest_client,
};
pub use token_store::{TokenPair, TokenStore, TokenUpdate};

/// A wired-up client stack sharing one token store and connection pool.
#[derive(Debug, Clone)]
pub struct Connection {
    pub auth: Arc<AuthGateway>,
    pub http: CellarHttpClient,
    pub api: Arc<CellarApiClient>,
}

/// Builds the client stack from configuration, persisting tokens to
/// `auth.token_path`.
pub fn connect(
    config: &CellarConfig,
    observer: Arc<dyn AuthObserver>,
) -> Result<Connection, CellarError> {
    let tokens = Arc::new(TokenStore::open(&config.auth.token_path)?);
    connect_with_store(config, tokens, observer)
}

/// Like [`connect`], with a caller-supplied token store.
pub fn connect_with_store(
    config: &CellarConfig,
    tokens: Arc<TokenStore>,
    observer: Arc<dyn AuthObserver>,
) -> Result<Connection, CellarError> {
    let client = build_reqwest_client(config.api.timeout())?;
    let base_url = config.api.base_url.trim().to_string();
    debug!(base_url = %base_url, timeout_secs = config.api.timeout_secs, "connecting");

    let auth = Arc::new(AuthGateway::new(
        client.clone(),
        base_url.clone(),
        tokens,
        observer,
    ));
    let http = CellarHttpClient::new(client, base_url, auth.clone());
    let api = Arc::new(CellarApiClient::new(http.clone()));
    Ok(Connection { auth, http, api })
}
