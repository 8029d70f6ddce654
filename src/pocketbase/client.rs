//! PocketBase client handle and shared request plumbing

use super::auth_store::AuthStore;
use super::realtime::RealtimeService;
use super::records::RecordService;
use crate::error::FirebaseError;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every non-streaming request
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error response returned by the PocketBase server
///
/// Carried unmodified to callers; `data` holds PocketBase's per-field
/// validation details when present.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{status} {message} ({url})")]
pub struct ClientResponseError {
    /// Requested URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Server message
    pub message: String,
    /// Server `data` payload (validation errors etc.)
    pub data: Value,
}

/// Connection to one PocketBase server
///
/// Cloning is cheap; all clones share the HTTP client, the [`AuthStore`] and
/// the realtime connection.
#[derive(Clone)]
pub struct PocketBase {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    http: reqwest::Client,
    auth_store: AuthStore,
    realtime: RealtimeService,
}

impl PocketBase {
    /// Create a client for the server at `base_url`
    ///
    /// Nothing is contacted here; connection problems surface on first use.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::new();
        let auth_store = AuthStore::new();
        let realtime = RealtimeService::new(base_url.clone(), http.clone(), auth_store.clone());

        Self {
            inner: Arc::new(ClientInner {
                base_url,
                http,
                auth_store,
                realtime,
            }),
        }
    }

    /// Server address this client talks to
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Session store shared by every request
    pub fn auth_store(&self) -> &AuthStore {
        &self.inner.auth_store
    }

    /// Record API for one collection
    pub fn collection(&self, name: impl Into<String>) -> RecordService {
        RecordService::new(self.clone(), name.into())
    }

    /// Whether the shared realtime connection is currently open
    pub async fn is_realtime_connected(&self) -> bool {
        self.inner.realtime.is_connected().await
    }

    pub(crate) fn realtime(&self) -> &RealtimeService {
        &self.inner.realtime
    }

    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, FirebaseError> {
        build_url(&self.inner.base_url, segments)
    }

    /// Start a request carrying the current auth token
    pub(crate) fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        let request = self.inner.http.request(method, url).timeout(REQUEST_TIMEOUT);
        authorize(request, &self.inner.auth_store)
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FirebaseError> {
        let response = request.send().await?;

        // Handle error responses first
        if !response.status().is_success() {
            return Err(response_error(response).await.into());
        }

        Ok(response.json().await?)
    }

    /// Send a request whose body (if any) is not needed
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), FirebaseError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(response_error(response).await.into());
        }

        Ok(())
    }
}

impl std::fmt::Debug for PocketBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBase")
            .field("base_url", &self.inner.base_url)
            .field("auth_store", &self.inner.auth_store)
            .finish()
    }
}

/// Join percent-encoded path segments onto the server address
pub(crate) fn build_url(base_url: &str, segments: &[&str]) -> Result<Url, FirebaseError> {
    let mut url = Url::parse(base_url).map_err(|e| {
        FirebaseError::internal(format!("Invalid PocketBase URL '{}': {}", base_url, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| FirebaseError::internal(format!("PocketBase URL cannot be a base: {}", base_url)))?
        .pop_if_empty()
        .extend(segments.iter());
    Ok(url)
}

pub(crate) fn authorize(request: RequestBuilder, auth_store: &AuthStore) -> RequestBuilder {
    let token = auth_store.token();
    if token.is_empty() {
        return request;
    }
    request.header(reqwest::header::AUTHORIZATION, token)
}

/// Build a [`ClientResponseError`] from a non-success response
pub(crate) async fn response_error(response: Response) -> ClientResponseError {
    let url = response.url().to_string();
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Something went wrong while processing your request.")
        .to_string();

    ClientResponseError {
        url,
        status,
        message,
        data: body.get("data").cloned().unwrap_or(Value::Null),
    }
}
