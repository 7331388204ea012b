//! REST gateway client.
//!
//! Every backend response is an [`ApiResponse`] envelope. The client attaches
//! the stored bearer token, unwraps the envelope and folds every failure into
//! a [`GatewayError`]. A 401 clears the stored tokens; nothing is retried.
//!
//! Public reads (menus, categories, seat lookups) go through a short-lived
//! `moka` cache that any mutating call invalidates.

mod auth;
mod catalog;
mod error;
mod notifications;
mod orders;
mod stores;
mod sub_accounts;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tableside_core::ApiResponse;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::session::SessionStore;

pub use auth::{Credentials, SignupRequest};
pub use error::{GatewayError, GatewayErrorKind};
pub use sub_accounts::NewSubAccount;

/// Client for the Tableside backend REST API.
///
/// Cheap to clone; clones share the HTTP connection pool, the session store
/// and the response cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    cache: Cache<String, serde_json::Value>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialization failure).
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::transport(&e))?;
        Ok(Self::with_http(http, &config.api_url, session, config.cache_ttl))
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_http(
        http: reqwest::Client,
        base_url: &Url,
        session: SessionStore,
        cache_ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
                session,
                cache,
            }),
        }
    }

    /// The session store whose token this client sends.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Issue a request and unwrap the response envelope.
    ///
    /// A missing `data` field decodes as JSON `null`, so commands without a
    /// result can use `T = ()`.
    ///
    /// # Errors
    ///
    /// - `Transport` if no response arrived
    /// - `Unauthorized` on HTTP 401 to a request that carried a token (stored
    ///   tokens are cleared first)
    /// - `Rejected` on any other non-2xx status, including a 401 to an
    ///   anonymous request, or a `success: false` envelope
    /// - `Decode` if the body is not an envelope or `data` does not fit `T`
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mutating = method != Method::GET;
        let data = self.send(method, path, body).await?;
        if mutating {
            self.inner.cache.invalidate_all();
        }
        serde_json::from_value(data).map_err(|e| GatewayError::decode(&e))
    }

    /// Send a request and return the envelope's `data` as raw JSON.
    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<serde_json::Value, GatewayError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.inner.base_url);
        let mut builder = self.inner.http.request(method, url);

        let mut sent_token = false;
        match self.inner.session.access_token() {
            Ok(Some(token)) => {
                builder = builder.bearer_auth(token.expose_secret());
                sent_token = true;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not read access token, sending anonymously"),
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::transport(&e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.inner.session.clear_tokens() {
                warn!(error = %e, "Failed to clear tokens after 401");
            }
            let text = response.text().await.unwrap_or_default();
            let envelope = serde_json::from_str::<ApiResponse<IgnoredAny>>(&text).ok();
            let reason = envelope.as_ref().map(ApiResponse::failure_reason);
            let cause = envelope.and_then(|envelope| envelope.error);
            debug!(sent_token, reason = ?reason, "Request unauthorized");
            return Err(if sent_token {
                GatewayError::unauthorized(reason, cause)
            } else {
                GatewayError::rejected(
                    status.as_u16(),
                    reason.unwrap_or_else(|| "authentication required".to_string()),
                    cause,
                )
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(&e))?;

        let envelope: ApiResponse<serde_json::Value> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                warn!(
                    error = %e,
                    body = %text.chars().take(200).collect::<String>(),
                    "Response is not an envelope"
                );
                return Err(GatewayError::decode(&e));
            }
            Err(_) => {
                return Err(GatewayError::rejected(
                    status.as_u16(),
                    format!("HTTP {status}"),
                    Some(text.chars().take(200).collect()),
                ));
            }
        };

        if !status.is_success() || !envelope.success {
            debug!(status = %status, reason = %envelope.failure_reason(), "Request rejected");
            return Err(GatewayError::rejected(
                status.as_u16(),
                envelope.failure_reason(),
                envelope.error.clone(),
            ));
        }

        Ok(envelope.data.unwrap_or(serde_json::Value::Null))
    }

    /// GET through the read cache.
    async fn get_cached<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        if let Some(hit) = self.inner.cache.get(path).await {
            debug!(path = %path, "Cache hit");
            return serde_json::from_value(hit).map_err(|e| GatewayError::decode(&e));
        }
        let data = self.send::<()>(Method::GET, path, None).await?;
        self.inner
            .cache
            .insert(path.to_string(), data.clone())
            .await;
        serde_json::from_value(data).map_err(|e| GatewayError::decode(&e))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, body).await
    }

    /// DELETE, ignoring whatever `data` the backend echoes back.
    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        self.request::<IgnoredAny, ()>(Method::DELETE, path, None)
            .await
            .map(|_| ())
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Append query parameters to a path.
fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    format!("{path}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/menus", &[]), "/menus");
        assert_eq!(
            with_query("/stores/1/orders", &[("status", "PICKED_UP".to_string())]),
            "/stores/1/orders?status=PICKED_UP"
        );
        assert_eq!(
            with_query("/x", &[("q", "a b&c".to_string())]),
            "/x?q=a+b%26c"
        );
    }
}
