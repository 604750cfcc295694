//! Magento API client.
//!
//! Low-level HTTP transport that handles base URL construction,
//! authentication, retries, cancellation and response normalization.
//! Entity operations are implemented on the handle types in
//! [`models`](crate::models).

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};
use url::Url;

use crate::error::{MagentoError, Result};
use crate::response::{normalize, unquote};
use crate::retry::RetryPolicy;
use crate::search::SearchCriteria;

const USER_AGENT: &str = concat!("m2rest/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const API_VERSION: &str = "V1";

/// Identifies one Magento REST endpoint root.
///
/// The resulting base URL is `{scheme}://{host}/rest/{store_code}/V1/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub scheme: String,
    /// Host name, optionally with port and installation path.
    pub host: String,
    pub store_code: String,
}

impl StoreConfig {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        store_code: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            store_code: store_code.into(),
        }
    }

    /// Build a store config from a URL such as `https://shop.example.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or has no host.
    pub fn from_url(url: &str, store_code: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| MagentoError::ConfigMissing(format!("no host in URL '{url}'")))?;

        let mut host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = parsed.path().trim_end_matches('/');
        if !path.is_empty() {
            host.push_str(path);
        }

        Ok(Self::new(parsed.scheme(), host, store_code))
    }

    /// The REST base URL for this store.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}/rest/{}/{API_VERSION}/",
            self.scheme, self.host, self.store_code
        )
    }
}

/// Which token endpoint to authenticate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    Customer,
    Admin,
}

impl AuthenticationType {
    /// Route of the token endpoint, relative to the REST base.
    pub fn route(self) -> &'static str {
        match self {
            Self::Customer => "/integration/customer/token",
            Self::Admin => "/integration/admin/token",
        }
    }
}

/// Username/password pair posted to a token endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Builder for [`MagentoClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    store: StoreConfig,
    token: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: String,
    cancel: CancellationToken,
    dispatch: Option<Dispatch>,
}

impl ClientBuilder {
    fn new(store: StoreConfig) -> Self {
        Self {
            store,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: USER_AGENT.to_string(),
            cancel: CancellationToken::new(),
            dispatch: None,
        }
    }

    /// Use a pre-issued (integration) bearer token.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Abort in-flight requests and retries once `token` is cancelled.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Route this client's log records to `dispatch` instead of the
    /// process-wide default subscriber.
    ///
    /// Without a dispatch the client only logs through whatever subscriber
    /// the application installed. The library never installs one, so an
    /// application that sets none gets no output.
    #[must_use]
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<MagentoClient> {
        let base_url = Url::parse(&self.store.base_url())?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(self.user_agent)
            .default_headers(headers)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(self.timeout)
            .build()
            .map_err(MagentoError::HttpError)?;

        tracing::debug!(base_url = %base_url, "built Magento HTTP client");

        Ok(MagentoClient {
            http,
            base_url: Arc::new(base_url),
            token: self.token.map(Arc::from),
            retry: self.retry,
            cancel: self.cancel,
            dispatch: self.dispatch,
        })
    }

    /// Build the client and obtain a token by posting `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::Authentication`] if the token endpoint
    /// rejects the credentials, or any transport error.
    pub async fn authenticate(
        self,
        credentials: &Credentials,
        kind: AuthenticationType,
    ) -> Result<MagentoClient> {
        let client = self.build()?;
        tracing::info!(
            base_url = %client.base_url,
            route = kind.route(),
            username = %credentials.username,
            "authenticating API client"
        );

        let raw = client
            .post_raw(kind.route(), credentials, "authenticate")
            .await
            .map_err(|e| match e {
                MagentoError::BadRequest { status, body, .. } => {
                    MagentoError::Authentication { status, body }
                }
                MagentoError::NotFound => MagentoError::Authentication {
                    status: 404,
                    body: String::new(),
                },
                other => other,
            })?;

        let token = unquote(raw.trim());
        tracing::info!(route = kind.route(), "API client authenticated");
        Ok(client.with_token(token))
    }
}

/// Magento REST API client.
///
/// Cheaply cloneable and safe to share across tasks; clones reference the
/// same connection pool. Entity handles keep their own clone.
///
/// # Example
///
/// ```no_run
/// use m2rest::{MagentoClient, StoreConfig};
///
/// # fn example() -> m2rest::Result<()> {
/// let store = StoreConfig::new("https", "shop.example.com", "default");
/// let client = MagentoClient::from_integration(store, "integration-token")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MagentoClient {
    http: Client,
    base_url: Arc<Url>,
    token: Option<Arc<str>>,
    retry: RetryPolicy,
    cancel: CancellationToken,
    dispatch: Option<Dispatch>,
}

impl std::fmt::Debug for MagentoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl MagentoClient {
    /// Start building a client for `store`.
    pub fn builder(store: StoreConfig) -> ClientBuilder {
        ClientBuilder::new(store)
    }

    /// Create a client without authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(store: StoreConfig) -> Result<Self> {
        Self::builder(store).build()
    }

    /// Create a client using an integration bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn from_integration(store: StoreConfig, bearer: &str) -> Result<Self> {
        Self::builder(store).bearer_token(bearer).build()
    }

    /// Create a client by exchanging credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::Authentication`] if the credentials are rejected.
    pub async fn from_authentication(
        store: StoreConfig,
        credentials: &Credentials,
        kind: AuthenticationType,
    ) -> Result<Self> {
        Self::builder(store).authenticate(credentials, kind).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The cancellation token observed by this client.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A clone of this client bound to a different cancellation token.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    fn with_token(mut self, token: &str) -> Self {
        self.token = Some(Arc::from(token));
        self
    }

    /// Resolve a route (e.g. `/products/abc`) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn url_for(&self, route: &str) -> Result<Url> {
        Ok(self.base_url.join(route.trim_start_matches('/'))?)
    }

    /// GET `route` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::NotFound`] on 404, [`MagentoError::BadRequest`]
    /// on other error statuses, or a transport/decode error.
    pub async fn get<T: DeserializeOwned>(&self, route: &str, operation: &str) -> Result<T> {
        let text = self.execute(Method::GET, route, None, operation).await?;
        decode(&text)
    }

    /// GET `route` with search criteria appended as the query string.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        route: &str,
        criteria: &SearchCriteria,
        operation: &str,
    ) -> Result<T> {
        let route = format!("{route}?{}", criteria.to_query_string());
        self.get(&route, operation).await
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn post<B, T>(&self, route: &str, body: &B, operation: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        let text = self
            .execute(Method::POST, route, Some(payload), operation)
            .await?;
        decode(&text)
    }

    /// PUT a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn put<B, T>(&self, route: &str, body: &B, operation: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        let text = self
            .execute(Method::PUT, route, Some(payload), operation)
            .await?;
        decode(&text)
    }

    /// DELETE `route` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, route: &str, operation: &str) -> Result<T> {
        let text = self.execute(Method::DELETE, route, None, operation).await?;
        decode(&text)
    }

    /// POST a JSON body and return the raw response body.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn post_raw<B>(&self, route: &str, body: &B, operation: &str) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body)?;
        self.execute(Method::POST, route, Some(payload), operation)
            .await
    }

    /// POST without a body and return the raw response body.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn post_empty(&self, route: &str, operation: &str) -> Result<String> {
        self.execute(Method::POST, route, None, operation).await
    }

    /// PUT a JSON body and return the raw response body.
    ///
    /// # Errors
    ///
    /// See [`MagentoClient::get`].
    pub async fn put_raw<B>(&self, route: &str, body: &B, operation: &str) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(body)?;
        self.execute(Method::PUT, route, Some(payload), operation)
            .await
    }

    async fn execute(
        &self,
        method: Method,
        route: &str,
        body: Option<serde_json::Value>,
        operation: &str,
    ) -> Result<String> {
        let url = self.url_for(route)?;
        let request = async {
            let span = tracing::debug_span!("magento_request", %method, route, operation);
            self.execute_with_retry(method, url, body, route, operation)
                .instrument(span)
                .await
        };

        match &self.dispatch {
            Some(dispatch) => request.with_subscriber(dispatch.clone()).await,
            None => request.await,
        }
    }

    async fn execute_with_retry(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        route: &str,
        operation: &str,
    ) -> Result<String> {
        let mut retry = 0;

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!(route, operation, "request cancelled before sending");
                return Err(MagentoError::Cancelled);
            }

            let started = Instant::now();
            tracing::debug!(route, attempt = retry + 1, payload = ?body, "sending request");

            let (status, text) = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::warn!(route, operation, "request cancelled in flight");
                    return Err(MagentoError::Cancelled);
                }
                result = self.send_once(method.clone(), url.clone(), body.as_ref()) => {
                    result.map_err(|e| {
                        tracing::error!(route, operation, error = %e, "request failed");
                        e
                    })?
                }
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::debug!(
                route,
                status = status.as_u16(),
                elapsed_ms,
                attempt = retry + 1,
                "request completed"
            );

            if RetryPolicy::is_retryable_status(status.as_u16()) && retry < self.retry.max_retries {
                retry += 1;
                let delay = self.retry.delay_for(retry);
                tracing::warn!(
                    route,
                    operation,
                    status = status.as_u16(),
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after server error"
                );

                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        tracing::warn!(route, operation, "request cancelled during backoff");
                        return Err(MagentoError::Cancelled);
                    }
                    () = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            normalize(status, &text, operation)?;
            return Ok(text);
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<(StatusCode, String)> {
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        Ok((status, text))
    }
}

fn transport_error(err: reqwest::Error) -> MagentoError {
    if err.is_timeout() {
        MagentoError::Timeout
    } else {
        MagentoError::HttpError(err)
    }
}

/// Decode a JSON body; an empty body decodes as `null`.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = text.trim();
    let text = if text.is_empty() { "null" } else { text };
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let store = StoreConfig::new("https", "shop.example.com", "default");
        let client = MagentoClient::from_integration(store, "secret-token").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("MagentoClient"));
        assert!(debug.contains("base_url"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_store_base_url() {
        let store = StoreConfig::new("https", "shop.example.com", "default");
        assert_eq!(store.base_url(), "https://shop.example.com/rest/default/V1/");
    }

    #[test]
    fn test_store_from_url_keeps_port_and_path() {
        let store = StoreConfig::from_url("http://127.0.0.1:8080", "all").unwrap();
        assert_eq!(store.scheme, "http");
        assert_eq!(store.host, "127.0.0.1:8080");

        let store = StoreConfig::from_url("https://example.com/shop/", "default").unwrap();
        assert_eq!(store.host, "example.com/shop");
        assert_eq!(store.base_url(), "https://example.com/shop/rest/default/V1/");
    }

    #[test]
    fn test_url_for_joins_routes() {
        let store = StoreConfig::new("https", "shop.example.com", "default");
        let client = MagentoClient::new(store).unwrap();

        let url = client.url_for("/products/ABC-1").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/rest/default/V1/products/ABC-1");

        let url = client
            .url_for("/orders?searchCriteria[pageSize]=1&fields=items[entity_id]")
            .unwrap();
        assert_eq!(url.path(), "/rest/default/V1/orders");
        assert_eq!(
            url.query(),
            Some("searchCriteria[pageSize]=1&fields=items[entity_id]")
        );
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let _: () = decode("").unwrap();
        let value: bool = decode(" true ").unwrap();
        assert!(value);
    }

    #[test]
    fn test_with_cancellation_shares_config() {
        let store = StoreConfig::new("https", "shop.example.com", "default");
        let client = MagentoClient::from_integration(store, "t").unwrap();
        let token = CancellationToken::new();
        let bound = client.with_cancellation(token.clone());

        token.cancel();
        assert!(bound.cancellation_token().is_cancelled());
        assert!(!client.cancellation_token().is_cancelled());
        assert!(bound.is_authenticated());
    }
}
