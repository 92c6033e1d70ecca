use super::config::{RequestBody, RequestConfig};
use super::state::{RequestState, StateTracker};
use super::{ApiResult, RequestError};
use crate::config::Config;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client bound to one base address.
///
/// Each instance owns its `RequestState`. Use [`RequestClient::session`] to get
/// an instance with fresh state that shares the underlying connection pool.
pub struct RequestClient {
    http: Client,
    base_url: String,
    default_headers: HeaderMap,
    tracker: Arc<StateTracker>,
}

impl RequestClient {
    pub fn new(config: &Config) -> Result<Self, RequestError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| RequestError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(http, config)
    }

    pub fn with_client(http: Client, config: &Config) -> Result<Self, RequestError> {
        let domain = HeaderValue::from_str(&config.domain)
            .map_err(|e| RequestError::InvalidRequest(format!("domain header: {}", e)))?;
        let mut default_headers = HeaderMap::new();
        default_headers.insert(HeaderName::from_static("domain"), domain);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_headers,
            tracker: StateTracker::new(),
        })
    }

    /// Same transport and defaults, independent loading/error state.
    pub fn session(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
            tracker: StateTracker::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> RequestState {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.tracker.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.snapshot().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.tracker.snapshot().error
    }

    /// Send `config` to `base_url + endpoint` and decode the JSON reply as `T`.
    ///
    /// Failures are returned and also recorded in this client's state.
    #[instrument(level = "debug", skip(self, config), fields(method = %config.method))]
    pub async fn send<T: DeserializeOwned>(&self, endpoint: &str, config: RequestConfig) -> ApiResult<T> {
        let call = self.tracker.begin();

        match self.execute(endpoint, config).await {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!(endpoint, error = %e, "request failed");
                call.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, endpoint: &str, config: RequestConfig) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut headers = self.default_headers.clone();

        let payload = match config.body {
            Some(RequestBody::Json(value)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                let encoded = serde_json::to_vec(&value)
                    .map_err(|e| RequestError::InvalidRequest(format!("unserializable body: {}", e)))?;
                Some(Bytes::from(encoded))
            }
            Some(RequestBody::Raw(bytes)) => Some(bytes),
            None => None,
        };

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RequestError::InvalidRequest(format!("header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RequestError::InvalidRequest(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut request = self.http.request(config.method.into(), &url).headers(headers);
        if let Some(payload) = payload {
            request = request.body(payload);
        }

        let response = request.send().await.map_err(RequestError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Transport {
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains(JSON_CONTENT_TYPE))
            .unwrap_or(false);
        if !is_json {
            debug!(%url, "non-JSON response, no data");
            return Ok(None);
        }

        let body = response.bytes().await.map_err(RequestError::from_reqwest)?;
        let data = serde_json::from_slice(&body).map_err(|e| RequestError::Decode(e.to_string()))?;
        Ok(Some(data))
    }
}
