//! Remote document loading

mod http;

pub use http::HttpTransport;

use crate::diagnostics::SessionError;
use crate::formats;
use crate::SessionConfig;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by a [`Transport`] before any HTTP status is known
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// An outgoing GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Header names are lower-case
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The parts of a response the loader looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP fetch primitive
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError>;
}

/// Options for a single load
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Route through the CORS proxy
    pub via_proxy: bool,
    /// Overrides the default Accept header
    pub accept: Option<String>,
}

/// A fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub body: String,
    /// Format named by the Content-Type header; `None` when missing or not parseable
    pub format_hint: Option<String>,
}

/// Fetches documents, optionally through a CORS proxy
#[derive(Clone)]
pub struct RemoteLoader {
    transport: Arc<dyn Transport>,
    proxy_endpoint: String,
    app_base_url: String,
}

impl RemoteLoader {
    pub fn new(
        transport: Arc<dyn Transport>,
        proxy_endpoint: impl Into<String>,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            proxy_endpoint: proxy_endpoint.into(),
            app_base_url: app_base_url.into(),
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &SessionConfig) -> Self {
        Self::new(transport, &config.cors_proxy, &config.app_base_url)
    }

    /// Build the request `load` would send
    pub fn request_for(&self, url: &str, options: &LoadOptions) -> FetchRequest {
        let mut request = if options.via_proxy {
            // some proxies change behaviour with the browser user-agent
            FetchRequest::new(format!("{}{}", self.proxy_endpoint, urlencoding::encode(url)))
                .with_header("user-agent", &self.app_base_url)
        } else {
            FetchRequest::new(url)
        };

        let accept = options.accept.clone().unwrap_or_else(formats::accept_header);
        request = request.with_header("accept", accept);
        request
    }

    /// Fetch `url` and derive its format from the Content-Type header
    pub async fn load(&self, url: &str, options: &LoadOptions) -> Result<LoadedDocument, SessionError> {
        let request = self.request_for(url, options);
        info!(url = %url, via_proxy = options.via_proxy, "Loading remote document");

        let response = self.transport.fetch(&request).await.map_err(|e| {
            warn!(url = %url, error = %e, "Fetch failed");
            SessionError::Transport(e.to_string())
        })?;

        if !(200..=299).contains(&response.status) {
            warn!(url = %url, status = response.status, "Load rejected");
            return Err(SessionError::Load {
                status: response.status,
            });
        }

        let format_hint = response
            .content_type
            .as_deref()
            .and_then(formats::from_content_type);

        debug!(
            url = %url,
            content_type = ?response.content_type,
            format_hint = ?format_hint,
            body_len = response.body.len(),
            "Loaded remote document"
        );

        Ok(LoadedDocument {
            body: response.body,
            format_hint,
        })
    }
}
