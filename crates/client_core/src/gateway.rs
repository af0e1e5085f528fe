//! Outbound HTTP to the case backend. Every failure comes back as an [`ApiError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use shared::{
    domain::{CaseId, ClientIdentity, ListQuery},
    error::ApiError,
    protocol::ErrorBody,
};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    ExecuteWorkflow,
    UserCases {
        user: ClientIdentity,
        query: ListQuery,
    },
    Case(CaseId),
    LikeCase(CaseId),
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Self::ExecuteWorkflow | Self::LikeCase(_) => Method::POST,
            Self::UserCases { .. } | Self::Case(_) => Method::GET,
        }
    }

    /// Unescaped path segments; the gateway escapes them when building URLs.
    pub fn segments(&self) -> Vec<String> {
        let mut segments = vec!["api".to_string()];
        match self {
            Self::ExecuteWorkflow => {
                segments.extend(["workflow".to_string(), "execute".to_string()]);
            }
            Self::UserCases { user, .. } => {
                segments.extend(["cases".to_string(), "user".to_string(), user.to_string()]);
            }
            Self::Case(id) => {
                segments.extend(["cases".to_string(), id.to_string()]);
            }
            Self::LikeCase(id) => {
                segments.extend(["cases".to_string(), id.to_string(), "like".to_string()]);
            }
        }
        segments
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::UserCases { query, .. } => {
                let mut pairs = vec![
                    ("page", query.page().to_string()),
                    ("per_page", query.per_page().to_string()),
                ];
                if let Some(keyword) = query.keyword() {
                    pairs.push(("q", keyword.to_string()));
                }
                pairs
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(
        &self,
        endpoint: &Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

/// Calls `endpoint` with its own method.
pub async fn send(
    gateway: &dyn Gateway,
    endpoint: &Endpoint,
    body: Option<Value>,
) -> Result<Value, ApiError> {
    gateway.call(endpoint, endpoint.method(), body).await
}

pub struct HttpGateway {
    http: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    /// `None` keeps the transport's default timeout behaviour.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Request(format!("invalid server url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Request(format!(
                "server url '{base_url}' cannot carry a path"
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::Request(format!("failed to build http client: {err}")))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Request(format!("server url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(endpoint.segments());

        let pairs = endpoint.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(
        &self,
        endpoint: &Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        if method != endpoint.method() {
            return Err(ApiError::Request(format!(
                "{} expects {}, got {method}",
                endpoint.path(),
                endpoint.method()
            )));
        }

        let url = self.url_for(endpoint)?;
        debug!(%method, path = %endpoint.path(), "issuing backend request");

        let mut request = self.http.request(method, url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_builder() {
                ApiError::Request(err.to_string())
            } else {
                ApiError::Network(err.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| format!("request failed with status {status}"));
            warn!(
                status = status.as_u16(),
                path = %endpoint.path(),
                error = %message,
                "backend rejected request"
            );
            return Err(ApiError::server(Some(status.as_u16()), message));
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
