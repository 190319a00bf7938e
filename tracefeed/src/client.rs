//! Remote trace API access.
//!
//! `TracePageSource` is the one seam the fetch session depends on; the
//! HTTP implementation lives here, and tests drive the session with
//! scripted in-memory sources instead.

use async_trait::async_trait;
use trace_types::{TracePage, TraceQuery};

use crate::config::Config;

#[derive(Debug, thiserror::Error, Clone)]
pub enum TraceFetchError {
    #[error("trace request failed: {0}")]
    Request(String),
    #[error("trace API returned status {0}: {1}")]
    Status(u16, String),
    #[error("trace response decode failed: {0}")]
    Decode(String),
}

/// Abstract "fetch one page" operation. `cursor` is `None` for the first
/// page of a query and the opaque token from the previous response after.
#[async_trait]
pub trait TracePageSource: Send + Sync {
    async fn fetch_page(
        &self,
        query: &TraceQuery,
        cursor: Option<&str>,
    ) -> Result<TracePage, TraceFetchError>;
}

/// `TracePageSource` backed by the node's HTTP history API.
#[derive(Debug, Clone)]
pub struct HttpTraceApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTraceApi {
    pub fn new(config: &Config) -> Result<Self, TraceFetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TraceFetchError::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn traces_url(&self, query: &TraceQuery) -> String {
        format!(
            "{}/history/traces{}",
            self.base_url,
            query.layer.path_suffix()
        )
    }
}

/// Assemble the query-string pairs for one page request.
pub(crate) fn page_request_params(query: &TraceQuery, cursor: Option<&str>) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for report_from in &query.report_from {
        params.push(("reportFrom".to_string(), report_from.clone()));
    }
    params.push(("from".to_string(), query.from.to_rfc3339()));
    params.push(("to".to_string(), query.to.to_rfc3339()));
    params.push(("limit".to_string(), query.page_size.to_string()));
    if query.include_count {
        params.push(("includeCount".to_string(), "true".to_string()));
    }
    if let Some(l3_type) = &query.l3_type {
        params.push(("l3type".to_string(), l3_type.clone()));
    }
    if let Some(cursor) = cursor {
        params.push(("cursor".to_string(), cursor.to_string()));
    }
    params
}

#[async_trait]
impl TracePageSource for HttpTraceApi {
    async fn fetch_page(
        &self,
        query: &TraceQuery,
        cursor: Option<&str>,
    ) -> Result<TracePage, TraceFetchError> {
        let url = self.traces_url(query);
        let response = self
            .http
            .get(&url)
            .query(&page_request_params(query, cursor))
            .send()
            .await
            .map_err(|e| TraceFetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TraceFetchError::Status(status.as_u16(), body));
        }

        response
            .json::<TracePage>()
            .await
            .map_err(|e| TraceFetchError::Decode(e.to_string()))
    }
}
