//! HttpAnalysisService - REST client for the remote analysis service.
//!
//! Endpoint mapping:
//!
//! - `POST   {base}/analyses`                                 full segmentation + scoring
//! - `GET    {base}/analyses/{sid}`                           authoritative snapshot
//! - `PUT    {base}/analyses/{sid}/paragraphs/{uid}`          commit + restructure one unit
//! - `POST   {base}/analyses/{sid}/paragraphs/merge`          merge two adjacent units
//! - `PUT    {base}/analyses/{sid}/paragraphs/order`          reorder units
//! - `DELETE {base}/analyses/{sid}/paragraphs/{uid}`          delete one unit
//! - `POST   {base}/analyses/{sid}/paragraphs/{uid}/metrics`  lightweight re-score

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sift_core::analysis::{MetricsPatch, Session};
use sift_core::config::SiftConfig;
use sift_core::error::{Result, SiftError};
use sift_core::service::AnalysisService;

/// `AnalysisService` implementation that talks to the analysis HTTP API.
#[derive(Clone)]
pub struct HttpAnalysisService {
    client: Client,
    base_url: String,
}

impl HttpAnalysisService {
    /// Creates a client with default settings against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    /// Creates a client from configuration (base URL and request timeout).
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the HTTP client cannot be built.
    pub fn from_config(config: &SiftConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.service.timeout_secs))
            .build()
            .map_err(|err| SiftError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(config.service.base_url.clone()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|err| {
            SiftError::network(format!("analysis service request failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body));
        }

        response.json::<T>().await.map_err(|err| {
            SiftError::server(
                Some(status.as_u16()),
                format!("failed to parse analysis service response: {err}"),
            )
        })
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

/// Maps a non-2xx response to a server error, preferring the structured
/// error message when the body carries one.
fn map_http_error(status: StatusCode, body: String) -> SiftError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .unwrap_or(body);
    SiftError::server(Some(status.as_u16()), message)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct InitializeAnalysisRequest<'a> {
    text: &'a str,
    topic: &'a str,
}

#[derive(Serialize)]
struct UpdateParagraphRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct MergeParagraphsRequest {
    first_id: u64,
    second_id: u64,
}

#[derive(Serialize)]
struct ReorderParagraphsRequest<'a> {
    ordered_ids: &'a [u64],
}

#[derive(Serialize)]
struct CalculateMetricsRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn initialize_analysis(&self, text: &str, topic: &str) -> Result<Session> {
        tracing::debug!("initializing analysis ({} bytes)", text.len());
        let request = self
            .client
            .post(self.url("/analyses"))
            .json(&InitializeAnalysisRequest { text, topic });
        self.execute(request).await
    }

    async fn fetch_analysis(&self, session_id: &str) -> Result<Session> {
        tracing::debug!("fetching analysis {session_id}");
        let request = self.client.get(self.url(&format!("/analyses/{session_id}")));
        self.execute(request).await
    }

    async fn update_text_and_restructure_paragraph(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<Session> {
        tracing::debug!("restructuring paragraph {unit_id} of {session_id}");
        let request = self
            .client
            .put(self.url(&format!("/analyses/{session_id}/paragraphs/{unit_id}")))
            .json(&UpdateParagraphRequest { text });
        self.execute(request).await
    }

    async fn merge_paragraphs(
        &self,
        session_id: &str,
        first_id: u64,
        second_id: u64,
    ) -> Result<Session> {
        tracing::debug!("merging paragraphs {first_id} + {second_id} of {session_id}");
        let request = self
            .client
            .post(self.url(&format!("/analyses/{session_id}/paragraphs/merge")))
            .json(&MergeParagraphsRequest { first_id, second_id });
        self.execute(request).await
    }

    async fn reorder_paragraphs(
        &self,
        session_id: &str,
        ordered_unit_ids: &[u64],
    ) -> Result<Session> {
        tracing::debug!("reordering {} paragraphs of {session_id}", ordered_unit_ids.len());
        let request = self
            .client
            .put(self.url(&format!("/analyses/{session_id}/paragraphs/order")))
            .json(&ReorderParagraphsRequest {
                ordered_ids: ordered_unit_ids,
            });
        self.execute(request).await
    }

    async fn delete_paragraph(&self, session_id: &str, unit_id: u64) -> Result<Session> {
        tracing::debug!("deleting paragraph {unit_id} of {session_id}");
        let request = self
            .client
            .delete(self.url(&format!("/analyses/{session_id}/paragraphs/{unit_id}")));
        self.execute(request).await
    }

    async fn calculate_paragraph_metrics(
        &self,
        session_id: &str,
        unit_id: u64,
        text: &str,
    ) -> Result<MetricsPatch> {
        tracing::debug!("re-scoring paragraph {unit_id} of {session_id}");
        let request = self
            .client
            .post(self.url(&format!(
                "/analyses/{session_id}/paragraphs/{unit_id}/metrics"
            )))
            .json(&CalculateMetricsRequest { text });
        self.execute(request).await
    }
}
