//! HTTP client for the extraction webhooks.

use async_trait::async_trait;
use phraselens_core::domain::ExtractionRecord;
use phraselens_core::payload::{phrases_from_response, records_from_slice};
use phraselens_core::ports::{PhraseExtractor, RecordStore, Result};
use phraselens_core::Error;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

pub const HISTORY_PATH: &str = "/webhook/get-finance-history";
pub const EXTRACT_PATH: &str = "/webhook/extract-finance";

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
}

/// Client for the webhook host serving both history and extraction.
pub struct WebhookClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebhookClient {
    /// Create a client for the given base URL, e.g. `http://localhost:5678`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn history_url(&self) -> String {
        format!("{}{}", self.base_url, HISTORY_PATH)
    }

    pub fn extract_url(&self) -> String {
        format!("{}{}", self.base_url, EXTRACT_PATH)
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Server {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

/// Phrases from an extraction response body. A body that is not JSON at all
/// is an error; a JSON body without `phrases` yields none.
fn decode_phrases(body: &[u8]) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    Ok(phrases_from_response(value))
}

#[async_trait]
impl RecordStore for WebhookClient {
    /// An unexpected body shape is not an error; it yields no records.
    async fn fetch_all_records(&self) -> Result<Vec<ExtractionRecord>> {
        let url = self.history_url();
        debug!(url = %url, "fetching extraction history");

        let resp = self.client.get(&url).send().await.map_err(transport)?;
        let resp = Self::check_status(resp).await?;
        let bytes = resp.bytes().await.map_err(transport)?;

        let records = records_from_slice(&bytes);
        info!(count = records.len(), "fetched extraction history");
        Ok(records)
    }
}

#[async_trait]
impl PhraseExtractor for WebhookClient {
    async fn extract(&self, text: &str) -> Result<Vec<String>> {
        let url = self.extract_url();
        debug!(url = %url, chars = text.len(), "submitting text for extraction");

        let resp = self
            .client
            .post(&url)
            .json(&ExtractRequest { text })
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp).await?;
        let bytes = resp.bytes().await.map_err(transport)?;

        decode_phrases(&bytes)
    }
}
