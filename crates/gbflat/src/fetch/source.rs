// Record sources
//
// The client talks to a RecordSource so retries, cancellation and parsing
// can be exercised without a live E-utilities endpoint.

use super::config::FetchConfig;
use super::endpoints;
use super::error::SourceError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Anything that can return the flat-file text of one record
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the text for `id` (`ACCESSION` or `ACCESSION.VERSION`)
    async fn fetch_text(&self, id: &str) -> Result<String, SourceError>;
}

/// NCBI efetch over HTTP
pub struct HttpRecordSource {
    client: Client,
    base_url: String,
    database: String,
    api_key: Option<String>,
}

impl HttpRecordSource {
    pub fn new(config: &FetchConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            database: config.database.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_text(&self, id: &str) -> Result<String, SourceError> {
        let url = endpoints::efetch_url(&self.base_url);
        let params = endpoints::efetch_params(&self.database, id, self.api_key.as_deref());
        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        // efetch answers 400 for identifiers it cannot resolve
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(SourceError::NotFound);
        }

        tracing::debug!(id, bytes = body.len(), "Received efetch response");
        Ok(body)
    }
}
