// Record fetch client
//
// Retries transient failures with exponential backoff. Every wait (request
// or backoff sleep) races the caller's cancellation token, and an optional
// deadline bounds the whole fetch.

use super::config::FetchConfig;
use super::error::FetchError;
use super::request::RecordRequest;
use super::source::{HttpRecordSource, RecordSource};
use crate::genbank::{GenbankParser, Record};
use futures::stream::{self, StreamExt};
use gbflat_common::{GbflatError, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fetches and parses GenBank records
///
/// Cheap to clone; clones share the underlying source and connection pool.
#[derive(Clone)]
pub struct FetchClient {
    source: Arc<dyn RecordSource>,
    config: Arc<FetchConfig>,
    parser: GenbankParser,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Client backed by NCBI efetch
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpRecordSource::new(&config)
            .map_err(|e| GbflatError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::build(Arc::new(source), config))
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FetchConfig::from_env()?)
    }

    /// Client over any record source
    pub fn with_source(source: Arc<dyn RecordSource>, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(source, config))
    }

    fn build(source: Arc<dyn RecordSource>, config: FetchConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
            parser: GenbankParser::new(),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch one record; `accession` may also carry the version as `ACC.N`
    pub async fn fetch(&self, accession: &str, version: Option<u32>) -> std::result::Result<Record, FetchError> {
        self.fetch_with_cancel(accession, version, &CancellationToken::new())
            .await
    }

    /// Fetch one record, giving up with `Cancelled` as soon as `cancel` fires
    pub async fn fetch_with_cancel(
        &self,
        accession: &str,
        version: Option<u32>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Record, FetchError> {
        let request = RecordRequest::new(accession, version)?;

        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.fetch_request(&request, cancel))
                .await
                .unwrap_or_else(|_| {
                    warn!(id = %request, deadline_ms = deadline.as_millis() as u64, "Fetch deadline exceeded");
                    Err(FetchError::Timeout { id: request.id() })
                }),
            None => self.fetch_request(&request, cancel).await,
        }
    }

    /// Fetch several records concurrently, at most `config.concurrency` at a
    /// time. Results come back in input order, one per accession.
    pub async fn fetch_many<I, S>(
        &self,
        accessions: I,
        cancel: &CancellationToken,
    ) -> Vec<std::result::Result<Record, FetchError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let accessions: Vec<String> = accessions
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect();

        stream::iter(accessions)
            .map(|accession| async move { self.fetch_with_cancel(&accession, None, cancel).await })
            .buffered(self.config.concurrency)
            .collect()
            .await
    }

    async fn fetch_request(
        &self,
        request: &RecordRequest,
        cancel: &CancellationToken,
    ) -> std::result::Result<Record, FetchError> {
        let id = request.id();
        let max_attempts = self.config.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(id = %id, attempt, max_attempts, "Fetching record");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled { id: id.clone() }),
                result = self.source.fetch_text(&id) => result,
            };

            match result {
                Ok(text) => return self.decode(request, &text),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let backoff = self.config.backoff_for(attempt);
                    warn!(
                        id = %id,
                        attempt,
                        max_attempts,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Fetch attempt failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled { id: id.clone() }),
                        _ = tokio::time::sleep(backoff) => {},
                    }
                },
                Err(e) => {
                    warn!(id = %id, attempt, error = %e, "Fetch failed");
                    return Err(FetchError::from_source(&id, attempt, e));
                },
            }
        }
    }

    fn decode(&self, request: &RecordRequest, text: &str) -> std::result::Result<Record, FetchError> {
        let record = self
            .parser
            .parse(text)
            .map_err(|cause| FetchError::MalformedResponse {
                id: request.id(),
                cause,
            })?;

        let accession_matches = record.accession() == request.accession();
        let version_matches = request.version().map_or(true, |v| v == record.version());
        if !accession_matches || !version_matches {
            return Err(FetchError::UnexpectedRecord {
                expected: request.id(),
                found: record.accession_version().to_string(),
            });
        }

        info!(
            id = %record.accession_version(),
            length = record.len(),
            features = record.features().len(),
            "Fetched record"
        );
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fetch::{FetchErrorKind, SourceError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const RECORD: &str = "\
LOCUS       AB000001                  10 bp    DNA     linear   SYN 01-JAN-2020
DEFINITION  Test record.
ACCESSION   AB000001
VERSION     AB000001.3
SOURCE      synthetic construct
  ORGANISM  synthetic construct
            artificial sequences.
FEATURES             Location/Qualifiers
     source          1..10
ORIGIN
        1 acgtacgtac
//
";

    /// Replays scripted responses, then repeats the last one
    struct ScriptedSource {
        script: Mutex<Vec<std::result::Result<String, SourceError>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<std::result::Result<String, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        async fn fetch_text(&self, _id: &str) -> std::result::Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        }
    }

    fn fast_config() -> FetchConfig {
        FetchConfig::default().with_backoff(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let source = ScriptedSource::new(vec![
            Err(SourceError::Status(503)),
            Err(SourceError::Timeout),
            Ok(RECORD.to_string()),
        ]);
        let client = FetchClient::with_source(source.clone(), fast_config()).unwrap();

        let record = client.fetch("AB000001", Some(3)).await.unwrap();
        assert_eq!(record.accession_version().to_string(), "AB000001.3");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let source = ScriptedSource::new(vec![Err(SourceError::Network("connection refused".into()))]);
        let client = FetchClient::with_source(source.clone(), fast_config().with_max_attempts(2)).unwrap();

        let err = client.fetch("AB000001", None).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Network);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let source = ScriptedSource::new(vec![Err(SourceError::NotFound)]);
        let client = FetchClient::with_source(source.clone(), fast_config()).unwrap();

        let err = client.fetch("AB999999", None).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::NotFound);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_call() {
        let source = ScriptedSource::new(vec![Ok(RECORD.to_string())]);
        let client = FetchClient::with_source(source.clone(), fast_config()).unwrap();

        let err = client.fetch("AB000001", Some(0)).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidRequest);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_unexpected_record() {
        let source = ScriptedSource::new(vec![Ok(RECORD.to_string())]);
        let client = FetchClient::with_source(source, fast_config()).unwrap();

        let err = client.fetch("AB000002", None).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedRecord { .. }));

        let err = client.fetch("AB000001", Some(2)).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let source = ScriptedSource::new(vec![Ok(RECORD.to_string())]);
        let client = FetchClient::with_source(source, fast_config()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .fetch_with_cancel("AB000001", None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let source = ScriptedSource::new(vec![Err(SourceError::Status(503))]);
        let config = FetchConfig::default()
            .with_backoff(Duration::from_secs(60), Duration::from_secs(60))
            .with_max_attempts(5);
        let client = FetchClient::with_source(source.clone(), config).unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = client
            .fetch_with_cancel("AB000001", None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Cancelled);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_retries() {
        let source = ScriptedSource::new(vec![Err(SourceError::Status(500))]);
        let config = FetchConfig::default()
            .with_backoff(Duration::from_secs(10), Duration::from_secs(10))
            .with_max_attempts(10)
            .with_deadline(Duration::from_secs(25));
        let client = FetchClient::with_source(source.clone(), config).unwrap();

        let err = client.fetch("AB000001", None).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Timeout);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_fetch_many_keeps_order() {
        let source = ScriptedSource::new(vec![Ok(RECORD.to_string())]);
        let client = FetchClient::with_source(source, fast_config()).unwrap();

        let results = client
            .fetch_many(["AB000001", "bad id", "AB000001.3"], &CancellationToken::new())
            .await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), FetchErrorKind::InvalidRequest);
        assert!(results[2].is_ok());
    }
}
