// Record retrieval from NCBI E-utilities (or any RecordSource)

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod request;
pub mod source;

pub use client::FetchClient;
pub use config::FetchConfig;
pub use error::{FetchError, FetchErrorKind, SourceError};
pub use request::RecordRequest;
pub use source::{HttpRecordSource, RecordSource};
pub use tokio_util::sync::CancellationToken;
