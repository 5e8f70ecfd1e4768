//! gbflat: GenBank flat-file parsing and record retrieval
//!
//! [`genbank`] turns the text of one GenBank record into a validated,
//! immutable [`Record`]. [`fetch`] retrieves records by accession from NCBI
//! E-utilities, retrying transient failures and honouring cancellation.
//!
//! # Example
//!
//! ```no_run
//! use gbflat::fetch::{FetchClient, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FetchClient::new(FetchConfig::from_env()?)?;
//!     let record = client.fetch("JQ610684", Some(1)).await?;
//!
//!     println!("{} {}", record.accession_version(), record.definition());
//!     for feature in record.cds_features() {
//!         println!("{} {:?}", feature.location, feature.qualifier("product"));
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod fetch;
pub mod genbank;

pub use fetch::{FetchClient, FetchConfig, FetchError, FetchErrorKind};
pub use genbank::{parse_record, GenbankParser, ParseError, Record};
