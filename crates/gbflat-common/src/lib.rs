//! gbflat Common Library
//!
//! Shared error handling, logging setup, and checksum helpers used by the
//! gbflat workspace members.
//!
//! # Example
//!
//! ```no_run
//! use gbflat_common::checksum::sha256_hex;
//! use gbflat_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let digest = sha256_hex(b"gtataaaatt");
//!     tracing::info!(%digest, "hashed residues");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{GbflatError, Result};
