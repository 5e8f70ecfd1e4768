// Validated record identifiers

use super::error::FetchError;
use crate::genbank::models::is_valid_accession;
use std::fmt;

/// An accession with an optional version, checked before any network call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRequest {
    accession: String,
    version: Option<u32>,
}

impl RecordRequest {
    /// `accession` may carry its own `.N` suffix; if `version` is also given
    /// the two must agree.
    pub fn new(accession: &str, version: Option<u32>) -> Result<Self, FetchError> {
        if accession.is_empty() {
            return Err(FetchError::invalid_request("accession is empty"));
        }

        let (accession, embedded) = match accession.rsplit_once('.') {
            Some((acc, suffix)) => {
                let embedded = suffix.parse::<u32>().map_err(|_| {
                    FetchError::invalid_request(format!("invalid version suffix in {:?}", accession))
                })?;
                (acc, Some(embedded))
            },
            None => (accession, None),
        };

        if !is_valid_accession(accession) {
            return Err(FetchError::invalid_request(format!(
                "accession {:?} may only contain ASCII letters, digits and underscores",
                accession
            )));
        }

        let version = match (embedded, version) {
            (Some(a), Some(b)) if a != b => {
                return Err(FetchError::invalid_request(format!(
                    "{}.{} conflicts with requested version {}",
                    accession, a, b
                )))
            },
            (a, b) => a.or(b),
        };
        if version == Some(0) {
            return Err(FetchError::invalid_request("version must be at least 1"));
        }

        Ok(Self {
            accession: accession.to_string(),
            version,
        })
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// Identifier sent to the source
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}.{}", self.accession, version),
            None => f.write_str(&self.accession),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fetch::FetchErrorKind;

    #[test]
    fn test_plain_and_versioned() {
        let request = RecordRequest::new("JQ610684", Some(1)).unwrap();
        assert_eq!(request.id(), "JQ610684.1");

        let request = RecordRequest::new("JQ610684.1", None).unwrap();
        assert_eq!((request.accession(), request.version()), ("JQ610684", Some(1)));

        let request = RecordRequest::new("NC_045512", None).unwrap();
        assert_eq!(request.id(), "NC_045512");
    }

    #[test]
    fn test_matching_embedded_version_accepted() {
        assert!(RecordRequest::new("JQ610684.2", Some(2)).is_ok());
    }

    #[test]
    fn test_rejections() {
        for (accession, version) in [
            ("", None),
            ("JQ 610684", None),
            ("JQ610684;drop", None),
            ("JQ610684", Some(0)),
            ("JQ610684.0", None),
            ("JQ610684.x", None),
            ("JQ610684.1", Some(2)),
        ] {
            let err = RecordRequest::new(accession, version).unwrap_err();
            assert_eq!(err.kind(), FetchErrorKind::InvalidRequest, "{:?}", accession);
        }
    }
}
