//! # Breached-Password Check
//!
//! Asks an external k-anonymity range service how often a password has
//! appeared in known breaches. Only the first five hex characters of the
//! password's SHA-1 ever leave the process.
//!
//! ## Range Query
//! ```text
//! SHA-1("Password1") = 70CCD9007338D6D81DD3B6271621B9CF9A97EA00
//!                      ├───┘└──────────────────────────────────┤
//!                      prefix            suffix (kept local)
//!
//! GET {base_url}70CCD
//!   ──► "9007338D6D81DD3B6271621B9CF9A97EA00:240\r\n..."
//!
//! suffix found → Compromised(240)     not found → Clean
//! ```
//!
//! Any failure (network, status, malformed body, timeout) is
//! [`BreachVerdict::Inconclusive`]; registration treats it as a warning.

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use std::time::Duration;
use thiserror::Error;

/// Why a breach check could not produce a count.
#[derive(Debug, Error)]
pub enum BreachCheckError {
    #[error("breach check request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("breach check returned HTTP {0}")]
    Status(u16),

    #[error("malformed breach check response: {0}")]
    Malformed(String),
}

/// Collaborator that reports how often a password appears in breach corpora.
#[async_trait]
pub trait BreachCheck: Send + Sync {
    /// Number of known occurrences; 0 means not found.
    async fn occurrences(&self, password: &str) -> Result<u64, BreachCheckError>;
}

/// Outcome of a bounded breach check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreachVerdict {
    Clean,
    Compromised(u64),
    /// The service could not answer in time or at all.
    Inconclusive(String),
}

/// Runs `checker` with an upper bound of `timeout`.
pub async fn screen(checker: &dyn BreachCheck, password: &str, timeout: Duration) -> BreachVerdict {
    match tokio::time::timeout(timeout, checker.occurrences(password)).await {
        Ok(Ok(0)) => BreachVerdict::Clean,
        Ok(Ok(count)) => BreachVerdict::Compromised(count),
        Ok(Err(err)) => BreachVerdict::Inconclusive(err.to_string()),
        Err(_) => BreachVerdict::Inconclusive(format!(
            "no answer within {} ms",
            timeout.as_millis()
        )),
    }
}

// =============================================================================
// Range Client
// =============================================================================

/// HTTP client for a k-anonymity range endpoint.
#[derive(Debug, Clone)]
pub struct PwnedRangeClient {
    client: reqwest::Client,
    base_url: String,
}

impl PwnedRangeClient {
    /// Creates a client; `base_url` gets the 5-character prefix appended.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BreachCheckError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockroom/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(PwnedRangeClient {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl BreachCheck for PwnedRangeClient {
    async fn occurrences(&self, password: &str) -> Result<u64, BreachCheckError> {
        let digest = hex::encode_upper(Sha1::digest(password.as_bytes()));
        let (prefix, suffix) = digest.split_at(5);

        let response = self
            .client
            .get(format!("{}{}", self.base_url, prefix))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BreachCheckError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_range_response(&body, suffix)
    }
}

/// Finds `suffix` in a `SUFFIX:COUNT` per line body.
pub fn parse_range_response(body: &str, suffix: &str) -> Result<u64, BreachCheckError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (hash, count) = line
            .split_once(':')
            .ok_or_else(|| BreachCheckError::Malformed(format!("line without count: {line:?}")))?;

        if hash.eq_ignore_ascii_case(suffix) {
            return count
                .trim()
                .parse()
                .map_err(|_| BreachCheckError::Malformed(format!("bad count: {count:?}")));
        }
    }
    Ok(0)
}
