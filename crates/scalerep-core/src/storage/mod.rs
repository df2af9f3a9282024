//! Completion detection through object storage.
//!
//! A report is complete once its artifact exists and was modified after the
//! watermark. The production detector is [`S3Probe`], an HTTP `HEAD` with
//! `If-Modified-Since` against a path-style S3 endpoint.

mod probe;
mod sigv4;

pub use probe::S3Probe;
pub use sigv4::{Credentials, SignedHeaders};

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use std::time::Duration;

/// Outcome of one completion probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Artifact exists and was modified at or after the watermark.
    Found,
    /// Missing, or only a stale copy from an earlier run exists.
    NotFound,
}

/// Probe failure. The scheduler treats these exactly like `NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
}

/// Checks whether a report artifact has appeared.
pub trait CompletionDetector {
    fn probe(
        &mut self,
        object_key: &str,
        modified_since: DateTime<Utc>,
    ) -> Result<ProbeStatus, ProbeError>;
}

/// `now - grace`, truncated to the second.
pub fn modified_since(now: DateTime<Utc>, grace: Duration) -> DateTime<Utc> {
    let grace = TimeDelta::from_std(grace).unwrap_or(TimeDelta::zero());
    (now - grace).trunc_subsecs(0)
}

/// RFC 7231 IMF-fixdate, as used by `If-Modified-Since`.
pub fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
