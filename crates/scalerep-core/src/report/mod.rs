//! Report submission.
//!
//! The scheduler hands each job to a [`ReportSubmitter`]; the production
//! implementation is [`ReportClient`], which POSTs a JSON scale report
//! request to the analytics service with libcurl.

mod body;
mod client;

pub use body::{build_body, query_set_start_time, ScaleReportBody, StyleClusterBoost};
pub use client::ReportClient;

use std::fmt;

use crate::job::{JobKey, UserProfile};

/// Per-run parameters shared by every report in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParams {
    pub alg_id: i64,
    pub query_set: i64,
    pub user_profile: UserProfile,
}

impl ReportParams {
    pub fn request_for(&self, key: JobKey) -> ReportRequest {
        ReportRequest {
            key,
            alg_id: self.alg_id,
            query_set: self.query_set,
            user_profile: self.user_profile,
        }
    }
}

/// Everything that varies between two report submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub key: JobKey,
    pub alg_id: i64,
    pub query_set: i64,
    pub user_profile: UserProfile,
}

/// Starts a scale report. Must return within a bounded time.
pub trait ReportSubmitter {
    fn submit(&mut self, request: &ReportRequest) -> Result<(), SubmitError>;
}

/// Why a submission was not accepted.
#[derive(Debug)]
pub enum SubmitError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// Service answered with something other than 200.
    Http(u32),
    /// Request body could not be encoded.
    Body(serde_json::Error),
}

impl SubmitError {
    /// HTTP status, when the service answered at all.
    pub fn status(&self) -> Option<u32> {
        match self {
            SubmitError::Http(code) => Some(*code),
            SubmitError::Curl(_) | SubmitError::Body(_) => None,
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Curl(e) => write!(f, "{}", e),
            SubmitError::Http(code) => write!(f, "HTTP {}", code),
            SubmitError::Body(e) => write!(f, "encoding request: {}", e),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Curl(e) => Some(e),
            SubmitError::Body(e) => Some(e),
            SubmitError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for SubmitError {
    fn from(e: curl::Error) -> Self {
        SubmitError::Curl(e)
    }
}
