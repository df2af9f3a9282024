//! Scale report submission over HTTP (libcurl).

use anyhow::{Context, Result};
use std::time::Duration;

use super::body::build_body;
use super::{ReportRequest, ReportSubmitter, SubmitError};
use crate::config::{ReportConfig, ReportTuning};

/// POSTs scale report requests to the analytics service.
///
/// Runs in the current thread; each call is bounded by the configured timeouts.
#[derive(Debug, Clone)]
pub struct ReportClient {
    endpoint: String,
    connect_timeout: Duration,
    timeout: Duration,
    tuning: ReportTuning,
}

impl ReportClient {
    pub fn from_config(cfg: &ReportConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&cfg.endpoint)
            .with_context(|| format!("invalid report endpoint {:?}", cfg.endpoint))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            tuning: cfg.tuning.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `body` and return the status code with the response text.
    fn post_json(&self, body: &str) -> Result<(u32, Vec<u8>), curl::Error> {
        let mut response = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.endpoint)?;
        easy.post(true)?;
        easy.post_fields_copy(body.as_bytes())?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append("Accept: */*")?;
        // Send the body straight away instead of waiting for 100-continue.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        Ok((code, response))
    }
}

impl ReportSubmitter for ReportClient {
    fn submit(&mut self, request: &ReportRequest) -> Result<(), SubmitError> {
        let now = chrono::Local::now().naive_local();
        let body = build_body(&self.tuning, request, now).map_err(SubmitError::Body)?;
        tracing::debug!(cluster = request.key.cluster, boost = request.key.boost, "POST {}", self.endpoint);

        let (code, response) = self.post_json(&body)?;
        if code != 200 {
            tracing::debug!(
                "report service replied {}: {}",
                code,
                String::from_utf8_lossy(&response).trim()
            );
            return Err(SubmitError::Http(code));
        }
        Ok(())
    }
}
