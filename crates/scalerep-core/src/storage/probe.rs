//! Object-storage HEAD probe.
//!
//! Uses the curl crate (libcurl) to issue a `HEAD` for the artifact with
//! `If-Modified-Since`, signed with SigV4 when credentials are configured.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

use super::sigv4::{self, Credentials};
use super::{http_date, CompletionDetector, ProbeError, ProbeStatus};
use crate::config::StorageConfig;

/// Completion detector backed by a path-style S3 endpoint.
#[derive(Debug, Clone)]
pub struct S3Probe {
    endpoint: Url,
    bucket: String,
    region: String,
    credentials: Option<Credentials>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl S3Probe {
    /// Build a probe from config. Requests are unsigned unless both the
    /// access key id and the secret are present.
    pub fn from_config(cfg: &StorageConfig) -> Result<Self> {
        let endpoint = Url::parse(&cfg.endpoint)
            .with_context(|| format!("invalid storage endpoint {:?}", cfg.endpoint))?;
        if endpoint.host_str().is_none() {
            anyhow::bail!("storage endpoint {:?} has no host", cfg.endpoint);
        }
        let credentials = match (&cfg.access_key_id, &cfg.secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: cfg.session_token.clone(),
            }),
            _ => None,
        };
        if credentials.is_none() {
            tracing::warn!("no storage credentials configured; completion probes are unsigned");
        }
        Ok(Self {
            endpoint,
            bucket: cfg.bucket.clone(),
            region: cfg.region.clone(),
            credentials,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
        })
    }

    pub fn is_signed(&self) -> bool {
        self.credentials.is_some()
    }

    /// URL of `object_key`, plus the `Host` value it will be requested with.
    pub fn object_url(&self, object_key: &str) -> (Url, String) {
        let base = self.endpoint.path().trim_end_matches('/');
        let path = sigv4::uri_encode_path(&format!("{}/{}/{}", base, self.bucket, object_key));
        let mut url = self.endpoint.clone();
        url.set_path(&path);
        url.set_query(None);

        let host = self.endpoint.host_str().unwrap_or_default();
        let host = match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        (url, host)
    }

    /// Issue the HEAD and return the HTTP status code.
    fn head(&self, object_key: &str, modified_since: DateTime<Utc>) -> Result<u32, ProbeError> {
        let (url, host) = self.object_url(object_key);

        let mut list = curl::easy::List::new();
        list.append(&format!("If-Modified-Since: {}", http_date(modified_since)))?;
        if let Some(credentials) = &self.credentials {
            let signed = sigv4::sign(credentials, "HEAD", &host, url.path(), &self.region, Utc::now());
            for line in signed.lines() {
                list.append(&line)?;
            }
        }

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.nobody(true)?; // HEAD request
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.http_headers(list)?;
        easy.perform()?;

        Ok(easy.response_code()?)
    }
}

impl CompletionDetector for S3Probe {
    fn probe(
        &mut self,
        object_key: &str,
        modified_since: DateTime<Utc>,
    ) -> Result<ProbeStatus, ProbeError> {
        match self.head(object_key, modified_since)? {
            200..=299 => Ok(ProbeStatus::Found),
            // 304: only a copy older than the watermark exists.
            304 | 404 => Ok(ProbeStatus::NotFound),
            code => Err(ProbeError::Http(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_for(endpoint: &str) -> S3Probe {
        let cfg = StorageConfig {
            endpoint: endpoint.to_string(),
            bucket: "reports".to_string(),
            ..StorageConfig::default()
        };
        S3Probe::from_config(&cfg).unwrap()
    }

    #[test]
    fn object_url_default_port() {
        let probe = probe_for("https://s3.us-west-2.amazonaws.com");
        let (url, host) = probe.object_url("report-data/c1-b20.zip");
        assert_eq!(
            url.as_str(),
            "https://s3.us-west-2.amazonaws.com/reports/report-data/c1-b20.zip"
        );
        assert_eq!(host, "s3.us-west-2.amazonaws.com");
    }

    #[test]
    fn object_url_keeps_port_and_base_path() {
        let probe = probe_for("http://127.0.0.1:9000/minio/");
        let (url, host) = probe.object_url("c3-b-5.zip");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/minio/reports/c3-b-5.zip");
        assert_eq!(host, "127.0.0.1:9000");
    }

    #[test]
    fn unsigned_without_secret() {
        let cfg = StorageConfig {
            access_key_id: Some("AKID".to_string()),
            ..StorageConfig::default()
        };
        assert!(!S3Probe::from_config(&cfg).unwrap().is_signed());
        let cfg = StorageConfig {
            access_key_id: Some("AKID".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..StorageConfig::default()
        };
        assert!(S3Probe::from_config(&cfg).unwrap().is_signed());
    }

    #[test]
    fn rejects_endpoint_without_host() {
        let cfg = StorageConfig {
            endpoint: "mailto:reports@example.com".to_string(),
            ..StorageConfig::default()
        };
        assert!(S3Probe::from_config(&cfg).is_err());
    }
}
