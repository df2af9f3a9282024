use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Static tuning fields sent with every scale report request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportTuning {
    pub report_id: i64,
    pub page_size: u32,
    pub page_no: u32,
    pub pie_recency_max_brand_new: u32,
    pub pie_recency_max_fresh: u32,
    pub pie_relevancy_max_low_confidence: u32,
    pub pie_global_relevancy_max_low_confidence: u32,
    pub pie_calculated_relevancy_max_low_confidence: u32,
    pub pie_keyword_low_impression: f64,
    pub pie_keyword_high_impression: f64,
    pub pie_true_low_impression: f64,
    pub pie_true_high_impression: f64,
    pub pie_asset_low_impression: f64,
    pub pie_asset_high_impression: f64,
    pub pie_low_download_ratio: u32,
    pub pie_high_download_ratio: u32,
    pub avg_relevancy_score_filter_outliers: bool,
    pub recency_score_filter_outliers: bool,
    pub query_set_type: String,
    /// Length of the query set window in days.
    pub query_set_duration: u32,
    pub content_scopes: Vec<String>,
}

impl Default for ReportTuning {
    fn default() -> Self {
        Self {
            report_id: -1,
            page_size: 100,
            page_no: 1,
            pie_recency_max_brand_new: 4,
            pie_recency_max_fresh: 52,
            pie_relevancy_max_low_confidence: 2,
            pie_global_relevancy_max_low_confidence: 2,
            pie_calculated_relevancy_max_low_confidence: 2,
            pie_keyword_low_impression: 28.25,
            pie_keyword_high_impression: 141.25,
            pie_true_low_impression: 28.25,
            pie_true_high_impression: 141.25,
            pie_asset_low_impression: 14.12,
            pie_asset_high_impression: 70.6,
            pie_low_download_ratio: 40,
            pie_high_download_ratio: 200,
            avg_relevancy_score_filter_outliers: false,
            recency_score_filter_outliers: false,
            query_set_type: "Standard".to_string(),
            query_set_duration: 1,
            content_scopes: vec!["getty".to_string()],
        }
    }
}

/// Report service endpoint (`[report]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// URL the report request is POSTed to.
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    /// Upper bound on a whole submission, including the response.
    pub timeout_secs: u64,
    pub tuning: ReportTuning,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://usw2-stage-search-saw.lower-getty.cloud/runscalereport".to_string(),
            connect_timeout_secs: 15,
            timeout_secs: 30,
            tuning: ReportTuning::default(),
        }
    }
}

/// Object storage holding finished report artifacts (`[storage]` section).
///
/// Credentials may be left out of the file; `AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN` fill them in at load time.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path-style endpoint; objects live at `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    /// Prefix prepended to `c{cluster}-b{boost}.zip`.
    pub key_prefix: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://s3.us-west-2.amazonaws.com".to_string(),
            bucket: "getty-search-usw2-stage-saw".to_string(),
            region: "us-west-2".to_string(),
            key_prefix: "report-data/".to_string(),
            connect_timeout_secs: 15,
            timeout_secs: 30,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("key_prefix", &self.key_prefix)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("session_token", &redacted(&self.session_token))
            .finish()
    }
}

impl StorageConfig {
    /// Fill unset credentials from the standard AWS environment variables.
    pub fn apply_env_credentials(&mut self) {
        self.apply_credentials_from(|name| std::env::var(name).ok());
    }

    fn apply_credentials_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut Option<String>, name: &str| {
            if slot.is_none() {
                *slot = lookup(name).filter(|v| !v.is_empty());
            }
        };
        fill(&mut self.access_key_id, "AWS_ACCESS_KEY_ID");
        fill(&mut self.secret_access_key, "AWS_SECRET_ACCESS_KEY");
        fill(&mut self.session_token, "AWS_SESSION_TOKEN");
    }
}

/// Global configuration loaded from `~/.config/scalerep/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerepConfig {
    /// Maximum number of reports in flight at once.
    pub workers: usize,
    /// Sleep between completion poll cycles.
    pub poll_interval_secs: u64,
    /// Artifacts modified earlier than `now - modified_grace_secs` are ignored.
    pub modified_grace_secs: u64,
    /// Keep polling after the last submission until every report completes.
    #[serde(default)]
    pub drain_on_exit: bool,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for ScalerepConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            poll_interval_secs: 30,
            modified_grace_secs: 120,
            drain_on_exit: false,
            report: ReportConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ScalerepConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn modified_grace(&self) -> Duration {
        Duration::from_secs(self.modified_grace_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scalerep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScalerepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScalerepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        let mut cfg = default_cfg;
        cfg.storage.apply_env_credentials();
        return Ok(cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (e.g. `--config`).
pub fn load_from_path(path: &Path) -> Result<ScalerepConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut cfg: ScalerepConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.storage.apply_env_credentials();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ScalerepConfig::default();
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.modified_grace(), Duration::from_secs(120));
        assert!(!cfg.drain_on_exit);
        assert_eq!(cfg.storage.key_prefix, "report-data/");
        assert_eq!(cfg.report.tuning.page_size, 100);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ScalerepConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ScalerepConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_minimal_uses_section_defaults() {
        let toml = r#"
            workers = 4
            poll_interval_secs = 5
            modified_grace_secs = 60
        "#;
        let cfg: ScalerepConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.poll_interval_secs, 5);
        assert!(!cfg.drain_on_exit);
        assert_eq!(cfg.report, ReportConfig::default());
        assert_eq!(cfg.storage, StorageConfig::default());
    }

    #[test]
    fn config_toml_partial_sections() {
        let toml = r#"
            workers = 3
            poll_interval_secs = 30
            modified_grace_secs = 120
            drain_on_exit = true

            [report]
            endpoint = "http://localhost:8080/runscalereport"

            [report.tuning]
            page_size = 50
            content_scopes = ["getty", "istock"]

            [storage]
            bucket = "reports"
            access_key_id = "AKID"
        "#;
        let cfg: ScalerepConfig = toml::from_str(toml).unwrap();
        assert!(cfg.drain_on_exit);
        assert_eq!(cfg.report.endpoint, "http://localhost:8080/runscalereport");
        assert_eq!(cfg.report.timeout_secs, 30);
        assert_eq!(cfg.report.tuning.page_size, 50);
        assert_eq!(cfg.report.tuning.query_set_type, "Standard");
        assert_eq!(cfg.report.tuning.content_scopes, vec!["getty", "istock"]);
        assert_eq!(cfg.storage.bucket, "reports");
        assert_eq!(cfg.storage.region, "us-west-2");
        assert_eq!(cfg.storage.access_key_id.as_deref(), Some("AKID"));
        assert!(cfg.storage.secret_access_key.is_none());
    }

    #[test]
    fn credentials_from_lookup_do_not_override_file() {
        let mut storage = StorageConfig {
            access_key_id: Some("from-file".to_string()),
            ..StorageConfig::default()
        };
        storage.apply_credentials_from(|name| match name {
            "AWS_ACCESS_KEY_ID" => Some("from-env".to_string()),
            "AWS_SECRET_ACCESS_KEY" => Some("secret".to_string()),
            "AWS_SESSION_TOKEN" => Some(String::new()),
            _ => None,
        });
        assert_eq!(storage.access_key_id.as_deref(), Some("from-file"));
        assert_eq!(storage.secret_access_key.as_deref(), Some("secret"));
        assert!(storage.session_token.is_none());
    }

    #[test]
    fn debug_hides_secrets() {
        let storage = StorageConfig {
            access_key_id: Some("AKID".to_string()),
            secret_access_key: Some("hunter2".to_string()),
            ..StorageConfig::default()
        };
        let s = format!("{:?}", storage);
        assert!(s.contains("AKID"));
        assert!(!s.contains("hunter2"));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "workers = 1\npoll_interval_secs = 0\nmodified_grace_secs = 10\n",
        )
        .unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.poll_interval(), Duration::ZERO);
    }

    #[test]
    fn load_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "workers = \"two\"\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
