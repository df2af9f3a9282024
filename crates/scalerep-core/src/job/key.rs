//! Storage key derived from a (cluster, boost) pair.

use std::fmt;
use std::str::FromStr;

/// One scale report: a style cluster and the boost applied to it.
///
/// The artifact for a key is stored as `c{cluster}-b{boost}.zip`; the same
/// file name is used to correlate a submission with its completion probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub cluster: u32,
    pub boost: i64,
}

impl JobKey {
    pub fn new(cluster: u32, boost: i64) -> Self {
        Self { cluster, boost }
    }

    /// Artifact file name, e.g. `c12-b40.zip`.
    pub fn file_name(&self) -> String {
        format!("c{}-b{}.zip", self.cluster, self.boost)
    }

    /// Full object key under `prefix` (e.g. `report-data/c12-b40.zip`).
    pub fn object_key(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.file_name())
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster {}, boost {}", self.cluster, self.boost)
    }
}

/// A file name that is not of the form `c{cluster}-b{boost}.zip`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a report file name: {0:?}")]
pub struct ParseKeyError(String);

impl FromStr for JobKey {
    type Err = ParseKeyError;

    /// Parses a bare file name; any directory prefix must already be stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseKeyError(s.to_string());
        let rest = s.strip_prefix('c').ok_or_else(bad)?;
        let rest = rest.strip_suffix(".zip").ok_or_else(bad)?;
        // Cluster is unsigned, so the first '-' always separates it from the boost.
        let (cluster, boost) = rest.split_once('-').ok_or_else(bad)?;
        let boost = boost.strip_prefix('b').ok_or_else(bad)?;
        Ok(Self {
            cluster: cluster.parse().map_err(|_| bad())?,
            boost: boost.parse().map_err(|_| bad())?,
        })
    }
}
