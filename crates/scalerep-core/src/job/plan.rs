//! Job enumeration: cluster range × boost series.

use std::fmt;
use std::str::FromStr;

use super::key::JobKey;

/// Highest valid style cluster id (inclusive).
pub const MAX_CLUSTER: i64 = 499;

/// User profile the report is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserProfile {
    Rf,
    RfPlus,
}

impl UserProfile {
    pub const ALL: [UserProfile; 2] = [UserProfile::Rf, UserProfile::RfPlus];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserProfile::Rf => "RF",
            UserProfile::RfPlus => "RF_PLUS",
        }
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserProfile {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::UserProfile(s.to_string()))
    }
}

/// Invalid command-line values. Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid cluster value. Valid cluster values are between 0 and 499, inclusive.")]
    ClusterOutOfRange,
    #[error(
        "Invalid cluster value. Starting cluster value should not be greater than the ending cluster value."
    )]
    ClusterOrder,
    #[error("Invalid user profile {0}. Valid values are [RF, RF_PLUS]")]
    UserProfile(String),
}

/// Raw, unvalidated enumeration arguments as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanArgs {
    pub start_cluster: i64,
    pub end_cluster: i64,
    pub start_boost: i64,
    pub boost_interval: i64,
    pub num_intervals: i64,
    pub user_profile: String,
}

impl PlanArgs {
    /// Check cluster bounds, cluster order and user profile (in that order)
    /// and build the plan.
    pub fn validate(&self) -> Result<(JobPlan, UserProfile), ValidationError> {
        if self.start_cluster < 0 || self.end_cluster > MAX_CLUSTER {
            return Err(ValidationError::ClusterOutOfRange);
        }
        if self.start_cluster > self.end_cluster {
            return Err(ValidationError::ClusterOrder);
        }
        let profile = self.user_profile.parse()?;
        let plan = JobPlan::new(
            self.start_cluster as u32,
            self.end_cluster as u32,
            self.start_boost,
            self.boost_interval,
            self.num_intervals,
        );
        Ok((plan, profile))
    }
}

/// Cluster-major enumeration of (cluster, boost) pairs.
///
/// The plan is a value; `iter` can be called any number of times and always
/// yields the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPlan {
    start_cluster: u32,
    end_cluster: u32,
    start_boost: i64,
    step: i64,
    max_boost: i64,
}

impl JobPlan {
    /// `max_boost` is computed from the interval as given and bumped by one
    /// when it equals `start_boost`; a zero interval is then stepped by 1.
    pub fn new(
        start_cluster: u32,
        end_cluster: u32,
        start_boost: i64,
        boost_interval: i64,
        num_intervals: i64,
    ) -> Self {
        let mut max_boost =
            start_boost.saturating_add(num_intervals.saturating_mul(boost_interval));
        if max_boost == start_boost {
            max_boost = max_boost.saturating_add(1);
        }
        let step = if boost_interval == 0 { 1 } else { boost_interval };
        Self {
            start_cluster,
            end_cluster,
            start_boost,
            step,
            max_boost,
        }
    }

    /// Boost values applied to every cluster.
    pub fn boosts(&self) -> Boosts {
        Boosts {
            next: Some(self.start_boost),
            step: self.step,
            end: self.max_boost,
        }
    }

    pub fn clusters(&self) -> std::ops::RangeInclusive<u32> {
        self.start_cluster..=self.end_cluster
    }

    /// Number of boost values per cluster, computed without walking the series.
    pub fn boost_count(&self) -> u64 {
        let (start, end, step) = (
            i128::from(self.start_boost),
            i128::from(self.max_boost),
            i128::from(self.step),
        );
        let span = if step > 0 { end - start } else { start - end };
        if span <= 0 {
            return 0;
        }
        let step = step.abs();
        // Yielded values stay within [start, end), so the overflow stop in
        // `Boosts` never ends the series early.
        u64::try_from((span + step - 1) / step).unwrap_or(u64::MAX)
    }

    /// Number of pairs `iter` yields, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        let clusters = u64::from(self.end_cluster - self.start_cluster) + 1;
        let total = clusters.saturating_mul(self.boost_count());
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = JobKey> + Clone {
        let boosts = self.boosts();
        self.clusters()
            .flat_map(move |cluster| boosts.clone().map(move |boost| JobKey::new(cluster, boost)))
    }
}

/// Half-open stepped range `[start, end)`; walks down when the step is negative.
#[derive(Debug, Clone)]
pub struct Boosts {
    next: Option<i64>,
    step: i64,
    end: i64,
}

impl Iterator for Boosts {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        let in_range = if self.step > 0 {
            current < self.end
        } else {
            current > self.end
        };
        if !in_range {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.step);
        Some(current)
    }
}
