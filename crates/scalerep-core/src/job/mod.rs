//! Jobs: the (cluster, boost) pairs a run submits.
//!
//! `JobKey` is the identity of one scale report and the name of the artifact
//! it eventually produces; `JobPlan` enumerates keys from validated
//! command-line arguments.

mod key;
mod plan;

pub use key::{JobKey, ParseKeyError};
pub use plan::{Boosts, JobPlan, PlanArgs, UserProfile, ValidationError, MAX_CLUSTER};
