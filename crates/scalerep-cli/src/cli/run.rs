//! Submit every report in the plan and wait for workers to free up.

use anyhow::Result;
use scalerep_core::config::ScalerepConfig;
use scalerep_core::job::{JobPlan, UserProfile};
use scalerep_core::report::{ReportClient, ReportParams};
use scalerep_core::scheduler::{Scheduler, SchedulerOptions};
use scalerep_core::storage::S3Probe;

use super::Cli;

pub fn run_reports(
    cli: &Cli,
    cfg: &ScalerepConfig,
    plan: JobPlan,
    user_profile: UserProfile,
) -> Result<()> {
    let submitter = ReportClient::from_config(&cfg.report)?;
    let detector = S3Probe::from_config(&cfg.storage)?;
    let params = ReportParams {
        alg_id: cli.alg_id,
        query_set: cli.query_set,
        user_profile,
    };
    let options = SchedulerOptions::from_config(cfg);
    let drain = options.drain;

    tracing::info!(
        "submitting {} scale report(s) to {} with {} worker(s)",
        plan.len(),
        submitter.endpoint(),
        cfg.workers.max(1)
    );

    let summary = Scheduler::new(submitter, detector, params, options).run(plan.iter());

    tracing::info!(
        submitted = summary.submitted,
        abandoned = summary.abandoned,
        completed = summary.completed,
        poll_cycles = summary.poll_cycles,
        "run finished"
    );
    for key in &summary.in_flight {
        tracing::debug!("{} still processing", key.file_name());
    }

    if drain && summary.in_flight.is_empty() {
        tracing::info!("All scale reports created and completed.");
    } else {
        tracing::info!("All scale reports created. You may have to wait for the last ones to complete.");
    }
    Ok(())
}
