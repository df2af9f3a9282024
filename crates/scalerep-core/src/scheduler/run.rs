//! Submission / poll loop.

use chrono::Utc;
use std::time::Duration;

use super::pool::WorkerPool;
use crate::config::ScalerepConfig;
use crate::job::JobKey;
use crate::report::{ReportParams, ReportSubmitter};
use crate::storage::{self, CompletionDetector, ProbeStatus};

/// Knobs for one scheduler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Worker slots (maximum reports in flight).
    pub workers: usize,
    /// Sleep before every poll cycle.
    pub poll_interval: Duration,
    /// How far before "now" an artifact may have been modified and still count.
    pub modified_grace: Duration,
    /// Object key prefix in front of `c{cluster}-b{boost}.zip`.
    pub key_prefix: String,
    /// Keep polling after the last submission until nothing is in flight.
    pub drain: bool,
}

impl SchedulerOptions {
    pub fn from_config(cfg: &ScalerepConfig) -> Self {
        Self {
            workers: cfg.workers,
            poll_interval: cfg.poll_interval(),
            modified_grace: cfg.modified_grace(),
            key_prefix: cfg.storage.key_prefix.clone(),
            drain: cfg.drain_on_exit,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Reports the service accepted.
    pub submitted: usize,
    /// Reports the service rejected; never retried.
    pub abandoned: usize,
    /// Reports whose artifact was seen.
    pub completed: usize,
    pub poll_cycles: usize,
    /// Accepted reports whose artifact had not been seen when the run ended.
    pub in_flight: Vec<JobKey>,
}

/// Single-threaded bounded scheduler over a report submitter and a
/// completion detector.
pub struct Scheduler<S, D> {
    submitter: S,
    detector: D,
    params: ReportParams,
    options: SchedulerOptions,
    pool: WorkerPool,
    /// Submission order; entries leave in completion order.
    in_flight: Vec<JobKey>,
    summary: RunSummary,
}

impl<S, D> Scheduler<S, D>
where
    S: ReportSubmitter,
    D: CompletionDetector,
{
    pub fn new(submitter: S, detector: D, params: ReportParams, options: SchedulerOptions) -> Self {
        let pool = WorkerPool::new(options.workers);
        Self {
            submitter,
            detector,
            params,
            options,
            pool,
            in_flight: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn available(&self) -> usize {
        self.pool.available()
    }

    pub fn capacity(&self) -> usize {
        self.pool.total()
    }

    pub fn in_flight(&self) -> &[JobKey] {
        &self.in_flight
    }

    /// Submit every job, waiting on storage whenever all workers are busy.
    ///
    /// Returns once the last job has been submitted and a worker is free; up
    /// to `workers` reports may still be running at that point unless
    /// `drain` is set.
    pub fn run<I>(mut self, jobs: I) -> RunSummary
    where
        I: IntoIterator<Item = JobKey>,
    {
        let mut jobs = jobs.into_iter();
        loop {
            let exhausted = self.fill(&mut jobs);
            self.wait_for_capacity();
            if exhausted {
                break;
            }
        }
        if self.options.drain {
            self.drain();
        }
        self.finish()
    }

    /// Submit jobs while a worker is free. Returns true once `jobs` is exhausted.
    pub fn fill<I>(&mut self, jobs: &mut I) -> bool
    where
        I: Iterator<Item = JobKey>,
    {
        while !self.pool.is_exhausted() {
            let Some(key) = jobs.next() else {
                return true;
            };
            self.submit(key);
        }
        false
    }

    /// Submit one job. A rejected job is logged and dropped without using a worker.
    fn submit(&mut self, key: JobKey) {
        let request = self.params.request_for(key);
        match self.submitter.submit(&request) {
            Ok(()) => {
                if !self.pool.acquire() {
                    tracing::warn!("submitted {} with no free worker", key.file_name());
                }
                self.in_flight.push(key);
                self.summary.submitted += 1;
                tracing::info!(
                    "Report created. {} added to list of currently processing reports.",
                    key.file_name()
                );
            }
            Err(e) => {
                self.summary.abandoned += 1;
                tracing::error!(
                    "Error {} from report service for cluster {}, boost {}",
                    e,
                    key.cluster,
                    key.boost
                );
            }
        }
        debug_assert!(self.in_flight.len() <= self.pool.total());
    }

    /// Poll until a worker frees up. Returns immediately if one already is.
    pub fn wait_for_capacity(&mut self) {
        while self.pool.is_exhausted() && !self.in_flight.is_empty() {
            self.poll_cycle();
        }
    }

    /// Poll until nothing is in flight.
    pub fn drain(&mut self) {
        if !self.in_flight.is_empty() {
            tracing::info!("waiting for {} report(s) to complete", self.in_flight.len());
        }
        while !self.in_flight.is_empty() {
            self.poll_cycle();
        }
    }

    /// Sleep, then probe every in-flight job once. Returns how many completed.
    pub fn poll_cycle(&mut self) -> usize {
        tracing::debug!("Waiting {} seconds...", self.options.poll_interval.as_secs());
        std::thread::sleep(self.options.poll_interval);
        self.summary.poll_cycles += 1;

        let since = storage::modified_since(Utc::now(), self.options.modified_grace);
        let mut completed = 0;
        for key in self.in_flight.clone() {
            let object_key = key.object_key(&self.options.key_prefix);
            tracing::debug!("Searching storage for {}...", object_key);
            match self.detector.probe(&object_key, since) {
                Ok(ProbeStatus::Found) => {
                    self.complete(key);
                    completed += 1;
                }
                Ok(ProbeStatus::NotFound) => {
                    tracing::debug!("File {} not found yet.", key.file_name());
                }
                Err(e) => {
                    tracing::debug!("File {} not found yet ({}).", key.file_name(), e);
                }
            }
        }
        completed
    }

    fn complete(&mut self, key: JobKey) {
        self.in_flight.retain(|k| *k != key);
        self.pool.release();
        self.summary.completed += 1;
        tracing::info!("{}", completion_message(&key.file_name()));
    }

    fn finish(self) -> RunSummary {
        RunSummary {
            in_flight: self.in_flight,
            ..self.summary
        }
    }
}

/// Log line for a report whose artifact appeared, decoded from its file name.
pub(crate) fn completion_message(file_name: &str) -> String {
    match file_name.parse::<JobKey>() {
        Ok(key) => format!(
            "**** Report for cluster {}, boost {} completed. ****",
            key.cluster, key.boost
        ),
        Err(_) => format!("**** Report {} completed. ****", file_name),
    }
}
