//! CLI for scalerep.

mod run;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use scalerep_core::config::{self, ScalerepConfig};
use scalerep_core::job::PlanArgs;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Shown on standard output when the positional arguments are wrong.
pub const USAGE: &str = "scalerep needs 8 arguments: start_cluster, end_cluster, start_boost, \
interval, num_intervals, alg_id, query_set, user_profile";

/// Batch-trigger scale reports over clusters × boosts, a few at a time.
#[derive(Debug, Parser)]
#[command(name = "scalerep")]
#[command(about = "Batch-trigger scale reports and wait for their artifacts", long_about = None)]
pub struct Cli {
    /// First style cluster (0-499).
    #[arg(allow_negative_numbers = true)]
    pub start_cluster: i64,
    /// Last style cluster, inclusive (0-499).
    #[arg(allow_negative_numbers = true)]
    pub end_cluster: i64,
    /// First boost value.
    #[arg(allow_negative_numbers = true)]
    pub start_boost: i64,
    /// Step between boost values (0 is treated as 1).
    #[arg(allow_negative_numbers = true)]
    pub boost_interval: i64,
    /// Number of boost steps per cluster.
    #[arg(allow_negative_numbers = true)]
    pub num_intervals: i64,
    /// Algorithm id the reports are run for.
    #[arg(allow_negative_numbers = true)]
    pub alg_id: i64,
    /// Query set id.
    #[arg(allow_negative_numbers = true)]
    pub query_set: i64,
    /// User profile: RF or RF_PLUS.
    pub user_profile: String,

    /// Read configuration from this file instead of ~/.config/scalerep/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Number of reports in flight at once (overrides the config file).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
    /// After the last submission, keep polling until every report has completed.
    #[arg(long)]
    pub drain: bool,
}

impl Cli {
    pub fn plan_args(&self) -> PlanArgs {
        PlanArgs {
            start_cluster: self.start_cluster,
            end_cluster: self.end_cluster,
            start_boost: self.start_boost,
            boost_interval: self.boost_interval,
            num_intervals: self.num_intervals,
            user_profile: self.user_profile.clone(),
        }
    }

    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, cfg: &mut ScalerepConfig) {
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if self.drain {
            cfg.drain_on_exit = true;
        }
    }

    pub fn run_from_args() -> Result<ExitCode> {
        Self::run_from(std::env::args_os(), &mut io::stdout())
    }

    /// Parse, validate, then load config and run. Usage and validation
    /// messages go to `out`; nothing is loaded or submitted when they occur.
    pub fn run_from<I, T>(args: I, out: &mut dyn Write) -> Result<ExitCode>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(err) => {
                writeln!(out, "{}", err)?;
                writeln!(out, "{}", USAGE)?;
                return Ok(ExitCode::FAILURE);
            }
        };

        let (plan, profile) = match cli.plan_args().validate() {
            Ok(valid) => valid,
            Err(err) => {
                writeln!(out, "{}", err)?;
                return Ok(ExitCode::FAILURE);
            }
        };

        let mut cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        cli.apply_overrides(&mut cfg);
        tracing::debug!("loaded config: {:?}", cfg);

        run::run_reports(&cli, &cfg, plan, profile)?;
        Ok(ExitCode::SUCCESS)
    }
}
