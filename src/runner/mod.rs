//! CLI execution and run scheduling.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! turns command-line options into feature evaluations. Each feature run
//! (one per data record when `--data` is given) gets its own
//! [`EvalContext`], so runs share nothing and may execute on separate
//! threads.

mod error;
mod path_helpers;

pub use error::RunnerError;

use crate::actions::BuiltinActions;
use crate::cli::Cli;
use crate::eval::{EvalContext, EvalOptions, FeatureResult};
use crate::normalize::{AstLoader, DataRecord, YamlAstLoader, load_records};
use crate::settings::Settings;
use crate::status::{self, EvalStatus};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tracing::{debug, info};

use path_helpers::{discover_features, job_attachment_dir, utf8_path};

/// One feature evaluation, optionally bound to a data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position of the job in scheduling order.
    pub index: usize,
    /// Feature file to evaluate.
    pub feature: Utf8PathBuf,
    /// Data record bound ahead of the feature's scenarios.
    pub record: Option<DataRecord>,
}

/// Shared, read-only configuration for every job of a run.
#[derive(Clone)]
pub struct RunConfig {
    /// Settings consulted for unbound names.
    pub settings: Arc<Settings>,
    /// Evaluation policy.
    pub options: EvalOptions,
    /// Root directory for failure attachments.
    pub attachments: Option<Utf8PathBuf>,
    /// Evaluate jobs in parallel.
    pub parallel: bool,
    /// Worker threads for parallel runs; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

#[derive(Serialize)]
struct Report<'a> {
    status: &'a EvalStatus,
    features: &'a [FeatureResult],
}

/// Execute the evaluation described by `cli`.
///
/// Returns the fold of every feature's status, whose exit code the binary
/// reports.
///
/// # Errors
///
/// Returns an error when paths, settings, or data cannot be loaded, when a
/// feature fails with a configuration error, or when the report cannot be
/// written.
pub fn run(cli: &Cli) -> Result<EvalStatus> {
    let paths = cli
        .paths
        .iter()
        .map(|path| utf8_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    let features = discover_features(&paths)?;
    debug!(count = features.len(), "discovered features");

    let settings_paths = cli
        .settings
        .iter()
        .map(|path| utf8_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    let settings = Settings::load_all(&settings_paths).context("loading settings")?;

    let records = match &cli.data {
        Some(data) => {
            let path = utf8_path(data)?;
            let loaded =
                load_records(&path).with_context(|| format!("loading data records from {path}"))?;
            if loaded.is_empty() {
                return Err(RunnerError::EmptyData { path }.into());
            }
            info!(data = %path, records = loaded.len(), "loaded data records");
            loaded.into_iter().map(Some).collect()
        }
        None => vec![None],
    };

    let config = RunConfig {
        settings: Arc::new(settings),
        options: EvalOptions {
            dry_run: cli.dry_run,
            fail_fast: cli.fail_fast(),
            exit_on_fail: cli.exit_on_fail,
        },
        attachments: cli.attachments.as_deref().map(utf8_path).transpose()?,
        parallel: cli.parallel,
        jobs: cli.jobs,
    };
    let jobs = plan_jobs(&features, &records);
    let results = run_jobs(&config, &YamlAstLoader, &jobs)?;
    let overall = status::fold(results.iter().map(|result| &result.status));
    info!(features = results.len(), status = %overall, "run complete");

    if let Some(report) = &cli.report {
        write_report(&utf8_path(report)?, &overall, &results)?;
    }
    Ok(overall)
}

/// Pair every feature with every data record, features outermost.
#[must_use]
pub fn plan_jobs(features: &[Utf8PathBuf], records: &[Option<DataRecord>]) -> Vec<Job> {
    features
        .iter()
        .flat_map(|feature| records.iter().map(move |record| (feature, record)))
        .enumerate()
        .map(|(index, (feature, record))| Job {
            index,
            feature: feature.clone(),
            record: record.clone(),
        })
        .collect()
}

/// Evaluate `jobs`, sequentially or in parallel.
///
/// Sequential runs stop scheduling after the first failed feature when
/// exit-on-fail is set. Parallel runs always evaluate every job.
///
/// # Errors
///
/// Returns the first configuration error raised by any job.
pub fn run_jobs(
    config: &RunConfig,
    loader: &dyn AstLoader,
    jobs: &[Job],
) -> Result<Vec<FeatureResult>> {
    if config.parallel {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.jobs {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().context("building worker pool")?;
        return pool.install(|| {
            jobs.par_iter()
                .map(|job| run_job(config, loader, job))
                .collect()
        });
    }
    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let result = run_job(config, loader, job)?;
        let failed = result.status.is_failed();
        results.push(result);
        if failed && config.options.exit_on_fail {
            info!(
                feature = %job.feature,
                withheld = jobs.len() - results.len(),
                "exit on fail: stopping run"
            );
            break;
        }
    }
    Ok(results)
}

/// Evaluate one job in a fresh context.
///
/// # Errors
///
/// Returns an error when the feature cannot be loaded or normalised, or
/// evaluation hits a configuration error.
pub fn run_job(config: &RunConfig, loader: &dyn AstLoader, job: &Job) -> Result<FeatureResult> {
    let spec = loader
        .load(&job.feature)
        .with_context(|| format!("loading feature {}", job.feature))?;
    let mut ctx = EvalContext::new(Arc::clone(&config.settings), Arc::new(BuiltinActions))
        .with_options(config.options);
    if let Some(root) = &config.attachments {
        ctx = ctx.with_attachments(job_attachment_dir(root, job.index, &job.feature));
    }
    ctx.load_and_evaluate(loader, &spec, job.record.as_ref())
        .with_context(|| format!("evaluating feature {}", job.feature))
}

fn write_report(path: &Utf8Path, overall: &EvalStatus, features: &[FeatureResult]) -> Result<()> {
    let report_error = |source| RunnerError::Report {
        path: path.to_owned(),
        source,
    };
    let file = File::create(path).map_err(report_error)?;
    let report = Report {
        status: overall,
        features,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .map_err(|err| report_error(err.into()))?;
    debug!(report = %path, "report written");
    Ok(())
}
