//! Feature-level evaluation loop.

use std::time::Instant;

use crate::ast::{FeatureSpec, Scenario};
use crate::status::{self, EvalStatus};

use super::step::evaluate_scenario;
use super::{EvalContext, EvalError, FeatureResult};

pub(super) fn evaluate_feature(
    ctx: &mut EvalContext,
    spec: &FeatureSpec,
) -> Result<FeatureResult, EvalError> {
    let started = Instant::now();
    let metas = spec
        .metas
        .iter()
        .map(|meta| load_meta(ctx, meta))
        .collect::<Result<Vec<_>, _>>()?;
    let scenarios = evaluate_scenarios(ctx, &spec.scenarios)?;
    let evaluated = FeatureSpec {
        scenarios,
        metas,
        ..spec.clone()
    };
    let status = evaluated.status();
    let elapsed = started.elapsed();
    if spec.is_meta() {
        if let Some(file) = &spec.file {
            ctx.loaded.insert(file.clone());
        }
        tracing::info!(meta = %spec.label(), status = %status, ?elapsed, "meta loaded");
    } else {
        tracing::info!(feature = %spec.label(), status = %status, ?elapsed, "feature evaluated");
    }
    Ok(FeatureResult {
        spec: evaluated,
        status,
        elapsed,
        attachments: ctx.attachments.list(),
    })
}

/// Evaluate scenarios in order under the context's fail-fast policy.
///
/// Once the statuses so far fold to `Failed`, exit-on-fail withholds the
/// remaining scenarios from the result and fail-fast returns them with
/// every step skipped. Without either flag evaluation carries on.
pub(super) fn evaluate_scenarios(
    ctx: &mut EvalContext,
    scenarios: &[Scenario],
) -> Result<Vec<Scenario>, EvalError> {
    let mut evaluated: Vec<Scenario> = Vec::with_capacity(scenarios.len());
    for (index, scenario) in scenarios.iter().enumerate() {
        let so_far = status::fold(evaluated.iter().map(Scenario::status));
        if so_far.is_failed() {
            let remaining = scenarios.len() - index;
            if ctx.options.exit_on_fail {
                tracing::info!(withheld = remaining, "exit on fail: stopping feature");
                break;
            }
            if ctx.options.fail_fast {
                tracing::info!(skipped = remaining, "fail fast: skipping remaining scenarios");
                evaluated.extend(
                    scenarios
                        .iter()
                        .skip(index)
                        .map(|rest| rest.with_steps_marked(&EvalStatus::Skipped)),
                );
                break;
            }
        }
        evaluated.push(evaluate_scenario(ctx, scenario)?);
    }
    Ok(evaluated)
}

/// Register the StepDefs of a normalised meta file.
fn load_meta(ctx: &mut EvalContext, meta: &FeatureSpec) -> Result<FeatureSpec, EvalError> {
    let scenarios = evaluate_scenarios(ctx, &meta.scenarios)?;
    let loaded = FeatureSpec {
        scenarios,
        ..meta.clone()
    };
    let path = meta.file.clone().unwrap_or_default();
    if let Some(cause) = loaded.status().cause() {
        return Err(EvalError::MetaFailed {
            path,
            cause: cause.to_owned(),
        });
    }
    tracing::info!(meta = %path, stepdefs = ctx.registry.len(), "meta loaded");
    ctx.loaded.insert(path);
    Ok(loaded)
}
