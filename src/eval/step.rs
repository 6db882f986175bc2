//! Step and scenario evaluation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::actions::ActionEnv;
use crate::ast::{Background, Scenario, Step};
use crate::scope::{STEPDEF_SCOPE, Scope};
use crate::status::EvalStatus;
use crate::stepdef::StepDefError;

use super::{EvalContext, EvalError, MAX_STEPDEF_DEPTH, Reference, TABLE_OBJECT, interpolate};

/// Evaluate one step, dispatching to a StepDef or the literal action.
pub(super) fn evaluate_step(ctx: &mut EvalContext, step: &Step) -> Result<Step, EvalError> {
    let expression = match interpolate(&step.expression, |reference| resolve(ctx, reference)) {
        Ok(expression) => expression,
        Err(err) => return Ok(failed(ctx, step, Duration::ZERO, err.to_string())),
    };
    let has_table = !step.table.is_empty();
    if has_table {
        ctx.scopes.objects_mut().bind(TABLE_OBJECT, json!(step.table));
    }
    let outcome = dispatch(ctx, step, &expression);
    if has_table {
        ctx.scopes.objects_mut().clear(TABLE_OBJECT);
    }
    let evaluated = outcome?;
    tracing::debug!(step = %step, status = %evaluated.status, "step evaluated");
    Ok(evaluated)
}

fn resolve(ctx: &EvalContext, reference: Reference<'_>) -> Option<String> {
    let scoped = || ctx.scopes.get_opt(reference.name());
    let setting = || ctx.settings.get_opt(reference.name());
    match reference {
        Reference::Attribute(_) => scoped().or_else(setting),
        Reference::Setting(_) => setting().or_else(scoped),
    }
    .map(str::to_owned)
}

fn dispatch(ctx: &mut EvalContext, step: &Step, expression: &str) -> Result<Step, EvalError> {
    let resolved = ctx
        .registry
        .resolve(expression)?
        .map(|found| (found.stepdef.clone(), found.params));
    match resolved {
        Some((stepdef, params)) => call_stepdef(ctx, step, expression, &stepdef, params),
        None => perform(ctx, step, expression),
    }
}

fn call_stepdef(
    ctx: &mut EvalContext,
    step: &Step,
    expression: &str,
    stepdef: &Scenario,
    params: Vec<(String, String)>,
) -> Result<Step, EvalError> {
    let frame = (stepdef.name.clone(), expression.to_owned());
    if ctx.call_stack.contains(&frame) || ctx.call_stack.len() >= MAX_STEPDEF_DEPTH {
        return Err(StepDefError::InfiniteRecursion {
            name: stepdef.name.clone(),
            expression: expression.to_owned(),
        }
        .into());
    }
    tracing::debug!(stepdef = %stepdef.name, depth = ctx.call_stack.len(), "calling StepDef");
    ctx.call_stack.push(frame);
    let depth = ctx.scopes.depth();
    ctx.scopes.push(Scope::with_bindings(STEPDEF_SCOPE, params));
    let outcome = evaluate_body(ctx, stepdef);
    ctx.scopes.truncate(depth);
    ctx.call_stack.pop();
    let body = outcome?;
    Ok(Step {
        status: body.status(),
        stepdef: Some(Box::new(body)),
        ..step.clone()
    })
}

fn perform(ctx: &mut EvalContext, step: &Step, expression: &str) -> Result<Step, EvalError> {
    if ctx.options.dry_run {
        return Ok(step.with_status(EvalStatus::passed(Duration::ZERO)));
    }
    let action = Arc::clone(&ctx.action);
    let started = Instant::now();
    let result = {
        let mut env = ActionEnv::new(&mut ctx.scopes, &ctx.settings);
        action.perform(expression, &mut env)
    };
    let elapsed = started.elapsed();
    Ok(match result {
        Ok(()) => step.with_status(EvalStatus::passed(elapsed)),
        Err(err) => failed(ctx, step, elapsed, err.to_string()),
    })
}

/// Mark `step` failed and attach the cause and a scope snapshot.
fn failed(ctx: &mut EvalContext, step: &Step, elapsed: Duration, cause: String) -> Step {
    tracing::info!(step = %step, cause = %cause, "step failed");
    let mut attachments = step.attachments.clone();
    if ctx.attachments.is_enabled() {
        let environment = serde_json::to_vec_pretty(&ctx.scopes.snapshot()).unwrap_or_default();
        let files = [
            ("Error details", "txt", cause.as_bytes()),
            ("Environment", "json", environment.as_slice()),
        ];
        for (name, extension, content) in files {
            match ctx.attachments.attach(name, extension, content) {
                Ok(Some(attachment)) => attachments.push(attachment),
                Ok(None) => {}
                Err(err) => tracing::warn!(attachment = name, error = %err, "failed to write attachment"),
            }
        }
    }
    Step {
        status: EvalStatus::failed(elapsed, cause),
        attachments,
        ..step.clone()
    }
}

/// Evaluate steps in order, skipping those after the first failure.
fn run_steps(ctx: &mut EvalContext, steps: &[Step]) -> Result<Vec<Step>, EvalError> {
    let mut evaluated = Vec::with_capacity(steps.len());
    let mut failed_already = false;
    for step in steps {
        if failed_already {
            evaluated.push(step.with_status(EvalStatus::Skipped));
            continue;
        }
        let result = evaluate_step(ctx, step)?;
        failed_already = result.status.is_failed();
        evaluated.push(result);
    }
    Ok(evaluated)
}

/// Evaluate a scenario's background and steps.
///
/// The scenario's own steps are skipped when its background fails.
fn evaluate_body(ctx: &mut EvalContext, scenario: &Scenario) -> Result<Scenario, EvalError> {
    let background = scenario
        .background
        .as_ref()
        .map(|bg| {
            run_steps(ctx, &bg.steps).map(|steps| Background {
                steps,
                ..bg.clone()
            })
        })
        .transpose()?;
    let background_failed = background
        .as_ref()
        .is_some_and(|bg| bg.status().is_failed());
    let steps = if background_failed {
        scenario
            .steps
            .iter()
            .map(|step| step.with_status(EvalStatus::Skipped))
            .collect()
    } else {
        run_steps(ctx, &scenario.steps)?
    };
    Ok(Scenario {
        background,
        steps,
        ..scenario.clone()
    })
}

/// Evaluate one scenario of a feature.
///
/// StepDefs are registered and marked loaded; `@Ignore` scenarios are
/// marked skipped. Neither runs any step.
pub(super) fn evaluate_scenario(
    ctx: &mut EvalContext,
    scenario: &Scenario,
) -> Result<Scenario, EvalError> {
    if scenario.is_stepdef() {
        ctx.registry.add(scenario.clone())?;
        tracing::debug!(stepdef = %scenario.name, "StepDef registered");
        return Ok(scenario.with_steps_marked(&EvalStatus::Loaded));
    }
    if scenario.is_ignored() {
        tracing::info!(scenario = %scenario.name, "scenario ignored");
        return Ok(scenario.with_steps_marked(&EvalStatus::Skipped));
    }
    let evaluated = evaluate_body(ctx, scenario)?;
    tracing::info!(
        scenario = %scenario.name,
        status = %evaluated.status(),
        "scenario evaluated"
    );
    Ok(evaluated)
}
