//! Tests for step dispatch, StepDef invocation, and the fail-fast loop.

use anyhow::Result;
use rstest::rstest;
use std::sync::{Arc, Mutex, PoisonError};
use stepwise::actions::{ActionEnv, ActionError, BuiltinActions, StepAction};
use stepwise::ast::{Background, FeatureSpec, Scenario, Step, Tag};
use stepwise::eval::{EvalContext, EvalError, EvalOptions, FeatureResult, TABLE_OBJECT};
use stepwise::normalize::{AstLoader, DataRecord, YamlAstLoader};
use stepwise::settings::Settings;
use stepwise::status::EvalStatus;
use stepwise::stepdef::StepDefError;
use test_support::{
    RecordingAction, and, feature, given, scenario, stepdef, then, utf8_temp_dir, when, write_file,
};

fn context(action: Arc<dyn StepAction>, options: EvalOptions) -> EvalContext {
    EvalContext::new(Arc::new(Settings::new()), action).with_options(options)
}

fn four_scenarios() -> FeatureSpec {
    feature(
        "Four",
        (1..=4)
            .map(|n| scenario(&format!("scenario {n}"), vec![given(&format!("step {n}"))]))
            .collect(),
    )
}

fn run_four(options: EvalOptions) -> (FeatureResult, Arc<RecordingAction>) {
    let action = Arc::new(RecordingAction::new().failing_on("step 2"));
    let mut ctx = context(action.clone(), options);
    let result = ctx.evaluate_feature(&four_scenarios()).expect("evaluate");
    (result, action)
}

fn keywords(result: &FeatureResult) -> Vec<&'static str> {
    result
        .spec
        .scenarios
        .iter()
        .map(|s| s.status().keyword())
        .collect()
}

#[rstest]
fn without_fail_fast_every_scenario_runs() {
    let (result, action) = run_four(EvalOptions::default());
    assert_eq!(keywords(&result), vec!["Passed", "Failed", "Passed", "Passed"]);
    assert_eq!(action.performed().len(), 4);
    assert!(result.status.is_failed());
}

#[rstest]
fn fail_fast_skips_but_keeps_remaining_scenarios() {
    let (result, action) = run_four(EvalOptions {
        fail_fast: true,
        ..EvalOptions::default()
    });
    assert_eq!(keywords(&result), vec!["Passed", "Failed", "Skipped", "Skipped"]);
    assert_eq!(action.performed(), vec!["step 1", "step 2"]);
}

#[rstest]
#[case(false)]
#[case(true)]
fn exit_on_fail_withholds_remaining_scenarios(#[case] fail_fast: bool) {
    let (result, action) = run_four(EvalOptions {
        fail_fast,
        exit_on_fail: true,
        ..EvalOptions::default()
    });
    let names: Vec<&str> = result.spec.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["scenario 1", "scenario 2"]);
    assert_eq!(action.performed(), vec!["step 1", "step 2"]);
    assert_eq!(result.status.cause(), Some("step 2 failed"));
}

#[rstest]
fn dry_run_suppresses_actions_only() {
    let action = Arc::new(RecordingAction::new().failing_on("step 2"));
    let mut ctx = context(
        action.clone(),
        EvalOptions {
            dry_run: true,
            ..EvalOptions::default()
        },
    );
    let result = ctx.evaluate_feature(&four_scenarios()).expect("evaluate");
    assert!(action.performed().is_empty());
    assert_eq!(keywords(&result), vec!["Passed"; 4]);
}

#[rstest]
fn dry_run_keeps_fail_fast_for_unbound_references() {
    let spec = feature(
        "Dry",
        vec![
            scenario("unbound", vec![given("x is \"$<missing>\"")]),
            scenario("later", vec![given("y is \"1\"")]),
        ],
    );
    let mut ctx = context(
        Arc::new(RecordingAction::new()),
        EvalOptions {
            dry_run: true,
            fail_fast: true,
            exit_on_fail: false,
        },
    );
    let result = ctx.evaluate_feature(&spec).expect("evaluate");
    assert_eq!(keywords(&result), vec!["Failed", "Skipped"]);
    assert_eq!(result.status.cause(), Some("unbound reference: missing"));
}

#[rstest]
fn stepdef_params_are_scoped_to_the_call() {
    let spec = feature(
        "Greet",
        vec![
            stepdef("I greet <name>", vec![given("greeting is \"hello $<name>\"")]),
            scenario(
                "greets",
                vec![
                    when("I greet ada"),
                    then("greeting should be \"hello ada\""),
                ],
            ),
        ],
    );
    let mut ctx = context(Arc::new(BuiltinActions), EvalOptions::default());
    let result = ctx.evaluate_feature(&spec).expect("evaluate");

    assert!(result.status.is_passed(), "{}", result.status);
    let [loaded, greets] = result.spec.scenarios.as_slice() else {
        panic!("expected two scenarios");
    };
    assert_eq!(loaded.status(), EvalStatus::Loaded);
    let call = greets.steps.first().expect("call step");
    let body = call.stepdef.as_deref().expect("stepdef body recorded");
    assert!(body.steps.iter().all(|step| step.status.is_passed()));
    assert_eq!(ctx.scopes().depth(), 0);
    assert!(ctx.scopes().get_opt("name").is_none());
}

#[rstest]
fn param_scope_is_popped_when_the_body_fails() {
    let spec = feature(
        "Failing call",
        vec![
            stepdef("I check <value>", vec![then("value should be \"never\"")]),
            scenario("checks", vec![when("I check something")]),
        ],
    );
    let mut ctx = context(Arc::new(BuiltinActions), EvalOptions::default());
    let result = ctx.evaluate_feature(&spec).expect("evaluate");
    assert!(result.status.is_failed());
    assert_eq!(ctx.scopes().depth(), 0);
}

/// Opens a `page` scope whenever it runs, as a navigation action would.
struct PageOpener;

impl StepAction for PageOpener {
    fn perform(&self, _expression: &str, env: &mut ActionEnv<'_>) -> Result<(), ActionError> {
        env.scopes().set("page", "title", "Home");
        Ok(())
    }
}

#[rstest]
fn scopes_opened_inside_a_stepdef_close_with_it() {
    let spec = feature(
        "Visit",
        vec![
            stepdef("I visit <name>", vec![given("the page opens")]),
            scenario("visits", vec![when("I visit ada"), then("nothing else")]),
        ],
    );
    let mut ctx = context(Arc::new(PageOpener), EvalOptions::default());
    let result = ctx.evaluate_feature(&spec).expect("evaluate");

    assert!(result.status.is_passed(), "{}", result.status);
    assert_eq!(ctx.scopes().depth(), 1, "only the scope opened by the last step remains");
    assert!(ctx.scopes().get_opt("name").is_none());
    assert_eq!(ctx.scopes().get_opt("title"), Some("Home"));
}

#[rstest]
fn data_binder_handles_spaced_headers_and_quoted_cells() {
    let record = DataRecord {
        file: "people.csv".into(),
        record: 1,
        columns: vec![
            ("first name".into(), "ada".into()),
            ("quote".into(), "say \"hi\"".into()),
            ("price".into(), "$<cost>".into()),
        ],
    };
    let spec = feature(
        "People",
        vec![scenario(
            "reads the record",
            vec![
                then("first name should be \"ada\""),
                and("quote should be \"say \"hi\"\""),
                and("price should be \"$$<cost>\""),
            ],
        )],
    );
    let mut ctx = context(Arc::new(BuiltinActions), EvalOptions::default());
    let result = ctx
        .load_and_evaluate(&YamlAstLoader, &spec, Some(&record))
        .expect("evaluate");

    assert!(result.status.is_passed(), "{}", result.status);
    assert_eq!(keywords(&result), vec!["Passed", "Passed"]);
    assert_eq!(ctx.scopes().get_opt("quote"), Some("say \"hi\""));
    assert_eq!(ctx.scopes().get_opt("price"), Some("$<cost>"));
}

#[rstest]
fn self_calling_stepdef_is_infinite_recursion() {
    let spec = feature(
        "Loop",
        vec![
            stepdef("I loop", vec![given("I loop")]),
            scenario("loops", vec![when("I loop")]),
        ],
    );
    let mut ctx = context(Arc::new(RecordingAction::new()), EvalOptions::default());
    let err = ctx.evaluate_feature(&spec).expect_err("recursion");
    assert!(
        matches!(err, EvalError::StepDef(StepDefError::InfiniteRecursion { .. })),
        "{err}"
    );
    assert_eq!(ctx.scopes().depth(), 0);
}

#[rstest]
fn ambiguous_steps_abort_evaluation() {
    let spec = feature(
        "Ambiguous",
        vec![
            stepdef("I have <n> apples", Vec::new()),
            stepdef("I have <count> <fruit>", Vec::new()),
            scenario("counts", vec![given("I have 3 apples")]),
        ],
    );
    let mut ctx = context(Arc::new(RecordingAction::new()), EvalOptions::default());
    let err = ctx.evaluate_feature(&spec).expect_err("ambiguous");
    assert!(
        matches!(err, EvalError::StepDef(StepDefError::Ambiguous { .. })),
        "{err}"
    );
}

#[rstest]
fn steps_after_a_failure_are_skipped() {
    let mut failing = scenario("s", vec![given("ok"), and("bad"), and("never")]);
    failing.background = Some(Background {
        name: "bg".into(),
        description: Vec::new(),
        steps: vec![given("setup")],
    });
    let action = Arc::new(RecordingAction::new().failing_on("bad"));
    let mut ctx = context(action.clone(), EvalOptions::default());
    let result = ctx
        .evaluate_feature(&feature("F", vec![failing]))
        .expect("evaluate");
    let evaluated = result.spec.scenarios.first().expect("scenario");
    let statuses: Vec<&str> = evaluated.all_steps().map(|s| s.status.keyword()).collect();
    assert_eq!(statuses, vec!["Passed", "Passed", "Failed", "Skipped"]);
    assert_eq!(action.performed(), vec!["setup", "ok", "bad"]);
}

#[rstest]
fn failed_background_skips_scenario_steps() {
    let mut guarded = scenario("s", vec![given("body")]);
    guarded.background = Some(Background {
        name: "bg".into(),
        description: Vec::new(),
        steps: vec![given("setup")],
    });
    let action = Arc::new(RecordingAction::new().failing_on("setup"));
    let mut ctx = context(action.clone(), EvalOptions::default());
    let result = ctx
        .evaluate_feature(&feature("F", vec![guarded]))
        .expect("evaluate");
    let evaluated = result.spec.scenarios.first().expect("scenario");
    assert_eq!(
        evaluated.steps.first().map(|s| s.status.keyword()),
        Some("Skipped")
    );
    assert_eq!(action.performed(), vec!["setup"]);
}

#[rstest]
fn ignored_scenarios_do_not_run() {
    let mut ignored = scenario("ignored", vec![given("never")]);
    ignored.tags.push(Tag::Ignore);
    let action = Arc::new(RecordingAction::new());
    let mut ctx = context(action.clone(), EvalOptions::default());
    let result = ctx
        .evaluate_feature(&feature("F", vec![ignored]))
        .expect("evaluate");
    assert_eq!(result.status, EvalStatus::Skipped);
    assert!(action.performed().is_empty());
}

#[rstest]
fn evaluation_leaves_the_input_untouched() {
    let spec = four_scenarios();
    let before = spec.clone();
    let mut ctx = context(Arc::new(RecordingAction::new()), EvalOptions::default());
    let result = ctx.evaluate_feature(&spec).expect("evaluate");
    assert_eq!(spec, before);
    assert!(spec.scenarios.iter().all(|s| s.status() == EvalStatus::Pending));
    assert!(result.status.is_passed());
}

#[derive(Default)]
struct TableProbe {
    seen: Mutex<Vec<Option<String>>>,
}

impl StepAction for TableProbe {
    fn perform(&self, _expression: &str, env: &mut ActionEnv<'_>) -> Result<(), ActionError> {
        let table = env
            .scopes()
            .objects()
            .get(TABLE_OBJECT)
            .map(ToString::to_string);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(table);
        Ok(())
    }
}

#[rstest]
fn data_tables_are_bound_for_the_step_only() {
    let mut with_table = given("a table");
    with_table.table = vec![vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]];
    let probe = Arc::new(TableProbe::default());
    let mut ctx = context(probe.clone(), EvalOptions::default());
    ctx.evaluate_feature(&feature(
        "Tables",
        vec![scenario("s", vec![with_table, and("no table")])],
    ))
    .expect("evaluate");
    let seen = probe.seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
    assert_eq!(seen, vec![Some(r#"[["a","b"],["1","2"]]"#.to_owned()), None]);
    assert!(ctx.scopes().objects().is_empty());
}

#[rstest]
fn failures_write_attachments() -> Result<()> {
    let (_guard, dir) = utf8_temp_dir()?;
    let action = Arc::new(RecordingAction::new().failing_on("bad"));
    let mut ctx = context(action, EvalOptions::default()).with_attachments(dir.join("att"));
    let result = ctx.evaluate_feature(&feature("F", vec![scenario("s", vec![given("bad")])]))?;
    let step: &Step = result
        .spec
        .scenarios
        .first()
        .and_then(|s: &Scenario| s.steps.first())
        .expect("step");
    let names: Vec<&str> = step.attachments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Error details", "Environment"]);
    let files: Vec<&str> = result
        .attachments
        .iter()
        .filter_map(|a| a.file.file_name())
        .collect();
    assert_eq!(files, vec!["0001-error-details.txt", "0002-environment.json"]);
    let details = std::fs::read_to_string(&step.attachments.first().expect("details").file)?;
    assert_eq!(details, "bad failed");
    Ok(())
}

#[rstest]
fn settings_back_interpolation() {
    let mut settings = Settings::new();
    settings.set("env.host", "example.test");
    let action = Arc::new(RecordingAction::new());
    let mut ctx = EvalContext::new(Arc::new(settings), action.clone());
    ctx.evaluate_feature(&feature(
        "F",
        vec![scenario("s", vec![given("open https://${env.host}/")])],
    ))
    .expect("evaluate");
    assert_eq!(action.performed(), vec!["open https://example.test/"]);
}

#[rstest]
fn meta_files_load_once_per_context() -> Result<()> {
    let (_guard, dir) = utf8_temp_dir()?;
    write_file(
        &dir,
        "common.meta",
        "feature:\n  name: Common\nscenarios:\n  - name: I greet <name>\n    steps:\n      - keyword: Given\n        expression: greeting is \"hello $<name>\"\n",
    )?;
    let path = write_file(
        &dir,
        "greet.feature",
        "feature:\n  name: Greet\n  tags: ['@Import(\"common.meta\")']\nscenarios:\n  - name: greets\n    steps:\n      - keyword: When\n        expression: I greet ada\n      - keyword: Then\n        expression: greeting should be \"hello ada\"\n",
    )?;
    let spec = YamlAstLoader.load(&path)?;
    let mut ctx = context(Arc::new(BuiltinActions), EvalOptions::default());

    let first = ctx.load_and_evaluate(&YamlAstLoader, &spec, None)?;
    assert!(first.status.is_passed(), "{}", first.status);
    assert_eq!(first.spec.metas.len(), 1);
    assert_eq!(ctx.loaded_metas().len(), 1);

    ctx.reset();
    let second = ctx.load_and_evaluate(&YamlAstLoader, &spec, None)?;
    assert!(second.status.is_passed(), "{}", second.status);
    assert!(second.spec.metas.is_empty());
    Ok(())
}
