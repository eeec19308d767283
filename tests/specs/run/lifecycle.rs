//! Run lifecycle: pending through terminal, exactly once

use crate::prelude::SpecHarness;
use sm_core::{ParamKind, RunStatus, ScriptParameter, TriggerSource};
use sm_engine::TriggerError;
use std::collections::HashMap;

#[tokio::test]
async fn successful_run_walks_the_full_lifecycle() {
    let h = SpecHarness::new();
    let spec = h.shell_script("lifecycle", "echo working\n");

    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();

    let run = h.wait_terminal(&run_id).await;
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.exit_code, Some(0));
    assert_eq!(run.triggered_by, TriggerSource::Manual);

    let started = run.started_at.unwrap();
    let finished = run.finished_at.unwrap();
    assert!(run.created_at <= started);
    assert!(started <= finished);
}

#[tokio::test]
async fn nonzero_exit_maps_to_failure_with_the_code() {
    let h = SpecHarness::new();
    let spec = h.shell_script("fails", "echo diagnostics here\nexit 42\n");

    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();

    let run = h.wait_terminal(&run_id).await;
    assert_eq!(run.status, RunStatus::Failure);
    assert_eq!(run.exit_code, Some(42));
    // Output produced before the failing exit is preserved
    let log = h.engine.run_output(&run_id).await.unwrap();
    assert!(log.contains("diagnostics here"));
}

#[tokio::test]
async fn spawn_failure_goes_straight_from_pending_to_failure() {
    let h = SpecHarness::new();
    let spec = h.phantom_script("vanished");

    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();

    let run = h.wait_terminal(&run_id).await;
    assert_eq!(run.status, RunStatus::Failure);
    assert_eq!(run.exit_code, Some(-1));
    assert!(run.started_at.is_none(), "run never spawned");
    assert!(run.finished_at.is_some());

    let log = h.engine.run_output(&run_id).await.unwrap();
    assert!(log.contains("script file not found"));
}

#[tokio::test]
async fn missing_required_parameters_create_no_record() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("strict", "echo \"$A $B\"\n");
    spec.parameters = vec![
        ScriptParameter::new("A", ParamKind::String).required(),
        ScriptParameter::new("B", ParamKind::Number).required(),
    ];
    h.update(&spec);

    let err = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap_err();

    // Every unresolved name is reported at once
    match err {
        TriggerError::Validation(e) => {
            let message = e.to_string();
            assert!(message.contains("A") && message.contains("B"));
        }
        other => panic!("expected validation error, got {other}"),
    }
    assert_eq!(h.store.run_count(), 0);
}

#[tokio::test]
async fn explicit_values_beat_defaults_and_extras_are_ignored() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("merge", "echo \"$NAME:$LEVEL\"\n");
    spec.parameters = vec![
        ScriptParameter::new("NAME", ParamKind::String).with_default("default-name"),
        ScriptParameter::new("LEVEL", ParamKind::Number).with_default("1"),
    ];
    h.update(&spec);

    let params = HashMap::from([
        ("NAME".to_string(), "given".to_string()),
        ("UNDECLARED".to_string(), "dropped".to_string()),
    ]);
    let run_id = h.engine.trigger_manual(&spec.id, &params).await.unwrap();
    h.wait_terminal(&run_id).await;

    assert_eq!(h.engine.run_output(&run_id).await.unwrap(), "given:1\n");
}

#[tokio::test]
async fn history_lists_newest_runs_first() {
    let h = SpecHarness::new();
    let spec = h.shell_script("repeat", "true\n");

    let mut ids = Vec::new();
    for _ in 0..3 {
        let run_id = h
            .engine
            .trigger_manual(&spec.id, &HashMap::new())
            .await
            .unwrap();
        h.wait_terminal(&run_id).await;
        ids.push(run_id);
        // created_at ordering needs distinct timestamps
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let history = h.engine.run_history(&spec.id, 2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, ids[2]);
    assert_eq!(history[1].id, ids[1]);
}
