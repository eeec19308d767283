//! Timeout enforcement: forced kill, bounded overhead, preserved output

use crate::prelude::SpecHarness;
use sm_core::RunStatus;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[tokio::test]
async fn overrunning_script_is_killed_and_marked_timeout() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("runaway", "echo captured\nsleep 30\necho lost\n");
    spec.timeout_ms = Some(150);
    h.update(&spec);

    let start = Instant::now();
    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();
    let run = h.wait_terminal(&run_id).await;

    // Kill overhead stays well under the two-second bound
    assert!(
        start.elapsed() < Duration::from_millis(150) + Duration::from_secs(2),
        "took {:?}",
        start.elapsed()
    );
    assert_eq!(run.status, RunStatus::Timeout);
    assert_eq!(run.exit_code, None);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn partial_output_survives_the_kill() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("cutoff", "echo captured\nsleep 30\necho lost\n");
    spec.timeout_ms = Some(150);
    h.update(&spec);

    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();
    h.wait_terminal(&run_id).await;

    let log = h.engine.run_output(&run_id).await.unwrap();
    assert!(log.contains("captured"));
    assert!(!log.contains("lost"));
    assert!(log.contains("exceeding timeout of 150ms"));
}

#[tokio::test]
async fn script_override_beats_the_deployment_default() {
    let h = SpecHarness::new();
    // Would overrun a tight default; the per-script override allows it
    let mut spec = h.shell_script("patient", "sleep 0.3\necho done\n");
    spec.timeout_ms = Some(10_000);
    h.update(&spec);

    let run_id = h
        .engine
        .trigger_manual(&spec.id, &HashMap::new())
        .await
        .unwrap();
    let run = h.wait_terminal(&run_id).await;

    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(h.engine.run_output(&run_id).await.unwrap(), "done\n");
}
