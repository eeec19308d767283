//! Recurring schedules: registration, fires, disable, next-fire math

use crate::prelude::SpecHarness;
use chrono::{TimeZone, Timelike, Utc};
use sm_core::{next_fire_time, ParamKind, ScriptParameter, TriggerSource};
use std::time::Duration;

#[tokio::test]
async fn scheduled_fire_runs_with_declared_defaults() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("cron-tick", "echo \"$WHO\"\n");
    spec.parameters = vec![ScriptParameter::new("WHO", ParamKind::String).with_default("cron")];
    // Sub-minute expression so the test observes a real fire
    spec.schedule_cron = Some("* * * * * *".to_string());
    spec.schedule_enabled = true;
    h.update(&spec);

    assert!(h.engine.apply_schedule(&spec).unwrap());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    let run = loop {
        let runs = h.engine.run_history(&spec.id, 1).await.unwrap();
        if let Some(run) = runs.into_iter().next() {
            if run.is_finished() {
                break run;
            }
        }
        assert!(tokio::time::Instant::now() < deadline, "schedule never fired");
        tokio::time::sleep(Duration::from_millis(25)).await;
    };

    assert_eq!(run.triggered_by, TriggerSource::Scheduler);
    assert_eq!(h.engine.run_output(&run.id).await.unwrap(), "cron\n");
    h.engine.shutdown();
}

#[tokio::test]
async fn re_registration_leaves_exactly_one_timer() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("cron-solo", "true\n");
    spec.schedule_cron = Some("* * * * * *".to_string());
    spec.schedule_enabled = true;
    h.update(&spec);

    // Registering twice must replace, not stack
    assert!(h.engine.apply_schedule(&spec).unwrap());
    assert!(h.engine.apply_schedule(&spec).unwrap());

    tokio::time::sleep(Duration::from_millis(2200)).await;
    h.engine.shutdown();

    // One timer fires once per second; a stacked timer would double it
    let count = h.store.run_count();
    assert!((1..=3).contains(&count), "saw {count} fires");
}

#[tokio::test]
async fn disabling_before_the_due_time_means_zero_fires() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("cron-paused", "echo should-not-run\n");
    spec.schedule_cron = Some("* * * * * *".to_string());
    spec.schedule_enabled = true;
    h.update(&spec);
    assert!(h.engine.apply_schedule(&spec).unwrap());

    spec.schedule_enabled = false;
    h.update(&spec);
    assert!(!h.engine.apply_schedule(&spec).unwrap());
    assert!(!h.engine.schedule_active(&spec.id));

    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(h.store.run_count(), 0);
}

#[test]
fn next_fire_lands_on_the_quarter_hour() {
    let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 7, 30).unwrap();
    let next = next_fire_time("*/15 * * * *", now).unwrap();
    assert_eq!(next.minute() % 15, 0);
    assert_eq!(next.second(), 0);
    assert!(next > now);
}

#[test]
fn invalid_expression_has_no_next_fire() {
    assert_eq!(next_fire_time("not a cron", Utc::now()), None);
}
