//! Webhook triggers: token routing and HMAC verification

use crate::prelude::SpecHarness;
use sm_core::{webhook, RunStatus, TriggerSource};
use sm_engine::WebhookError;

#[tokio::test]
async fn token_routes_to_the_script_and_stores_the_payload() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("hooked", "echo triggered\n");
    spec.webhook_token = Some(webhook::generate_token());
    h.update(&spec);
    let token = spec.webhook_token.clone().unwrap();

    let payload = r#"{"branch":"main","sha":"abc123"}"#;
    let run_id = h
        .engine
        .trigger_webhook(&token, Some(payload.to_string()), None)
        .await
        .unwrap();

    let run = h.wait_terminal(&run_id).await;
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.triggered_by, TriggerSource::Webhook);
    assert_eq!(run.payload.as_deref(), Some(payload));
}

#[tokio::test]
async fn unknown_token_is_rejected_without_a_record() {
    let h = SpecHarness::new();
    let err = h
        .engine
        .trigger_webhook("bogus", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::UnknownToken));
    assert_eq!(h.store.run_count(), 0);
}

#[tokio::test]
async fn required_signature_must_match_the_payload() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("signed", "echo verified\n");
    let secret = webhook::generate_secret();
    spec.webhook_token = Some("tok".to_string());
    spec.webhook_secret = Some(secret.clone());
    spec.require_webhook_signature = true;
    h.update(&spec);

    let payload = r#"{"event":"release"}"#;
    let good = webhook::sign(&secret, payload);

    // Valid signature, including the conventional prefix form
    let run_id = h
        .engine
        .trigger_webhook("tok", Some(payload.to_string()), Some(&format!("sha256={good}")))
        .await
        .unwrap();
    h.wait_terminal(&run_id).await;

    // The same signature over a tampered payload fails
    let err = h
        .engine
        .trigger_webhook("tok", Some(r#"{"event":"tampered"}"#.to_string()), Some(&good))
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::BadSignature));

    // No signature at all fails
    let err = h
        .engine
        .trigger_webhook("tok", Some(payload.to_string()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WebhookError::BadSignature));
}

#[tokio::test]
async fn signature_is_optional_unless_the_script_demands_it() {
    let h = SpecHarness::new();
    let mut spec = h.shell_script("open", "echo open\n");
    spec.webhook_token = Some("tok-open".to_string());
    spec.webhook_secret = Some(webhook::generate_secret());
    spec.require_webhook_signature = false;
    h.update(&spec);

    let run_id = h
        .engine
        .trigger_webhook("tok-open", None, None)
        .await
        .unwrap();
    let run = h.wait_terminal(&run_id).await;
    assert_eq!(run.status, RunStatus::Success);
}
