//! Integration tests for the provider webhook intake and the finalize
//! billing path.
//!
//! The archiver's download target is a closed local port, so archival
//! falls back to the transient URL in every test; the successful-upload
//! path is covered by `skinny-storage`'s own tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use skinny_core::signing::compute_signature;
use skinny_db::models::generation::GenerationStatus;
use skinny_db::models::platform_settings::UpdatePlatformSettings;
use skinny_db::repositories::{GenerationRepo, ProfileRepo, SettingsRepo, TransactionRepo};

/// Transient output URL on a closed port: downloads fail fast and the
/// archiver falls back to the URL unchanged.
const TRANSIENT_URL: &str = "http://127.0.0.1:9/out.png";

async fn post_webhook(app: &axum::Router, body: serde_json::Value) -> axum::http::StatusCode {
    common::send_json(app, "POST", "/webhook", body, &[])
        .await
        .status()
}

// ---------------------------------------------------------------------------
// Test: missing prediction id is rejected with 400
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_prediction_id_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);

    let status = post_webhook(&app, json!({ "status": "succeeded" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: unknown prediction id is acknowledged, nothing mutated
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_prediction_id_is_acknowledged(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::send_json(
        &app,
        "POST",
        "/webhook",
        json!({ "id": "pred-never-seen", "status": "succeeded", "output": [TRANSIENT_URL] }),
        &[],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "No matching generation");
}

// ---------------------------------------------------------------------------
// Test: full finalize -- succeeded webhook bills exactly once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn succeeded_webhook_finalizes_and_bills(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Succeeded);
    // Archive fallback: transient URL retained.
    assert_eq!(updated.output_urls, vec![TRANSIENT_URL.to_string()]);
    assert_eq!(updated.total_cost_cents, Some(65));
    assert!(updated.billing_complete());
    assert_eq!(updated.metadata["billed_via"], "webhook");
    assert_eq!(updated.metadata["billed_amount_cents"], 65);
    assert!(updated.completed_at.is_some());

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 935);

    let tx_count = TransactionRepo::count_for_generation(&pool, generation.id)
        .await
        .unwrap();
    assert_eq!(tx_count, 1);

    let transactions = TransactionRepo::list_for_profile(&pool, profile.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(transactions[0].amount_cents, -65);
    assert_eq!(transactions[0].tx_type, "generation");
    assert_eq!(transactions[0].generation_id, Some(generation.id));
    assert_eq!(
        transactions[0].preview_url.as_deref(),
        Some(TRANSIENT_URL)
    );
}

// ---------------------------------------------------------------------------
// Test: duplicate delivery does not double charge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_delivery_charges_once(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let payload = json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] });

    assert_eq!(post_webhook(&app, payload.clone()).await, StatusCode::OK);
    assert_eq!(post_webhook(&app, payload).await, StatusCode::OK);

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 935, "second delivery must not deduct again");

    let tx_count = TransactionRepo::count_for_generation(&pool, generation.id)
        .await
        .unwrap();
    assert_eq!(tx_count, 1, "exactly one ledger entry per generation");
}

// ---------------------------------------------------------------------------
// Test: lifetime access is never charged
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn lifetime_access_yields_zero_charge(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 500, true).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Succeeded);
    assert!(updated.billing_complete());

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 500, "lifetime access must not touch the balance");

    let transactions = TransactionRepo::list_for_profile(&pool, profile.id, 10, 0)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].amount_cents, 0);
    assert_eq!(transactions[0].metadata["lifetime_access"], true);
}

// ---------------------------------------------------------------------------
// Test: success with no usable output fails the record, free of charge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn success_without_output_is_free_failure(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "succeeded", "output": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Failed);
    assert!(updated.error.is_some());
    assert!(!updated.billing_complete());

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 1000);

    let tx_count = TransactionRepo::count_for_generation(&pool, generation.id)
        .await
        .unwrap();
    assert_eq!(tx_count, 0);
}

// ---------------------------------------------------------------------------
// Test: failed webhook records the provider error, no charge
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_webhook_records_error(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "failed", "error": "NSFW content detected" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Failed);
    assert_eq!(updated.error.as_deref(), Some("NSFW content detected"));

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 1000);
}

// ---------------------------------------------------------------------------
// Test: deduction failure defers billing; redelivery recovers it
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn deduction_failure_recovers_on_redelivery(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    // Balance covers dispatch-time checks elsewhere, but not the charge.
    let profile = common::seed_profile(&pool, "plat-1", 10, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let payload = json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] });
    assert_eq!(post_webhook(&app, payload.clone()).await, StatusCode::OK);

    // Output is kept and the record succeeds, but billing stays open.
    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Succeeded);
    assert_eq!(updated.output_urls.len(), 1);
    assert!(!updated.billing_complete());
    assert_eq!(
        TransactionRepo::count_for_generation(&pool, generation.id)
            .await
            .unwrap(),
        0
    );

    // A top-up arrives, then the provider redelivers the webhook.
    ProfileRepo::credit(&pool, profile.id, 500).await.unwrap();
    assert_eq!(post_webhook(&app, payload).await, StatusCode::OK);

    let recovered = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(recovered.billing_complete());
    assert_eq!(recovered.metadata["billed_via"], "webhook_recovery");

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 510 - 65);
    assert_eq!(
        TransactionRepo::count_for_generation(&pool, generation.id)
            .await
            .unwrap(),
        1
    );
}

// ---------------------------------------------------------------------------
// Test: scaling model multiplies the final charge by output count
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sequential_outputs_scale_the_charge(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 7, true).await;

    let outputs = json!([
        "http://127.0.0.1:9/1.png",
        "http://127.0.0.1:9/2.png",
        "http://127.0.0.1:9/3.png"
    ]);
    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "succeeded", "output": outputs }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.output_urls.len(), 3);
    assert_eq!(updated.total_cost_cents, Some(21));

    let balance = ProfileRepo::find_by_id(&pool, profile.id)
        .await
        .unwrap()
        .unwrap()
        .balance_cents;
    assert_eq!(balance, 1000 - 21);
}

// ---------------------------------------------------------------------------
// Test: processing webhook sets started_at without billing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn processing_webhook_marks_started(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(&app, json!({ "id": "pred-1", "status": "processing" })).await;
    assert_eq!(status, StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Processing);
    assert!(updated.started_at.is_some());
    assert!(!updated.billing_complete());
}

// ---------------------------------------------------------------------------
// Test: signature enforcement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unsigned_webhook_rejected_when_secret_configured(pool: PgPool) {
    SettingsRepo::update(
        &pool,
        &UpdatePlatformSettings {
            replicate_api_token: None,
            webhook_signing_secret: Some("whsec_test".into()),
            gemini_api_key: None,
        },
    )
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let status = post_webhook(
        &app,
        json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nothing was mutated.
    let unchanged = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, GenerationStatus::Starting);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn correctly_signed_webhook_is_processed(pool: PgPool) {
    SettingsRepo::update(
        &pool,
        &UpdatePlatformSettings {
            replicate_api_token: None,
            webhook_signing_secret: Some("whsec_test".into()),
            gemini_api_key: None,
        },
    )
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let body =
        json!({ "id": "pred-1", "status": "succeeded", "output": [TRANSIENT_URL] }).to_string();
    let signature = compute_signature("whsec_test", body.as_bytes());

    let response = common::send_raw(
        &app,
        "POST",
        "/webhook",
        body,
        &[("webhook-signature", signature.as_str())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, GenerationStatus::Succeeded);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn tampered_signature_is_rejected(pool: PgPool) {
    SettingsRepo::update(
        &pool,
        &UpdatePlatformSettings {
            replicate_api_token: None,
            webhook_signing_secret: Some("whsec_test".into()),
            gemini_api_key: None,
        },
    )
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());

    let body = json!({ "id": "pred-1", "status": "succeeded" }).to_string();
    let signature = compute_signature("some_other_secret", body.as_bytes());

    let response = common::send_raw(
        &app,
        "POST",
        "/webhook",
        body,
        &[("x-replicate-signature", signature.as_str())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Test: unrecognized status string is acknowledged without mutation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unrecognized_status_is_acknowledged(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let profile = common::seed_profile(&pool, "plat-1", 1000, false).await;
    let generation = common::seed_generation(&pool, profile.id, "pred-1", 65, false).await;

    let response = common::send_json(
        &app,
        "POST",
        "/webhook",
        json!({ "id": "pred-1", "status": "queued" }),
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Unrecognized status");

    let unchanged = GenerationRepo::find_by_id(&pool, generation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, GenerationStatus::Starting);
}
