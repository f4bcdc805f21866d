//! Audit report creation and the execute / dismiss / verify actions

mod helpers;

use axum::http::StatusCode;
use helpers::{test_app_without_llm, TestApp};
use serde_json::{json, Value};

async fn create_feature(app: &TestApp, name: &str) -> String {
    let (status, body) = app
        .post("/features", json!({"name": name, "description": "under test"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    body["feature_id"].as_str().unwrap().to_string()
}

async fn create_report(app: &TestApp, feature_id: &str, needs_action: bool, to: &str) -> String {
    let (status, body) = app
        .post(
            "/audit-report",
            json!({
                "feature_id": feature_id,
                "source_ids": ["s1", "s2"],
                "needs_action": needs_action,
                "original_status": "pending",
                "status_change_to": to,
                "reason": "Collects birth dates without parental consent",
                "confidence": 0.92,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["audit_report_id"].as_str().unwrap().to_string()
}

async fn feature_status(app: &TestApp, feature_id: &str) -> Value {
    let (_, body) = app.get(&format!("/features/{}", feature_id)).await;
    body["feature"]["status"].clone()
}

async fn report(app: &TestApp, id: &str) -> Value {
    let (status, body) = app.get(&format!("/audit-report/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    body["audit_report"].clone()
}

#[tokio::test]
async fn new_report_is_pending() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;
    let id = create_report(&app, &feature_id, true, "critical").await;

    let report = report(&app, &id).await;
    assert_eq!(report["status"], "pending");
    assert_eq!(report["feature_id"], feature_id.as_str());
    assert_eq!(report["source_ids"], json!(["s1", "s2"]));
    assert!(report["updated_at"].is_null());
}

#[tokio::test]
async fn execute_applies_proposed_status_only_when_needed() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;

    let quiet = create_report(&app, &feature_id, false, "critical").await;
    let (status, body) = app
        .post_empty(&format!("/audit-report/{}/action", quiet))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Audit report action executed successfully");
    assert_eq!(feature_status(&app, &feature_id).await, "pending");

    let loud = create_report(&app, &feature_id, true, "critical").await;
    app.post_empty(&format!("/audit-report/{}/action", loud))
        .await;
    assert_eq!(feature_status(&app, &feature_id).await, "critical");
    assert_eq!(report(&app, &loud).await["status"], "pending");
}

#[tokio::test]
async fn dismiss_restores_original_status() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;
    let id = create_report(&app, &feature_id, true, "warning").await;

    app.post_empty(&format!("/audit-report/{}/action", id)).await;
    assert_eq!(feature_status(&app, &feature_id).await, "warning");

    let (status, body) = app
        .post_empty(&format!("/audit-report/{}/dismiss", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Audit report dismissed successfully");
    assert_eq!(feature_status(&app, &feature_id).await, "pending");

    let report = report(&app, &id).await;
    assert_eq!(report["status"], "dismissed");
    assert!(report["updated_at"].is_string());
}

#[tokio::test]
async fn verify_sets_proposed_status() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;
    let id = create_report(&app, &feature_id, true, "critical").await;

    let (status, body) = app
        .post_empty(&format!("/audit-report/{}/verify", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Audit report verified successfully");
    assert_eq!(feature_status(&app, &feature_id).await, "critical");
    assert_eq!(report(&app, &id).await["status"], "verified");
}

#[tokio::test]
async fn reviewed_reports_can_still_be_acted_on() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;
    let id = create_report(&app, &feature_id, true, "critical").await;

    app.post_empty(&format!("/audit-report/{}/verify", id)).await;
    let (status, _) = app
        .post_empty(&format!("/audit-report/{}/dismiss", id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report(&app, &id).await["status"], "dismissed");
    assert_eq!(feature_status(&app, &feature_id).await, "pending");
}

#[tokio::test]
async fn actions_on_unknown_report_are_404() {
    let app = test_app_without_llm().await;

    for action in ["action", "dismiss", "verify"] {
        let (status, _) = app
            .post_empty(&format!("/audit-report/missing/{}", action))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", action);
    }

    let (status, _) = app.get("/audit-report/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_of_report_for_missing_feature_leaves_it_pending() {
    let app = test_app_without_llm().await;
    let id = create_report(&app, "no-such-feature", true, "critical").await;

    for action in ["dismiss", "verify"] {
        let (status, _) = app
            .post_empty(&format!("/audit-report/{}/{}", id, action))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", action);
        assert_eq!(report(&app, &id).await["status"], "pending", "{}", action);
    }
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected() {
    let app = test_app_without_llm().await;
    let (status, _) = app
        .post(
            "/audit-report",
            json!({
                "feature_id": "f1",
                "source_ids": [],
                "needs_action": false,
                "original_status": "pass",
                "status_change_to": "pass",
                "reason": "",
                "confidence": 1.5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pending_lookup_per_feature() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;

    let (status, body) = app
        .get(&format!("/audit-report/feature/{}/pending", feature_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["audit_report"].is_null());

    let first = create_report(&app, &feature_id, true, "warning").await;
    let second = create_report(&app, &feature_id, true, "critical").await;
    app.post_empty(&format!("/audit-report/{}/dismiss", second))
        .await;

    let (_, body) = app
        .get(&format!("/audit-report/feature/{}/pending", feature_id))
        .await;
    assert_eq!(body["audit_report"]["id"], first.as_str());
}

#[tokio::test]
async fn reports_by_source() {
    let app = test_app_without_llm().await;
    let feature_id = create_feature(&app, "Age gate").await;
    let id = create_report(&app, &feature_id, false, "pass").await;

    let (_, body) = app.get("/audit-report/source/s2").await;
    let ids: Vec<&str> = body["audit_reports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![id.as_str()]);

    let (_, body) = app.get("/audit-report/source/s3").await;
    assert_eq!(body["audit_reports"], json!([]));

    let (_, body) = app.get("/audit-report").await;
    assert_eq!(body["audit_reports"].as_array().unwrap().len(), 1);
}
