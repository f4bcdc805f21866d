//! POST /scripts/reset

mod helpers;

use axum::http::StatusCode;
use helpers::test_app_without_llm;
use serde_json::json;

#[tokio::test]
async fn reset_clears_sources_and_reports_but_keeps_features() {
    let app = test_app_without_llm().await;

    let (_, body) = app
        .post("/features", json!({"name": "Kids mode", "description": "d"}))
        .await;
    let feature_id = body["feature_id"].as_str().unwrap().to_string();
    app.post("/sources", json!({"source_url": "https://regs.test/coppa"}))
        .await;
    app.post(
        "/sources/content",
        json!({"source_url": "https://regs.test/coppa", "title": "t", "content": "c"}),
    )
    .await;
    let (_, body) = app
        .post(
            "/audit-report",
            json!({
                "feature_id": feature_id,
                "source_ids": [],
                "needs_action": true,
                "original_status": "pending",
                "status_change_to": "critical",
                "reason": "r",
                "confidence": 0.7,
            }),
        )
        .await;
    app.post_empty(&format!(
        "/audit-report/{}/action",
        body["audit_report_id"].as_str().unwrap()
    ))
    .await;

    let (status, body) = app.post_empty("/scripts/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Reset completed");
    assert_eq!(
        body["summary"],
        json!({
            "audit_reports_deleted": 1,
            "source_contents_deleted": 1,
            "sources_deleted": 1,
            "features_reset": 1,
        })
    );

    let (_, body) = app.get("/sources").await;
    assert_eq!(body["sources"], json!([]));
    let (_, body) = app.get("/sources/content").await;
    assert_eq!(body["source_contents"], json!([]));
    let (_, body) = app.get("/audit-report").await;
    assert_eq!(body["audit_reports"], json!([]));

    let (_, body) = app.get(&format!("/features/{}", feature_id)).await;
    assert_eq!(body["feature"]["status"], "pending");
    assert!(body["feature"]["updated_at"].is_string());
}

#[tokio::test]
async fn reset_on_empty_database_succeeds() {
    let app = test_app_without_llm().await;
    let (status, body) = app.post_empty("/scripts/reset").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["features_reset"], 0);
}
