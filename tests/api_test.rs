mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{build_pdf, prompts, test_state, test_state_with, upload_request};
use legal_analyzer::Config;
use legal_analyzer::create_router;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn new_session(app: &Router) -> String {
    let request = Request::builder()
        .uri("/api/sessions")
        .method("POST")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

fn contract_pdf() -> Vec<u8> {
    build_pdf(&[
        &[
            "CONSULTING AGREEMENT",
            "This agreement is made between Acme Corp and Jane Doe.",
            "Consultant shall deliver monthly reports to the Client.",
        ],
        &[
            "Termination",
            "Either party may terminate this agreement with thirty days notice.",
            "Liability is limited to the fees paid in the prior twelve months.",
        ],
    ])
}

#[tokio::test]
async fn test_health_and_analysis_types() {
    let (state, _) = test_state();
    let app = create_router(state);

    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);

    let request = Request::builder().uri("/api/analysis-types").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let types = body.as_array().unwrap();
    assert_eq!(types.len(), 5);
    assert_eq!(types[0]["id"], "contract_review");
    assert!(types[4]["preset_query"].is_null());
}

#[tokio::test]
async fn test_index_page_served() {
    let (state, _) = test_state();
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body_bytes.to_vec()).unwrap();
    assert!(html.contains("AI Legal Team Agents"));
    // Error bodies that are not JSON still reach the message area
    assert!(html.contains("await res.text()"));
    assert!(html.contains("sessionStorage.getItem('sessionId')"));
}

#[tokio::test]
async fn test_upload_then_full_analysis() {
    let (state, llm) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        post_json(&format!("/api/sessions/{}/credentials", id), json!({ "api_key": "sk-test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credential_configured"], true);

    let (status, body) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "1000", "200")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["outcome"], "ingested");
    assert_eq!(body["details"]["page_count"], 2);
    assert_eq!(body["verification"]["status"], "verified");

    let request = Request::builder()
        .uri(format!("/api/sessions/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_documents"], json!(["contract.pdf"]));
    assert_eq!(body["knowledge_base_ready"], true);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/sessions/{}/analysis", id),
            json!({ "analysis_type": "contract_review" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    for tab in ["analysis", "key_points", "recommendations"] {
        assert!(!body[tab].as_str().unwrap().is_empty(), "{} tab is empty", tab);
    }
    assert_eq!(body["specialists"].as_array().unwrap().len(), 3);

    let prompts = prompts(&llm);
    assert_eq!(prompts.len(), 6);
    assert!(prompts[0].starts_with("Research legal aspects of: Analyze this document"));
    assert!(prompts[3].starts_with("Create a concise legal analysis report"));
}

#[tokio::test]
async fn test_same_name_upload_is_skipped() {
    let (state, _) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, _) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "1000", "200")).await;
    assert_eq!(status, StatusCode::OK);

    let other = build_pdf(&[&["An unrelated lease agreement."]]);
    let (status, body) = send(&app, upload_request(&id, "contract.pdf", &other, "500", "100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "skipped");

    let request = Request::builder()
        .uri(format!("/api/sessions/{}", id))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, request).await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analysis_before_upload_is_rejected() {
    let (state, llm) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/sessions/{}/analysis", id),
            json!({ "analysis_type": "risk_assessment" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Error: AI agents not properly initialized. Please ensure a document is uploaded and processed."
    );
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_blank_custom_query_is_rejected() {
    let (state, llm) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/sessions/{}/analysis", id),
            json!({ "analysis_type": "custom_query", "query": "   " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a query.");
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_analysis_without_credential() {
    let (state, _) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, _) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "1000", "200")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/sessions/{}/analysis", id),
            json!({ "analysis_type": "compliance_check" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter your API key to proceed.");
}

#[tokio::test]
async fn test_invalid_chunking_rejected() {
    let (state, _) = test_state();
    let app = create_router(state);
    let id = new_session(&app).await;

    let (status, _) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "0", "200")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "1000", "1001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, upload_request(&id, "contract.pdf", &contract_pdf(), "big", "200")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (state, _) = test_state();
    let app = create_router(state);

    let request = Request::builder()
        .uri("/api/sessions/00000000-0000-0000-0000-000000000000")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_is_a_json_error() {
    let mut config = Config::defaults();
    config.knowledge.max_upload_bytes = 4096;
    let (state, _) = test_state_with(config);
    let app = create_router(state);
    let id = new_session(&app).await;

    let mut pdf = contract_pdf();
    pdf.extend(std::iter::repeat(b' ').take(16 * 1024));
    let (status, body) = send(&app, upload_request(&id, "contract.pdf", &pdf, "1000", "200")).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File too large: uploads are limited to 4096 bytes");

    let request = Request::builder()
        .uri(format!("/api/sessions/{}", id))
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, request).await;
    assert_eq!(body["knowledge_base_ready"], false);
}
