#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use legal_analyzer::testing::{FakeBackend, ScriptedLlm};
use legal_analyzer::{AppState, Config};

pub use legal_analyzer::testing::build_pdf;

pub const BOUNDARY: &str = "legal-analyzer-test-boundary";

pub fn test_state() -> (AppState, Arc<ScriptedLlm>) {
    test_state_with(Config::defaults())
}

/// App state over an echoing model and the local embedder
pub fn test_state_with(config: Config) -> (AppState, Arc<ScriptedLlm>) {
    let backend = FakeBackend::new(ScriptedLlm::echo());
    let llm = backend.llm.clone();
    (AppState::new(config, Arc::new(backend)), llm)
}

/// Last user message of every request the model has seen
pub fn prompts(llm: &ScriptedLlm) -> Vec<String> {
    llm.requests()
        .iter()
        .filter_map(|r| r.messages.iter().rev().find(|m| m.role == "user"))
        .map(|m| m.content.clone())
        .collect()
}

/// multipart/form-data upload with chunking parameters
pub fn upload_request(session_id: &str, filename: &str, pdf: &[u8], chunk_size: &str, overlap: &str) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in [("chunk_size", chunk_size), ("overlap", overlap)] {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(pdf);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .uri(format!("/api/sessions/{}/documents", session_id))
        .method("POST")
        .header("Content-Type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}
