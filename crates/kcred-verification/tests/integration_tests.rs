//! # Integration Tests for kcred-verification
//!
//! Router tests use `tower::ServiceExt::oneshot` with the issuance service
//! stubbed by wiremock. The end-to-end tests serve the real issuance router
//! on an ephemeral port and verify through the HTTP oracle.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kcred_core::{Credential, CredentialData, CredentialId, Timestamp, WorkerId};
use kcred_issuance_client::{IssuanceClient, IssuanceClientConfig, IssuanceOracle};
use kcred_verification::state::{AppConfig, AppState};

// -- Helpers ------------------------------------------------------------------

fn client_for(base_url: &str) -> Arc<dyn IssuanceOracle> {
    Arc::new(
        IssuanceClient::new(IssuanceClientConfig {
            base_url: base_url.parse().unwrap(),
            timeout_secs: 2,
        })
        .unwrap(),
    )
}

fn test_app(issuance_url: &str, worker: &str) -> axum::Router {
    kcred_verification::app(AppState::with_oracle(
        client_for(issuance_url),
        WorkerId::new(worker),
        Duration::from_secs(2),
    ))
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn verify_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/verification/verify")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn alice() -> CredentialData {
    json!({"name": "Alice", "degree": "BSc"})
        .as_object()
        .cloned()
        .unwrap()
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Serve the issuance router on an ephemeral port and return its base URL.
async fn spawn_issuance(worker: &str) -> String {
    let app = kcred_issuance::app(kcred_issuance::state::AppState::in_memory(WorkerId::new(
        worker,
    )));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// -- Verdicts against a stubbed issuance service ------------------------------

#[tokio::test]
async fn test_verify_valid_credential() {
    let server = MockServer::start().await;
    let cred = Credential::issue(
        alice(),
        WorkerId::new("issuer-1"),
        Timestamp::parse("2024-01-01T00:00:00.000Z").unwrap(),
    );
    Mock::given(method("POST"))
        .and(path("/api/credentials/issue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Credential already issued by issuer-1",
            "credential": cred,
            "alreadyIssued": true,
        })))
        .mount(&server)
        .await;

    let response = test_app(&server.uri(), "verifier-1")
        .oneshot(verify_request(
            r#"{"credentialData":{"degree":"BSc","name":"Alice"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "valid");
    assert_eq!(body["message"], "Credential is valid. Originally issued by issuer-1");
    assert_eq!(body["verifiedBy"], "verifier-1");
    assert_eq!(body["issuedBy"], "issuer-1");
    assert_eq!(body["issuedAt"], "2024-01-01T00:00:00.000Z");
    assert_eq!(body["credentialId"], CredentialId::derive(&alice()).as_str());
}

#[tokio::test]
async fn test_verify_invalid_when_issuance_rejects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/credentials/issue"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "Internal server error while issuing credential",
        })))
        .mount(&server)
        .await;

    let response = test_app(&server.uri(), "verifier-1")
        .oneshot(verify_request(r#"{"credentialData":{"name":"Alice"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "invalid");
    assert_eq!(body["message"], "Credential not found or invalid");
    assert!(body.get("issuedBy").is_none());
    assert!(body.get("issuedAt").is_none());
}

#[tokio::test]
async fn test_verify_returns_503_when_issuance_unreachable() {
    let response = test_app(&closed_port_url().await, "verifier-1")
        .oneshot(verify_request(r#"{"credentialData":{"name":"Alice"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "Service temporarily unavailable: Cannot connect to issuance service"
    );
}

// -- Validation and ancillary endpoints --------------------------------------

#[tokio::test]
async fn test_verify_rejects_invalid_payloads_without_calling_issuance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for body in [
        r#"{}"#,
        r#"{"credentialData":null}"#,
        r#"{"credentialData":7}"#,
        r#"[{"name":"Alice"}]"#,
    ] {
        let response = test_app(&server.uri(), "v")
            .oneshot(verify_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Invalid request: credentialData is required and must be an object"
        );
    }
}

#[tokio::test]
async fn test_health_and_worker() {
    let app = test_app("http://127.0.0.1:9", "verifier-h");

    let health = body_json(app.clone().oneshot(get("/api/verification/health")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "verification-service");
    assert_eq!(health["workerId"], "verifier-h");

    let worker = body_json(app.oneshot(get("/api/verification/worker")).await.unwrap()).await;
    assert_eq!(worker["workerId"], "verifier-h");
}

#[tokio::test]
async fn test_descriptor_and_404() {
    let app = test_app("http://127.0.0.1:9", "v");

    let root = body_json(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert_eq!(root["endpoints"]["verify"], "POST /api/verification/verify");

    let response = app.oneshot(get("/api/verification/history")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Endpoint not found");
}

// -- End to end ---------------------------------------------------------------

#[tokio::test]
async fn test_verify_previously_issued_reports_original_issuer() {
    let issuance_url = spawn_issuance("issuer-pod-0").await;
    let client = IssuanceClient::new(IssuanceClientConfig::for_url(&issuance_url).unwrap()).unwrap();
    let issued = client.issue(&alice()).await.unwrap();
    let credential = issued.credential.unwrap();

    let response = test_app(&issuance_url, "verifier-pod-3")
        .oneshot(verify_request(
            r#"{"credentialData":{"degree":"BSc","name":"Alice"}}"#,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;

    assert_eq!(body["status"], "valid");
    assert_eq!(body["credentialId"], credential.id.as_str());
    assert_eq!(body["issuedBy"], "issuer-pod-0");
    assert_eq!(body["issuedAt"], credential.issued_at.to_string());
    assert_eq!(body["verifiedBy"], "verifier-pod-3");
}

#[tokio::test]
async fn test_verify_fresh_payload_issues_it() {
    let issuance_url = spawn_issuance("issuer-pod-1").await;
    let fresh = r#"{"credentialData":{"name":"Never Seen","year":2025}}"#;

    let response = test_app(&issuance_url, "verifier-pod-1")
        .oneshot(verify_request(fresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let verdict = body_json(response).await;
    assert_eq!(verdict["status"], "valid");
    assert_eq!(verdict["issuedBy"], "issuer-pod-1");

    // The credential now exists: issuing it reports already issued.
    let data = json!({"name": "Never Seen", "year": 2025})
        .as_object()
        .cloned()
        .unwrap();
    let client = IssuanceClient::new(IssuanceClientConfig::for_url(&issuance_url).unwrap()).unwrap();
    let again = client.issue(&data).await.unwrap();
    assert_eq!(again.already_issued, Some(true));
    assert_eq!(
        again.credential.unwrap().issued_at.to_string(),
        verdict["issuedAt"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_verifications_are_logged_to_file() {
    let issuance_url = spawn_issuance("issuer-pod-2").await;
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        issuance: IssuanceClientConfig::for_url(&issuance_url).unwrap(),
        ..AppConfig::from_lookup(|_: &str| None).unwrap()
    };
    let app = kcred_verification::app(
        AppState::from_config(&config, WorkerId::new("verifier-pod-2")).unwrap(),
    );

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(verify_request(r#"{"credentialData":{"name":"Logged"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(config.verifications_path()).unwrap())
            .unwrap();
    let entries = raw["verifications"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["status"] == "valid"));
    assert!(entries.iter().all(|e| e["verifiedBy"] == "verifier-pod-2"));
    assert!(entries.iter().all(|e| e["issuedBy"] == "issuer-pod-2"));
}
