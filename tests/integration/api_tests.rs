//! API integration tests against a running server

use reqwest::{multipart, Client};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@dsfix.com",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Unique equipment code per run, so reruns don't collide
fn unique_code() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("IT-{}", millis % 1_000_000_000)
}

async fn create_equipment(client: &Client, token: &str, code: &str) -> Value {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "code": code,
            "name": "Coffee Machine",
            "category": "Coffee Machine",
            "location": "Lobby"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_ready_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@dsfix.com",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["admin"]["email"], "admin@dsfix.com");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@dsfix.com",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_admin() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "admin@dsfix.com");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_equipment_code() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = unique_code();
    create_equipment(&client, &token, &code).await;

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "code": code,
            "name": "Another Machine",
            "category": "Coffee Machine",
            "location": "Floor 2"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_request_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = unique_code();
    let equipment = create_equipment(&client, &token, &code).await;

    // Requester resolves the scanned code
    let response = client
        .get(format!("{}/public/equipment/{}", BASE_URL, code))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Requester files the request
    let response = client
        .post(format!("{}/public/requests", BASE_URL))
        .json(&json!({
            "equipment_id": equipment["id"],
            "requester_name": "Alice",
            "requester_department": "Sales",
            "description": "Not heating water properly",
            "urgency": "HIGH"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    let request_id = created["id"].as_str().expect("No request ID").to_string();

    // Admin finishes it
    let response = client
        .put(format!("{}/requests/{}/status", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "status": "DONE", "note": "Fixed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/requests/{}", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let detail: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(detail["status"], "DONE");
    assert!(detail["completed_at"].is_string());
    assert_eq!(detail["history"].as_array().map(Vec::len), Some(2));

    // Deactivation hides the code from requesters
    let response = client
        .post(format!("{}/equipment/{}/deactivate", BASE_URL, equipment["id"].as_str().unwrap()))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/public/equipment/{}", BASE_URL, code))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_search_no_match() {
    let client = Client::new();

    let response = client
        .get(format!("{}/public/equipment/search?q=xyz-nonexistent", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!([]));
}

#[tokio::test]
#[ignore]
async fn test_upload_rejects_pdf() {
    let client = Client::new();

    let part = multipart::Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("manual.pdf")
        .mime_str("application/pdf")
        .expect("Invalid mime");
    let form = multipart::Form::new().part("file", part);

    let response = client
        .post(format!("{}/public/uploads/photo", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["pending"].is_number());
    assert!(body["active_equipment"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/requests", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_status_updates_keep_history_chained() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = format!("{}-C", unique_code());
    let equipment = create_equipment(&client, &token, &code).await;

    let response = client
        .post(format!("{}/public/requests", BASE_URL))
        .json(&json!({
            "equipment_id": equipment["id"],
            "requester_name": "Bruno",
            "requester_department": "Finance",
            "description": "Paper jam on every print job",
            "urgency": "MEDIUM"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    let request_id = created["id"].as_str().expect("No request ID").to_string();

    let statuses = ["IN_PROGRESS", "DONE", "CANCELLED", "PENDING"];
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            let url = format!("{}/requests/{}/status", BASE_URL, request_id);
            let token = token.clone();
            let status = statuses[i % statuses.len()];
            tokio::spawn(async move {
                client
                    .put(url)
                    .header("Authorization", format!("Bearer {}", token))
                    .json(&json!({ "status": status }))
                    .send()
                    .await
                    .expect("Failed to send request")
                    .status()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.expect("Task panicked").is_success());
    }

    let response = client
        .get(format!("{}/requests/{}", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let detail: Value = response.json().await.expect("Failed to parse response");

    // Newest first; each entry starts where the next older one ended
    let history = detail["history"].as_array().expect("No history");
    assert_eq!(history[0]["new_status"], detail["status"]);
    for pair in history.windows(2) {
        assert_eq!(pair[0]["previous_status"], pair[1]["new_status"]);
        assert_ne!(pair[0]["previous_status"], pair[0]["new_status"]);
    }
    assert!(history.last().expect("Empty history")["previous_status"].is_null());
}
