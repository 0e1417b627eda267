mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::{json, Value};
use solver_service::services::MockEmailProvider;

#[tokio::test]
async fn send_email_delivers_through_provider() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .post(format!("{}/send-email", app.address))
        .json(&json!({
            "to": "student@example.com",
            "subject": "Your solutions",
            "body": "Q1: 2 + 2 = 4"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Email sent successfully");

    assert_eq!(app.email.send_count(), 1);
    let sent = app.email.sent();
    assert_eq!(sent[0].to, "student@example.com");
    assert_eq!(sent[0].subject, "Your solutions");
    assert_eq!(sent[0].body, "Q1: 2 + 2 = 4");

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_recipient_is_rejected() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .post(format!("{}/send-email", app.address))
        .json(&json!({ "to": "not-an-address", "subject": "Hi", "body": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email request");
    assert!(body["error"].as_str().unwrap().contains("to"));
    assert_eq!(app.email.send_count(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .post(format!("{}/send-email", app.address))
        .header("content-type", "application/json")
        .body("{\"to\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email request");

    app.cleanup().await;
}

#[tokio::test]
async fn provider_failure_is_reported() {
    let app = TestApp::spawn_with_email(MockEmailProvider::new(false)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/send-email", app.address))
        .json(&json!({ "to": "student@example.com", "subject": "Hi", "body": "..." }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to send email");
    assert_eq!(body["error"], "Email provider not enabled");

    app.cleanup().await;
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let app = TestApp::spawn().await;

    let response = reqwest::Client::new()
        .get(format!("{}/send-email", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Method not allowed");

    app.cleanup().await;
}
