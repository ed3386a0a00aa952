//! HTTP API Tests
//!
//! Drives the full router over the in-memory store: session handling, the
//! customer/loan/payment flow and the error envelope.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use microfinance_ledger::auth::AuthService;
use microfinance_ledger::build_router;
use microfinance_ledger::config::Config;
use microfinance_ledger::middleware::RateLimiter;
use microfinance_ledger::services::BusinessCalendar;
use microfinance_ledger::state::AppState;
use microfinance_ledger::store::MemoryStore;

const PASSWORD: &str = "collect-daily";

fn app() -> Router {
    let config = Config::default();
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    let auth = Arc::new(AuthService::new(
        config.jwt_secret.clone(),
        config.session_ttl_seconds,
        config.admin_username.clone(),
        hash,
    ));
    let state = AppState::new(Arc::new(MemoryStore::new()), BusinessCalendar::utc(), auth);
    build_router(state, &config, RateLimiter::new(1000))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_customer(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/customers",
        Some(token),
        Some(json!({ "name": name, "phone": "9000000001", "address": "12 Market Road" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_standard_loan(app: &Router, token: &str, customer_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/loans",
        Some(token),
        Some(json!({
            "customer_id": customer_id,
            "principal_amount": 10000,
            "interest_amount": 2000,
            "installment_amount": 1000,
            "repayment_frequency": "monthly",
            "start_date": "2024-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    // Development config
    assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_ledger_routes_require_session() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/customers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");

    let (status, body) =
        send(&app, Method::GET, "/api/customers", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "guess" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/api/customers", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "SESSION_REVOKED");
}

// ============================================================================
// Ledger Flow Tests
// ============================================================================

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = app();
    let token = login(&app).await;
    let customer_id = create_customer(&app, &token, "Asha").await;
    let loan_id = create_standard_loan(&app, &token, &customer_id).await;

    let (status, loan) = send(&app, Method::GET, &format!("/api/loans/{}", loan_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loan["total_amount"].as_f64(), Some(12000.0));
    assert_eq!(loan["number_of_installments"], 12);
    assert_eq!(loan["end_date"], "2025-01-01");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({ "loan_id": loan_id, "paid_amount": 2500, "payment_date": "2024-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/loans/{}/summary?as_of=2024-06-01", loan_id);
    let (status, summary) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["customer_name"], "Asha");
    assert_eq!(summary["total_paid"].as_f64(), Some(2500.0));
    assert_eq!(summary["remaining"].as_f64(), Some(9500.0));
    assert_eq!(summary["installments_paid"], 2);
    assert_eq!(summary["next_due_date"], "2024-04-01");
    assert_eq!(summary["overdue_days"], 61);
    assert_eq!(summary["status"], "active");

    let uri = format!("/api/customers/{}/ledger?as_of=2024-06-01", customer_id);
    let (status, ledger) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ledger["ledger"][0]["loan_number"], 1);
    assert_eq!(ledger["ledger"][0]["payments"][0]["balance_after"].as_f64(), Some(9500.0));
    assert_eq!(ledger["total_remaining"].as_f64(), Some(9500.0));

    let (status, dashboard) =
        send(&app, Method::GET, "/api/dashboard?as_of=2024-06-01", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_customers"], 1);
    assert_eq!(dashboard["active_loans"], 1);
    assert_eq!(dashboard["overdue"], 1);
    assert_eq!(dashboard["pending"].as_f64(), Some(9500.0));

    let (status, overdue) =
        send(&app, Method::GET, "/api/dashboard/overdue?as_of=2024-06-01", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overdue.as_array().map(Vec::len), Some(1));

    let (status, collections) = send(
        &app,
        Method::GET,
        "/api/dashboard/today-collection?as_of=2024-02-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collections["total_collections"], 1);
    assert_eq!(collections["total_amount"].as_f64(), Some(2500.0));
}

// ============================================================================
// Error Envelope Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_frequency_is_field_error() {
    let app = app();
    let token = login(&app).await;
    let customer_id = create_customer(&app, &token, "Ravi").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/loans",
        Some(&token),
        Some(json!({
            "customer_id": customer_id,
            "principal_amount": 1000,
            "interest_amount": 0,
            "installment_amount": 100,
            "repayment_frequency": "fortnightly",
            "start_date": "2024-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"], "repayment_frequency");
}

#[tokio::test]
async fn test_missing_field_is_field_error() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(&token),
        Some(json!({ "name": "Meena", "address": "3 Temple Street" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"], "phone");
}

#[tokio::test]
async fn test_payment_for_unknown_loan() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({
            "loan_id": "00000000-0000-0000-0000-000000000001",
            "paid_amount": 100,
            "payment_date": "2024-02-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "REFERENTIAL_ERROR");
}

#[tokio::test]
async fn test_zero_payment_rejected() {
    let app = app();
    let token = login(&app).await;
    let customer_id = create_customer(&app, &token, "Asha").await;
    let loan_id = create_standard_loan(&app, &token, &customer_id).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payments",
        Some(&token),
        Some(json!({ "loan_id": loan_id, "paid_amount": 0, "payment_date": "2024-02-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"], "paid_amount");
}

#[tokio::test]
async fn test_oversized_payment_leaves_ledger_readable() {
    let app = app();
    let token = login(&app).await;
    let customer_id = create_customer(&app, &token, "Asha").await;
    let loan_id = create_standard_loan(&app, &token, &customer_id).await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/payments",
            Some(&token),
            Some(json!({ "loan_id": loan_id, "paid_amount": 5e20, "payment_date": "2024-02-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"], "paid_amount");
    }

    let uri = format!("/api/loans/{}/summary?as_of=2024-02-01", loan_id);
    let (status, summary) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_paid"].as_f64(), Some(0.0));

    let (status, _) = send(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_customer_with_loans_cannot_be_deleted() {
    let app = app();
    let token = login(&app).await;
    let customer_id = create_customer(&app, &token, "Asha").await;
    create_standard_loan(&app, &token, &customer_id).await;

    let uri = format!("/api/customers/{}", customer_id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let spare = create_customer(&app, &token, "Ravi").await;
    let uri = format!("/api/customers/{}", spare);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
