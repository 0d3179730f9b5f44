// Admission pipeline tests: headers, rate tiers, screening, content type,
// deadline, session authentication and role gating through the full router.


use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use test_utils::{spawn_app, spawn_app_with, test_config};
use turnate_config::RateTierConfig;
use turnate_types::UserRole;

fn assert_security_headers(headers: &axum::http::HeaderMap) {
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    assert!(headers.contains_key("permissions-policy"));
    assert!(headers["content-security-policy"]
        .to_str()
        .unwrap()
        .contains("https://code.jquery.com"));
}

#[tokio::test]
async fn test_security_headers_on_success_and_rejection() {
    let app = spawn_app().await;

    let ok = app.get("/health", None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_security_headers(&ok.headers);

    let rejected = app.get("/api/me", None).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_security_headers(&rejected.headers);
}

#[tokio::test]
async fn test_global_tier_limits_per_client() {
    let mut config = test_config();
    config.rate_limits.global = RateTierConfig::per_second(1.0, 2);
    let app = spawn_app_with(config).await;

    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);

    let limited = app.get("/health", None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "Rate limit exceeded");
    assert_eq!(limited.body["message"], "Too many requests. Please slow down.");
    assert_security_headers(&limited.headers);

    // A different client key has its own bucket
    let other = Request::builder()
        .uri("/health")
        .header("x-forwarded-for", "198.51.100.99")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(other).await.status, StatusCode::OK);

    // One token back after a second
    app.clock.advance(std::time::Duration::from_secs(1));
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_tier_only_guards_auth_endpoints() {
    let app = spawn_app().await;
    app.create_user("alice", UserRole::Normal).await;

    for _ in 0..5 {
        let response = app
            .post("/auth/login", None, json!({ "username": "alice" }))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body["token"].is_string());
    }

    let limited = app
        .post("/auth/login", None, json!({ "username": "alice" }))
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "Authentication rate limit exceeded");

    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_api_tier_runs_before_session_check() {
    let mut config = test_config();
    config.rate_limits.api = RateTierConfig::per_second(1.0, 1);
    let app = spawn_app_with(config).await;

    assert_eq!(
        app.get("/api/me", Some("garbage")).await.status,
        StatusCode::UNAUTHORIZED
    );
    let limited = app.get("/api/me", Some("garbage")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "API rate limit exceeded");
}

#[tokio::test]
async fn test_issued_token_authenticates() {
    let app = spawn_app().await;
    let login = app
        .post("/auth/login", None, json!({ "username": "root" }))
        .await;
    let token = login.body["token"].as_str().unwrap().to_string();

    let me = app.get("/api/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "root");
    assert_eq!(me.body["role"], "admin");
}

#[tokio::test]
async fn test_query_screening_rejects_before_authentication() {
    let app = spawn_app().await;

    let response = app
        .get("/api/search?q=%3Cscript%3Ealert(1)%3C%2Fscript%3E", None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid input detected");
    assert_eq!(response.body["field"], "q");

    let user = app.create_user("bob", UserRole::Normal).await;
    let clean = app.get("/api/search?q=hello", Some(&user.token)).await;
    assert_eq!(clean.status, StatusCode::OK);
    assert_eq!(clean.body["q"], "hello");
}

#[tokio::test]
async fn test_path_parameter_screening() {
    let app = spawn_app().await;

    let response = app
        .get("/api/channels/..%2F..%2Fetc%2Fpasswd", Some(&app.admin.token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid path parameter");
    assert_eq!(response.body["field"], "id");
}

#[tokio::test]
async fn test_form_body_screening() {
    let app = spawn_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header("x-forwarded-for", "203.0.113.10")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=root%27%3B%20drop%20table%20users"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["field"], "username");
}

#[tokio::test]
async fn test_body_methods_need_json_or_multipart() {
    let app = spawn_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/channels")
        .header("x-forwarded-for", "203.0.113.10")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("name=plain"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.body["error"], "Unsupported content type");
    assert_eq!(
        response.body["message"],
        "Expected application/json or multipart/form-data"
    );
}

#[tokio::test(start_paused = true)]
async fn test_deadline_returns_timeout() {
    let app = spawn_app().await;

    let response = app.get("/slow", None).await;
    assert_eq!(response.status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(response.body["error"], "Request timeout");
    assert_eq!(
        response.body["message"],
        "The request took too long to process"
    );
    assert_security_headers(&response.headers);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_request_costs_one_token() {
    let mut config = test_config();
    config.rate_limits.global = RateTierConfig::per_second(1.0, 3);
    let app = spawn_app_with(config).await;

    assert_eq!(
        app.get("/slow", None).await.status,
        StatusCode::REQUEST_TIMEOUT
    );

    // Burst of 3, one spent on the abandoned request
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
    assert_eq!(
        app.get("/health", None).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
}

fn oversized_form(client: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header("x-forwarded-for", client)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={}", "a".repeat(119))))
        .unwrap()
}

#[tokio::test]
async fn test_rate_tier_rejects_before_body_is_buffered() {
    let mut config = test_config();
    config.rate_limits.global = RateTierConfig::per_second(1.0, 1);
    config.max_request_body_size = 16;
    let app = spawn_app_with(config).await;

    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);

    let limited = app.send(oversized_form("203.0.113.10")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "Rate limit exceeded");

    // A client with tokens left still hits the body cap
    let fresh = app.send(oversized_form("198.51.100.7")).await;
    assert_eq!(fresh.status, StatusCode::BAD_REQUEST);
    assert_eq!(fresh.body["error"], "Request body too large");
}

#[tokio::test]
async fn test_bearer_header_failures() {
    let app = spawn_app().await;

    let missing = app.get("/api/me", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "Authorization header required");

    let malformed = Request::builder()
        .uri("/api/me")
        .header("x-forwarded-for", "203.0.113.10")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let malformed = app.send(malformed).await;
    assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        malformed.body["error"],
        "Invalid authorization header format"
    );

    let invalid = app.get("/api/me", Some("not.a.token")).await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.body["error"], "Invalid token");
}

#[tokio::test]
async fn test_deactivation_takes_effect_immediately() {
    let app = spawn_app().await;
    let carol = app.create_user("carol", UserRole::Normal).await;

    assert_eq!(
        app.get("/api/me", Some(&carol.token)).await.status,
        StatusCode::OK
    );

    app.users.set_active(carol.principal.id, false).await;
    let response = app.get("/api/me", Some(&carol.token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "User not found or inactive");
}

#[tokio::test]
async fn test_disabled_account_cannot_log_in() {
    let app = spawn_app().await;
    let frank = app.create_user("frank", UserRole::Normal).await;
    app.users.set_active(frank.principal.id, false).await;

    let response = app
        .post("/auth/login", None, json!({ "username": "frank" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Account is disabled");
}

#[tokio::test]
async fn test_admin_deactivation_ends_sessions() {
    let app = spawn_app().await;
    let grace = app.create_user("grace", UserRole::Normal).await;
    let heidi = app.create_user("heidi", UserRole::Normal).await;
    let grace_path = format!("/api/users/{}", grace.principal.id);

    // Users may rename themselves but not touch status or other profiles
    let renamed = app
        .patch(&grace_path, Some(&grace.token), json!({ "display_name": "Grace H" }))
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["display_name"], "Grace H");

    let escalation = app
        .patch(&grace_path, Some(&grace.token), json!({ "role": "admin" }))
        .await;
    assert_eq!(escalation.status, StatusCode::FORBIDDEN);
    assert_eq!(
        escalation.body["error"],
        "Only admins can update role and status"
    );

    let meddling = app
        .patch(&grace_path, Some(&heidi.token), json!({ "is_active": false }))
        .await;
    assert_eq!(meddling.status, StatusCode::FORBIDDEN);
    assert_eq!(meddling.body["error"], "Permission denied");

    let deactivated = app
        .patch(&grace_path, Some(&app.admin.token), json!({ "is_active": false }))
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.body["is_active"], false);

    let response = app.get("/api/me", Some(&grace.token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_last_seen_failure_is_not_fatal() {
    let app = spawn_app().await;
    let dave = app.create_user("dave", UserRole::Normal).await;
    app.users.fail_last_seen_updates(true);

    let response = app.get("/api/me", Some(&dave.token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_need_admin_role() {
    let app = spawn_app().await;
    let erin = app.create_user("erin", UserRole::Normal).await;

    let denied = app.get("/api/admin/stats", Some(&erin.token)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["error"], "Admin access required");

    let anonymous = app.get("/api/admin/stats", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let allowed = app.get("/api/admin/stats", Some(&app.admin.token)).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["requested_by"], "root");
}
