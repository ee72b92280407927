use common::{TestServer, ANN, BOT_TOKEN, JANE, JANE_FORGED};
use health_tracker::{AuthConfig, DEFAULT_DEV_SENTINEL};
use serde_json::{json, Value};

mod common;

async fn get_me(server: &TestServer, header: &str, credential: &str) -> reqwest::Response {
    // ---
    server
        .client
        .get(server.url("/api/auth/me"))
        .header(header, credential)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn verified_credential_returns_user() {
    // ---
    let server = TestServer::new().await;

    let response = get_me(&server, "X-Telegram-Init-Data", ANN).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["trust"], "verified");
    assert_eq!(body["data"]["user"]["external_id"], 42);
    assert_eq!(body["data"]["user"]["first_name"], "Ann");
    assert_eq!(body["data"]["user"]["username"], "ann");
    assert_eq!(body["data"]["user_id"], body["data"]["user"]["id"]);
}

#[tokio::test]
async fn repeated_logins_keep_the_same_internal_id() {
    // ---
    let server = TestServer::new().await;

    let first: Value = get_me(&server, "x-telegram-init-data", JANE).await.json().await.unwrap();
    let second: Value = get_me(&server, "x-init-data", JANE).await.json().await.unwrap();

    assert_eq!(first["data"]["user_id"], second["data"]["user_id"]);
    assert_eq!(second["data"]["user"]["external_id"], 555);
}

#[tokio::test]
async fn every_header_spelling_is_accepted() {
    // ---
    let server = TestServer::new().await;

    for header in [
        "X-Telegram-Init-Data",
        "X-Telegram-InitData",
        "Telegram-Init-Data",
        "X-Init-Data",
    ] {
        let response = get_me(&server, header, JANE).await;
        assert_eq!(response.status(), 200, "header {header}");
    }
}

#[tokio::test]
async fn forged_credential_is_rejected() {
    // ---
    let server = TestServer::new().await;

    let response = get_me(&server, "X-Telegram-Init-Data", JANE_FORGED).await;
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["reason"], "hash verification failed");
}

#[tokio::test]
async fn missing_credential_is_rejected() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "No credential provided");
}

#[tokio::test]
async fn dev_sentinel_works_only_in_development() {
    // ---
    let dev = TestServer::with_auth(AuthConfig::development(Some(BOT_TOKEN))).await;
    let response = get_me(&dev, "X-Telegram-Init-Data", DEFAULT_DEV_SENTINEL).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["trust"], "unverified");
    assert_eq!(body["data"]["user"]["external_id"], 1);

    let prod = TestServer::new().await;
    let response = get_me(&prod, "X-Telegram-Init-Data", DEFAULT_DEV_SENTINEL).await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn development_falls_back_to_unverified() {
    // ---
    let server = TestServer::with_auth(AuthConfig::development(Some(BOT_TOKEN))).await;

    let response = get_me(&server, "X-Telegram-Init-Data", JANE_FORGED).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["trust"], "unverified");
    assert_eq!(body["data"]["user"]["external_id"], 556);
}

#[tokio::test]
async fn production_without_token_accepts_unverified() {
    // ---
    let server = TestServer::with_auth(AuthConfig::production(None)).await;

    let body: Value = get_me(&server, "X-Telegram-Init-Data", JANE_FORGED)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["trust"], "unverified");

    let response = get_me(&server, "X-Telegram-Init-Data", "auth_date=1").await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "shared secret not configured");
}

#[tokio::test]
async fn legacy_user_id_in_query() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/me?telegram_id=9001"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user"]["external_id"], 9001);
    assert_eq!(body["data"]["trust"], "unverified");
}

#[tokio::test]
async fn legacy_user_id_in_json_body() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/me"))
        .json(&json!({ "userId": 9002 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user"]["external_id"], 9002);
}

#[tokio::test]
async fn header_wins_over_legacy_id() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/me?user_id=9003"))
        .header("X-Telegram-Init-Data", JANE)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user"]["external_id"], 555);
    assert_eq!(body["data"]["trust"], "verified");
}

#[tokio::test]
async fn legacy_user_id_can_be_disabled() {
    // ---
    let mut auth = AuthConfig::production(Some(BOT_TOKEN));
    auth.allow_legacy_user_id = false;
    let server = TestServer::with_auth(auth).await;

    let response = server
        .client
        .get(server.url("/api/auth/me?user_id=9004"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn status_reports_anonymous_requests() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], false);
    assert!(body["data"].get("me").is_none());
}

#[tokio::test]
async fn status_ignores_bad_credentials() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/status"))
        .header("X-Telegram-Init-Data", JANE_FORGED)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], false);
}

#[tokio::test]
async fn status_reports_authenticated_user() {
    // ---
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/status"))
        .header("X-Telegram-Init-Data", JANE)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["me"]["user"]["external_id"], 555);
    assert_eq!(body["data"]["me"]["trust"], "verified");
}

#[tokio::test]
async fn status_passes_oversized_json_body_through_anonymously() {
    // ---
    let server = TestServer::new().await;
    let body = json!({ "user_id": 9005, "notes": "x".repeat(70 * 1024) });

    let response = server
        .client
        .get(server.url("/api/auth/status"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], false);
}

#[tokio::test]
async fn me_rejects_oversized_json_body_as_missing_credential() {
    // ---
    let server = TestServer::new().await;
    let body = json!({ "user_id": 9006, "notes": "x".repeat(70 * 1024) });

    let response = server
        .client
        .get(server.url("/api/auth/me"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "No credential provided");
}
