//! End-to-end tests through the router, using the in-memory store and
//! the recording dispatcher.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use dish_digest_core::Email;
use dish_digest_server::config::DigestConfig;
use dish_digest_server::kv::{KvStore, MemoryKvStore};
use dish_digest_server::notify::{Dispatcher, MemoryDispatcher};
use dish_digest_server::routes;
use dish_digest_server::state::AppState;
use dish_digest_server::store::DigestStore;
use dish_digest_server::token;

const SECRET: &str = "kD8#mQ2$vN5@xR7!pT4&wZ9^bG1*hJ6%";
const BEARER: &str = "Bearer kD8#mQ2$vN5@xR7!pT4&wZ9^bG1*hJ6%";

struct TestApp {
    router: Router,
    store: DigestStore,
    dispatcher: MemoryDispatcher,
}

fn test_app() -> TestApp {
    let config = DigestConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 8787,
        base_url: Url::parse("http://digest.test").unwrap(),
        shared_secret: SecretString::from(SECRET),
        dispatch: None,
        kv: None,
        sentry_dsn: None,
        sentry_environment: None,
    };

    let store = DigestStore::new(KvStore::Memory(MemoryKvStore::new()));
    let dispatcher = MemoryDispatcher::new();
    let state = AppState::with_parts(
        config,
        store.clone(),
        Dispatcher::Memory(dispatcher.clone()),
    );

    TestApp {
        router: routes::routes().with_state(state),
        store,
        dispatcher,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn form_subscribe(email: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/subscribe")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "email={}",
            urlencoding::encode(email)
        )))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn valid_token(email: &str) -> String {
    token::sign(&SecretString::from(SECRET), email)
}

#[tokio::test]
async fn subscribe_confirm_unsubscribe_lifecycle() {
    let app = test_app();
    let jane = Email::parse("jane@cornell.edu").unwrap();

    // Subscribe with mixed case: 200, nothing persisted yet.
    let (status, body) = send(&app.router, form_subscribe("Jane@Cornell.edu")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("inbox"));
    assert!(!app.store.is_subscribed(&jane).await.unwrap());

    // The dispatched confirm URL points at our own origin and carries the
    // token over the normalized address.
    let sent = app.dispatcher.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, jane);
    assert!(sent[0].confirm_url.starts_with("http://digest.test/api/confirm?"));
    assert!(sent[0].confirm_url.contains(&valid_token("jane@cornell.edu")));

    // Confirm with the lowercase address: record created.
    let uri = format!(
        "/api/confirm?email=jane@cornell.edu&token={}",
        valid_token("jane@cornell.edu")
    );
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.is_subscribed(&jane).await.unwrap());

    // Second confirm with the same token is an idempotent success.
    let (status, body) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("lready subscribed"));

    // Unsubscribe with the same token removes the record.
    let uri = format!(
        "/api/unsubscribe?email=jane@cornell.edu&token={}",
        valid_token("jane@cornell.edu")
    );
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.store.is_subscribed(&jane).await.unwrap());
}

#[tokio::test]
async fn subscribe_accepts_json_body() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/subscribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email": "  A@B.COM "}"#))
        .unwrap();

    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    // Normalized before signing.
    let sent = app.dispatcher.sent().await;
    assert_eq!(sent[0].email.as_str(), "a@b.com");
}

#[tokio::test]
async fn subscribe_rejects_invalid_email() {
    let app = test_app();

    for bad in ["not-an-email", "user@", "@b.com", "user@nodot", ""] {
        let (status, _) = send(&app.router, form_subscribe(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {bad:?}");
    }
    assert!(app.dispatcher.sent().await.is_empty());
}

#[tokio::test]
async fn subscribe_is_idempotent_for_confirmed_subscriber() {
    let app = test_app();
    let jane = Email::parse("jane@cornell.edu").unwrap();
    app.store.add_subscriber(&jane).await.unwrap();

    let (status, body) = send(&app.router, form_subscribe("jane@cornell.edu")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("lready subscribed"));

    // No duplicate verification email.
    assert!(app.dispatcher.sent().await.is_empty());
}

#[tokio::test]
async fn confirm_rejects_missing_and_invalid_params() {
    let app = test_app();

    let (status, _) = send(&app.router, get("/api/confirm")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, get("/api/confirm?email=jane@cornell.edu")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/confirm?token={}", valid_token("jane@cornell.edu"));
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Tampered token: forbidden, nothing written.
    let uri = format!("/api/confirm?email=jane@cornell.edu&token={}", "0".repeat(64));
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let jane = Email::parse("jane@cornell.edu").unwrap();
    assert!(!app.store.is_subscribed(&jane).await.unwrap());

    // Token for a different address: forbidden.
    let uri = format!(
        "/api/confirm?email=jane@cornell.edu&token={}",
        valid_token("john@cornell.edu")
    );
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unsubscribe_absent_record_succeeds() {
    let app = test_app();

    let uri = format!(
        "/api/unsubscribe?email=ghost@cornell.edu&token={}",
        valid_token("ghost@cornell.edu")
    );
    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.subscriber_emails().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_subscribers_requires_bearer_secret() {
    let app = test_app();
    let jane = Email::parse("jane@cornell.edu").unwrap();
    app.store.add_subscriber(&jane).await.unwrap();

    // No header.
    let (status, body) = send(&app.router, get("/api/subscribers")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.contains("jane@cornell.edu"));

    // Wrong value.
    let request = Request::builder()
        .uri("/api/subscribers")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.contains("jane@cornell.edu"));

    // Correct secret.
    let request = Request::builder()
        .uri("/api/subscribers")
        .header(header::AUTHORIZATION, BEARER)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        parsed["subscribers"],
        serde_json::json!(["jane@cornell.edu"])
    );
}

fn store_picks_request(auth: Option<&str>, payload: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/store_picks")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

#[tokio::test]
async fn store_picks_requires_bearer_secret() {
    let app = test_app();
    let payload = serde_json::json!({"date_str": "Friday", "meals": {}});

    let (status, _) = send(&app.router, store_picks_request(None, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.latest_picks().await.unwrap().is_none());
}

#[tokio::test]
async fn store_picks_validates_required_fields() {
    let app = test_app();

    let missing_meals = serde_json::json!({"date_str": "Friday"});
    let (status, body) = send(
        &app.router,
        store_picks_request(Some(BEARER), &missing_meals),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(parsed["error"].is_string());

    // Singleton left unchanged.
    assert!(app.store.latest_picks().await.unwrap().is_none());
}

#[tokio::test]
async fn store_picks_rejects_malformed_bodies_as_json() {
    let app = test_app();

    // Syntactically broken JSON.
    let request = Request::builder()
        .method("POST")
        .uri("/api/store_picks")
        .header(header::AUTHORIZATION, BEARER)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(parsed["error"].is_string());

    // Missing Content-Type.
    let request = Request::builder()
        .method("POST")
        .uri("/api/store_picks")
        .header(header::AUTHORIZATION, BEARER)
        .body(Body::from(r#"{"date_str": "Friday", "meals": {}}"#))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(parsed["error"].is_string());

    assert!(app.store.latest_picks().await.unwrap().is_none());
}

#[tokio::test]
async fn store_picks_overwrites_fully() {
    let app = test_app();

    let monday = serde_json::json!({"date_str": "Monday", "meals": {"lunch": {"picks": []}}});
    let (status, body) = send(&app.router, store_picks_request(Some(BEARER), &monday)).await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["success"], serde_json::json!(true));
    assert_eq!(parsed["stored_date"], serde_json::json!("Monday"));

    let tuesday = serde_json::json!({"date_str": "Tuesday", "meals": {}});
    let (status, _) = send(&app.router, store_picks_request(Some(BEARER), &tuesday)).await;
    assert_eq!(status, StatusCode::OK);

    // Only the second payload remains.
    let picks = app.store.latest_picks().await.unwrap().unwrap();
    assert_eq!(picks.date_str, "Tuesday");
    assert!(picks.meals.is_empty());
}

#[tokio::test]
async fn home_renders_with_and_without_picks() {
    let app = test_app();

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Subscribe"));

    let payload = serde_json::json!({
        "date_str": "Friday, August 29",
        "meals": {"lunch": {"picks": [{"eatery": "Morrison", "dishes": ["Pho"]}]}},
        "location_map": {"Morrison": "North Campus"}
    });
    app.store.put_latest_picks(&payload).await.unwrap();

    let (status, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Morrison"));
    assert!(body.contains("North Campus"));
    assert!(body.contains("Pho"));
}

#[tokio::test]
async fn cors_preflight_is_permissive() {
    let app = test_app();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/subscribe")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn unknown_routes_return_404() {
    let app = test_app();

    let (status, _) = send(&app.router, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Wrong method on a known path renders the same not-found page as an
    // unknown path.
    let request = Request::builder()
        .method("POST")
        .uri("/api/confirm")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("nothing at this address"));

    let request = Request::builder()
        .method("GET")
        .uri("/api/store_picks")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
