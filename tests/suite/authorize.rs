//! End-to-end credential exchange against a mock web app with real RSA.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seedling_auth::{AuthError, RETRY_DELAY, authorize};
use seedling_types::Credentials;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::common::{
    RecordingSleeper, address, authorization, credentials, mount_public_key, open_envelope,
    token_body,
};

#[tokio::test]
async fn valid_key_and_token_response_yields_token() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;

    let envelopes = Arc::new(Mutex::new(Vec::new()));
    let seen = envelopes.clone();
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .and(header("user-agent", "FarmbotOSBootstrap"))
        .respond_with(move |req: &Request| {
            seen.lock().unwrap().push(open_envelope(req));
            ResponseTemplate::new(200).set_body_json(token_body("abc123"))
        })
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let token = authorization(&sleeper)
        .authorize(&credentials(), &address(&server))
        .await
        .unwrap();

    assert_eq!(token.as_str(), "abc123");
    assert!(sleeper.waits().is_empty());

    let envelopes = envelopes.lock().unwrap();
    let envelope = &envelopes[0];
    assert_eq!(envelope["email"], "admin@admin.com");
    assert_eq!(envelope["password"], "password123");
    assert_eq!(envelope["version"], 1);
    assert!(!envelope["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_is_rejected_without_retry() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let err = authorization(&sleeper)
        .authorize(&credentials(), &address(&server))
        .await
        .unwrap_err();

    assert_eq!(err.rejected_status(), Some(401));
    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains(&server.uri()));
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn service_unavailable_waits_once_then_succeeds() {
    let server = MockServer::start().await;

    let key_fetches = Arc::new(AtomicU32::new(0));
    let fetches = key_fetches.clone();
    let pem = crate::common::public_key_pem();
    Mock::given(method("GET"))
        .and(path("/api/public_key"))
        .respond_with(move |_: &Request| {
            fetches.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_string(pem.clone())
        })
        .mount(&server)
        .await;

    let attempt = AtomicU32::new(0);
    let ids = Arc::new(Mutex::new(Vec::new()));
    let seen = ids.clone();
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(move |req: &Request| {
            let envelope = open_envelope(req);
            seen.lock()
                .unwrap()
                .push(envelope["id"].as_str().unwrap().to_string());
            if attempt.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(token_body("after-deploy"))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let token = authorization(&sleeper)
        .authorize(&credentials(), &address(&server))
        .await
        .unwrap();

    assert_eq!(token.as_str(), "after-deploy");
    assert_eq!(sleeper.waits(), vec![Duration::from_millis(5000)]);
    assert_eq!(key_fetches.load(Ordering::SeqCst), 2);

    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn token_without_encoded_is_unknown_structure() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let err = authorization(&sleeper)
        .authorize(&credentials(), &address(&server))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuthError::UnknownStructure { missing: "encoded" }
    ));
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn body_without_token_is_unknown_structure() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let err = authorization(&sleeper)
        .authorize(&credentials(), &address(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UnknownStructure { missing: "token" }));
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn concurrent_calls_do_not_interfere() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(|req: &Request| {
            let envelope = open_envelope(req);
            let email = envelope["email"].as_str().unwrap().to_string();
            ResponseTemplate::new(200).set_body_json(token_body(&format!("token-for-{email}")))
        })
        .expect(2)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let authorization = authorization(&sleeper);
    let server_address = address(&server);
    let first = Credentials::parse("one@farm.bot", "pw-one").unwrap();
    let second = Credentials::parse("two@farm.bot", "pw-two").unwrap();

    let (a, b) = tokio::join!(
        authorization.authorize(&first, &server_address),
        authorization.authorize(&second, &server_address),
    );

    assert_eq!(a.unwrap().as_str(), "token-for-one@farm.bot");
    assert_eq!(b.unwrap().as_str(), "token-for-two@farm.bot");
}

#[tokio::test]
async fn trailing_slash_on_server_is_normalized() {
    let server = MockServer::start().await;
    mount_public_key(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("slash")))
        .expect(1)
        .mount(&server)
        .await;

    let token = authorize(
        "admin@admin.com",
        "password123",
        &format!("{}/", server.uri()),
    )
    .await
    .unwrap();
    assert_eq!(token.as_str(), "slash");
}

#[tokio::test]
async fn convenience_entry_point_validates_inputs() {
    let err = authorize("  ", "pw", "https://my.farm.bot")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));

    let err = authorize("admin@admin.com", "pw", "my.farm.bot")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidServer(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let sleeper = RecordingSleeper::default();
    let server = seedling_types::ServerAddress::parse("http://127.0.0.1:9").unwrap();
    let err = authorization(&sleeper)
        .authorize(&credentials(), &server)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Network { .. }));
    assert!(sleeper.waits().is_empty());
}

#[test]
fn retry_delay_is_five_seconds() {
    assert_eq!(RETRY_DELAY, Duration::from_millis(5000));
}
