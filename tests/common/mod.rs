//! Shared test utilities and fixtures
//!
//! A mock Farmbot web app backed by a real RSA key pair, plus a sleeper that
//! records the retry delay instead of waiting it out.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use seedling_auth::{Authorization, SleepFut, Sleeper, http_client_builder};
use seedling_types::{Credentials, ServerAddress};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// One 2048-bit key for the whole test binary; generation is slow.
pub fn private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).unwrap())
}

pub fn public_key_pem() -> String {
    private_key()
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

/// Decrypt the envelope inside a `POST /api/tokens` body.
pub fn open_envelope(request: &Request) -> serde_json::Value {
    let outer: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    open_secret(outer["user"]["credentials"].as_str().unwrap())
}

/// Decrypt a base64 credential blob.
pub fn open_secret(blob: &str) -> serde_json::Value {
    let sealed = STANDARD.decode(blob).unwrap();
    let plaintext = private_key().decrypt(Pkcs1v15Encrypt, &sealed).unwrap();
    serde_json::from_slice(&plaintext).unwrap()
}

pub fn token_body(encoded: &str) -> serde_json::Value {
    serde_json::json!({
        "token": {
            "encoded": encoded,
            "unencoded": {"bot": "device_7", "iss": "//my.farm.bot"}
        },
        "user": {"id": 7, "email": "admin@admin.com"}
    })
}

pub async fn mount_public_key(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/public_key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(public_key_pem()))
        .mount(server)
        .await;
}

#[derive(Clone, Default)]
pub struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.0.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFut<'_> {
        self.0.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

pub fn authorization(sleeper: &RecordingSleeper) -> Authorization {
    Authorization::with_client(http_client_builder().build().unwrap())
        .with_sleeper(sleeper.clone())
}

pub fn credentials() -> Credentials {
    Credentials::parse("admin@admin.com", "password123").unwrap()
}

pub fn address(server: &MockServer) -> ServerAddress {
    ServerAddress::parse(&server.uri()).unwrap()
}
