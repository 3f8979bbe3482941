//! Shared fixtures for tests: RSA signing keys, token minting and a mocked
//! key set endpoint.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use httpmock::Method::GET;
use httpmock::{Mock, MockServer};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use openssl::rsa::Rsa;
use serde::Serialize;
use serde_json::{json, Value};

use crate::jwk::{AuthConfig, TokenVerifier};

pub(crate) const TEST_ISSUER: &str = "https://login.example.com/tenant/v2.0";
pub(crate) const TEST_AUDIENCE: &str = "resume-api";
pub(crate) const KEYS_PATH: &str = "/discovery/v2.0/keys";

pub(crate) struct TestKey {
    encoding_key: EncodingKey,
    n: String,
    e: String,
}

impl TestKey {
    fn generate() -> TestKey {
        let rsa = Rsa::generate(2048).expect("Failed to generate RSA key");
        let pem = rsa
            .private_key_to_pem()
            .expect("Failed to export private key");

        TestKey {
            encoding_key: EncodingKey::from_rsa_pem(&pem)
                .expect("Failed to create encoding key"),
            n: BASE64_URL_SAFE_NO_PAD.encode(rsa.n().to_vec()),
            e: BASE64_URL_SAFE_NO_PAD.encode(rsa.e().to_vec()),
        }
    }

    /// Key set entry publishing this key under `kid`.
    pub(crate) fn jwk(&self, kid: &str) -> Value {
        json!({
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "n": self.n,
            "e": self.e,
            "alg": "RS256"
        })
    }

    pub(crate) fn sign(&self, alg: Algorithm, kid: Option<&str>, claims: &impl Serialize) -> String {
        let mut header = Header::new(alg);
        header.kid = kid.map(str::to_owned);
        encode(&header, claims, &self.encoding_key).expect("Failed to sign token")
    }
}

pub(crate) static PRIMARY_KEY: LazyLock<TestKey> = LazyLock::new(TestKey::generate);
pub(crate) static OTHER_KEY: LazyLock<TestKey> = LazyLock::new(TestKey::generate);

pub(crate) fn now_as_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub(crate) fn valid_claims() -> Value {
    let now = now_as_secs();
    json!({
        "sub": "user123",
        "aud": TEST_AUDIENCE,
        "iss": TEST_ISSUER,
        "exp": now + 3600,
        "iat": now,
    })
}

/// Serves `{"keys": keys}` on [`KEYS_PATH`].
pub(crate) async fn serve_keys(server: &MockServer, keys: Vec<Value>) -> Mock<'_> {
    let body = json!({ "keys": keys });
    server
        .mock_async(|when, then| {
            when.method(GET).path(KEYS_PATH);
            then.status(200).json_body(body);
        })
        .await
}

pub(crate) fn config_for(server: &MockServer) -> AuthConfig {
    AuthConfig::new(server.url(KEYS_PATH), TEST_ISSUER, TEST_AUDIENCE).unwrap()
}

pub(crate) fn verifier_for(server: &MockServer) -> TokenVerifier {
    TokenVerifier::new(config_for(server)).unwrap()
}
