use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};
use serde_json::{Map, Value};
use tracing::*;

use super::cache::KeyCache;
use super::config::AuthConfig;
use super::error::{ClaimError, FetchError, VerificationError, VerificationResult};
use super::fetcher::KeySetFetcher;
use crate::claims::{numeric_date, Audience, TokenClaims};

/// Signature algorithms an RSA public key can verify.
const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Extra checks run on claims that already passed signature, issuer,
/// audience and expiry validation.
pub trait ClaimsPolicy: Send + Sync {
    /// Returns a reason when the claims must be rejected.
    fn check(&self, claims: &TokenClaims) -> Result<(), String>;
}

/// Accepts every token that passed the standard checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ClaimsPolicy for AcceptAll {
    fn check(&self, _claims: &TokenClaims) -> Result<(), String> {
        Ok(())
    }
}

/// Verifies RSA-signed bearer tokens against the identity provider's keys.
pub struct TokenVerifier {
    keys: KeyCache,
    config: AuthConfig,
    policy: Arc<dyn ClaimsPolicy>,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: AuthConfig) -> Result<TokenVerifier, FetchError> {
        let fetcher = KeySetFetcher::new(config.jwks_url().clone())?;
        Ok(TokenVerifier::with_key_cache(config, KeyCache::new(fetcher)))
    }

    pub fn with_key_cache(config: AuthConfig, keys: KeyCache) -> TokenVerifier {
        TokenVerifier {
            keys,
            config,
            policy: Arc::new(AcceptAll),
        }
    }

    pub fn with_policy(mut self, policy: impl ClaimsPolicy + 'static) -> TokenVerifier {
        self.policy = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Verifies `token` and returns its claims.
    ///
    /// Steps run in order and the first failure is returned: header parsing,
    /// algorithm check, `kid` lookup, key resolution, signature, registered
    /// claims, then the configured [`ClaimsPolicy`].
    pub async fn verify(&self, token: &str) -> VerificationResult<TokenClaims> {
        let header =
            jsonwebtoken::decode_header(token).map_err(VerificationError::MalformedToken)?;

        if !RSA_ALGORITHMS.contains(&header.alg) {
            return Err(VerificationError::UnsupportedAlgorithm(header.alg));
        }

        let kid = match header.kid {
            Some(kid) if !kid.is_empty() => kid,
            _ => return Err(VerificationError::MissingKeyId),
        };

        let public_key = self.keys.resolve(&kid).await?;

        // Only the signature is checked here. Registered claims are
        // validated below so that a missing or malformed claim is reported
        // as a claim failure rather than a deserialization error.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let payload = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            public_key.decoding_key(),
            &validation,
        )
        .map_err(classify)?
        .claims;

        self.check_registered_claims(&payload, unix_now())?;

        let claims: TokenClaims = serde_json::from_value(Value::Object(payload))
            .map_err(|err| VerificationError::MalformedToken(err.into()))?;

        self.policy
            .check(&claims)
            .map_err(VerificationError::CustomClaimRejected)?;

        debug!(kid = %kid, sub = ?claims.sub, "Token verified");
        Ok(claims)
    }

    /// `exp`, `iss` and `aud` must be present. `exp` must be strictly after
    /// `now`, and `nbf`, when present, must not be after it.
    fn check_registered_claims(
        &self,
        payload: &Map<String, Value>,
        now: f64,
    ) -> Result<(), ClaimError> {
        let exp = required(payload, "exp")?;
        let iss = required(payload, "iss")?;
        let aud = required(payload, "aud")?;

        let exp = numeric_date(exp).ok_or_else(|| ClaimError::InvalidFormat("exp".into()))?;
        if exp <= now {
            return Err(ClaimError::Expired);
        }

        if let Some(nbf) = payload.get("nbf") {
            let nbf =
                numeric_date(nbf).ok_or_else(|| ClaimError::InvalidFormat("nbf".into()))?;
            if nbf > now {
                return Err(ClaimError::NotYetValid);
            }
        }

        if iss.as_str() != Some(self.config.issuer()) {
            return Err(ClaimError::Issuer);
        }

        let audience: Audience =
            serde_json::from_value(aud.clone()).map_err(|_| ClaimError::Audience)?;
        if !audience.contains(self.config.audience()) {
            return Err(ClaimError::Audience);
        }

        Ok(())
    }
}

fn required<'a>(payload: &'a Map<String, Value>, claim: &str) -> Result<&'a Value, ClaimError> {
    match payload.get(claim) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ClaimError::MissingClaim(claim.to_owned())),
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

fn classify(err: jsonwebtoken::errors::Error) -> VerificationError {
    match err.kind() {
        ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
        _ => VerificationError::MalformedToken(err),
    }
}
