use jsonwebtoken::Algorithm;
use thiserror::Error;

pub(super) type VerificationResult<T> = std::result::Result<T, VerificationError>;

/// Errors raised while turning a single key set entry into a usable public key.
#[derive(Debug, Error)]
pub enum KeyDecodeError {
    /// Only `"RSA"` keys can verify tokens for this service.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The modulus or exponent is not valid unpadded base64url.
    #[error("failed to decode key {component}: {source}")]
    MalformedKeyEncoding {
        component: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

/// Errors raised while retrieving the key set from the identity provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build the key set HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch key set: {0}")]
    Network(#[source] reqwest::Error),

    #[error("key set endpoint returned status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),

    #[error("failed to decode key set: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors raised while resolving a key identifier through the cache.
#[derive(Debug, Error)]
pub enum KeyCacheError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("key with ID {0} not found")]
    KeyNotFound(String),
}

/// A registered claim that did not match what this service expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("token issuer does not match")]
    Issuer,

    #[error("token audience does not match")]
    Audience,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token is missing the '{0}' claim")]
    MissingClaim(String),

    /// A date claim that is not a non-negative number of seconds.
    #[error("the '{0}' claim is not a valid date")]
    InvalidFormat(String),
}

/// Errors that can occur during token verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The token could not be split into header, claims and signature.
    #[error("malformed token: {0}")]
    MalformedToken(#[source] jsonwebtoken::errors::Error),

    /// The header declares an algorithm outside the RSA family.
    #[error("unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    /// The token is missing the `kid` header.
    #[error("missing 'kid' header in token")]
    MissingKeyId,

    /// No public key could be obtained for the token's `kid`.
    #[error("failed to resolve signing key: {0}")]
    KeyResolutionFailed(#[from] KeyCacheError),

    /// The token signature could not be verified.
    #[error("invalid signature")]
    InvalidSignature,

    #[error("claim validation failed: {0}")]
    ClaimValidationFailed(#[from] ClaimError),

    /// Rejected by the configured [`ClaimsPolicy`](super::ClaimsPolicy).
    #[error("custom claim check failed: {0}")]
    CustomClaimRejected(String),
}

/// Errors raised while assembling [`AuthConfig`](super::AuthConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable '{0}'")]
    MissingVar(&'static str),

    #[error("invalid key set URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("the {0} must not be empty")]
    Empty(&'static str),
}
