use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Registered claims of a verified bearer token.
///
/// Anything beyond the registered claims (`name`, `roles`, `tid`, ...) is
/// kept in [`TokenClaims::extra`] untouched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer of the token
    pub iss: String,

    /// Audience(s) the token was issued for
    pub aud: Audience,

    /// Expiration time (epoch seconds, fractional part dropped)
    #[serde(deserialize_with = "whole_seconds")]
    pub exp: u64,

    /// Subject, usually the caller's object or user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued-at time (epoch seconds)
    #[serde(
        default,
        deserialize_with = "optional_whole_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<u64>,

    /// Not-before time (epoch seconds)
    #[serde(
        default,
        deserialize_with = "optional_whole_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub nbf: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `aud` claim, which may be a single string or an array.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Reads an RFC 7519 NumericDate, which may carry a fractional part.
pub(crate) fn numeric_date(value: &Value) -> Option<f64> {
    value.as_f64().filter(|secs| secs.is_finite() && *secs >= 0.0)
}

fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    numeric_date(&value)
        .map(|secs| secs.floor() as u64)
        .ok_or_else(|| serde::de::Error::custom("expected a NumericDate"))
}

fn optional_whole_seconds<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => numeric_date(&value)
            .map(|secs| Some(secs.floor() as u64))
            .ok_or_else(|| serde::de::Error::custom("expected a NumericDate")),
    }
}
