use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use tracing::*;

use super::error::KeyDecodeError;

const RSA_KEY_TYPE: &str = "RSA";

/// Key set document served by the identity provider's discovery endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningKeySet {
    pub keys: Vec<SigningKey>,
}

/// One published signing key, as it appears on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SigningKey {
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub kid: String,
    #[serde(default, rename = "use")]
    pub key_use: String,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
    #[serde(default)]
    pub alg: String,
}

/// A decoded RSA public key, ready to verify signatures.
///
/// The exponent is held as a `u64`. Exponents wider than eight bytes keep
/// only their low-order bytes, which is harmless for real-world keys
/// (almost always 65537) but means an oversized exponent is not represented
/// faithfully.
#[derive(Clone)]
pub struct PublicKeyHandle {
    modulus: Vec<u8>,
    exponent: u64,
    decoding_key: DecodingKey,
}

impl PublicKeyHandle {
    /// Big-endian modulus bytes.
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    pub fn exponent(&self) -> u64 {
        self.exponent
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for PublicKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKeyHandle")
            .field("modulus_bits", &(self.modulus.len() * 8))
            .field("exponent", &self.exponent)
            .finish()
    }
}

impl TryFrom<&SigningKey> for PublicKeyHandle {
    type Error = KeyDecodeError;

    fn try_from(key: &SigningKey) -> Result<Self, Self::Error> {
        if key.kty != RSA_KEY_TYPE {
            return Err(KeyDecodeError::UnsupportedKeyType(key.kty.clone()));
        }

        let modulus = decode_component("modulus", &key.n)?;
        let exponent_bytes = decode_component("exponent", &key.e)?;
        let exponent = truncate_exponent(&exponent_bytes);

        if exponent_bytes.len() > std::mem::size_of::<u64>() {
            warn!(
                kid = %key.kid,
                bytes = exponent_bytes.len(),
                "RSA exponent wider than 64 bits, keeping the low-order bytes"
            );
        }

        let exponent_be = exponent.to_be_bytes();
        let significant = exponent_be
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(exponent_be.len());
        let decoding_key =
            DecodingKey::from_rsa_raw_components(&modulus, &exponent_be[significant..]);

        Ok(PublicKeyHandle {
            modulus,
            exponent,
            decoding_key,
        })
    }
}

fn decode_component(
    component: &'static str,
    value: &str,
) -> Result<Vec<u8>, KeyDecodeError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|source| KeyDecodeError::MalformedKeyEncoding { component, source })
}

fn truncate_exponent(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}
