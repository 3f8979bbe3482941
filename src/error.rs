/// A crate-wide result type alias using the custom [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for authentication setup and token verification.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The authentication settings are missing or invalid.
    #[error(transparent)]
    ConfigError(#[from] crate::jwk::ConfigError),

    /// The key set client could not be built or the key set could not be fetched.
    #[error(transparent)]
    FetchError(#[from] crate::jwk::FetchError),

    /// Errors that occur during JWT verification or claim validation.
    #[error(transparent)]
    VerificationError(#[from] crate::jwk::VerificationError),
}
