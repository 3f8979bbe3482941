use std::env;
use std::ops::Deref;
use std::time::Duration;

use url::Url;

use super::error::ConfigError;

/// How long a fetched key set is trusted before the next lookup refetches it.
pub const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Client-level timeout applied to every key set request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Path that bypasses authentication unless configured otherwise.
pub const DEFAULT_HEALTH_PATH: &str = "/health";

const JWKS_URL_VAR: &str = "RESUME_AUTH_JWKS_URL";
const ISSUER_VAR: &str = "RESUME_AUTH_ISSUER";
const AUDIENCE_VAR: &str = "RESUME_AUTH_AUDIENCE";
const HEALTH_PATH_VAR: &str = "RESUME_AUTH_HEALTH_PATH";

/// Expected `iss` claim, compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer(String);

impl Issuer {
    pub fn new(issuer: impl Into<String>) -> Result<Issuer, ConfigError> {
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(ConfigError::Empty("issuer"));
        }
        Ok(Issuer(issuer))
    }
}

impl Deref for Issuer {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

/// Settings consumed by the token verifier and the authentication gate.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    jwks_url: Url,
    issuer: Issuer,
    audience: String,
    health_path: String,
}

impl AuthConfig {
    pub fn new(
        jwks_url: impl AsRef<str>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<AuthConfig, ConfigError> {
        let jwks_url = Url::parse(jwks_url.as_ref())?;
        let audience = audience.into();
        if audience.trim().is_empty() {
            return Err(ConfigError::Empty("audience"));
        }

        Ok(AuthConfig {
            jwks_url,
            issuer: Issuer::new(issuer)?,
            audience,
            health_path: DEFAULT_HEALTH_PATH.to_owned(),
        })
    }

    /// Builds the configuration from `RESUME_AUTH_*` environment variables.
    ///
    /// `RESUME_AUTH_HEALTH_PATH` is optional and defaults to `/health`.
    pub fn from_env() -> Result<AuthConfig, ConfigError> {
        let config = AuthConfig::new(
            required_var(JWKS_URL_VAR)?,
            required_var(ISSUER_VAR)?,
            required_var(AUDIENCE_VAR)?,
        )?;

        match env::var(HEALTH_PATH_VAR) {
            Ok(path) if !path.is_empty() => Ok(config.with_health_path(path)),
            _ => Ok(config),
        }
    }

    pub fn with_health_path(mut self, path: impl Into<String>) -> AuthConfig {
        self.health_path = path.into();
        self
    }

    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_health_path() {
        let config = AuthConfig::new(
            "https://login.example.com/discovery/v2.0/keys",
            "https://login.example.com/tenant/v2.0",
            "resume-api",
        )
        .unwrap();

        assert_eq!(config.health_path(), "/health");
        assert_eq!(config.issuer(), "https://login.example.com/tenant/v2.0");
        assert_eq!(config.audience(), "resume-api");
        assert_eq!(config.jwks_url().path(), "/discovery/v2.0/keys");
    }

    #[test]
    fn rejects_invalid_jwks_url() {
        let result = AuthConfig::new("not a url", "issuer", "audience");
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn rejects_empty_issuer_and_audience() {
        let url = "https://login.example.com/keys";
        assert!(matches!(
            AuthConfig::new(url, "  ", "audience"),
            Err(ConfigError::Empty("issuer"))
        ));
        assert!(matches!(
            AuthConfig::new(url, "issuer", ""),
            Err(ConfigError::Empty("audience"))
        ));
    }

    #[test]
    fn overrides_health_path() {
        let config = AuthConfig::new("https://login.example.com/keys", "issuer", "audience")
            .unwrap()
            .with_health_path("/livez");
        assert_eq!(config.health_path(), "/livez");
    }

    #[test]
    fn reads_environment_variables() {
        // Only this test touches the RESUME_AUTH_* variables.
        env::set_var(JWKS_URL_VAR, "https://login.example.com/keys");
        env::set_var(ISSUER_VAR, "https://login.example.com/tenant/v2.0");
        env::set_var(AUDIENCE_VAR, "resume-api");
        env::set_var(HEALTH_PATH_VAR, "/status");

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.audience(), "resume-api");
        assert_eq!(config.health_path(), "/status");

        env::remove_var(AUDIENCE_VAR);
        assert!(matches!(
            AuthConfig::from_env(),
            Err(ConfigError::MissingVar(AUDIENCE_VAR))
        ));

        env::remove_var(JWKS_URL_VAR);
        env::remove_var(ISSUER_VAR);
        env::remove_var(HEALTH_PATH_VAR);
    }
}
