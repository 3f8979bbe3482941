use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::HttpMessage;
use futures::future::{ok, LocalBoxFuture, Ready};
use tracing::*;

use crate::jwk::{AuthConfig, TokenVerifier, VerificationError};

const BEARER_PREFIX: &str = "Bearer ";

/// Why a request was turned away before reaching its handler.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("no token sent")]
    NoTokenSent,

    #[error("not a bearer token")]
    NotBearer,

    /// Empty bearer token, or claims requested on a route outside the gate.
    #[error("unauthorized")]
    Unauthorized,

    /// The cause is logged; the response body never includes it.
    #[error("invalid token")]
    InvalidToken(#[source] VerificationError),
}

/// Middleware that requires a valid bearer token on every path except the
/// configured health path.
///
/// Verified [`TokenClaims`](crate::TokenClaims) are stored in the request
/// extensions, where handlers can extract them.
///
/// ```no_run
/// use actix_web::{web, App, HttpResponse};
/// use resume_auth::{AuthConfig, Authentication, TokenClaims, TokenVerifier};
///
/// # fn app() -> resume_auth::Result<()> {
/// let config = AuthConfig::new(
///     "https://login.example.com/discovery/v2.0/keys",
///     "https://login.example.com/tenant/v2.0",
///     "resume-api",
/// )?;
/// let gate = Authentication::new(TokenVerifier::new(config)?);
///
/// let _app = App::new()
///     .wrap(gate)
///     .route("/whoami", web::get().to(|claims: TokenClaims| async move {
///         HttpResponse::Ok().json(claims)
///     }));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Authentication {
    verifier: Arc<TokenVerifier>,
}

impl Authentication {
    pub fn new(verifier: TokenVerifier) -> Authentication {
        Authentication::shared(Arc::new(verifier))
    }

    /// Wraps a verifier that is shared with other parts of the application.
    pub fn shared(verifier: Arc<TokenVerifier>) -> Authentication {
        Authentication { verifier }
    }

    /// Builds the gate from `RESUME_AUTH_*` environment variables.
    pub fn from_env() -> crate::Result<Authentication> {
        let config = AuthConfig::from_env()?;
        Ok(Authentication::new(TokenVerifier::new(config)?))
    }

    pub fn verifier(&self) -> &Arc<TokenVerifier> {
        &self.verifier
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
        })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);

        Box::pin(async move {
            if req.path() == verifier.config().health_path() {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }

            let token = match bearer_token(req.headers()) {
                Ok(token) => token.to_owned(),
                Err(rejection) => {
                    debug!(path = %req.path(), "Rejected request: {rejection}");
                    return Ok(reject(req, rejection));
                }
            };

            match verifier.verify(&token).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    warn!(path = %req.path(), "Token verification failed: {err}");
                    Ok(reject(req, Rejection::InvalidToken(err)))
                }
            }
        })
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers.get(AUTHORIZATION).ok_or(Rejection::NoTokenSent)?;
    let value = value.to_str().map_err(|_| Rejection::NotBearer)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(Rejection::NotBearer)?;

    if token.is_empty() {
        return Err(Rejection::Unauthorized);
    }
    Ok(token)
}

fn reject<B>(req: ServiceRequest, rejection: Rejection) -> ServiceResponse<EitherBody<B>> {
    req.error_response(rejection).map_into_right_body()
}
