//! # resume-auth
//!
//! Bearer token authentication for the resume API on `actix-web`.
//! Tokens are RSA-signed JWTs issued by an external identity provider and
//! verified against the provider's published key set, which is fetched
//! lazily and cached for an hour.
//!
//! ## Example
//!
//! ```no_run
//! use actix_web::{web, App, HttpServer, HttpResponse};
//! use resume_auth::{Authentication, TokenClaims};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     // Reads RESUME_AUTH_JWKS_URL, RESUME_AUTH_ISSUER and RESUME_AUTH_AUDIENCE.
//!     let gate = Authentication::from_env().unwrap(); // Don't forget to handle this error
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .wrap(gate.clone())
//!             .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() }))
//!             .route("/whoami", web::get().to(whoami))
//!     })
//!     .bind(("127.0.0.1", 8090))?
//!     .run()
//!     .await
//! }
//!
//! async fn whoami(claims: TokenClaims) -> HttpResponse {
//!     HttpResponse::Ok().json(claims)
//! }
//! ```

mod claims;
mod error;
mod gate;
mod impls;
mod jwk;

#[cfg(test)]
mod testutil;

pub use claims::*;
pub use error::*;
pub use gate::{Authentication, AuthenticationMiddleware, Rejection};
pub use jwk::*;
