//! Minimal Actix Web server guarded by [`Authentication`].
//!
//! - `/health`: open liveness check, never asks for a token.
//! - `/whoami`: requires a valid bearer token and echoes its claims.
//!
//! Configuration comes from `RESUME_AUTH_JWKS_URL`, `RESUME_AUTH_ISSUER`,
//! `RESUME_AUTH_AUDIENCE` and optionally `RESUME_AUTH_HEALTH_PATH`.
//! Log verbosity follows `RUST_LOG` (default `info`).

use actix_web::{get, App, HttpResponse, HttpServer, Responder};
use resume_auth::{Authentication, TokenClaims};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let gate = match Authentication::from_env() {
        Ok(gate) => gate,
        Err(e) => {
            tracing::error!("Failed to configure authentication: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        jwks_url = %gate.verifier().config().jwks_url(),
        "Starting resume API on 127.0.0.1:8090"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(gate.clone())
            .service(health)
            .service(whoami)
    })
    .bind(("127.0.0.1", 8090))?
    .run()
    .await
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "Status": "healthy" }))
}

// Protected route, requires a valid bearer token
#[get("/whoami")]
async fn whoami(claims: TokenClaims) -> impl Responder {
    HttpResponse::Ok().json(claims)
}
