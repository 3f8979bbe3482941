use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{dev, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use actix_web_httpauth::headers::www_authenticate::bearer::{Bearer, Error as BearerError};
use futures::future::{ready, Ready};

use crate::gate::Rejection;
use crate::TokenClaims;

const REALM: &str = "resume";

impl ResponseError for Rejection {
    fn status_code(&self) -> StatusCode {
        // Every rejection is an authentication failure. Well-formed but
        // invalid tokens are not distinguished with 403.
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .insert_header((header::WWW_AUTHENTICATE, self.challenge().to_string()))
            .body(self.to_string())
    }
}

impl Rejection {
    /// RFC 6750 challenge. A request without credentials gets no error code.
    fn challenge(&self) -> Bearer {
        let builder = Bearer::build().realm(REALM);
        match self {
            Rejection::NoTokenSent => builder.finish(),
            Rejection::NotBearer | Rejection::Unauthorized => builder
                .error(BearerError::InvalidRequest)
                .error_description("Authorization header must be 'Bearer <token>'")
                .finish(),
            Rejection::InvalidToken(_) => builder
                .error(BearerError::InvalidToken)
                .error_description("The access token is invalid or expired")
                .finish(),
        }
    }
}

/// Claims verified by [`Authentication`](crate::Authentication) for this request.
impl FromRequest for TokenClaims {
    type Error = Rejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<TokenClaims>().cloned();
        ready(claims.ok_or(Rejection::Unauthorized))
    }
}
