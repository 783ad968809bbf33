//! handlers/mod.rs
//! Handlers HTTP y utilidades compartidas entre ellos.

pub mod campaign_handler;
pub mod record_handler;

use std::future::{ready, Ready};

use actix_web::{dev::Payload, error::InternalError, FromRequest, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::RecordError;

/// Cabecera con la cuenta que hace la petición (la autenticación vive fuera).
pub const ACCOUNT_HEADER: &str = "X-Account-Id";

/// Cuenta que llama, sacada de `X-Account-Id`.
#[derive(Debug, Clone)]
pub struct CallerAccount(pub String);

impl FromRequest for CallerAccount {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let account = req
            .headers()
            .get(ACCOUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        ready(match account {
            Some(id) => Ok(CallerAccount(id.to_string())),
            None => Err(InternalError::from_response(
                "missing account header",
                HttpResponse::Unauthorized().json(json!({
                    "status": "error",
                    "message": format!("missing {ACCOUNT_HEADER} header")
                })),
            )
            .into()),
        })
    }
}

pub fn error_response(status: actix_web::http::StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "status": "error",
        "message": message.into()
    }))
}

pub fn record_error_response(e: RecordError) -> HttpResponse {
    use actix_web::http::StatusCode;

    let status = match &e {
        RecordError::NotFound(_) => StatusCode::NOT_FOUND,
        RecordError::Forbidden(_) => StatusCode::FORBIDDEN,
        RecordError::Invalid(_) => StatusCode::BAD_REQUEST,
        RecordError::Storage(inner) => {
            log::error!("Error de almacenamiento: {:?}", inner);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}
