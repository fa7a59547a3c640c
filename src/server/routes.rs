//! Request routing and handlers.

use std::error::Error as StdError;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::ServerState;
use crate::core::models::ValidationRequest;
use crate::error::{ErrorKind, KeycheckError};

/// Response body for every failure that is not a provider verdict.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    is_valid: bool,
    error: &'a str,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

/// `POST /validate` payload. Missing fields become empty strings and are
/// rejected by the orchestrator.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateBody {
    #[serde(default)]
    provider: String,
    #[serde(default)]
    api_key: String,
}

const MALFORMED_BODY: &str = "Request body must be a JSON object with provider and apiKey";

/// Dispatch one request.
pub async fn route<B>(state: &ServerState, request: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/validate") => validate(state, request).await,
        (_, "/validate") => method_not_allowed("POST"),
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &HealthBody {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
            },
        ),
        (_, "/health") => method_not_allowed("GET"),
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms,
        "Request handled"
    );
    response
}

async fn validate<B>(state: &ServerState, request: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    if declared_length(&request).is_some_and(|len| len > state.max_body_bytes as u64) {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
    }

    let collected = match Limited::new(request.into_body(), state.max_body_bytes)
        .collect()
        .await
    {
        Ok(collected) => collected,
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
        Err(_) => return error_response(StatusCode::BAD_REQUEST, MALFORMED_BODY),
    };

    // The raw body holds the key; wipe our copy once it is parsed.
    let raw = Zeroizing::new(Vec::<u8>::from(collected.to_bytes()));
    let Ok(body) = serde_json::from_slice::<ValidateBody>(&raw) else {
        return error_response(StatusCode::BAD_REQUEST, MALFORMED_BODY);
    };
    drop(raw);

    let request = ValidationRequest::new(body.provider, body.api_key);
    match state.orchestrator.validate(request).await {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(err) => failure_response(&err),
    }
}

fn failure_response(err: &KeycheckError) -> Response<Full<Bytes>> {
    let kind = err.kind();
    if kind == ErrorKind::InternalError {
        tracing::error!(error_code = err.error_code(), error = %err, "Validation failed internally");
    } else {
        tracing::debug!(error_code = err.error_code(), error = %err, "Validation rejected");
    }
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, &err.user_message())
}

fn declared_length<B>(request: &Request<B>) -> Option<u64> {
    request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorBody {
            is_valid: false,
            error: message,
        },
    )
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"isValid":false,"error":"Internal server error"}"#.to_vec(),
            )
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
