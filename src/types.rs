use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Response, StatusCode,
    header::{CONTENT_TYPE, HeaderValue, SERVER},
};
use serde::Serialize;

use crate::metadata::PKG_NAME;

const JSON_CONTENT_TYPE: &str = "application/json";
const SERIALIZATION_FAILED: &[u8] = br#"{"error":"Internal Server Error"}"#;

/// Successful `/chat` payload. Field order is part of the wire format.
#[derive(Clone, Debug, Serialize)]
pub struct ChatResponse<'a> {
    pub status: &'static str,
    pub reply: String,
    pub model: &'a str,
}

/// Single-field envelope used by every non-success response.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiInfo {
    pub message: &'static str,
    pub version: &'static str,
}

/// A status code paired with an already-encoded JSON body.
#[derive(Clone, Debug)]
pub struct JsonReply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl JsonReply {
    pub fn json<T: Serialize>(status: StatusCode, payload: &T) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => Self {
                status,
                body: Bytes::from(body),
            },
            Err(err) => {
                tracing::error!("Failed to encode response payload: {err}");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: Bytes::from_static(SERIALIZATION_FAILED),
                }
            }
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, &ErrorEnvelope { error: message })
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(SERVER, HeaderValue::from_static(PKG_NAME));
        response
    }
}
