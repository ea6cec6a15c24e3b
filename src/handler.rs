//! The `/chat` request contract.
//!
//! [`handle_chat_request`] is a pure function of the request head and its
//! buffered body. Checks run in a fixed order and the first failure decides
//! the response:
//!
//! 1. path is exactly `/chat` (404)
//! 2. method is POST (405)
//! 3. `Content-Type` starts with `application/json`, ignoring case (415)
//! 4. body is non-empty (400)
//! 5. body is at most [`MAX_BODY_SIZE_BYTES`] (413)
//! 6. `model` is a JSON string (400)
//! 7. `message` is a JSON string (400)
//! 8. neither string is empty (400)

use std::fmt;

use bytes::Bytes;
use http::request::Parts;
use hyper::{Method, StatusCode, header::CONTENT_TYPE};
use serde::{
    Deserialize, Deserializer,
    de::{IgnoredAny, MapAccess, Visitor},
};
use serde_json::Value;

use crate::{
    endpoints::format_message,
    types::{ChatResponse, JsonReply},
};

pub const CHAT_PATH: &str = "/chat";
pub const MAX_BODY_SIZE_BYTES: usize = 1_048_576;

const JSON_MEDIA_TYPE: &[u8] = b"application/json";

/// Request body as handed over by the server.
#[derive(Clone, Debug)]
pub enum RequestBody {
    Buffered(Bytes),
    /// More than [`MAX_BODY_SIZE_BYTES`] was declared or received; the rest
    /// was never read.
    Oversized,
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Buffered(bytes) => bytes.is_empty(),
            RequestBody::Oversized => false,
        }
    }
}

/// Checks 1-3, which need only the request head. The server runs these
/// before reading any body bytes.
pub fn check_request_head(parts: &Parts) -> Option<JsonReply> {
    if parts.uri.path() != CHAT_PATH {
        return Some(JsonReply::error(StatusCode::NOT_FOUND, "Not Found"));
    }

    if parts.method != Method::POST {
        return Some(JsonReply::error(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        ));
    }

    if !has_json_content_type(parts) {
        return Some(JsonReply::error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be application/json",
        ));
    }

    None
}

pub fn handle_chat_request(parts: &Parts, body: &RequestBody) -> JsonReply {
    if let Some(reply) = check_request_head(parts) {
        return reply;
    }

    if body.is_empty() {
        return JsonReply::error(StatusCode::BAD_REQUEST, "Request body is required");
    }

    let bytes = match body {
        RequestBody::Buffered(bytes) if bytes.len() <= MAX_BODY_SIZE_BYTES => bytes,
        _ => return JsonReply::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
    };

    // Malformed JSON is reported the same way as a missing `model`.
    let fields = serde_json::from_slice::<ChatFields>(bytes).unwrap_or_default();

    let Some(model) = fields.model.as_ref().and_then(Value::as_str) else {
        return JsonReply::error(StatusCode::BAD_REQUEST, "Missing or invalid model field");
    };

    let Some(message) = fields.message.as_ref().and_then(Value::as_str) else {
        return JsonReply::error(StatusCode::BAD_REQUEST, "Missing or invalid message field");
    };

    if model.is_empty() || message.is_empty() {
        return JsonReply::error(StatusCode::BAD_REQUEST, "Model and message are required");
    }

    JsonReply::json(
        StatusCode::OK,
        &ChatResponse {
            status: "success",
            reply: format_message(message),
            model,
        },
    )
}

fn has_json_content_type(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .map(|value| value.as_bytes())
        .is_some_and(|value| {
            value.len() >= JSON_MEDIA_TYPE.len()
                && value[..JSON_MEDIA_TYPE.len()].eq_ignore_ascii_case(JSON_MEDIA_TYPE)
        })
}

/// Top-level `model` and `message` values of the request document. A key that
/// appears more than once keeps its first value.
#[derive(Debug, Default)]
struct ChatFields {
    model: Option<Value>,
    message: Option<Value>,
}

impl<'de> Deserialize<'de> for ChatFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChatFieldsVisitor;

        impl<'de> Visitor<'de> for ChatFieldsVisitor {
            type Value = ChatFields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut fields = ChatFields::default();

                while let Some(key) = map.next_key::<String>()? {
                    let slot = match key.as_str() {
                        "model" => &mut fields.model,
                        "message" => &mut fields.message,
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                            continue;
                        }
                    };
                    if slot.is_some() {
                        map.next_value::<IgnoredAny>()?;
                    } else {
                        *slot = Some(map.next_value::<Value>()?);
                    }
                }

                Ok(fields)
            }
        }

        deserializer.deserialize_any(ChatFieldsVisitor)
    }
}
