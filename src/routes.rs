use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use http::request::Parts;
use hyper::{Request, StatusCode, body::Body, header::CONTENT_LENGTH};

use crate::{
    endpoints::{
        api_info, health_check,
        health::{HEALTH_PATH, ROOT_PATH},
    },
    handler::{
        CHAT_PATH, MAX_BODY_SIZE_BYTES, RequestBody, check_request_head, handle_chat_request,
    },
    types::JsonReply,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Exact-path dispatch. Only `/chat` reads the request body, and only once
/// its method and content type have been accepted.
pub async fn route<B>(request: Request<B>, read_timeout: Duration) -> JsonReply
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let (parts, body) = request.into_parts();
    match parts.uri.path() {
        CHAT_PATH => {
            if let Some(reply) = check_request_head(&parts) {
                return reply;
            }
            match read_body(&parts, body, read_timeout).await {
                Ok(body) => handle_chat_request(&parts, &body),
                Err(reply) => reply,
            }
        }
        HEALTH_PATH => health_check(),
        ROOT_PATH => api_info(),
        _ => JsonReply::error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

/// Buffers at most [`MAX_BODY_SIZE_BYTES`]. Anything larger, declared or
/// streamed, becomes [`RequestBody::Oversized`] without reading further.
pub async fn read_body<B>(
    parts: &Parts,
    body: B,
    read_timeout: Duration,
) -> Result<RequestBody, JsonReply>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    if declared_length(parts).is_some_and(|len| len > MAX_BODY_SIZE_BYTES as u64) {
        return Ok(RequestBody::Oversized);
    }

    let collected = tokio::time::timeout(
        read_timeout,
        Limited::new(body, MAX_BODY_SIZE_BYTES).collect(),
    )
    .await
    .map_err(|_| JsonReply::error(StatusCode::REQUEST_TIMEOUT, "Request Timeout"))?;

    match collected {
        Ok(collected) => Ok(RequestBody::Buffered(collected.to_bytes())),
        Err(err) if err.is::<LengthLimitError>() => Ok(RequestBody::Oversized),
        Err(err) => {
            tracing::debug!("Failed to read request body: {err}");
            Err(JsonReply::error(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ))
        }
    }
}

fn declared_length(parts: &Parts) -> Option<u64> {
    parts
        .headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
