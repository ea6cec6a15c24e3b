use hyper::StatusCode;

use crate::{
    metadata::PKG_VERSION,
    types::{ApiInfo, HealthStatus, JsonReply},
};

pub const HEALTH_PATH: &str = "/health";
pub const ROOT_PATH: &str = "/";

pub fn health_check() -> JsonReply {
    JsonReply::json(StatusCode::OK, &HealthStatus { status: "healthy" })
}

/// Static banner served at `/`.
pub fn api_info() -> JsonReply {
    JsonReply::json(
        StatusCode::OK,
        &ApiInfo {
            message: "LLM Gateway API",
            version: PKG_VERSION,
        },
    )
}
