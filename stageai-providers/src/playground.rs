use crate::request::{Body, HttpRequest};
use serde_json::json;
use stageai_core::types::OperationKind;

pub const PATH_ROOT: &str = "/";
pub const PATH_LOGIN: &str = "/login";
pub const PATH_LOGOUT: &str = "/logout";
pub const PATH_GENERATE: &str = "/generate";
pub const PATH_GENERATE_IMAGE: &str = "/generate-image";
pub const PATH_CHAT: &str = "/chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundEndpoint {
    pub base_url: String,
}

impl PlaygroundEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

pub fn build_probe_request(ep: &PlaygroundEndpoint) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(&ep.base_url, PATH_ROOT),
        headers: vec![],
        body: Body::Empty,
        credentialed: false,
    }
}

pub fn build_login_request(ep: &PlaygroundEndpoint, username: &str, password: &str) -> HttpRequest {
    let payload = json!({ "username": username, "password": password });
    json_post(ep, PATH_LOGIN, Body::Json(payload.to_string()), true)
}

pub fn build_logout_request(ep: &PlaygroundEndpoint) -> HttpRequest {
    json_post(ep, PATH_LOGOUT, Body::Empty, true)
}

/// Builds the request for one of the three AI operations.
pub fn build_operation_request(
    ep: &PlaygroundEndpoint,
    kind: OperationKind,
    input: &str,
) -> HttpRequest {
    let path = match kind {
        OperationKind::Text => PATH_GENERATE,
        OperationKind::Image => PATH_GENERATE_IMAGE,
        OperationKind::Chat => PATH_CHAT,
    };

    let mut payload = serde_json::Map::new();
    payload.insert(kind.request_field().into(), json!(input));

    json_post(
        ep,
        path,
        Body::Json(serde_json::Value::Object(payload).to_string()),
        false,
    )
}

fn json_post(ep: &PlaygroundEndpoint, path: &str, body: Body, credentialed: bool) -> HttpRequest {
    let headers = match body {
        Body::Empty => vec![],
        Body::Json(_) => vec![("Content-Type".into(), "application/json".into())],
    };

    HttpRequest {
        method: "POST".into(),
        url: join_url(&ep.base_url, path),
        headers,
        body,
        credentialed,
    }
}

/// Resolves a server-relative asset path (e.g. a generated image) against the
/// origin of `base_url`. Absolute URLs are returned unchanged.
pub fn resolve_asset_url(base_url: &str, path: &str) -> String {
    if url::Url::parse(path).is_ok() {
        return path.to_string();
    }

    let origin = match url::Url::parse(base_url) {
        Ok(u) => u.origin().ascii_serialization(),
        Err(_) => base_url.to_string(),
    };
    join_url(&origin, path)
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
