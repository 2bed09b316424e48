use std::time::Duration;

use anyhow::Context;
use stageai_core::config::ClientConfig;
use stageai_core::types::OperationKind;
use stageai_engine::traits::{ApiError, PlaygroundApi};
use stageai_providers::parse::{parse_error_message, parse_operation_result, parse_probe_text};
use stageai_providers::playground::{
    PlaygroundEndpoint, build_login_request, build_logout_request, build_operation_request,
    build_probe_request,
};
use stageai_providers::request::HttpRequest;
use stageai_providers::runtime::{HttpExecutor, HttpResponse};

/// [`PlaygroundApi`] over HTTP, sharing one cookie jar across calls.
#[derive(Debug, Clone)]
pub struct HttpPlaygroundApi {
    endpoint: PlaygroundEndpoint,
    http: HttpExecutor,
}

impl HttpPlaygroundApi {
    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let http = HttpExecutor::new(
            Duration::from_secs(cfg.connect_timeout_secs),
            Duration::from_secs(cfg.request_timeout_secs),
        )
        .context("create playground http client")?;

        Ok(Self {
            endpoint: PlaygroundEndpoint::new(cfg.base_url.clone()),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    async fn send(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        log::debug!("sending {req:?}");
        self.http
            .execute(req)
            .await
            .map_err(|e| ApiError::Transport(format!("{e:#}")))
    }

    async fn send_expecting_success(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let resp = self.send(req).await?;
        if !resp.is_success() {
            return Err(ApiError::Status {
                status: resp.status,
                message: parse_error_message(&resp.body),
            });
        }
        Ok(resp)
    }

    async fn run_operation(&self, kind: OperationKind, input: &str) -> Result<String, ApiError> {
        let req = build_operation_request(&self.endpoint, kind, input);
        let resp = self.send_expecting_success(&req).await?;

        parse_operation_result(kind, &resp.body)
            .map_err(|e| ApiError::Decode(format!("{e:#}")))?
            .ok_or(ApiError::MissingField(kind.result_field()))
    }
}

#[async_trait::async_trait]
impl PlaygroundApi for HttpPlaygroundApi {
    async fn probe(&self) -> Result<String, ApiError> {
        let resp = self
            .send_expecting_success(&build_probe_request(&self.endpoint))
            .await?;
        Ok(parse_probe_text(&resp.body))
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let req = build_login_request(&self.endpoint, username, password);
        self.send_expecting_success(&req).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send_expecting_success(&build_logout_request(&self.endpoint))
            .await?;
        Ok(())
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ApiError> {
        self.run_operation(OperationKind::Text, prompt).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ApiError> {
        self.run_operation(OperationKind::Image, prompt).await
    }

    async fn chat(&self, message: &str) -> Result<String, ApiError> {
        self.run_operation(OperationKind::Chat, message).await
    }
}
