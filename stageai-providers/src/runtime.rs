use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Executes [`HttpRequest`]s for the lifetime of the process.
///
/// Credentialed requests go through a client with an in-memory cookie store so
/// the session cookie set by the login endpoint is replayed on later calls.
/// Other requests use a cookie-less client. Nothing is persisted to disk.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    credentialed: reqwest::Client,
    anonymous: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> anyhow::Result<Self> {
        // Without an explicit timeout a stuck backend would leave the request pending forever.
        let credentialed = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .context("build credentialed http client")?;
        let anonymous = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            credentialed,
            anonymous,
        })
    }

    pub async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        let client = if req.credentialed {
            &self.credentialed
        } else {
            &self.anonymous
        };

        let mut headers = HeaderMap::new();
        for (k, v) in &req.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name: {k}"))?;
            let value =
                HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }

        let builder = match req.method.as_str() {
            "GET" => client.get(&req.url),
            "POST" => client.post(&req.url),
            other => return Err(anyhow!("unsupported method: {other}")),
        }
        .headers(headers);

        let builder = match &req.body {
            Body::Empty => builder,
            Body::Json(s) => builder.body(s.clone()),
        };

        let resp = builder.send().await.context("http request failed")?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .context("failed reading response body")?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}
