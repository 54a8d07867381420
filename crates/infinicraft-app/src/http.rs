//! HTTP backend for the combination service.

use infinicraft_core::service::BoxFuture;
use infinicraft_core::{CombineRequest, CombineResponse, CraftService, Element, Progress, ServiceError, ServiceResult, UserId};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Talks to the combination service over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpCraftService {
    client: Client,
    base_url: String,
}

impl HttpCraftService {
    /// Create a client for a service rooted at `base_url`
    /// (e.g. `http://localhost:8001`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }
}

/// Send a request and check its status, returning the raw body.
async fn send(request: RequestBuilder) -> ServiceResult<Vec<u8>> {
    let response = request.send().await.map_err(|e| ServiceError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response.bytes().await.map_err(|e| ServiceError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ServiceResult<T> {
    serde_json::from_slice(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> ServiceResult<T> {
    let body = send(request).await?;
    decode(&body)
}

impl CraftService for HttpCraftService {
    fn base_elements(&self) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
        let request = self.get("/api/elements/base");
        Box::pin(fetch(request))
    }

    fn discovered_elements(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Vec<Element>>> {
        let request = self.get("/api/elements/discovered").query(&[("user_id", user.as_str())]);
        Box::pin(fetch(request))
    }

    fn progress(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<Progress>> {
        let request = self.get("/api/user/progress").query(&[("user_id", user.as_str())]);
        Box::pin(fetch(request))
    }

    fn reset(&self, user: &UserId) -> BoxFuture<'_, ServiceResult<()>> {
        let request = self.post("/api/user/reset").query(&[("user_id", user.as_str())]);
        Box::pin(async move {
            send(request).await?;
            Ok(())
        })
    }

    fn combine(&self, request: &CombineRequest) -> BoxFuture<'_, ServiceResult<CombineResponse>> {
        let request = self
            .post("/api/elements/combine")
            .query(&[("user_id", request.user_id.as_str())])
            .json(request);
        Box::pin(fetch(request))
    }
}
