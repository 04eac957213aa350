//! HTTP client for the agent API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::http::{ErrorBody, Paginated};
use crate::model::{AgentHeartbeat, Page, Record, Redirect};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid manager url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("manager returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Client bound to one project of one manager.
#[derive(Clone)]
pub struct ManagerClient {
    client: Client,
    project_url: Url,
    token: String,
}

impl ManagerClient {
    pub fn new(base_url: &str, token: &str, namespace: &str, project: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url, token, namespace, project)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        token: &str,
        namespace: &str,
        project: &str,
    ) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let project_url = base.join(&format!("api/namespace/{namespace}/project/{project}/"))?;
        Ok(Self {
            client,
            project_url,
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.project_url.join(path)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ClientError::Status { status, message })
    }

    pub async fn version(&self) -> Result<u64, ClientError> {
        let response = self.send(self.client.get(self.url("version")?)).await?;
        Ok(response.json().await?)
    }

    /// Every published redirect, following pagination.
    pub async fn redirects(&self) -> Result<Vec<Record<Redirect>>, ClientError> {
        self.fetch_all("redirects").await
    }

    /// Every published page, following pagination.
    pub async fn pages(&self) -> Result<Vec<Record<Page>>, ClientError> {
        self.fetch_all("pages").await
    }

    async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let url = self.url(path)?;
        let mut items = Vec::new();
        loop {
            let request = self
                .client
                .get(url.clone())
                .query(&[("offset", items.len())]);
            let page: Paginated<T> = self.send(request).await?.json().await?;
            let has_more = page.has_more() && !page.items.is_empty();
            items.extend(page.items);
            if !has_more {
                return Ok(items);
            }
        }
    }

    pub async fn upsert_agent(&self, heartbeat: &AgentHeartbeat) -> Result<(), ClientError> {
        self.send(self.client.post(self.url("agents")?).json(heartbeat))
            .await?;
        Ok(())
    }

    pub async fn hit(&self, name: &str) -> Result<(), ClientError> {
        let mut url = self.url("agents/")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(name)
            .push("hit");
        self.send(self.client.patch(url)).await?;
        Ok(())
    }
}
