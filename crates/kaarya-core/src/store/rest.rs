use async_trait::async_trait;
use reqwest::{Method, Response, Url};
use tracing::{debug, warn};

use super::TaskStore;
use crate::backend::{BackendClient, ServiceError};
use crate::error::StoreError;
use crate::task::{NewTask, Task, TaskChanges, TaskId, UserId};

const TASKS_PATH: &str = "rest/v1/tasks";

/// Row store client for the hosted service, authorised as the signed-in user.
/// Row-level security on the service restricts every call to the user's rows.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: BackendClient,
    access_token: String,
}

impl RestStore {
    pub fn new(client: BackendClient, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }

    fn tasks_url(&self) -> Result<Url, StoreError> {
        self.client
            .endpoint(TASKS_PATH)
            .map_err(|err| StoreError::Transport(err.to_string()))
    }

    fn id_filtered_url(&self, id: TaskId) -> Result<Url, StoreError> {
        let mut url = self.tasks_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = ServiceError::parse(status, &body);
        warn!(status = parsed.status, code = ?parsed.code, "row store rejected request");
        Err(StoreError::Rejected {
            status: parsed.status,
            message: parsed.message,
        })
    }
}

#[async_trait]
impl TaskStore for RestStore {
    #[tracing::instrument(skip(self))]
    async fn select_by_owner(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        let mut url = self.tasks_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{owner}"))
            .append_pair("order", "created_at.desc");

        let request = self
            .client
            .request(Method::GET, url, Some(&self.access_token));
        let rows: Vec<Task> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;

        debug!(count = rows.len(), "selected task rows");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, rows: Vec<NewTask>) -> Result<Vec<Task>, StoreError> {
        let request = self
            .client
            .request(Method::POST, self.tasks_url()?, Some(&self.access_token))
            .header("Prefer", "return=representation")
            .json(&rows);

        let inserted: Vec<Task> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::Decode(err.to_string()))?;

        if inserted.len() != rows.len() {
            return Err(StoreError::Decode(format!(
                "expected {} inserted rows, got {}",
                rows.len(),
                inserted.len()
            )));
        }
        Ok(inserted)
    }

    #[tracing::instrument(skip(self, changes))]
    async fn update(&self, id: TaskId, changes: &TaskChanges) -> Result<(), StoreError> {
        let request = self
            .client
            .request(Method::PATCH, self.id_filtered_url(id)?, Some(&self.access_token))
            .json(changes);
        self.send(request).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let request = self.client.request(
            Method::DELETE,
            self.id_filtered_url(id)?,
            Some(&self.access_token),
        );
        self.send(request).await?;
        Ok(())
    }
}
