use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::error::ConnectorError;
use crate::resources::{
    BulkUpdateResult, ClientData, ClientParams, ProjectData, ProjectFilter, ProjectParams,
    ProjectUserData, TaskData, UserData, UserParams,
};
use crate::time_entry::{TagAction, TimeEntry, TimeEntryParams};

/// time entryを作成した時に`created_with`として送る値。
pub const CREATED_WITH: &str = "toggl-connector";

/// Toggl APIの各操作を1操作1メソッドで表すtrait。
///
/// 各メソッドは1つの結果を返すか、エラーを返す。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TogglRepository: Send + Sync {
    /// time entryを取得する。
    ///
    /// 期間を指定しない場合はToggl側の既定(直近9日間、最大1000件)が適用される。
    async fn read_time_entries(
        &self,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimeEntry>>;
    async fn read_current_time_entry(&self) -> Result<Option<TimeEntry>>;
    async fn read_time_entry(&self, id: i64) -> Result<TimeEntry>;
    async fn create_time_entry(&self, params: TimeEntryParams) -> Result<TimeEntry>;
    async fn start_time_entry(&self, params: TimeEntryParams) -> Result<TimeEntry>;
    async fn stop_time_entry(&self, id: i64) -> Result<TimeEntry>;
    async fn update_time_entry(&self, id: i64, params: TimeEntryParams) -> Result<TimeEntry>;
    async fn delete_time_entry(&self, id: i64) -> Result<()>;
    async fn update_time_entries_tags(
        &self,
        ids: Vec<i64>,
        tags: Vec<String>,
        action: TagAction,
    ) -> Result<BulkUpdateResult>;

    async fn read_user(&self) -> Result<UserData>;
    async fn update_user(&self, params: UserParams) -> Result<UserData>;
    async fn reset_api_token(&self) -> Result<String>;
    async fn change_password(&self, current_password: String, password: String) -> Result<()>;

    async fn create_client(&self, params: ClientParams) -> Result<ClientData>;
    async fn read_clients(&self) -> Result<Vec<ClientData>>;
    async fn read_client(&self, id: i64) -> Result<ClientData>;
    async fn update_client(&self, id: i64, params: ClientParams) -> Result<ClientData>;
    async fn delete_client(&self, id: i64) -> Result<()>;
    async fn read_client_projects(&self, id: i64, filter: ProjectFilter)
        -> Result<Vec<ProjectData>>;

    async fn create_project(&self, params: ProjectParams) -> Result<ProjectData>;
    async fn read_project(&self, id: i64) -> Result<ProjectData>;
    async fn update_project(&self, id: i64, params: ProjectParams) -> Result<ProjectData>;
    async fn delete_project(&self, id: i64) -> Result<()>;
    async fn delete_projects(&self, ids: Vec<i64>) -> Result<()>;
    async fn read_project_tasks(&self, id: i64) -> Result<Vec<TaskData>>;
    async fn read_project_users(&self, id: i64) -> Result<Vec<ProjectUserData>>;
}

/// Toggl APIと通信するためのクライアント。
///
/// # Examples
///
/// ```ignore
/// let client = TogglClient::new(&config);
/// let time_entries = client.read_time_entries(None, None).await?;
/// ```
pub struct TogglClient {
    client: Client,
    api_url: String,
    api_token: String,
    workspace_id: Option<i64>,
}

impl TogglClient {
    /// 設定から新しい`TogglClient`を返す。
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(&config.api_url, &config.api_token, config.workspace_id)
    }

    /// 接続先を指定して新しい`TogglClient`を返す。
    pub fn with_base_url(api_url: &str, api_token: &str, workspace_id: Option<i64>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            workspace_id,
        }
    }

    /// 書き込み系のAPIで使うworkspace idを返す。
    fn workspace_id(&self, requested: Option<i64>) -> Result<i64> {
        requested
            .or(self.workspace_id)
            .ok_or(ConnectorError::MissingConfig("TOGGL_WORKSPACE_ID"))
            .map_err(Into::into)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}{}", method, self.api_url, path);
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .basic_auth(&self.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
    }

    /// リクエストを送り、レスポンスのJSONをデシリアライズする。
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let value = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")?;

        Ok(value)
    }

    /// レスポンスのbodyを使わないリクエストを送る。
    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?;

        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.request(Method::GET, path)).await
    }

    async fn send_body<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.request(method, path).json(body)).await
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_time_entries(
        &self,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimeEntry>> {
        let mut query = Vec::new();
        if let Some(start_at) = start_at {
            query.push(("start_date", start_at.to_rfc3339()));
        }
        if let Some(end_at) = end_at {
            query.push(("end_date", end_at.to_rfc3339()));
        }
        let time_entries = self
            .send_json::<Option<Vec<TimeEntry>>>(
                self.request(Method::GET, "/me/time_entries").query(&query),
            )
            .await?
            .unwrap_or_default();
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }

    async fn read_current_time_entry(&self) -> Result<Option<TimeEntry>> {
        self.get("/me/time_entries/current").await
    }

    async fn read_time_entry(&self, id: i64) -> Result<TimeEntry> {
        self.get(&format!("/me/time_entries/{}", id)).await
    }

    async fn create_time_entry(&self, params: TimeEntryParams) -> Result<TimeEntry> {
        let workspace_id = self.workspace_id(params.workspace_id)?;
        let params = TimeEntryParams {
            workspace_id: Some(workspace_id),
            created_with: params.created_with.or(Some(CREATED_WITH.to_string())),
            ..params
        };
        self.send_body(
            Method::POST,
            &format!("/workspaces/{}/time_entries", workspace_id),
            &params,
        )
        .await
    }

    /// 実行中のtime entryとして作成する。
    async fn start_time_entry(&self, params: TimeEntryParams) -> Result<TimeEntry> {
        let start = params.start.unwrap_or_else(Utc::now);
        let params = TimeEntryParams {
            start: Some(start),
            stop: None,
            duration: Some(-start.timestamp()),
            ..params
        };
        self.create_time_entry(params).await
    }

    async fn stop_time_entry(&self, id: i64) -> Result<TimeEntry> {
        let workspace_id = self.workspace_id(None)?;
        self.send_json(self.request(
            Method::PATCH,
            &format!("/workspaces/{}/time_entries/{}/stop", workspace_id, id),
        ))
        .await
    }

    async fn update_time_entry(&self, id: i64, params: TimeEntryParams) -> Result<TimeEntry> {
        let workspace_id = self.workspace_id(params.workspace_id)?;
        self.send_body(
            Method::PUT,
            &format!("/workspaces/{}/time_entries/{}", workspace_id, id),
            &params,
        )
        .await
    }

    async fn delete_time_entry(&self, id: i64) -> Result<()> {
        let workspace_id = self.workspace_id(None)?;
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/workspaces/{}/time_entries/{}", workspace_id, id),
        ))
        .await
    }

    async fn update_time_entries_tags(
        &self,
        ids: Vec<i64>,
        tags: Vec<String>,
        action: TagAction,
    ) -> Result<BulkUpdateResult> {
        let workspace_id = self.workspace_id(None)?;
        let ids = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let body = json!([{ "op": action, "path": "/tags", "value": tags }]);
        self.send_body(
            Method::PATCH,
            &format!("/workspaces/{}/time_entries/{}", workspace_id, ids),
            &body,
        )
        .await
    }

    async fn read_user(&self) -> Result<UserData> {
        self.get("/me").await
    }

    async fn update_user(&self, params: UserParams) -> Result<UserData> {
        self.send_body(Method::PUT, "/me", &params).await
    }

    async fn reset_api_token(&self) -> Result<String> {
        self.send_json(self.request(Method::POST, "/me/reset_token"))
            .await
    }

    async fn change_password(&self, current_password: String, password: String) -> Result<()> {
        let body = json!({ "current_password": current_password, "password": password });
        self.send_empty(self.request(Method::PUT, "/me").json(&body))
            .await
    }

    async fn create_client(&self, params: ClientParams) -> Result<ClientData> {
        let workspace_id = self.workspace_id(None)?;
        self.send_body(
            Method::POST,
            &format!("/workspaces/{}/clients", workspace_id),
            &params,
        )
        .await
    }

    async fn read_clients(&self) -> Result<Vec<ClientData>> {
        let clients: Option<Vec<ClientData>> = self.get("/me/clients").await?;
        Ok(clients.unwrap_or_default())
    }

    async fn read_client(&self, id: i64) -> Result<ClientData> {
        let workspace_id = self.workspace_id(None)?;
        self.get(&format!("/workspaces/{}/clients/{}", workspace_id, id))
            .await
    }

    async fn update_client(&self, id: i64, params: ClientParams) -> Result<ClientData> {
        let workspace_id = self.workspace_id(None)?;
        self.send_body(
            Method::PUT,
            &format!("/workspaces/{}/clients/{}", workspace_id, id),
            &params,
        )
        .await
    }

    async fn delete_client(&self, id: i64) -> Result<()> {
        let workspace_id = self.workspace_id(None)?;
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/workspaces/{}/clients/{}", workspace_id, id),
        ))
        .await
    }

    async fn read_client_projects(
        &self,
        id: i64,
        filter: ProjectFilter,
    ) -> Result<Vec<ProjectData>> {
        let workspace_id = self.workspace_id(None)?;
        let projects: Option<Vec<ProjectData>> = self
            .send_json(
                self.request(
                    Method::GET,
                    &format!("/workspaces/{}/projects", workspace_id),
                )
                .query(&[
                    ("client_ids", id.to_string()),
                    ("active", filter.as_query().to_string()),
                ]),
            )
            .await?;
        Ok(projects.unwrap_or_default())
    }

    async fn create_project(&self, params: ProjectParams) -> Result<ProjectData> {
        let workspace_id = self.workspace_id(None)?;
        self.send_body(
            Method::POST,
            &format!("/workspaces/{}/projects", workspace_id),
            &params,
        )
        .await
    }

    async fn read_project(&self, id: i64) -> Result<ProjectData> {
        let workspace_id = self.workspace_id(None)?;
        self.get(&format!("/workspaces/{}/projects/{}", workspace_id, id))
            .await
    }

    async fn update_project(&self, id: i64, params: ProjectParams) -> Result<ProjectData> {
        let workspace_id = self.workspace_id(None)?;
        self.send_body(
            Method::PUT,
            &format!("/workspaces/{}/projects/{}", workspace_id, id),
            &params,
        )
        .await
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        let workspace_id = self.workspace_id(None)?;
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/workspaces/{}/projects/{}", workspace_id, id),
        ))
        .await
    }

    /// 1件ずつ削除し、最初に失敗したところで中断する。
    async fn delete_projects(&self, ids: Vec<i64>) -> Result<()> {
        for id in ids {
            self.delete_project(id)
                .await
                .with_context(|| format!("Failed to delete project {}", id))?;
        }
        Ok(())
    }

    async fn read_project_tasks(&self, id: i64) -> Result<Vec<TaskData>> {
        let workspace_id = self.workspace_id(None)?;
        let tasks: Option<Vec<TaskData>> = self
            .get(&format!(
                "/workspaces/{}/projects/{}/tasks",
                workspace_id, id
            ))
            .await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn read_project_users(&self, id: i64) -> Result<Vec<ProjectUserData>> {
        let workspace_id = self.workspace_id(None)?;
        let users: Option<Vec<ProjectUserData>> = self
            .send_json(
                self.request(
                    Method::GET,
                    &format!("/workspaces/{}/project_users", workspace_id),
                )
                .query(&[("project_ids", id.to_string())]),
            )
            .await?;
        Ok(users.unwrap_or_default())
    }
}
