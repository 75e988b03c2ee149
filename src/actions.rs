use std::fmt::Display;
use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{error, info};

use crate::resources::{
    BulkUpdateResult, ClientData, ClientParams, ProjectData, ProjectFilter, ProjectParams,
    ProjectUserData, TaskData, UserData, UserParams,
};
use crate::time_entry::{TagAction, TimeEntry, TimeEntryParams};
use crate::toggl::TogglRepository;

/// Toggl APIの操作をconnectorのactionとして公開する。
///
/// 読み込み系の操作はエラーをそのまま返す。書き込み系の一部の操作は
/// エラーをログに出して`None`を返し、呼び出し元の処理を止めない。
pub struct TogglActions<R: TogglRepository> {
    repository: R,
}

/// 書き込みの失敗をログに出し、`None`に変換する。
async fn log_failure<T, F>(operation: impl Display, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(err) => {
            error!("Toggl {} failed: {:#}", operation, err);
            None
        }
    }
}

impl<R: TogglRepository> TogglActions<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// 内部で使っているクライアントを返す。
    pub fn sdk(&self) -> &R {
        info!("Toggl - SDK Returned");
        &self.repository
    }

    // Time Entry

    /// 期間を指定しない場合はToggl側の既定(直近9日間、最大1000件)が適用される。
    pub async fn get_time_entries(
        &self,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<TimeEntry>> {
        self.repository.read_time_entries(start_at, end_at).await
    }

    pub async fn get_current_time_entry(&self) -> Result<Option<TimeEntry>> {
        self.repository.read_current_time_entry().await
    }

    pub async fn get_time_entry_data(&self, id: i64) -> Result<TimeEntry> {
        self.repository.read_time_entry(id).await
    }

    pub async fn create_time_entry(&self, params: TimeEntryParams) -> Option<TimeEntry> {
        log_failure("create time entry", self.repository.create_time_entry(params)).await
    }

    pub async fn start_time_entry(&self, params: TimeEntryParams) -> Result<TimeEntry> {
        self.repository.start_time_entry(params).await
    }

    pub async fn stop_time_entry(&self, id: i64) -> Result<TimeEntry> {
        self.repository.stop_time_entry(id).await
    }

    pub async fn update_time_entry(&self, id: i64, params: TimeEntryParams) -> Option<TimeEntry> {
        log_failure(
            format!("update time entry {}", id),
            self.repository.update_time_entry(id, params),
        )
        .await
    }

    pub async fn update_time_entries_tags(
        &self,
        ids: Vec<i64>,
        tags: Vec<String>,
        action: TagAction,
    ) -> Option<BulkUpdateResult> {
        log_failure(
            "update time entries tags",
            self.repository.update_time_entries_tags(ids, tags, action),
        )
        .await
    }

    /// 削除できた場合は`Some(())`を返す。
    pub async fn delete_time_entry(&self, id: i64) -> Option<()> {
        log_failure(
            format!("delete time entry {}", id),
            self.repository.delete_time_entry(id),
        )
        .await
    }

    // Users

    pub async fn get_user_data(&self) -> Result<UserData> {
        self.repository.read_user().await
    }

    pub async fn update_user_data(&self, params: UserParams) -> Option<UserData> {
        log_failure("update user data", self.repository.update_user(params)).await
    }

    pub async fn reset_api_token(&self) -> Result<String> {
        self.repository.reset_api_token().await
    }

    pub async fn change_user_password(&self, current_password: &str, password: &str) -> Result<()> {
        self.repository
            .change_password(current_password.to_string(), password.to_string())
            .await
    }

    // Clients

    pub async fn create_client(&self, params: ClientParams) -> Option<ClientData> {
        log_failure("create client", self.repository.create_client(params)).await
    }

    pub async fn get_clients(&self) -> Result<Vec<ClientData>> {
        self.repository.read_clients().await
    }

    pub async fn get_client_data(&self, id: i64) -> Result<ClientData> {
        self.repository.read_client(id).await
    }

    pub async fn update_client(&self, id: i64, params: ClientParams) -> Option<ClientData> {
        log_failure(
            format!("update client {}", id),
            self.repository.update_client(id, params),
        )
        .await
    }

    pub async fn delete_client(&self, id: i64) -> Result<()> {
        self.repository.delete_client(id).await
    }

    pub async fn get_client_projects(
        &self,
        id: i64,
        filter: ProjectFilter,
    ) -> Result<Vec<ProjectData>> {
        self.repository.read_client_projects(id, filter).await
    }

    // Projects

    pub async fn create_project(&self, params: ProjectParams) -> Option<ProjectData> {
        log_failure("create project", self.repository.create_project(params)).await
    }

    pub async fn delete_project(&self, id: i64) -> Result<()> {
        self.repository.delete_project(id).await
    }

    pub async fn delete_projects(&self, ids: Vec<i64>) -> Result<()> {
        self.repository.delete_projects(ids).await
    }

    pub async fn get_project_data(&self, id: i64) -> Result<ProjectData> {
        self.repository.read_project(id).await
    }

    pub async fn get_project_tasks(&self, id: i64) -> Result<Vec<TaskData>> {
        self.repository.read_project_tasks(id).await
    }

    pub async fn get_project_users(&self, id: i64) -> Result<Vec<ProjectUserData>> {
        self.repository.read_project_users(id).await
    }

    pub async fn update_project(&self, id: i64, params: ProjectParams) -> Option<ProjectData> {
        log_failure(
            format!("update project {}", id),
            self.repository.update_project(id, params),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::TogglActions;
    use crate::resources::{ClientParams, ProjectParams, UserParams};
    use crate::time_entry::fixtures::entry;
    use crate::time_entry::{TagAction, TimeEntryParams};
    use crate::toggl::MockTogglRepository;

    /// 書き込みが失敗してもエラーを返さず`None`になる。
    #[tokio::test]
    async fn test_create_failure_resolves_to_none() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_create_time_entry()
            .times(1)
            .returning(|_| Err(anyhow!("remote rejected")));
        let actions = TogglActions::new(toggl);

        let result = actions.create_time_entry(TimeEntryParams::default()).await;

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_failures_resolve_to_none() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_update_time_entry()
            .returning(|_, _| Err(anyhow!("boom")));
        toggl
            .expect_update_time_entries_tags()
            .returning(|_, _, _| Err(anyhow!("boom")));
        toggl
            .expect_delete_time_entry()
            .returning(|_| Err(anyhow!("boom")));
        toggl.expect_update_user().returning(|_| Err(anyhow!("boom")));
        toggl
            .expect_create_client()
            .returning(|_| Err(anyhow!("boom")));
        toggl
            .expect_update_client()
            .returning(|_, _| Err(anyhow!("boom")));
        toggl
            .expect_create_project()
            .returning(|_| Err(anyhow!("boom")));
        toggl
            .expect_update_project()
            .returning(|_, _| Err(anyhow!("boom")));
        let actions = TogglActions::new(toggl);

        assert!(actions
            .update_time_entry(1, TimeEntryParams::default())
            .await
            .is_none());
        assert!(actions
            .update_time_entries_tags(vec![1], vec!["a".to_string()], TagAction::Add)
            .await
            .is_none());
        assert!(actions.delete_time_entry(1).await.is_none());
        assert!(actions
            .update_user_data(UserParams::default())
            .await
            .is_none());
        assert!(actions
            .create_client(ClientParams::default())
            .await
            .is_none());
        assert!(actions
            .update_client(1, ClientParams::default())
            .await
            .is_none());
        assert!(actions
            .create_project(ProjectParams::default())
            .await
            .is_none());
        assert!(actions
            .update_project(1, ProjectParams::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_create_success_returns_value() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_create_time_entry()
            .times(1)
            .returning(|_| Ok(entry(3, 9, "new")));
        let actions = TogglActions::new(toggl);

        let result = actions.create_time_entry(TimeEntryParams::default()).await;

        assert_eq!(result, Some(entry(3, 9, "new")));
    }

    /// 読み込みの失敗は呼び出し元に返る。
    #[tokio::test]
    async fn test_read_failures_propagate() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .times(1)
            .returning(|_, _| Err(anyhow!("unreachable")));
        toggl
            .expect_read_time_entry()
            .times(1)
            .returning(|_| Err(anyhow!("not found")));
        toggl
            .expect_stop_time_entry()
            .times(1)
            .returning(|_| Err(anyhow!("not running")));
        let actions = TogglActions::new(toggl);

        assert!(actions.get_time_entries(None, None).await.is_err());
        assert!(actions.get_time_entry_data(1).await.is_err());
        assert!(actions.stop_time_entry(1).await.is_err());
    }
}
