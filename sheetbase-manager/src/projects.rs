//! Project registry operations with operator feedback.

use crate::error::{ManagerError, ManagerResult};
use crate::notifications::{describe, NotificationCenter, NotificationLevel};
use sheetbase_client::{ProjectRegistry, ProjectRequest, ProjectSummary};
use std::sync::Arc;

/// Outcome of an add or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectChange {
    /// Confirmation text from the remote, if it sent one.
    pub message: Option<String>,
    /// The list after the change. `None` when the refresh failed; the
    /// failure has already been reported as a notification.
    pub projects: Option<Vec<ProjectSummary>>,
}

pub struct ProjectManager {
    registry: Option<Arc<dyn ProjectRegistry>>,
    notifications: NotificationCenter,
}

impl ProjectManager {
    pub fn new(
        registry: Option<Arc<dyn ProjectRegistry>>,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            registry,
            notifications,
        }
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    fn registry(&self) -> ManagerResult<&Arc<dyn ProjectRegistry>> {
        self.registry.as_ref().ok_or_else(|| {
            self.notifications.toast(
                NotificationLevel::Error,
                "Please set the endpoint URL first.",
            );
            ManagerError::EndpointNotConfigured
        })
    }

    pub async fn list_projects(&self) -> ManagerResult<Vec<ProjectSummary>> {
        let registry = self.registry()?;
        match registry.list_projects().await {
            Ok(projects) => {
                tracing::debug!(count = projects.len(), "Fetched project list");
                Ok(projects)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to fetch project list");
                self.notifications.toast(
                    NotificationLevel::Error,
                    format!("Error fetching projects: {}", describe(&err)),
                );
                Err(err.into())
            }
        }
    }

    /// Register `project_id` (trimmed). An empty password means no password.
    pub async fn add_project(
        &self,
        project_id: &str,
        password: Option<&str>,
    ) -> ManagerResult<ProjectChange> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            self.notifications
                .toast(NotificationLevel::Error, "Project ID cannot be empty.");
            return Err(ManagerError::EmptyProjectId);
        }
        let registry = self.registry()?;
        let request = ProjectRequest::new(project_id, non_empty(password));

        match registry.add_project(&request).await {
            Ok(message) => {
                tracing::info!(project_id, "Project added");
                self.confirm(message.as_deref(), &format!("Project '{}' added.", project_id));
                Ok(self.refreshed(message).await)
            }
            Err(err) => {
                tracing::warn!(project_id, error = %err, "Failed to add project");
                self.notifications.toast(
                    NotificationLevel::Error,
                    format!("Error adding project: {}", describe(&err)),
                );
                Err(err.into())
            }
        }
    }

    pub async fn delete_project(
        &self,
        project_id: &str,
        password: Option<&str>,
    ) -> ManagerResult<ProjectChange> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            self.notifications
                .toast(NotificationLevel::Error, "Project ID cannot be empty.");
            return Err(ManagerError::EmptyProjectId);
        }
        let registry = self.registry()?;
        let request = ProjectRequest::new(project_id, non_empty(password));

        match registry.delete_project(&request).await {
            Ok(message) => {
                tracing::info!(project_id, "Project deleted");
                self.confirm(
                    message.as_deref(),
                    &format!("Project '{}' deleted.", project_id),
                );
                Ok(self.refreshed(message).await)
            }
            Err(err) => {
                tracing::warn!(project_id, error = %err, "Failed to delete project");
                self.notifications.toast(
                    NotificationLevel::Error,
                    format!("Error deleting project: {}", describe(&err)),
                );
                Err(err.into())
            }
        }
    }

    fn confirm(&self, message: Option<&str>, fallback: &str) {
        let text = message.filter(|m| !m.trim().is_empty()).unwrap_or(fallback);
        self.notifications.toast(NotificationLevel::Success, text);
    }

    async fn refreshed(&self, message: Option<String>) -> ProjectChange {
        ProjectChange {
            message,
            projects: self.list_projects().await.ok(),
        }
    }
}

fn non_empty(password: Option<&str>) -> Option<String> {
    password.filter(|p| !p.is_empty()).map(str::to_string)
}

impl std::fmt::Debug for ProjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectManager")
            .field("configured", &self.registry.is_some())
            .field("notifications", &self.notifications.len())
            .finish()
    }
}
