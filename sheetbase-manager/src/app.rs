//! Command execution.

use crate::cli::{Command, USAGE};
use crate::error::{ManagerError, ManagerResult};
use crate::notifications::{NotificationCenter, NotificationLevel};
use crate::projects::{ProjectChange, ProjectManager};
use crate::settings::LocalSettings;
use sheetbase_cache::{ChannelObserver, DocumentCache, DocumentCacheBuilder};
use sheetbase_client::{DocumentRemote, HttpEndpoint, ProjectRegistry, ProjectSummary};
use sheetbase_core::{CacheEvent, JsonValue, PartitionKey, SheetbaseConfig};
use std::sync::Arc;
use std::time::Duration;

/// Remote handles for one endpoint.
#[derive(Clone)]
pub struct Remotes {
    pub documents: Arc<dyn DocumentRemote>,
    pub registry: Arc<dyn ProjectRegistry>,
}

impl Remotes {
    pub fn http(url: &str, timeout: Duration) -> ManagerResult<Self> {
        let endpoint = Arc::new(HttpEndpoint::new(url, timeout)?);
        Ok(Self {
            documents: endpoint.clone(),
            registry: endpoint,
        })
    }
}

pub struct App {
    config: SheetbaseConfig,
    settings: LocalSettings,
    remotes: Option<Remotes>,
    notifications: NotificationCenter,
}

impl App {
    /// Load local settings and connect to the configured endpoint, if any.
    pub fn from_config(config: SheetbaseConfig) -> ManagerResult<Self> {
        let settings = LocalSettings::load(&config.settings_path)?;
        let mut app = Self::new(config, settings, None);
        app.remotes = match app.connect() {
            Ok(remotes) => remotes,
            // A bad saved URL must not lock out `endpoint set`
            Err(err) if app.config.endpoint_url.is_none() => {
                tracing::warn!(
                    error = %err,
                    "Saved endpoint URL is unusable, continuing without an endpoint"
                );
                app.notifications.toast(
                    NotificationLevel::Warning,
                    "Saved endpoint URL is invalid. Please set it again.",
                );
                None
            }
            Err(err) => return Err(err),
        };
        Ok(app)
    }

    pub fn new(config: SheetbaseConfig, settings: LocalSettings, remotes: Option<Remotes>) -> Self {
        Self {
            config,
            settings,
            remotes,
            notifications: NotificationCenter::new(),
        }
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn settings(&self) -> &LocalSettings {
        &self.settings
    }

    /// Endpoint URL in effect: the config file wins over local settings.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.config
            .endpoint_url
            .as_deref()
            .or_else(|| self.settings.script_url())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    fn connect(&self) -> ManagerResult<Option<Remotes>> {
        match self.endpoint_url() {
            Some(url) => Ok(Some(Remotes::http(url, self.request_timeout())?)),
            None => Ok(None),
        }
    }

    fn remotes(&self) -> ManagerResult<&Remotes> {
        self.remotes.as_ref().ok_or_else(|| {
            self.notifications.toast(
                NotificationLevel::Error,
                "Please set the endpoint URL first.",
            );
            ManagerError::EndpointNotConfigured
        })
    }

    fn project_manager(&self) -> ProjectManager {
        ProjectManager::new(
            self.remotes.as_ref().map(|r| r.registry.clone()),
            self.notifications.clone(),
        )
    }

    /// Run one command and return the lines to print.
    pub async fn execute(&mut self, command: Command) -> ManagerResult<Vec<String>> {
        match command {
            Command::Help => Ok(vec![USAGE.to_string()]),
            Command::EndpointShow => Ok(vec![self
                .endpoint_url()
                .unwrap_or("(not configured)")
                .to_string()]),
            Command::EndpointSet { url } => self.set_endpoint(&url),
            Command::ProjectsList => {
                let projects = self.project_manager().list_projects().await?;
                Ok(render_projects(&projects))
            }
            Command::ProjectsAdd {
                project_id,
                password,
            } => {
                let change = self
                    .project_manager()
                    .add_project(&project_id, password.as_deref())
                    .await?;
                Ok(render_change(change))
            }
            Command::ProjectsDelete {
                project_id,
                password,
            } => {
                let change = self
                    .project_manager()
                    .delete_project(&project_id, password.as_deref())
                    .await?;
                Ok(render_change(change))
            }
            Command::DocGet { project, key } => self.doc_get(project, &key).await,
            Command::DocSet {
                project,
                key,
                value,
            } => self.doc_set(project, &key, value).await,
        }
    }

    fn set_endpoint(&mut self, url: &str) -> ManagerResult<Vec<String>> {
        let url = url.trim();
        // Only a URL the client can connect with is saved
        let remotes = Remotes::http(url, self.request_timeout())
            .and_then(|remotes| {
                self.settings.set_script_url(url)?;
                Ok(remotes)
            })
            .map_err(|err| {
                self.notifications
                    .toast(NotificationLevel::Error, "Please enter a valid URL.");
                err
            })?;
        self.settings.save()?;
        tracing::info!(path = %self.settings.path().display(), "Endpoint URL saved");
        self.notifications
            .toast(NotificationLevel::Success, "URL saved successfully!");

        let mut lines = Vec::new();
        if self.config.endpoint_url.is_some() {
            lines.push("note: endpoint_url in the config file takes precedence".to_string());
        } else {
            self.remotes = Some(remotes);
        }
        Ok(lines)
    }

    fn cache_builder(&self, project: PartitionKey) -> ManagerResult<DocumentCacheBuilder> {
        let remotes = self.remotes()?;
        Ok(DocumentCache::builder(remotes.documents.clone())
            .with_partition(project)
            .with_schema(self.config.document_schema())
            .with_observer(self.notifications.clone()))
    }

    async fn doc_get(&self, project: PartitionKey, key: &str) -> ManagerResult<Vec<String>> {
        let cache = self.cache_builder(project)?.build()?;
        let value = cache.get(key, JsonValue::Null).await;
        Ok(vec![pretty(&value)])
    }

    async fn doc_set(
        &self,
        project: PartitionKey,
        key: &str,
        value: JsonValue,
    ) -> ManagerResult<Vec<String>> {
        let (observer, mut events) = ChannelObserver::new();
        let cache = self
            .cache_builder(project.clone())?
            .with_observer(observer)
            .build()?;

        // Never overwrite the remote with the fallback document. FetchFailed
        // is already delivered once initialize returns.
        cache.initialize().await;
        if let Ok(CacheEvent::FetchFailed { error, .. }) = events.try_recv() {
            return Err(error.into());
        }

        cache.set(key, value).await;
        cache.flush().await?;

        while let Ok(event) = events.try_recv() {
            if let CacheEvent::SaveFailed { error, .. } = event {
                return Err(error.into());
            }
        }
        Ok(vec![format!("Saved '{}' for project '{}'.", key, project)])
    }
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render_projects(projects: &[ProjectSummary]) -> Vec<String> {
    if projects.is_empty() {
        return vec!["No projects found.".to_string()];
    }
    let width = projects
        .iter()
        .map(|p| p.project_id.len())
        .max()
        .unwrap_or(0)
        .max("PROJECT".len());
    let mut lines = vec![format!("{:<width$}  {:<8}  PASSWORD", "PROJECT", "CELL")];
    for project in projects {
        lines.push(format!(
            "{:<width$}  {:<8}  {}",
            project.project_id,
            project.cell_location.as_deref().unwrap_or("-"),
            if project.password_protected { "Yes" } else { "No" },
        ));
    }
    lines
}

fn render_change(change: ProjectChange) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(message) = change.message {
        lines.push(message);
    }
    if let Some(projects) = change.projects {
        lines.extend(render_projects(&projects));
    }
    lines
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("endpoint_url", &self.endpoint_url())
            .field("settings_path", &self.settings.path())
            .field("connected", &self.remotes.is_some())
            .finish()
    }
}
