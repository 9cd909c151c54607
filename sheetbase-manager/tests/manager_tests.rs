//! Manager operations against the mock endpoint.

use serde_json::json;
use sheetbase_core::{CacheError, EndpointError, LogFormat, SheetbaseConfig};
use sheetbase_manager::{
    App, Command, LocalSettings, ManagerError, NotificationCenter, NotificationLevel,
    NotificationStyle, ProjectManager, Remotes,
};
use sheetbase_test_utils::{fixtures, MockEndpoint, ProjectRequest, RegistryCall};
use std::path::Path;
use std::sync::Arc;

fn manager(endpoint: &MockEndpoint) -> ProjectManager {
    ProjectManager::new(Some(Arc::new(endpoint.clone())), NotificationCenter::new())
}

fn remotes(endpoint: &MockEndpoint) -> Remotes {
    Remotes {
        documents: Arc::new(endpoint.clone()),
        registry: Arc::new(endpoint.clone()),
    }
}

fn config(settings_path: &Path, endpoint_url: Option<&str>) -> SheetbaseConfig {
    SheetbaseConfig {
        endpoint_url: endpoint_url.map(str::to_string),
        request_timeout_ms: 5_000,
        settings_path: settings_path.to_path_buf(),
        log_format: LogFormat::Text,
        schema: None,
    }
}

fn app_with(endpoint: Option<&MockEndpoint>, dir: &tempfile::TempDir) -> App {
    let path = dir.path().join("settings.json");
    let settings = LocalSettings::load(&path).unwrap();
    App::new(config(&path, None), settings, endpoint.map(remotes))
}

// ============================================================================
// PROJECT MANAGER
// ============================================================================

#[tokio::test]
async fn add_trims_id_and_refreshes_list() {
    let endpoint = MockEndpoint::new();
    let manager = manager(&endpoint);

    let change = manager.add_project("  spring-fair  ", Some("pw")).await.unwrap();

    assert_eq!(change.message.as_deref(), Some("Project 'spring-fair' added."));
    let projects = change.projects.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project_id, "spring-fair");
    assert!(projects[0].password_protected);
    assert_eq!(
        endpoint.registry_calls(),
        vec![
            RegistryCall::Add(ProjectRequest::new("spring-fair", Some("pw".to_string()))),
            RegistryCall::List,
        ]
    );

    let toasts = manager.notifications().recent();
    assert_eq!(toasts[0].level, NotificationLevel::Success);
    assert_eq!(toasts[0].message, "Project 'spring-fair' added.");
}

#[tokio::test]
async fn empty_id_is_rejected_locally() {
    let endpoint = MockEndpoint::new();
    let manager = manager(&endpoint);

    let err = manager.add_project("   ", None).await.unwrap_err();

    assert_eq!(err, ManagerError::EmptyProjectId);
    assert!(endpoint.registry_calls().is_empty());
    assert_eq!(
        manager.notifications().recent()[0].message,
        "Project ID cannot be empty."
    );
}

#[tokio::test]
async fn empty_password_is_sent_as_absent() {
    let endpoint = MockEndpoint::new();
    let manager = manager(&endpoint);

    manager.add_project("gala", Some("")).await.unwrap();

    assert_eq!(
        endpoint.registry_calls()[0],
        RegistryCall::Add(ProjectRequest::new("gala", None))
    );
    assert!(!endpoint.projects()[0].password_protected);
}

#[tokio::test]
async fn remote_rejection_becomes_error_toast() {
    let endpoint = MockEndpoint::new();
    endpoint.set_projects(vec![fixtures::project("gala", true)]);
    endpoint.fail_next_registry_call(EndpointError::remote("Incorrect password."));
    let manager = manager(&endpoint);

    let err = manager.delete_project("gala", Some("nope")).await.unwrap_err();

    assert_eq!(err, ManagerError::Endpoint(EndpointError::remote("Incorrect password.")));
    assert_eq!(endpoint.projects().len(), 1);
    let toast = &manager.notifications().recent()[0];
    assert_eq!(toast.level, NotificationLevel::Error);
    assert_eq!(toast.message, "Error deleting project: Incorrect password.");
}

#[tokio::test]
async fn delete_refreshes_list() {
    let endpoint = MockEndpoint::new();
    endpoint.set_projects(vec![
        fixtures::project("gala", false),
        fixtures::project("fair", false),
    ]);
    let manager = manager(&endpoint);

    let change = manager.delete_project("gala", None).await.unwrap();

    let remaining = change.projects.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].project_id, "fair");
}

#[tokio::test]
async fn failed_refresh_keeps_successful_change() {
    let endpoint = MockEndpoint::new();
    endpoint.script_registry([Ok(()), Err(EndpointError::transport("reset"))]);
    let manager = manager(&endpoint);

    let change = manager.add_project("fair", None).await.unwrap();

    assert_eq!(change.message.as_deref(), Some("Project 'fair' added."));
    assert!(change.projects.is_none());
    assert_eq!(endpoint.projects().len(), 1);
    let toasts = manager.notifications().recent();
    assert_eq!(toasts.len(), 2);
    assert_eq!(
        toasts[1].message,
        "Error fetching projects: Transport failure: reset"
    );
}

#[tokio::test]
async fn unconfigured_endpoint_is_reported() {
    let manager = ProjectManager::new(None, NotificationCenter::new());

    let err = manager.list_projects().await.unwrap_err();

    assert_eq!(err, ManagerError::EndpointNotConfigured);
    assert_eq!(
        manager.notifications().recent()[0].message,
        "Please set the endpoint URL first."
    );
}

// ============================================================================
// APP COMMANDS
// ============================================================================

#[tokio::test]
async fn endpoint_set_persists_and_show_reports_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(None, &dir);

    assert_eq!(
        app.execute(Command::EndpointShow).await.unwrap(),
        vec!["(not configured)".to_string()]
    );

    app.execute(Command::EndpointSet {
        url: " https://script.example.com/macros/s/abc/exec ".to_string(),
    })
    .await
    .unwrap();

    assert_eq!(
        app.execute(Command::EndpointShow).await.unwrap(),
        vec!["https://script.example.com/macros/s/abc/exec".to_string()]
    );
    let reloaded = LocalSettings::load(&dir.path().join("settings.json")).unwrap();
    assert_eq!(
        reloaded.script_url(),
        Some("https://script.example.com/macros/s/abc/exec")
    );
}

#[tokio::test]
async fn endpoint_set_rejects_invalid_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(None, &dir);

    let err = app
        .execute(Command::EndpointSet {
            url: "ftp://nope".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ManagerError::Config(_)));
    assert!(!dir.path().join("settings.json").exists());
    assert_eq!(
        app.notifications().recent()[0].message,
        "Please enter a valid URL."
    );
}

#[tokio::test]
async fn endpoint_set_rejects_url_the_client_cannot_parse() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(None, &dir);

    let err = app
        .execute(Command::EndpointSet {
            url: "http://exa mple.com/exec".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ManagerError::Config(_)));
    assert!(app.settings().script_url().is_none());
    assert!(!dir.path().join("settings.json").exists());
}

#[tokio::test]
async fn unusable_saved_url_does_not_block_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"scriptUrl": "http://exa mple.com/exec"}"#).unwrap();

    let mut app = App::from_config(config(&path, None)).unwrap();

    let warning = &app.notifications().recent()[0];
    assert_eq!(warning.level, NotificationLevel::Warning);
    let err = app.execute(Command::ProjectsList).await.unwrap_err();
    assert_eq!(err, ManagerError::EndpointNotConfigured);

    app.execute(Command::EndpointSet {
        url: "https://script.example.com/exec".to_string(),
    })
    .await
    .unwrap();
    let reloaded = LocalSettings::load(&path).unwrap();
    assert_eq!(reloaded.script_url(), Some("https://script.example.com/exec"));
}

#[test]
fn config_endpoint_wins_over_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = LocalSettings::load(&path).unwrap();
    settings.set_script_url("https://settings.example.com/exec").unwrap();

    let app = App::new(
        config(&path, Some("https://config.example.com/exec")),
        settings,
        None,
    );
    assert_eq!(app.endpoint_url(), Some("https://config.example.com/exec"));
}

#[tokio::test]
async fn doc_set_saves_and_doc_get_reads() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = MockEndpoint::with_document(fixtures::site_document());
    let mut app = app_with(Some(&endpoint), &dir);

    let lines = app
        .execute(Command::DocSet {
            project: fixtures::partition("alpha"),
            key: "gallery".to_string(),
            value: json!(["a.png"]),
        })
        .await
        .unwrap();
    assert_eq!(lines, vec!["Saved 'gallery' for project 'alpha'.".to_string()]);

    let persisted = endpoint.persisted();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].document.get("gallery"), Some(&json!(["a.png"])));
    assert!(persisted[0].document.contains_key("events"));

    let toasts = app.notifications().drain();
    assert!(toasts
        .iter()
        .any(|n| n.level == NotificationLevel::Success && n.style == NotificationStyle::Toast));

    let lines = app
        .execute(Command::DocGet {
            project: fixtures::partition("alpha"),
            key: "events".to_string(),
        })
        .await
        .unwrap();
    assert!(lines[0].contains("Bake sale"));
}

#[tokio::test]
async fn doc_set_reports_failed_save() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = MockEndpoint::with_document(fixtures::site_document());
    endpoint.script_persist([Err(EndpointError::remote("Quota exceeded"))]);
    let mut app = app_with(Some(&endpoint), &dir);

    let err = app
        .execute(Command::DocSet {
            project: fixtures::partition("alpha"),
            key: "events".to_string(),
            value: json!([]),
        })
        .await
        .unwrap_err();

    assert_eq!(err, ManagerError::Endpoint(EndpointError::remote("Quota exceeded")));
}

#[tokio::test]
async fn doc_set_refuses_to_overwrite_after_failed_load() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = MockEndpoint::failing_fetch(EndpointError::transport("offline"));
    let mut app = app_with(Some(&endpoint), &dir);

    let err = app
        .execute(Command::DocSet {
            project: fixtures::partition("alpha"),
            key: "events".to_string(),
            value: json!([]),
        })
        .await
        .unwrap_err();

    assert_eq!(err, ManagerError::Endpoint(EndpointError::transport("offline")));
    assert!(endpoint.persisted().is_empty());
    let alert = &app.notifications().recent()[0];
    assert_eq!(alert.style, NotificationStyle::Alert);
}

#[tokio::test]
async fn doc_get_falls_back_with_alert() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = MockEndpoint::failing_fetch(EndpointError::protocol(Some(502), "Bad gateway"));
    let mut app = app_with(Some(&endpoint), &dir);

    let lines = app
        .execute(Command::DocGet {
            project: fixtures::partition("alpha"),
            key: "events".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(lines, vec!["[]".to_string()]);
    assert_eq!(app.notifications().recent()[0].style, NotificationStyle::Alert);
}

#[tokio::test]
async fn doc_commands_need_an_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(None, &dir);

    let err = app
        .execute(Command::DocGet {
            project: fixtures::partition("alpha"),
            key: "events".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ManagerError::EndpointNotConfigured);
}

#[test]
fn cache_errors_convert() {
    let err = ManagerError::from(CacheError::QueueClosed);
    assert!(matches!(err, ManagerError::Cache(_)));
}
