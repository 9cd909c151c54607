//! Operator tooling for sheetbase: local settings, project registry
//! management, notifications and the `sheetbase` command-line entry point.

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod projects;
pub mod settings;

pub use app::{App, Remotes};
pub use cli::{parse_args, Cli, Command};
pub use error::{ManagerError, ManagerResult, SettingsError};
pub use notifications::{Notification, NotificationCenter, NotificationLevel, NotificationStyle};
pub use projects::{ProjectChange, ProjectManager};
pub use settings::{LocalSettings, SCRIPT_URL_KEY};
