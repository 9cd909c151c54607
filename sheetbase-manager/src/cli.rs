//! Command-line parsing.

use crate::error::{ManagerError, ManagerResult};
use sheetbase_core::{JsonValue, PartitionKey};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: sheetbase [--config <path>] [--json] <command>

Commands:
  endpoint show                            Print the endpoint URL in use
  endpoint set <url>                       Save the endpoint URL to local settings
  projects list                            List registered projects
  projects add <id> [--password <pw>]      Register a project
  projects delete <id> [--password <pw>]   Remove a project
  doc get <project> <key>                  Print one document value
  doc set <project> <key> <json>           Store one document value and save it

Options:
  --config <path>   Config file (defaults to $SHEETBASE_CONFIG)
  --json            Emit logs as JSON
  -h, --help        Show this help";

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub json_logs: bool,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    EndpointShow,
    EndpointSet {
        url: String,
    },
    ProjectsList,
    ProjectsAdd {
        project_id: String,
        password: Option<String>,
    },
    ProjectsDelete {
        project_id: String,
        password: Option<String>,
    },
    DocGet {
        project: PartitionKey,
        key: String,
    },
    DocSet {
        project: PartitionKey,
        key: String,
        value: JsonValue,
    },
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> ManagerResult<Cli>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut config = None;
    let mut json_logs = false;
    let mut password = None;
    let mut help = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(required_value(&mut args, "--config")?)),
            "--password" => password = Some(required_value(&mut args, "--password")?),
            "--json" => json_logs = true,
            "-h" | "--help" => help = true,
            flag if flag.starts_with("--") => {
                return Err(usage(format!("Unknown option: {}", flag)));
            }
            _ => positional.push(arg),
        }
    }

    let command = if help {
        Command::Help
    } else {
        parse_command(&positional, password)?
    };
    Ok(Cli {
        config,
        json_logs,
        command,
    })
}

fn parse_command(positional: &[String], password: Option<String>) -> ManagerResult<Command> {
    let words: Vec<&str> = positional.iter().map(String::as_str).collect();
    let takes_password = matches!(words.as_slice(), ["projects", "add" | "delete", ..]);
    if password.is_some() && !takes_password {
        return Err(usage("--password only applies to `projects add` and `projects delete`"));
    }

    match words.as_slice() {
        [] => Ok(Command::Help),
        ["endpoint", "show"] => Ok(Command::EndpointShow),
        ["endpoint", "set", url] => Ok(Command::EndpointSet {
            url: url.to_string(),
        }),
        ["projects", "list"] => Ok(Command::ProjectsList),
        ["projects", "add", id] => Ok(Command::ProjectsAdd {
            project_id: id.to_string(),
            password,
        }),
        ["projects", "delete", id] => Ok(Command::ProjectsDelete {
            project_id: id.to_string(),
            password,
        }),
        ["doc", "get", project, key] => Ok(Command::DocGet {
            project: PartitionKey::new(project)?,
            key: key.to_string(),
        }),
        ["doc", "set", project, key, raw] => {
            let value = serde_json::from_str(raw)
                .map_err(|e| usage(format!("Value for {} is not valid JSON: {}", key, e)))?;
            Ok(Command::DocSet {
                project: PartitionKey::new(project)?,
                key: key.to_string(),
                value,
            })
        }
        _ => Err(usage(format!("Unrecognized command: {}", positional.join(" ")))),
    }
}

fn required_value(args: &mut impl Iterator<Item = String>, flag: &str) -> ManagerResult<String> {
    args.next()
        .ok_or_else(|| usage(format!("{} requires a value", flag)))
}

fn usage(message: impl Into<String>) -> ManagerError {
    ManagerError::Usage(format!("{}\n\n{}", message.into(), USAGE))
}
