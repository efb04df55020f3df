use clap::{Parser, Subcommand};
use mytodo_core::config::{ConfigOverrides, Theme};
use mytodo_core::error::AppError;
use mytodo_core::model::{Filter, TaskId};
use std::collections::HashMap;

#[derive(Parser, Debug)]
#[command(name = "mytodo", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: mytodo add Buy milk
    Add { text: Vec<String> },
    /// Mark a task as completed, or as active again
    ///
    /// Example: mytodo toggle 1766188800000
    Toggle { id: TaskId },
    /// Edit a task's text; without text, enter edit mode (interactive only)
    ///
    /// Example: mytodo edit 1766188800000 Buy oat milk
    Edit { id: TaskId, text: Vec<String> },
    /// Save the task being edited with new text (interactive only)
    ///
    /// Example: save Buy oat milk
    Save { text: Vec<String> },
    /// Leave edit mode without changing anything (interactive only)
    Cancel,
    /// Delete a task
    ///
    /// Example: mytodo delete 1766188800000
    Delete { id: TaskId },
    /// Remove every completed task
    ClearCompleted,
    /// Choose which tasks the list shows
    ///
    /// Example: mytodo filter active
    Filter { filter: Filter },
    /// List tasks
    ///
    /// Example: mytodo list --filter completed
    List {
        #[arg(short, long)]
        filter: Option<Filter>,
    },
    /// Show how many tasks remain
    Count,
}

impl Command {
    /// Commands that only make sense while a store stays open between lines.
    pub fn needs_edit_mode(&self) -> bool {
        match self {
            Self::Edit { text, .. } => text.is_empty(),
            Self::Save { .. } | Self::Cancel => true,
            _ => false,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Add { .. }
                | Self::Toggle { .. }
                | Self::Edit { .. }
                | Self::Save { .. }
                | Self::Cancel
                | Self::Delete { .. }
                | Self::ClearCompleted
        )
    }
}

/// Applies one `--config-override KEY=VALUE` entry.
///
/// Keys are matched ignoring case and `-`/`_`; `filter`, `notifications` and
/// `alias.<name>` are accepted as short forms.
pub fn apply_config_override(overrides: &mut ConfigOverrides, raw: &str) -> Result<(), AppError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::invalid_input(format!("override '{raw}' is not KEY=VALUE")))?;
    let value = value.trim();
    let (field, alias) = match key.split_once('.') {
        Some((field, name)) => (field, Some(name.trim())),
        None => (key, None),
    };

    match (normalize_key(field).as_str(), alias) {
        ("theme", None) => overrides.theme = Some(value.parse::<Theme>()?),
        ("defaultfilter" | "filter", None) => {
            overrides.default_filter = Some(value.parse::<Filter>()?);
        }
        ("desktopnotifications" | "notifications", None) => {
            overrides.desktop_notifications = Some(parse_switch(value)?);
        }
        ("aliases" | "alias", Some(name)) if !name.is_empty() => {
            overrides.aliases.insert(name.to_string(), value.to_string());
        }
        ("aliases" | "alias", _) => {
            return Err(AppError::invalid_input(
                "alias overrides need a name, as in aliases.ls=list",
            ));
        }
        _ => {
            return Err(AppError::invalid_input(format!(
                "unknown config key '{}'",
                key.trim()
            )));
        }
    }
    Ok(())
}

/// Folds every `--config-override` value into one [`ConfigOverrides`].
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        apply_config_override(&mut overrides, entry)?;
    }
    Ok(overrides)
}

fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

fn parse_switch(raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(AppError::invalid_input(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}

/// Splits an interactive line into arguments, honouring double quotes.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

/// Replaces a leading alias with its command line. Aliases do not expand recursively.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let Some(expansion) = args.first().and_then(|first| aliases.get(first)) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}
