use crate::error::AppError;
use crate::model::Filter;
use crate::notify::NoticeKind;
use crate::storage::app_dir;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "MYTODO_CONFIG_PATH";

const RESET: &str = "\x1b[0m";

/// Colour scheme for notices and completed tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Plain terminal output, no escape codes.
    #[default]
    Default,
    Noir,
    Solarized,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Noir => "noir",
            Theme::Solarized => "solarized",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Default => Palette::plain(),
            Theme::Noir => Palette::from_codes([36, 203, 214, 63, 244]),
            Theme::Solarized => Palette::from_codes([64, 160, 136, 33, 245]),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts any casing and separator; `light`/`vanilla` and the `dark` spellings are aliases.
impl FromStr for Theme {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "" | "default" | "vanilla" | "light" => Ok(Theme::Default),
            name if name == "noir" || name.starts_with("dark") => Ok(Theme::Noir),
            "solarized" => Ok(Theme::Solarized),
            _ => Err(AppError::invalid_input(format!(
                "unknown theme '{}' (expected default, noir or solarized)",
                raw.trim()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|err: AppError| serde::de::Error::custom(err.message()))
    }
}

/// ANSI colours per notice kind; empty strings disable colouring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub success: String,
    pub error: String,
    pub warning: String,
    pub info: String,
    pub muted: String,
}

impl Palette {
    pub fn plain() -> Self {
        Self {
            success: String::new(),
            error: String::new(),
            warning: String::new(),
            info: String::new(),
            muted: String::new(),
        }
    }

    /// Builds a 256-colour palette from success, error, warning, info and muted codes.
    fn from_codes(codes: [u8; 5]) -> Self {
        let [success, error, warning, info, muted] = codes.map(|code| format!("\x1b[38;5;{code}m"));
        Self {
            success,
            error,
            warning,
            info,
            muted,
        }
    }

    pub fn paint(&self, kind: NoticeKind, text: &str) -> String {
        let colour = match kind {
            NoticeKind::Success => &self.success,
            NoticeKind::Error => &self.error,
            NoticeKind::Warning => &self.warning,
            NoticeKind::Info => &self.info,
        };
        wrap(colour, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        wrap(&self.muted, text)
    }
}

fn wrap(colour: &str, text: &str) -> String {
    if colour.is_empty() {
        text.to_string()
    } else {
        format!("{colour}{text}{RESET}")
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    /// Filter a session starts with.
    #[serde(default)]
    pub default_filter: Option<Filter>,
    #[serde(default)]
    pub desktop_notifications: bool,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// Result of a best-effort load: always a usable config, plus whatever went wrong.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

impl ConfigLoad {
    fn defaults(error: Option<AppError>) -> Self {
        Self {
            config: Config::default(),
            error,
        }
    }
}

/// Values given on the command line; `None` keeps the file's value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<Theme>,
    pub default_filter: Option<Filter>,
    pub desktop_notifications: Option<bool>,
    pub aliases: HashMap<String, String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(app_dir()?.join(CONFIG_FILE_NAME)),
    }
}

/// Missing files yield defaults silently; unreadable ones yield defaults plus the error.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_or_defaults(&path),
        Err(err) => ConfigLoad::defaults(Some(err)),
    }
}

fn load_config_or_defaults(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad::defaults(None);
    }

    match read_config(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad::defaults(Some(err)),
    }
}

fn read_config(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content)
        .map_err(|err| AppError::invalid_data(format!("config {}: {}", path.display(), err)))
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    merged.theme = overrides.theme.unwrap_or(base.theme);
    merged.default_filter = overrides.default_filter.or(base.default_filter);
    merged.desktop_notifications = overrides
        .desktop_notifications
        .unwrap_or(base.desktop_notifications);
    merged.aliases.extend(
        overrides
            .aliases
            .iter()
            .map(|(name, command)| (name.clone(), command.clone())),
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides, Theme, load_config_or_defaults, merge_overrides};
    use crate::model::Filter;
    use crate::notify::NoticeKind;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("mytodo-{nanos}-{file_name}"))
    }

    fn load_json(file_name: &str, content: &str) -> super::ConfigLoad {
        let path = temp_path(file_name);
        fs::write(&path, content).unwrap();
        let loaded = load_config_or_defaults(&path);
        fs::remove_file(&path).ok();
        loaded
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let loaded = load_config_or_defaults(&temp_path("absent-config.json"));

        assert_eq!(loaded.config, Config::default());
        assert!(loaded.error.is_none());
    }

    #[test]
    fn broken_json_falls_back_to_defaults() {
        let loaded = load_json("broken-config.json", "{ \"theme\": ");

        assert_eq!(loaded.config, Config::default());
        assert_eq!(loaded.error.unwrap().code(), "invalid_data");
    }

    #[test]
    fn every_field_is_read() {
        let loaded = load_json(
            "full-config.json",
            r#"{
                "theme": "Dark Mode",
                "default_filter": "active",
                "desktop_notifications": true,
                "aliases": { "ls": "list --filter active" }
            }"#,
        );

        assert!(loaded.error.is_none());
        let config = loaded.config;
        assert_eq!(config.theme, Theme::Noir);
        assert_eq!(config.default_filter, Some(Filter::Active));
        assert!(config.desktop_notifications);
        assert_eq!(config.aliases["ls"], "list --filter active");
    }

    #[test]
    fn unknown_filter_or_theme_is_rejected() {
        let filter = load_json("filter-config.json", r#"{"default_filter": "someday"}"#);
        assert!(filter.error.is_some());

        let theme = load_json("theme-config.json", r#"{"theme": "oceanic"}"#);
        assert_eq!(theme.config.theme, Theme::Default);
        assert!(theme.error.unwrap().message().contains("oceanic"));
    }

    #[test]
    fn overrides_win_and_aliases_accumulate() {
        let base = Config {
            aliases: [("ls".into(), "list".into())].into_iter().collect(),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            theme: Some(Theme::Solarized),
            default_filter: Some(Filter::Completed),
            desktop_notifications: Some(true),
            aliases: [("x".into(), "clear-completed".into())].into_iter().collect(),
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.theme, Theme::Solarized);
        assert_eq!(merged.default_filter, Some(Filter::Completed));
        assert!(merged.desktop_notifications);
        assert_eq!(merged.aliases["ls"], "list");
        assert_eq!(merged.aliases["x"], "clear-completed");
        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn theme_names_are_forgiving() {
        assert_eq!("Vanilla".parse::<Theme>().unwrap(), Theme::Default);
        assert_eq!("dark-mode".parse::<Theme>().unwrap(), Theme::Noir);
        assert_eq!(" SOLARIZED ".parse::<Theme>().unwrap(), Theme::Solarized);
        assert_eq!("".parse::<Theme>().unwrap(), Theme::Default);
        assert_eq!("neon".parse::<Theme>().unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn palettes_colour_notices_by_kind() {
        let plain = Theme::Default.palette();
        assert_eq!(plain.paint(NoticeKind::Error, "oops"), "oops");
        assert_eq!(plain.mutedize("done"), "done");

        let noir = Theme::Noir.palette();
        assert_eq!(
            noir.paint(NoticeKind::Success, "ok"),
            "\x1b[38;5;36mok\x1b[0m"
        );
        assert_eq!(noir.mutedize("done"), "\x1b[38;5;244mdone\x1b[0m");
    }
}
