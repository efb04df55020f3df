use super::KeyValueStorage;
use crate::error::AppError;
use std::path::PathBuf;

const STORE_DIR_ENV_VAR: &str = "MYTODO_STORE_DIR";
const APP_DIR_NAME: &str = "mytodo";

/// Per-user application directory shared by the task store and the config file.
pub fn app_dir() -> Result<PathBuf, AppError> {
    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };
    base.map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::invalid_data("cannot locate the user config directory"))
}

/// Resolves the directory that backs [`FileStorage`].
pub fn store_dir() -> Result<PathBuf, AppError> {
    match std::env::var(STORE_DIR_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => app_dir(),
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("storage key is required"));
        }
        if trimmed.contains(['/', '\\']) || trimmed.starts_with('.') {
            return Err(AppError::invalid_input(format!(
                "storage key '{trimmed}' is not a plain name"
            )));
        }

        Ok(self.dir.join(format!("{trimmed}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::io(format!("{}: {}", self.dir.display(), err)))?;
        std::fs::write(&path, value)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }
}
