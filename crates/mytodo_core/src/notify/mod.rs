//! User-facing outcome notices and the desktop notifiers that can show them.

use crate::error::AppError;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

/// How long a desktop notice stays on screen before it is dismissed.
///
/// Windows toasts only offer the system short and long durations, so they use
/// the short one instead.
pub const NOTICE_TIMEOUT: Duration = Duration::from_secs(3);

const APP_NAME: &str = "mytodo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new<M: Into<String>>(kind: NoticeKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success<M: Into<String>>(message: M) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error<M: Into<String>>(message: M) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn warning<M: Into<String>>(message: M) -> Self {
        Self::new(NoticeKind::Warning, message)
    }

    pub fn info<M: Into<String>>(message: M) -> Self {
        Self::new(NoticeKind::Info, message)
    }
}

pub trait Notifier {
    fn notify(&self, notice: &Notice) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notice: &Notice) -> Result<(), AppError> {
        Ok(())
    }
}

/// Desktop notifier when `enabled` and supported, otherwise a no-op.
pub fn notifier_from_env(enabled: bool) -> Result<Box<dyn Notifier>, AppError> {
    if !enabled || std::env::var("MYTODO_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Err(AppError::InvalidData(reason)) => {
            debug!(%reason, "desktop notices unavailable");
            Ok(Box::new(NoopNotifier))
        }
        other => other,
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "desktop notifications are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::{Notice, NoticeKind, notifier_from_env};

    #[test]
    fn constructors_set_kind() {
        assert_eq!(Notice::success("ok").kind, NoticeKind::Success);
        assert_eq!(Notice::error("no").kind, NoticeKind::Error);
        assert_eq!(Notice::warning("hm").kind, NoticeKind::Warning);
        assert_eq!(Notice::info("fyi").message, "fyi");
    }

    #[test]
    fn disabled_notifier_accepts_everything() {
        let notifier = notifier_from_env(false).unwrap();
        assert!(notifier.notify(&Notice::info("quiet")).is_ok());
    }

    #[test]
    fn notice_serializes_kind_in_snake_case() {
        let value = serde_json::to_value(Notice::warning("Failed to save tasks")).unwrap();
        assert_eq!(value["kind"], "warning");
        assert_eq!(value["message"], "Failed to save tasks");
    }
}
