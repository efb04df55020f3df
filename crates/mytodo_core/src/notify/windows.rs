use crate::error::AppError;
use crate::notify::{APP_NAME, Notice, Notifier};
use tauri_winrt_notification::{Duration, Toast};

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(APP_NAME)
            .text1(&notice.message)
            // No custom timeout on toasts; short is the closest to NOTICE_TIMEOUT.
            .duration(Duration::Short)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
