use crate::error::AppError;
use crate::notify::{APP_NAME, NOTICE_TIMEOUT, Notice, NoticeKind, Notifier};
use notify_rust::{Notification, Timeout, Urgency};

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), AppError> {
        let urgency = match notice.kind {
            NoticeKind::Error => Urgency::Critical,
            NoticeKind::Warning => Urgency::Normal,
            NoticeKind::Success | NoticeKind::Info => Urgency::Low,
        };

        let mut notification = Notification::new();
        notification.summary(APP_NAME);
        notification.body(&notice.message);
        notification.urgency(urgency);
        notification.timeout(Timeout::Milliseconds(NOTICE_TIMEOUT.as_millis() as u32));

        notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }
}
