use crate::approval::DueStage;
use crate::error::AppError;
use crate::notify::{Notifier, launch_timeline, notification_body, notification_summary};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, due: &DueStage) -> Result<(), AppError> {
        self.notify_with_action(due, "")
    }

    fn notify_with_action(&self, due: &DueStage, action: &str) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary(&notification_summary(due));
        notification.body(&notification_body(due));
        if !action.trim().is_empty() {
            notification.action(action, "Open timeline");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        if !action.trim().is_empty() {
            let action_key = action.to_string();
            std::thread::spawn(move || {
                handle.wait_for_action(|selected| {
                    if selected == action_key || selected == "default" {
                        let _ = launch_timeline();
                    }
                });
            });
        }

        Ok(())
    }
}
