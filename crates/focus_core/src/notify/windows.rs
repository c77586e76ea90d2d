use crate::approval::DueStage;
use crate::error::AppError;
use crate::notify::{
    Notifier, launch_timeline, notification_body, notification_summary,
    parse_activation_argument,
};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, due: &DueStage) -> Result<(), AppError> {
        self.notify_with_action(due, "")
    }

    fn notify_with_action(&self, due: &DueStage, action: &str) -> Result<(), AppError> {
        let action_value = action.to_string();
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&notification_summary(due))
            .text1(&notification_body(due));

        if !action_value.trim().is_empty() {
            toast = toast.add_button("Open timeline", &action_value);
        }

        toast
            .on_activated(move |args| {
                let open = match args.as_deref().map(str::trim) {
                    None | Some("") => true,
                    Some(args) => args == action_value || parse_activation_argument(args).is_some(),
                };
                if open {
                    let _ = launch_timeline();
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
