use crate::approval::{DueAction, DueStage};
use crate::clock::format_clock_time;
use crate::error::AppError;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const APP_NAME: &str = "Live Focus";

pub trait Notifier {
    fn notify(&self, due: &DueStage) -> Result<(), AppError>;

    fn notify_with_action(&self, due: &DueStage, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(due)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _due: &DueStage) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("FOCUS_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(AppError::InvalidData(_)) => Ok(Box::new(NoopNotifier)),
        Err(other) => Err(other),
    }
}

pub fn notification_summary(due: &DueStage) -> String {
    match due.action {
        DueAction::Start => format!("{APP_NAME}: time to start"),
        DueAction::Finish => format!("{APP_NAME}: time to wrap up"),
    }
}

pub fn notification_body(due: &DueStage) -> String {
    let end = due.start_time_minutes + due.duration_minutes.max(0);
    format!(
        "{} - stage {} ({}-{})",
        due.task_title,
        due.stage_id,
        format_clock_time(due.start_time_minutes),
        format_clock_time(end)
    )
}

const ACTION_PREFIX: &str = "timeline:";

pub fn activation_argument(task_id: &str) -> String {
    format!("{ACTION_PREFIX}{task_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .map(|id| id.to_string())
}

/// Opens today's timeline in a fresh process.
pub fn launch_timeline() -> Result<(), AppError> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe).arg("timeline").spawn()?;
    Ok(())
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
        "notifications are not supported on this platform",
    ))
}
