use crate::approval::{DueStage, due_stages as select_due_stages};
use crate::clock::{
    MINUTES_PER_DAY, format_date_key, logical_date_key, minute_of_day, parse_date_key,
};
use crate::error::AppError;
use crate::model::{DEFAULT_STAGE_DURATION_MINUTES, Stage, StageId, StageStatus, Task};
use crate::notify::{Notifier, activation_argument};
use crate::storage::json_store;
use crate::timeline::{DayTimeline, build_day_timeline};
use log::{info, warn};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

#[derive(Debug)]
pub struct NotificationOutcome {
    pub notified: Vec<DueStage>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub stage_id: StageId,
    pub error: AppError,
}

pub fn add_task(
    title: &str,
    logical_date: Option<&str>,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    add_task_with_path(&path, title, logical_date, now, daily_start)
}

pub fn list_tasks(logical_date: &str) -> Result<Vec<Task>, AppError> {
    let path = json_store::store_path()?;
    list_tasks_with_path(&path, logical_date)
}

pub fn delete_task(task_id: &str) -> Result<Task, AppError> {
    let path = json_store::store_path()?;
    delete_task_with_path(&path, task_id)
}

pub fn add_stage(
    task_id: &str,
    start: Option<i32>,
    duration: Option<i32>,
    now: PrimitiveDateTime,
) -> Result<Stage, AppError> {
    let path = json_store::store_path()?;
    add_stage_with_path(&path, task_id, start, duration, now)
}

pub fn move_stage(task_id: &str, stage_id: StageId, start: i32) -> Result<Stage, AppError> {
    let path = json_store::store_path()?;
    move_stage_with_path(&path, task_id, stage_id, start)
}

pub fn resize_stage(task_id: &str, stage_id: StageId, duration: i32) -> Result<Stage, AppError> {
    let path = json_store::store_path()?;
    resize_stage_with_path(&path, task_id, stage_id, duration)
}

pub fn set_stage_status(
    task_id: &str,
    stage_id: StageId,
    status: StageStatus,
) -> Result<Stage, AppError> {
    let path = json_store::store_path()?;
    set_stage_status_with_path(&path, task_id, stage_id, status)
}

pub fn delete_stage(task_id: &str, stage_id: StageId) -> Result<Stage, AppError> {
    let path = json_store::store_path()?;
    delete_stage_with_path(&path, task_id, stage_id)
}

pub fn timeline(
    logical_date: &str,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<DayTimeline, AppError> {
    let path = json_store::store_path()?;
    timeline_with_path(&path, logical_date, now, daily_start)
}

pub fn due_stages(now: PrimitiveDateTime, daily_start: i32) -> Result<Vec<DueStage>, AppError> {
    let path = json_store::store_path()?;
    due_stages_with_path(&path, now, daily_start)
}

pub fn notify_due(
    now: PrimitiveDateTime,
    daily_start: i32,
    notifier: &dyn Notifier,
) -> Result<NotificationOutcome, AppError> {
    let path = json_store::store_path()?;
    notify_due_with_path(&path, now, daily_start, notifier)
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("task id is required"));
    }
    Ok(trimmed)
}

fn validate_start(start: i32) -> Result<i32, AppError> {
    if !(0..MINUTES_PER_DAY).contains(&start) {
        return Err(AppError::invalid_input("start must be between 00:00 and 23:59"));
    }
    Ok(start)
}

fn validate_duration(duration: i32) -> Result<i32, AppError> {
    if duration < 0 {
        return Err(AppError::invalid_input("duration must not be negative"));
    }
    Ok(duration)
}

fn find_task<'a>(tasks: &'a mut [Task], task_id: &str) -> Result<&'a mut Task, AppError> {
    tasks
        .iter_mut()
        .find(|task| task.id == task_id)
        .ok_or_else(|| AppError::not_found(format!("task {task_id} not found")))
}

/// Loads the store, applies `edit` to one stage and saves.
fn update_stage_with_path<F>(
    path: &Path,
    task_id: &str,
    stage_id: StageId,
    edit: F,
) -> Result<Stage, AppError>
where
    F: FnOnce(&mut Stage) -> Result<(), AppError>,
{
    let task_id = required_id(task_id)?;
    let mut tasks = json_store::load_tasks(path)?;
    let task = find_task(&mut tasks, task_id)?;
    let stage = task
        .stage_mut(stage_id)
        .ok_or_else(|| AppError::not_found(format!("stage {stage_id} not found in {task_id}")))?;

    edit(stage)?;
    let updated = stage.clone();
    json_store::save_tasks(path, &tasks)?;

    Ok(updated)
}

fn add_task_with_path(
    path: &Path,
    title: &str,
    logical_date: Option<&str>,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<Task, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    let logical_date = match logical_date {
        Some(value) => format_date_key(parse_date_key(value)?),
        None => logical_date_key(now, daily_start),
    };

    let created = now.assume_utc();
    let created_at = created
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    let id = format!("task-{}", OffsetDateTime::now_utc().unix_timestamp_nanos());

    let task = Task {
        id,
        title: trimmed.to_string(),
        logical_date,
        created_at,
        stages: Vec::new(),
    };

    let mut tasks = json_store::load_tasks(path)?;
    tasks.push(task.clone());
    json_store::save_tasks(path, &tasks)?;

    info!("added task {} for {}", task.id, task.logical_date);
    Ok(task)
}

fn list_tasks_with_path(path: &Path, logical_date: &str) -> Result<Vec<Task>, AppError> {
    let key = format_date_key(parse_date_key(logical_date)?);
    let tasks = json_store::load_tasks(path)?;
    Ok(tasks
        .into_iter()
        .filter(|task| task.logical_date == key)
        .collect())
}

fn delete_task_with_path(path: &Path, task_id: &str) -> Result<Task, AppError> {
    let task_id = required_id(task_id)?;
    let mut tasks = json_store::load_tasks(path)?;
    let index = tasks
        .iter()
        .position(|task| task.id == task_id)
        .ok_or_else(|| AppError::not_found(format!("task {task_id} not found")))?;

    let removed = tasks.remove(index);
    json_store::save_tasks(path, &tasks)?;

    Ok(removed)
}

fn add_stage_with_path(
    path: &Path,
    task_id: &str,
    start: Option<i32>,
    duration: Option<i32>,
    now: PrimitiveDateTime,
) -> Result<Stage, AppError> {
    let task_id = required_id(task_id)?;
    let start = start.map(validate_start).transpose()?;
    let duration = duration.map(validate_duration).transpose()?;

    let mut tasks = json_store::load_tasks(path)?;
    let task = find_task(&mut tasks, task_id)?;

    let stage = Stage {
        id: task.next_stage_id(),
        start_time_minutes: Some(
            start.unwrap_or_else(|| task.default_stage_start(minute_of_day(now))),
        ),
        duration_minutes: Some(duration.unwrap_or(DEFAULT_STAGE_DURATION_MINUTES)),
        status: StageStatus::Upcoming,
    };
    task.stages.push(stage.clone());
    json_store::save_tasks(path, &tasks)?;

    info!("added stage {} to {}", stage.id, task_id);
    Ok(stage)
}

fn move_stage_with_path(
    path: &Path,
    task_id: &str,
    stage_id: StageId,
    start: i32,
) -> Result<Stage, AppError> {
    let start = validate_start(start)?;
    update_stage_with_path(path, task_id, stage_id, |stage| {
        stage.start_time_minutes = Some(start);
        Ok(())
    })
}

fn resize_stage_with_path(
    path: &Path,
    task_id: &str,
    stage_id: StageId,
    duration: i32,
) -> Result<Stage, AppError> {
    let duration = validate_duration(duration)?;
    update_stage_with_path(path, task_id, stage_id, |stage| {
        stage.duration_minutes = Some(duration);
        Ok(())
    })
}

fn set_stage_status_with_path(
    path: &Path,
    task_id: &str,
    stage_id: StageId,
    status: StageStatus,
) -> Result<Stage, AppError> {
    update_stage_with_path(path, task_id, stage_id, |stage| {
        if !stage.status.can_transition_to(status) {
            return Err(AppError::invalid_input(format!(
                "cannot move stage from {} to {}",
                stage.status.label(),
                status.label()
            )));
        }
        info!(
            "stage {} {} -> {}",
            stage.id,
            stage.status.label(),
            status.label()
        );
        stage.status = status;
        Ok(())
    })
}

fn delete_stage_with_path(
    path: &Path,
    task_id: &str,
    stage_id: StageId,
) -> Result<Stage, AppError> {
    let task_id = required_id(task_id)?;
    let mut tasks = json_store::load_tasks(path)?;
    let task = find_task(&mut tasks, task_id)?;
    let index = task
        .stages
        .iter()
        .position(|stage| stage.id == stage_id)
        .ok_or_else(|| AppError::not_found(format!("stage {stage_id} not found in {task_id}")))?;

    let removed = task.stages.remove(index);
    json_store::save_tasks(path, &tasks)?;

    Ok(removed)
}

fn timeline_with_path(
    path: &Path,
    logical_date: &str,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<DayTimeline, AppError> {
    let tasks = json_store::load_tasks(path)?;
    build_day_timeline(&tasks, logical_date, now, daily_start)
}

fn due_stages_with_path(
    path: &Path,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<Vec<DueStage>, AppError> {
    let tasks = json_store::load_tasks(path)?;
    Ok(select_due_stages(&tasks, now, daily_start))
}

fn notify_due_with_path(
    path: &Path,
    now: PrimitiveDateTime,
    daily_start: i32,
    notifier: &dyn Notifier,
) -> Result<NotificationOutcome, AppError> {
    let mut notified = Vec::new();
    let mut failures = Vec::new();

    for due in due_stages_with_path(path, now, daily_start)? {
        let action = activation_argument(&due.task_id);
        match notifier.notify_with_action(&due, &action) {
            Ok(()) => notified.push(due),
            Err(error) => {
                warn!(
                    "notification for {} stage {} failed: {}",
                    due.task_id, due.stage_id, error
                );
                failures.push(NotificationFailure {
                    task_id: due.task_id,
                    stage_id: due.stage_id,
                    error,
                });
            }
        }
    }

    Ok(NotificationOutcome { notified, failures })
}
