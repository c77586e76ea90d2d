use crate::clock::{MINUTES_PER_DAY, parse_date_key};
use crate::config::app_dir;
use crate::error::AppError;
use crate::model::Task;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "tasks.json";
const STORE_ENV_VAR: &str = "FOCUS_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(STORE_FILE_NAME))
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    validate_tasks(&stored.tasks)?;
    Ok(stored.tasks)
}

fn validate_tasks(tasks: &[Task]) -> Result<(), AppError> {
    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!("duplicate task id {}", task.id)));
        }

        parse_date_key(&task.logical_date).map_err(|_| {
            AppError::invalid_data(format!("task {} has invalid logical_date", task.id))
        })?;

        let mut stage_ids = HashSet::new();
        for stage in &task.stages {
            if !stage_ids.insert(stage.id) {
                return Err(AppError::invalid_data(format!(
                    "task {} has duplicate stage id {}",
                    task.id, stage.id
                )));
            }

            if let Some(start) = stage.start_time_minutes
                && !(0..MINUTES_PER_DAY).contains(&start)
            {
                return Err(AppError::invalid_data(format!(
                    "task {} stage {} start_time_minutes out of range",
                    task.id, stage.id
                )));
            }
        }
    }

    Ok(())
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    info!("saved {} tasks to {}", tasks.len(), path.display());
    Ok(())
}
