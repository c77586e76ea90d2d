use super::stage::{Stage, StageId};
use crate::clock::MINUTES_PER_DAY;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Logical day the task is planned for, `YYYY-MM-DD`.
    pub logical_date: String,
    pub created_at: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Task {
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }

    pub fn stage_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|stage| stage.id == id)
    }

    pub fn next_stage_id(&self) -> StageId {
        self.stages
            .iter()
            .map(|stage| stage.id)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Where a new stage lands when the caller gives no start: right after
    /// the last stage that has one, otherwise at `now_minute`.
    pub fn default_stage_start(&self, now_minute: i32) -> i32 {
        self.stages
            .iter()
            .rev()
            .find_map(|stage| {
                let start = stage.start_time_minutes?;
                Some((start + stage.effective_duration().max(0)).rem_euclid(MINUTES_PER_DAY))
            })
            .unwrap_or_else(|| now_minute.rem_euclid(MINUTES_PER_DAY))
    }

    pub fn timed_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|stage| stage.is_timed())
    }

    /// Untimed stages in insertion order.
    pub fn untimed_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|stage| !stage.is_timed())
    }
}
