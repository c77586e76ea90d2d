use serde::{Deserialize, Serialize};

pub type StageId = u32;

pub const DEFAULT_STAGE_DURATION_MINUTES: i32 = 180;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    /// Wall-clock minute of the day, 0-1439.
    #[serde(default)]
    pub start_time_minutes: Option<i32>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub status: StageStatus,
}

impl Stage {
    /// Timed stages sit on the time axis; the rest are listed separately.
    pub fn is_timed(&self) -> bool {
        self.start_time_minutes.is_some() || self.duration_minutes.is_some()
    }

    pub fn effective_duration(&self) -> i32 {
        self.duration_minutes.unwrap_or(DEFAULT_STAGE_DURATION_MINUTES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Upcoming,
    Process,
    Done,
    Undone,
}

impl StageStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Process => "process",
            Self::Done => "done",
            Self::Undone => "undone",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "process" | "in_process" | "running" => Some(Self::Process),
            "done" => Some(Self::Done),
            "undone" => Some(Self::Undone),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Undone)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Upcoming, Self::Process)
                | (Self::Process, Self::Done)
                | (Self::Upcoming, Self::Undone)
                | (Self::Process, Self::Undone)
                | (Self::Undone, Self::Upcoming)
        )
    }
}
