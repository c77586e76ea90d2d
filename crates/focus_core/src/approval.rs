//! Which stages are waiting for the user to start or finish them.
//!
//! The timeline and the notification path both call [`due_action`], so
//! they always agree on what is actionable.

use crate::clock::{logical_date_key, minute_of_day, to_display_minutes};
use crate::layout::{StageOverrides, StageSpan, effective_spans};
use crate::model::{StageId, StageStatus, Task};
use serde::Serialize;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueAction {
    Start,
    Finish,
}

impl DueAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Finish => "finish",
        }
    }
}

/// Comparison is done on the display axis, so a stage at 00:30 is not due
/// at 23:00 of the same logical day.
pub fn due_action(
    status: StageStatus,
    display_start: i32,
    display_end: i32,
    display_now: i32,
) -> Option<DueAction> {
    match status {
        StageStatus::Upcoming if display_start <= display_now => Some(DueAction::Start),
        StageStatus::Process if display_end <= display_now => Some(DueAction::Finish),
        _ => None,
    }
}

pub fn span_due_action(
    span: &StageSpan,
    status: StageStatus,
    display_now: i32,
    daily_start: i32,
) -> Option<DueAction> {
    due_action(
        status,
        span.display_start(daily_start),
        span.display_end(daily_start),
        display_now,
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueStage {
    pub task_id: String,
    pub task_title: String,
    pub stage_id: StageId,
    pub action: DueAction,
    pub start_time_minutes: i32,
    pub duration_minutes: i32,
}

/// Due stages of the tasks planned for the logical day containing `now`.
pub fn due_stages(tasks: &[Task], now: PrimitiveDateTime, daily_start: i32) -> Vec<DueStage> {
    let today = logical_date_key(now, daily_start);
    let display_now = to_display_minutes(minute_of_day(now), daily_start);
    let overrides = StageOverrides::new();

    let mut due = Vec::new();
    for task in tasks.iter().filter(|task| task.logical_date == today) {
        for span in effective_spans(&task.stages, &overrides, daily_start) {
            let Some(stage) = task
                .stage(span.id)
                .filter(|stage| !stage.status.is_terminal())
            else {
                continue;
            };
            if let Some(action) = span_due_action(&span, stage.status, display_now, daily_start) {
                due.push(DueStage {
                    task_id: task.id.clone(),
                    task_title: task.title.clone(),
                    stage_id: stage.id,
                    action,
                    start_time_minutes: span.start,
                    duration_minutes: span.duration,
                });
            }
        }
    }

    due
}

#[cfg(test)]
mod tests {
    use super::{DueAction, due_action, due_stages};
    use crate::model::{Stage, StageStatus, Task};
    use time::macros::datetime;

    fn stage(id: u32, start: Option<i32>, duration: i32, status: StageStatus) -> Stage {
        Stage {
            id,
            start_time_minutes: start,
            duration_minutes: Some(duration),
            status,
        }
    }

    fn task(id: &str, logical_date: &str, stages: Vec<Stage>) -> Task {
        Task {
            id: id.to_string(),
            title: format!("title {id}"),
            logical_date: logical_date.to_string(),
            created_at: "2024-03-02T07:00:00Z".to_string(),
            stages,
        }
    }

    #[test]
    fn upcoming_is_due_once_start_is_reached() {
        assert_eq!(due_action(StageStatus::Upcoming, 100, 160, 99), None);
        assert_eq!(
            due_action(StageStatus::Upcoming, 100, 160, 100),
            Some(DueAction::Start)
        );
    }

    #[test]
    fn process_is_due_once_end_is_reached() {
        assert_eq!(due_action(StageStatus::Process, 100, 160, 159), None);
        assert_eq!(
            due_action(StageStatus::Process, 100, 160, 160),
            Some(DueAction::Finish)
        );
    }

    #[test]
    fn finished_stages_are_never_due() {
        assert_eq!(due_action(StageStatus::Done, 0, 10, 500), None);
        assert_eq!(due_action(StageStatus::Undone, 0, 10, 500), None);
    }

    #[test]
    fn due_stages_filters_by_logical_day_and_display_time() {
        let tasks = vec![
            task(
                "task-1",
                "2024-03-02",
                vec![
                    // 22:00 for 60 minutes, running.
                    stage(1, Some(1320), 60, StageStatus::Process),
                    // 00:30, later in the same logical day.
                    stage(2, Some(30), 30, StageStatus::Upcoming),
                    // 09:00, already passed.
                    stage(3, Some(540), 30, StageStatus::Upcoming),
                    // No start: follows stage 3, so 09:30.
                    stage(4, None, 30, StageStatus::Upcoming),
                    stage(5, Some(600), 30, StageStatus::Done),
                ],
            ),
            task(
                "task-2",
                "2024-03-01",
                vec![stage(1, Some(540), 30, StageStatus::Upcoming)],
            ),
        ];

        let due = due_stages(&tasks, datetime!(2024-03-02 23:15), 360);
        let summary: Vec<(String, u32, DueAction)> = due
            .into_iter()
            .map(|item| (item.task_id, item.stage_id, item.action))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("task-1".to_string(), 1, DueAction::Finish),
                ("task-1".to_string(), 3, DueAction::Start),
                ("task-1".to_string(), 4, DueAction::Start),
            ]
        );
    }

    #[test]
    fn early_morning_now_belongs_to_previous_logical_day() {
        let tasks = vec![task(
            "task-1",
            "2024-03-01",
            vec![stage(1, Some(30), 30, StageStatus::Upcoming)],
        )];

        let due = due_stages(&tasks, datetime!(2024-03-02 00:45), 360);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].action, DueAction::Start);
    }
}
