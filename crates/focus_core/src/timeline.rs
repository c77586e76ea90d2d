//! Day view data: display positions and lanes for each task's stages.

use crate::approval::{DueAction, span_due_action};
use crate::clock::{
    format_date_key, logical_date, minute_of_day, parse_date_key, to_display_minutes,
};
use crate::error::AppError;
use crate::layout::{
    LaneMap, StageOverrides, effective_spans, lane_count, layout_order, pack_lanes,
};
use crate::model::{StageId, StageStatus, Task};
use serde::Serialize;
use std::collections::HashMap;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub stage_id: StageId,
    pub status: StageStatus,
    pub start_time_minutes: i32,
    pub duration_minutes: i32,
    pub display_start: i32,
    pub display_end: i32,
    pub lane: usize,
    pub due: Option<DueAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTimeline {
    pub task_id: String,
    pub title: String,
    /// Timed stages in layout order.
    pub entries: Vec<TimelineEntry>,
    /// Stages without a slot, in insertion order.
    pub untimed: Vec<StageId>,
    pub lane_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTimeline {
    pub logical_date: String,
    pub daily_start_minutes: i32,
    /// Position of the "now" marker; only set when the day is today.
    pub now_display: Option<i32>,
    pub tasks: Vec<TaskTimeline>,
}

/// Lays out one task. `lanes` replaces the packer's answer when the caller
/// holds a frozen snapshot.
pub fn build_task_timeline(
    task: &Task,
    overrides: &StageOverrides,
    lanes: Option<&LaneMap>,
    now_display: Option<i32>,
    daily_start: i32,
) -> TaskTimeline {
    let spans = effective_spans(&task.stages, overrides, daily_start);
    let packed;
    let lanes = match lanes {
        Some(lanes) => lanes,
        None => {
            packed = pack_lanes(&spans, daily_start);
            &packed
        }
    };

    let statuses: HashMap<StageId, StageStatus> = task
        .stages
        .iter()
        .map(|stage| (stage.id, stage.status))
        .collect();

    let entries: Vec<TimelineEntry> = layout_order(&spans, daily_start)
        .into_iter()
        .map(|span| {
            let status = statuses
                .get(&span.id)
                .copied()
                .unwrap_or(StageStatus::Upcoming);
            TimelineEntry {
                stage_id: span.id,
                status,
                start_time_minutes: span.start,
                duration_minutes: span.duration,
                display_start: span.display_start(daily_start),
                display_end: span.display_end(daily_start),
                lane: lanes.get(&span.id).copied().unwrap_or(0),
                due: now_display
                    .and_then(|now| span_due_action(&span, status, now, daily_start)),
            }
        })
        .collect();

    let placed: Vec<StageId> = entries.iter().map(|entry| entry.stage_id).collect();
    let untimed = task
        .untimed_stages()
        .map(|stage| stage.id)
        .filter(|id| !placed.contains(id))
        .collect();

    TaskTimeline {
        task_id: task.id.clone(),
        title: task.title.clone(),
        lane_count: lane_count(lanes).max(usize::from(!entries.is_empty())),
        entries,
        untimed,
    }
}

pub fn build_day_timeline(
    tasks: &[Task],
    date_key: &str,
    now: PrimitiveDateTime,
    daily_start: i32,
) -> Result<DayTimeline, AppError> {
    let date = parse_date_key(date_key)?;
    let logical_date_key = format_date_key(date);

    let now_display = (logical_date(now, daily_start) == date)
        .then(|| to_display_minutes(minute_of_day(now), daily_start));

    let overrides = StageOverrides::new();
    let tasks = tasks
        .iter()
        .filter(|task| task.logical_date == logical_date_key)
        .map(|task| build_task_timeline(task, &overrides, None, now_display, daily_start))
        .collect();

    Ok(DayTimeline {
        logical_date: logical_date_key,
        daily_start_minutes: daily_start,
        now_display,
        tasks,
    })
}
