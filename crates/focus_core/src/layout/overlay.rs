use super::packer::StageSpan;
use crate::model::{Stage, StageId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A start/duration pair that has not reached the store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEdit {
    pub start: i32,
    pub duration: i32,
}

impl StageEdit {
    fn span(self, id: StageId) -> StageSpan {
        StageSpan::new(id, self.start, self.duration)
    }
}

/// Ephemeral edits layered over stored stages at read time.
///
/// Precedence: the live candidate of an ongoing drag, then a pending commit,
/// then the stored value. Resolving never touches the stages themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOverrides {
    live: Option<(StageId, StageEdit)>,
    pending: BTreeMap<StageId, StageEdit>,
}

impl StageOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(mut self, id: StageId, edit: StageEdit) -> Self {
        self.live = Some((id, edit));
        self
    }

    pub fn live(&self) -> Option<(StageId, StageEdit)> {
        self.live
    }

    pub fn clear_live(&mut self) {
        self.live = None;
    }

    pub fn set_pending(&mut self, id: StageId, edit: StageEdit) {
        self.pending.insert(id, edit);
    }

    pub fn pending(&self, id: StageId) -> Option<StageEdit> {
        self.pending.get(&id).copied()
    }

    /// Drops pending edits that the store now reflects, or whose stage is gone.
    pub fn reconcile(&mut self, stored: &[Stage]) {
        self.pending.retain(|id, edit| {
            let Some(stage) = stored.iter().find(|stage| stage.id == *id) else {
                return false;
            };
            let landed = stage.start_time_minutes == Some(edit.start)
                && stage.duration_minutes == Some(edit.duration);
            !landed
        });
    }

    /// Span of one stage from an override or its stored start. `None` when
    /// neither places it; see [`effective_spans`] for duration-only stages.
    pub fn resolve(&self, stage: &Stage) -> Option<StageSpan> {
        if let Some((id, edit)) = self.live
            && id == stage.id
        {
            return Some(edit.span(id));
        }

        if let Some(edit) = self.pending(stage.id) {
            return Some(edit.span(stage.id));
        }

        let start = stage.start_time_minutes?;
        Some(StageSpan::new(stage.id, start, stage.effective_duration()))
    }
}

/// Spans for every timed stage, in stored order.
///
/// A stage with a duration but no start is anchored where `add_stage` would
/// have put it: at the end of the previous placed stage, or at the daily
/// start when it is the first one.
pub fn effective_spans(
    stages: &[Stage],
    overrides: &StageOverrides,
    daily_start: i32,
) -> Vec<StageSpan> {
    let mut spans: Vec<StageSpan> = Vec::with_capacity(stages.len());

    for stage in stages {
        let span = match overrides.resolve(stage) {
            Some(span) => span,
            None if stage.is_timed() => {
                let start = spans
                    .last()
                    .map_or(daily_start, |prev| prev.start + prev.duration.max(0));
                debug!("stage {} has no start; anchored at {}", stage.id, start);
                StageSpan::new(stage.id, start, stage.effective_duration())
            }
            None => continue,
        };
        spans.push(span);
    }

    spans
}
