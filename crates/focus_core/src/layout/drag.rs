use super::overlay::{StageEdit, StageOverrides, effective_spans};
use super::packer::{LaneMap, pack_lanes};
use crate::error::AppError;
use crate::model::{Stage, StageId};
use log::debug;

/// Layout state for one drag or resize gesture on one task.
///
/// Lanes of every stage are captured when the gesture starts. While it
/// runs, only the dragged stage is re-packed; the others keep their frozen
/// lane so they do not jump as the candidate crosses them. Releasing
/// consumes the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    stage_id: StageId,
    candidate: StageEdit,
    frozen: LaneMap,
    daily_start: i32,
}

impl DragSession {
    pub fn begin(
        stages: &[Stage],
        overrides: &StageOverrides,
        stage_id: StageId,
        daily_start: i32,
    ) -> Result<Self, AppError> {
        if !stages.iter().any(|stage| stage.id == stage_id) {
            return Err(AppError::not_found(format!("stage {stage_id} not found")));
        }

        let spans = effective_spans(stages, overrides, daily_start);
        let span = spans
            .iter()
            .find(|span| span.id == stage_id)
            .copied()
            .ok_or_else(|| AppError::invalid_input(format!("stage {stage_id} has no time slot")))?;

        let frozen = pack_lanes(&spans, daily_start);
        debug!("drag started on stage {stage_id}; froze {} lanes", frozen.len());

        Ok(Self {
            stage_id,
            candidate: StageEdit {
                start: span.start,
                duration: span.duration,
            },
            frozen,
            daily_start,
        })
    }

    pub fn stage_id(&self) -> StageId {
        self.stage_id
    }

    pub fn candidate(&self) -> StageEdit {
        self.candidate
    }

    pub fn frozen_lanes(&self) -> &LaneMap {
        &self.frozen
    }

    pub fn update(&mut self, edit: StageEdit) {
        self.candidate = edit;
    }

    /// `base` with the live candidate layered on top.
    pub fn overrides(&self, base: &StageOverrides) -> StageOverrides {
        base.clone().with_live(self.stage_id, self.candidate)
    }

    pub fn lanes(&self, stages: &[Stage], base: &StageOverrides) -> LaneMap {
        let fresh = pack_lanes(
            &effective_spans(stages, &self.overrides(base), self.daily_start),
            self.daily_start,
        );

        fresh
            .into_iter()
            .map(|(id, lane)| {
                if id == self.stage_id {
                    (id, lane)
                } else {
                    (id, self.frozen.get(&id).copied().unwrap_or(lane))
                }
            })
            .collect()
    }

    /// Ends the gesture. The candidate becomes a pending edit until the
    /// store catches up.
    pub fn release(self, overrides: &mut StageOverrides) -> (StageId, StageEdit) {
        overrides.clear_live();
        overrides.set_pending(self.stage_id, self.candidate);
        debug!(
            "drag released on stage {} at {}+{}",
            self.stage_id, self.candidate.start, self.candidate.duration
        );
        (self.stage_id, self.candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::DragSession;
    use crate::layout::{LaneMap, StageEdit, StageOverrides, effective_spans, pack_lanes};
    use crate::model::{Stage, StageStatus};

    fn stage(id: u32, start: i32, duration: i32) -> Stage {
        Stage {
            id,
            start_time_minutes: Some(start),
            duration_minutes: Some(duration),
            status: StageStatus::Upcoming,
        }
    }

    fn sample() -> Vec<Stage> {
        vec![
            stage(1, 600, 60),
            stage(2, 630, 60),
            stage(3, 800, 60),
            stage(4, 830, 60),
        ]
    }

    fn lanes(pairs: &[(u32, usize)]) -> LaneMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn other_stages_keep_frozen_lanes_while_dragging() {
        let stages = sample();
        let base = StageOverrides::new();
        let mut session = DragSession::begin(&stages, &base, 1, 360).unwrap();
        assert_eq!(
            session.frozen_lanes(),
            &lanes(&[(1, 0), (2, 1), (3, 1), (4, 2)])
        );

        session.update(StageEdit {
            start: 900,
            duration: 60,
        });

        let unfrozen = pack_lanes(&effective_spans(&stages, &session.overrides(&base), 360), 360);
        assert_eq!(unfrozen, lanes(&[(1, 1), (2, 0), (3, 0), (4, 1)]));

        let during = session.lanes(&stages, &base);
        assert_eq!(during, lanes(&[(1, 1), (2, 1), (3, 1), (4, 2)]));
    }

    #[test]
    fn release_turns_candidate_into_pending_edit() {
        let stages = sample();
        let mut overrides = StageOverrides::new();
        let mut session = DragSession::begin(&stages, &overrides, 1, 360).unwrap();
        session.update(StageEdit {
            start: 900,
            duration: 60,
        });

        let (id, edit) = session.release(&mut overrides);
        assert_eq!(id, 1);
        assert_eq!(overrides.live(), None);
        assert_eq!(overrides.pending(1), Some(edit));

        let after = pack_lanes(&effective_spans(&stages, &overrides, 360), 360);
        assert_eq!(after, lanes(&[(1, 1), (2, 0), (3, 0), (4, 1)]));
    }

    #[test]
    fn begin_starts_from_pending_value() {
        let stages = sample();
        let mut overrides = StageOverrides::new();
        overrides.set_pending(
            3,
            StageEdit {
                start: 1000,
                duration: 15,
            },
        );

        let session = DragSession::begin(&stages, &overrides, 3, 360).unwrap();
        assert_eq!(
            session.candidate(),
            StageEdit {
                start: 1000,
                duration: 15
            }
        );
    }

    #[test]
    fn begin_rejects_unknown_and_untimed_stages() {
        let mut stages = sample();
        stages.push(Stage {
            id: 5,
            start_time_minutes: None,
            duration_minutes: None,
            status: StageStatus::Upcoming,
        });
        let base = StageOverrides::new();

        let missing = DragSession::begin(&stages, &base, 42, 360).unwrap_err();
        assert_eq!(missing.code(), "not_found");

        let untimed = DragSession::begin(&stages, &base, 5, 360).unwrap_err();
        assert_eq!(untimed.code(), "invalid_input");
    }

    #[test]
    fn begin_accepts_duration_only_stage() {
        let mut stages = sample();
        stages.push(Stage {
            id: 5,
            start_time_minutes: None,
            duration_minutes: Some(20),
            status: StageStatus::Upcoming,
        });

        let session = DragSession::begin(&stages, &StageOverrides::new(), 5, 360).unwrap();
        assert_eq!(
            session.candidate(),
            StageEdit {
                start: 890,
                duration: 20
            }
        );
        assert_eq!(session.frozen_lanes().get(&5), Some(&2));
    }
}
