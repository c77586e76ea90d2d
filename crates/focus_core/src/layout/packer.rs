use crate::clock::{MINUTES_PER_DAY, to_display_minutes};
use crate::model::StageId;
use log::debug;
use std::collections::BTreeMap;

/// Stage id to lane index (0 is the top row).
pub type LaneMap = BTreeMap<StageId, usize>;

/// A timed stage reduced to what the packer needs, after overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpan {
    pub id: StageId,
    /// Wall-clock minute of the day, 0-1439.
    pub start: i32,
    pub duration: i32,
}

impl StageSpan {
    pub fn new(id: StageId, start: i32, duration: i32) -> Self {
        Self {
            id,
            start: start.rem_euclid(MINUTES_PER_DAY),
            duration,
        }
    }

    pub fn display_start(&self, daily_start: i32) -> i32 {
        to_display_minutes(self.start, daily_start)
    }

    /// Clamped to the end of the logical day; the overnight remainder
    /// belongs to the next day's timeline.
    pub fn display_end(&self, daily_start: i32) -> i32 {
        (self.display_start(daily_start) + self.duration.max(0)).min(MINUTES_PER_DAY)
    }

    /// Starts at or after the daily start, as opposed to the early-morning
    /// tail of the logical day.
    pub fn belongs_to_today(&self, daily_start: i32) -> bool {
        self.start >= daily_start
    }
}

/// Half-open overlap test. An empty interval overlaps nothing.
pub fn intervals_overlap(a: (i32, i32), b: (i32, i32)) -> bool {
    a.0 < a.1 && b.0 < b.1 && b.0 < a.1 && a.0 < b.1
}

/// Spans in the order the packer walks them: today's stages before the
/// early-morning tail, then by raw start, then by id.
pub fn layout_order(spans: &[StageSpan], daily_start: i32) -> Vec<StageSpan> {
    let mut ordered = spans.to_vec();
    ordered.sort_by_key(|span| (!span.belongs_to_today(daily_start), span.start, span.id));
    ordered
}

/// Assigns every span a lane in one pass.
///
/// Each span is compared with its predecessor in layout order only. An
/// overlap pushes it one lane below the predecessor; otherwise it shares the
/// predecessor's lane. Lanes therefore never decrease along the walk, and
/// editing one stage can only move its neighbour.
pub fn pack_lanes(spans: &[StageSpan], daily_start: i32) -> LaneMap {
    let mut lanes = LaneMap::new();
    let mut previous: Option<(usize, i32, i32)> = None;

    for span in layout_order(spans, daily_start) {
        let start = span.display_start(daily_start);
        let end = span.display_end(daily_start);

        let lane = match previous {
            None => 0,
            Some((prev_lane, prev_start, prev_end)) => {
                if intervals_overlap((prev_start, prev_end), (start, end)) {
                    prev_lane + 1
                } else {
                    prev_lane
                }
            }
        };

        lanes.insert(span.id, lane);
        previous = Some((lane, start, end));
    }

    debug!(
        "packed {} stages into {} lanes",
        lanes.len(),
        lane_count(&lanes)
    );
    lanes
}

pub fn lane_count(lanes: &LaneMap) -> usize {
    lanes.values().max().map_or(0, |max| max + 1)
}
