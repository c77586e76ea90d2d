//! Lane layout for the timed stages of one task.

mod drag;
mod overlay;
mod packer;

pub use drag::DragSession;
pub use overlay::{StageEdit, StageOverrides, effective_spans};
pub use packer::{LaneMap, StageSpan, intervals_overlap, lane_count, layout_order, pack_lanes};
