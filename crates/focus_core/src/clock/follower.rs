use super::logical_date;
use time::{Date, PrimitiveDateTime};

/// Tracks which logical day a live view is showing.
///
/// The view follows "today" across a rollover only while it was already
/// showing today on the previous tick. A day picked by the user is never
/// replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFollower {
    selected: Date,
    showing_today: bool,
}

impl DayFollower {
    pub fn new(now: PrimitiveDateTime, daily_start: i32) -> Self {
        Self {
            selected: logical_date(now, daily_start),
            showing_today: true,
        }
    }

    pub fn selected(&self) -> Date {
        self.selected
    }

    pub fn is_showing_today(&self) -> bool {
        self.showing_today
    }

    pub fn select(&mut self, date: Date, now: PrimitiveDateTime, daily_start: i32) {
        self.selected = date;
        self.showing_today = date == logical_date(now, daily_start);
    }

    /// Re-evaluates the rollover rule. Returns the new day when the view
    /// advanced on this tick.
    pub fn tick(&mut self, now: PrimitiveDateTime, daily_start: i32) -> Option<Date> {
        let today = logical_date(now, daily_start);
        let was_showing_today = self.showing_today;

        if was_showing_today && today > self.selected {
            self.selected = today;
            self.showing_today = true;
            return Some(today);
        }

        self.showing_today = self.selected == today;
        None
    }
}
