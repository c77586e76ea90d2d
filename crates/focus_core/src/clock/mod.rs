//! Logical day arithmetic.
//!
//! A logical day starts `daily_start` minutes after midnight instead of at
//! midnight itself, so work done at 01:00 still belongs to the previous
//! evening. Every function here is pure: "now" is always passed in.

mod follower;

pub use follower::DayFollower;

use crate::error::AppError;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime};

pub const MINUTES_PER_DAY: i32 = 1440;
pub const DEFAULT_DAILY_START_MINUTES: i32 = 360;

const DATE_KEY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Minutes elapsed since wall-clock midnight.
pub fn minute_of_day(instant: PrimitiveDateTime) -> i32 {
    i32::from(instant.hour()) * 60 + i32::from(instant.minute())
}

/// Calendar date of the logical day containing `instant`.
pub fn logical_date(instant: PrimitiveDateTime, daily_start: i32) -> Date {
    let date = instant.date();
    if minute_of_day(instant) < daily_start {
        date.previous_day().unwrap_or(date)
    } else {
        date
    }
}

/// `logical_date` rendered as `YYYY-MM-DD`.
pub fn logical_date_key(instant: PrimitiveDateTime, daily_start: i32) -> String {
    format_date_key(logical_date(instant, daily_start))
}

pub fn format_date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn parse_date_key(value: &str) -> Result<Date, AppError> {
    Date::parse(value.trim(), DATE_KEY_FORMAT)
        .map_err(|_| AppError::invalid_input(format!("date must be YYYY-MM-DD: {}", value.trim())))
}

pub fn start_of_logical_day(instant: PrimitiveDateTime, daily_start: i32) -> PrimitiveDateTime {
    day_start_on(logical_date(instant, daily_start), daily_start)
}

pub fn start_of_logical_day_from_date_string(
    date_key: &str,
    daily_start: i32,
) -> Result<PrimitiveDateTime, AppError> {
    let date = parse_date_key(date_key)?;
    Ok(day_start_on(date, daily_start))
}

fn day_start_on(date: Date, daily_start: i32) -> PrimitiveDateTime {
    date.midnight() + Duration::minutes(i64::from(daily_start))
}

pub fn is_same_logical_day(a: PrimitiveDateTime, b: PrimitiveDateTime, daily_start: i32) -> bool {
    logical_date(a, daily_start) == logical_date(b, daily_start)
}

/// Maps a wall-clock minute onto the timeline axis, where 0 is the daily
/// start and 1439 the minute before the next one.
///
/// Total over every integer: the wall minute is first reduced modulo a day.
pub fn to_display_minutes(wall_minute: i32, daily_start: i32) -> i32 {
    let day = i64::from(MINUTES_PER_DAY);
    let wall = i64::from(wall_minute).rem_euclid(day);
    // Result lies in [0, 1440), which always fits.
    (wall - i64::from(daily_start)).rem_euclid(day) as i32
}

/// Parses `HH:MM` (24h) into a minute of the day.
pub fn parse_clock_time(value: &str) -> Result<i32, AppError> {
    let trimmed = value.trim();
    let (hours, minutes) = trimmed
        .split_once(':')
        .ok_or_else(|| AppError::invalid_input(format!("time must be HH:MM: {trimmed}")))?;

    let hours: i32 = hours
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_input(format!("invalid hour in {trimmed}")))?;
    let minutes: i32 = minutes
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_input(format!("invalid minute in {trimmed}")))?;

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(AppError::invalid_input(format!(
            "time out of range: {trimmed}"
        )));
    }

    Ok(hours * 60 + minutes)
}

pub fn format_clock_time(minute: i32) -> String {
    let minute = minute.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", minute / 60, minute % 60)
}
