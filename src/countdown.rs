//! Next decision cycle: agents decide Monday, Wednesday and Friday at 00:00 UTC.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub const DECISION_DAYS: [Weekday; 3] = [Weekday::Mon, Weekday::Wed, Weekday::Fri];

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub next_date: DateTime<Utc>,
    pub next_day_name: String,
    pub is_today: bool,
}

pub fn is_decision_day(weekday: Weekday) -> bool {
    DECISION_DAYS.contains(&weekday)
}

/// First decision-cycle instant strictly after `now`. A cycle starting
/// exactly at `now` counts as already passed.
pub fn next_decision_cycle(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    (0..=7u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .find(|candidate| is_decision_day(candidate.weekday()) && *candidate > now)
        .unwrap_or_else(|| today.and_time(NaiveTime::MIN).and_utc())
}

/// Time remaining until `target`, zeroed once the target is reached.
pub fn time_left(target: DateTime<Utc>, now: DateTime<Utc>) -> CountdownTime {
    let remaining = (target - now).num_seconds();
    let next_day_name = decision_day_name(target).to_string();

    if remaining <= 0 {
        return CountdownTime {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
            next_date: target,
            next_day_name,
            is_today: false,
        };
    }

    CountdownTime {
        days: remaining / SECONDS_PER_DAY,
        hours: (remaining / 3_600) % 24,
        minutes: (remaining / 60) % 60,
        seconds: remaining % 60,
        next_date: target,
        next_day_name,
        is_today: remaining < SECONDS_PER_DAY,
    }
}

pub fn countdown(now: DateTime<Utc>) -> CountdownTime {
    time_left(next_decision_cycle(now), now)
}

pub fn decision_day_name(date: DateTime<Utc>) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
