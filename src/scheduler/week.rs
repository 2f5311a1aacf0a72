//! Sunday-anchored week numbering
//!
//! Two numberings coexist and are deliberately kept apart:
//!
//! | Function | Saturday | 1st is a Sunday |
//! |----------|----------|-----------------|
//! | [`service_week_number`] | folded into the next day's week | first Sunday is week 1 |
//! | [`setlist_week_number`] | classified as itself | first Sunday is week 2 |
//!
//! In both, the days before the first Sunday of the month are week 1.
//! Whether the two should agree is an open product question.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::models::YearMonth;

/// First Sunday on or after the 1st of `date`'s month
fn first_sunday_of_month(date: NaiveDate) -> NaiveDate {
    let first = YearMonth::from_date(date).first_day();
    let offset = (7 - first.weekday().num_days_from_sunday()) % 7;
    first + Days::new(u64::from(offset))
}

fn weeks_since(date: NaiveDate, anchor: NaiveDate) -> u32 {
    ((date - anchor).num_days() / 7) as u32
}

/// Week of the service month containing `date`
///
/// Saturday practice belongs to the following Sunday's week, so a Saturday
/// is classified as the next calendar day (which may fall in the next month).
pub fn service_week_number(date: NaiveDate) -> u32 {
    let target = if date.weekday() == Weekday::Sat {
        date.succ_opt().unwrap_or(date)
    } else {
        date
    };

    let first_sunday = first_sunday_of_month(target);
    if target < first_sunday {
        return 1;
    }

    let starts_on_sunday = first_sunday.day() == 1;
    weeks_since(target, first_sunday) + if starts_on_sunday { 1 } else { 2 }
}

/// Week number used to label weekly set-lists
pub fn setlist_week_number(date: NaiveDate) -> u32 {
    let first_sunday = first_sunday_of_month(date);
    if date < first_sunday {
        return 1;
    }
    weeks_since(date, first_sunday) + 2
}

fn days_on(year_month: YearMonth, weekday: Weekday) -> Vec<NaiveDate> {
    year_month
        .days()
        .filter(|d| d.weekday() == weekday)
        .collect()
}

/// Sundays of the month, in order
pub fn sundays_in_month(year_month: YearMonth) -> Vec<NaiveDate> {
    days_on(year_month, Weekday::Sun)
}

/// Saturdays of the month, in order
pub fn saturdays_in_month(year_month: YearMonth) -> Vec<NaiveDate> {
    days_on(year_month, Weekday::Sat)
}
