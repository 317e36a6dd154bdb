//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the crore project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::CroreError;
use crate::term::{parse_field, Term};

/// How many years the resolver is willing to walk before declaring an
/// expression unsatisfiable (e.g. day 30 of February).
const YEAR_CAP: i64 = 8;
const DAY_CAP: i64 = YEAR_CAP * 366;
const MONTH_CAP: i64 = YEAR_CAP * 12;

/// A parsed 5-field cron expression. The raw field strings are kept for
/// display only.
#[derive(Debug, Clone)]
pub struct Schedule {
    minutes: Vec<Term>,
    hours: Vec<Term>,
    days: Vec<Term>,
    months: Vec<Term>,
    weekdays: Vec<Term>,
    raw: [String; 5],
}

impl Schedule {
    pub fn parse(fields: [&str; 5]) -> Result<Self, CroreError> {
        Ok(Schedule {
            minutes: parse_field(fields[0], 0, 59)?,
            hours: parse_field(fields[1], 0, 23)?,
            days: parse_field(fields[2], 1, 31)?,
            months: parse_field(fields[3], 1, 12)?,
            weekdays: parse_field(fields[4], 0, 6)?,
            raw: fields.map(str::to_string),
        })
    }

    /// Compute the next UTC instant after `now` at which all five fields
    /// match. Works at minute precision; the result always carries second 0.
    pub fn next_fire(&self, now: NaiveDateTime) -> Result<NaiveDateTime, CroreError> {
        let mut date = self.next_date(now.date())?;

        let (minute, hour) = if date == now.date() {
            let (cand_min, min_wrapped) =
                condense(&self.minutes, 0, 59, i64::from(now.minute()), false);
            let (cand_hour, hour_wrapped) =
                condense(&self.hours, 0, 23, i64::from(now.hour()), !min_wrapped);
            if hour_wrapped {
                // Today's matches are exhausted; resolve the date again from
                // tomorrow so the day, month, and weekday fields keep
                // holding.
                let next_day = date
                    .succ_opt()
                    .ok_or_else(|| out_of_calendar(&self.raw))?;
                date = self.next_date(next_day)?;
                (self.first_minute(), self.first_hour())
            } else {
                (cand_min, cand_hour)
            }
        } else {
            (self.first_minute(), self.first_hour())
        };

        let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, 0)
            .ok_or_else(|| out_of_calendar(&self.raw))?;
        Ok(NaiveDateTime::new(date, time))
    }

    /// Resolve the next matching calendar date at or after `today`.
    fn next_date(&self, today: NaiveDate) -> Result<NaiveDate, CroreError> {
        let (cand_day, day_wrapped) = condense(&self.days, 1, 31, i64::from(today.day()), true);
        // A wrapped day pushes the month search past the current month.
        let (cand_month, _) =
            condense(&self.months, 1, 12, i64::from(today.month()), !day_wrapped);

        let reset_month = condense(&self.months, 1, 12, 1, true).0;
        let reset_day = condense(&self.days, 1, 31, 1, true).0;

        let mut year = today.year();
        let mut month = cand_month;
        let mut day = cand_day;
        let mut attempts = 0;
        let mut date = loop {
            attempts += 1;
            if attempts > MONTH_CAP {
                return Err(out_of_calendar(&self.raw));
            }
            match NaiveDate::from_ymd_opt(year, month as u32, day as u32) {
                // Failsafe: a same-year candidate earlier in the calendar
                // than today belongs to next year.
                Some(d) if d.year() == today.year() && d.ordinal() < today.ordinal() => {
                    year += 1;
                    month = reset_month;
                    day = reset_day;
                }
                Some(d) => break d,
                // The candidate day does not exist in the candidate month
                // (Jun 31, Feb 29 outside a leap year): move to the next
                // matching month and restart the day from the field minimum.
                None => {
                    let (next_month, wrapped) = condense(&self.months, 1, 12, month, false);
                    if wrapped {
                        year += 1;
                    }
                    month = next_month;
                    day = reset_day;
                }
            }
        };

        if self.weekday_unrestricted() {
            return Ok(date);
        }

        // Restricted weekdays fall back to bounded day-by-day iteration: the
        // candidate must land on an allowed weekday while still matching the
        // month and day-of-month fields.
        let mut days = 0;
        loop {
            let weekday = i64::from(date.weekday().num_days_from_sunday());
            if self.weekdays.iter().any(|t| t.matches(weekday))
                && self.months.iter().any(|t| t.matches(i64::from(date.month())))
                && self.days.iter().any(|t| t.matches(i64::from(date.day())))
            {
                return Ok(date);
            }
            days += 1;
            if days > DAY_CAP {
                return Err(out_of_calendar(&self.raw));
            }
            date = date.succ_opt().ok_or_else(|| out_of_calendar(&self.raw))?;
        }
    }

    fn weekday_unrestricted(&self) -> bool {
        self.weekdays
            == [Term {
                min: 0,
                max: 6,
                step: 1,
            }]
    }

    fn first_minute(&self) -> i64 {
        condense(&self.minutes, 0, 59, 0, true).0
    }

    fn first_hour(&self) -> i64 {
        condense(&self.hours, 0, 23, 0, true).0
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw.join(" "))
    }
}

fn out_of_calendar(raw: &[String; 5]) -> CroreError {
    CroreError::InvalidExpression(format!("'{}' never matches a calendar date", raw.join(" ")))
}

/// Smallest value in the term's range matching it at or after `v` (strictly
/// after when `include_current` is false). Returns `term.min` when nothing at
/// or after `v` matches, signaling a wrap to the caller.
fn next_applicable(term: &Term, v: i64, include_current: bool) -> i64 {
    let from = if include_current { v } else { v + 1 };
    if from <= term.min {
        return term.min;
    }
    let next = from + (term.step - from.rem_euclid(term.step)) % term.step;
    if next > term.max {
        term.min
    } else {
        next
    }
}

/// Collapse a term list to the least matching value at or after `v`, wrapping
/// to the least term minimum when the field is exhausted. The `wrapped` flag
/// must be propagated into the next-coarser field by the caller.
fn condense(
    terms: &[Term],
    global_min: i64,
    global_max: i64,
    v: i64,
    include_current: bool,
) -> (i64, bool) {
    let floor = terms.iter().map(|t| t.min).min().unwrap_or(global_min);
    let v = if include_current { v } else { v + 1 };
    if v > global_max {
        return (floor, true);
    }

    let mut best: Option<i64> = None;
    for term in terms {
        let w = next_applicable(term, v, true);
        if w >= v && best.map_or(true, |b| w < b) {
            best = Some(w);
        }
    }
    match best {
        Some(w) => (w, false),
        None => (floor, true),
    }
}
