use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use crore::error::CroreError;
use crore::schedule::Schedule;
use crore::term::parse_field;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDateTime::new(
        NaiveDate::from_ymd_opt(y, mo, d).unwrap(),
        NaiveTime::from_hms_opt(h, mi, s).unwrap(),
    )
}

fn schedule(expr: &str) -> Schedule {
    let fields: Vec<&str> = expr.split(' ').collect();
    Schedule::parse([fields[0], fields[1], fields[2], fields[3], fields[4]]).unwrap()
}

#[test]
fn every_minute_advances_to_the_next_minute() {
    let s = schedule("* * * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 0, 30)).unwrap(),
        at(2025, 6, 1, 12, 1, 0)
    );
}

#[test]
fn step_minutes() {
    let s = schedule("*/5 * * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 2, 0)).unwrap(),
        at(2025, 6, 1, 12, 5, 0)
    );
}

#[test]
fn yearly_job_rolls_to_next_year() {
    let s = schedule("0 0 1 1 *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 0, 0, 0)).unwrap(),
        at(2026, 1, 1, 0, 0, 0)
    );
}

#[test]
fn weekday_match_on_the_same_day() {
    // 2025-06-01 is a Sunday.
    let s = schedule("30 2 * * 0");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 0, 0, 0)).unwrap(),
        at(2025, 6, 1, 2, 30, 0)
    );
}

#[test]
fn leap_day_job_waits_for_a_leap_year() {
    let s = schedule("0 0 29 2 *");
    assert_eq!(
        s.next_fire(at(2025, 1, 1, 0, 0, 0)).unwrap(),
        at(2028, 2, 29, 0, 0, 0)
    );
}

#[test]
fn weekday_iteration_walks_to_the_next_monday() {
    // 2025-06-03 is a Tuesday; the next Monday is 2025-06-09.
    let s = schedule("0 0 * * 1");
    assert_eq!(
        s.next_fire(at(2025, 6, 3, 15, 0, 0)).unwrap(),
        at(2025, 6, 9, 0, 0, 0)
    );
}

#[test]
fn exhausted_day_on_a_weekly_job_waits_a_full_week() {
    // 2025-06-02 is a Monday and 09:00 has already passed, so the next fire
    // is the following Monday, not just the next day.
    let s = schedule("0 9 * * 1");
    assert_eq!(
        s.next_fire(at(2025, 6, 2, 10, 0, 0)).unwrap(),
        at(2025, 6, 9, 9, 0, 0)
    );
}

#[test]
fn exhausted_day_on_a_monthly_job_waits_a_full_month() {
    // Rescheduling right after the monthly firing must land on the first of
    // the next month, not on July 2nd.
    let s = schedule("30 2 1 * *");
    assert_eq!(
        s.next_fire(at(2025, 7, 1, 2, 30, 5)).unwrap(),
        at(2025, 8, 1, 2, 30, 0)
    );
}

#[test]
fn reschedule_at_the_firing_minute_keeps_the_weekday() {
    // 2025-06-04 is a Wednesday; resolving from the firing minute itself
    // walks to the next Wednesday.
    let s = schedule("0 0 * * 3");
    assert_eq!(
        s.next_fire(at(2025, 6, 4, 0, 0, 30)).unwrap(),
        at(2025, 6, 11, 0, 0, 0)
    );
}

#[test]
fn day_wrap_pushes_the_month_forward() {
    // Day 5 has passed in June, so the candidate is July 5, not June 5.
    let s = schedule("0 0 5 * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 15, 0, 0, 0)).unwrap(),
        at(2025, 7, 5, 0, 0, 0)
    );
}

#[test]
fn later_month_with_earlier_day() {
    let s = schedule("0 0 5 7 *");
    assert_eq!(
        s.next_fire(at(2025, 6, 15, 0, 0, 0)).unwrap(),
        at(2025, 7, 5, 0, 0, 0)
    );
}

#[test]
fn minute_wrap_carries_into_the_hour() {
    let s = schedule("5 * * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 10, 0)).unwrap(),
        at(2025, 6, 1, 13, 5, 0)
    );
}

#[test]
fn hour_wrap_carries_into_the_day() {
    let s = schedule("59 23 * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 23, 59, 30)).unwrap(),
        at(2025, 6, 2, 23, 59, 0)
    );
}

#[test]
fn stepped_minute_is_anchored_to_absolute_multiples() {
    // 1/5 matches 1, 5, 10, ... — not 1, 6, 11.
    let s = schedule("1/5 * * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 1, 30)).unwrap(),
        at(2025, 6, 1, 12, 5, 0)
    );
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 58, 0)).unwrap(),
        at(2025, 6, 1, 13, 1, 0)
    );
}

#[test]
fn resolution_is_stable_while_waiting() {
    // Every instant between the reference and the firing minute resolves to
    // the same fire time.
    let s = schedule("*/15 2 * * *");
    let fire = s.next_fire(at(2025, 6, 1, 1, 50, 0)).unwrap();
    assert_eq!(fire, at(2025, 6, 1, 2, 0, 0));
    for minute in 51..60 {
        assert_eq!(s.next_fire(at(2025, 6, 1, 1, minute, 0)).unwrap(), fire);
    }
    assert_eq!(s.next_fire(at(2025, 6, 1, 1, 59, 59)).unwrap(), fire);
}

#[test]
fn firing_always_moves_strictly_forward() {
    for expr in ["* * * * *", "*/7 */3 * * *", "30 2 1 * *", "0 0 * * 3"] {
        let s = schedule(expr);
        let mut now = at(2025, 6, 1, 12, 0, 30);
        for _ in 0..50 {
            let next = s.next_fire(now).unwrap();
            assert!(next > now, "{expr}: {next} not after {now}");
            now = next;
        }
    }
}

#[test]
fn widening_one_field_cannot_unmatch_the_others() {
    // Matrix of single-field widenings around a fully pinned expression: the
    // resolved instant must still match every untouched field.
    let base = ["30", "2", "15", "6", "*"];
    let ranges = [(0, 59), (0, 23), (1, 31), (1, 12), (0, 6)];
    for widened in 0..4 {
        let mut fields = base;
        fields[widened] = "*";
        let s = Schedule::parse(fields).unwrap();
        let fire = s.next_fire(at(2025, 6, 1, 0, 0, 0)).unwrap();

        use chrono::{Datelike, Timelike};
        let components = [
            i64::from(fire.minute()),
            i64::from(fire.hour()),
            i64::from(fire.day()),
            i64::from(fire.month()),
        ];
        for (i, field) in base.iter().enumerate().take(4) {
            if i == widened {
                continue;
            }
            let terms = parse_field(field, ranges[i].0, ranges[i].1).unwrap();
            assert!(
                terms.iter().any(|t| t.matches(components[i])),
                "widening field {widened} broke field {i}"
            );
        }
    }
}

#[test]
fn short_months_are_skipped() {
    // June has no 31st; the next candidate is July 31.
    let s = schedule("0 0 31 * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 15, 0, 0, 0)).unwrap(),
        at(2025, 7, 31, 0, 0, 0)
    );
}

#[test]
fn year_end_wraps_into_january() {
    let s = schedule("0 0 5 * *");
    assert_eq!(
        s.next_fire(at(2025, 12, 15, 0, 0, 0)).unwrap(),
        at(2026, 1, 5, 0, 0, 0)
    );
}

#[test]
fn impossible_dates_are_rejected() {
    let s = schedule("0 0 30 2 *");
    assert!(matches!(
        s.next_fire(at(2025, 1, 1, 0, 0, 0)),
        Err(CroreError::InvalidExpression(_))
    ));

    let with_weekday = schedule("0 0 30 2 1");
    assert!(matches!(
        with_weekday.next_fire(at(2025, 1, 1, 0, 0, 0)),
        Err(CroreError::InvalidExpression(_))
    ));
}

#[test]
fn comma_lists_pick_the_nearest_candidate() {
    let s = schedule("15,45 * * * *");
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 20, 0)).unwrap(),
        at(2025, 6, 1, 12, 45, 0)
    );
    assert_eq!(
        s.next_fire(at(2025, 6, 1, 12, 45, 0)).unwrap(),
        at(2025, 6, 1, 13, 15, 0)
    );
}

#[test]
fn display_round_trips_the_raw_fields() {
    let s = schedule("*/5 2-4 1,15 * 0-6/2");
    assert_eq!(s.to_string(), "*/5 2-4 1,15 * 0-6/2");
}
