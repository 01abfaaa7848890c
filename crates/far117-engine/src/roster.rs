//! Roster records from the schedule store, and the aggregations over them.
//!
//! Records are loaded leniently: every time-bearing field stays a raw string
//! and is parsed on use, so one malformed leg never aborts a whole roster.
//! Malformed values contribute nothing (zero minutes, skipped day) instead of
//! raising.
//!
//! All functions take the "now" instant explicitly.

use chrono::{DateTime, Duration, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Far117Error, Result};
use crate::timefmt::{optional_minutes, parse_hhmm_minutes, parse_utc_timestamp, round_tenth};

/// Kind of roster entry. Only [`EventType::Pairing`] entries carry duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Pairing,
    /// Non-jeopardy move / reserve marker.
    Njm,
    Mov,
    Vac,
    Training,
    #[serde(other)]
    Other,
}

/// One flight segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLeg {
    pub leg_number: u32,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub depart_utc: Option<String>,
    pub arrive_utc: Option<String>,
    /// Block time as `"H:MM"`.
    pub block_time: Option<String>,
    pub is_deadhead: bool,
    pub flight_date: String,
}

impl FlightLeg {
    /// Block minutes, or 0 when missing or malformed.
    pub fn block_minutes(&self) -> i64 {
        optional_minutes(self.block_time.as_deref())
    }
}

/// One duty day of a pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyDay {
    /// `YYYY-MM-DD`.
    pub flight_date: String,
    /// Local report time as shown on the roster (e.g. `"05:45"`).
    pub report_time: Option<String>,
    pub report_time_utc: Option<String>,
    pub report_tz: Option<String>,
    pub legs: Vec<FlightLeg>,
    pub day_block: Option<String>,
    pub day_credit: Option<String>,
    /// Duty length as `"H:MM"`.
    pub duty_time: Option<String>,
}

impl DutyDay {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.flight_date.trim(), "%Y-%m-%d").ok()
    }

    pub fn report_utc(&self) -> Option<DateTime<Utc>> {
        self.report_time_utc.as_deref().and_then(parse_utc_timestamp)
    }

    pub fn duty_minutes(&self) -> i64 {
        optional_minutes(self.duty_time.as_deref())
    }

    /// Report time plus duty time, when both are known, duty is positive and
    /// the sum is a representable instant.
    pub fn release_utc(&self) -> Option<DateTime<Utc>> {
        let report = self.report_utc()?;
        let duty = self.duty_minutes();
        if duty <= 0 {
            return None;
        }
        TimeDelta::try_minutes(duty).and_then(|d| report.checked_add_signed(d))
    }

    pub fn block_minutes(&self) -> i64 {
        self.legs
            .iter()
            .map(FlightLeg::block_minutes)
            .fold(0, i64::saturating_add)
    }
}

/// A trip (or other roster event) spanning one or more days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pairing {
    pub pairing_id: String,
    pub summary: String,
    pub event_type: EventType,
    pub start_utc: Option<String>,
    pub end_utc: Option<String>,
    pub days: Vec<DutyDay>,
}

impl Pairing {
    pub fn is_duty(&self) -> bool {
        self.event_type == EventType::Pairing
    }
}

/// A user's schedule as served by the schedule store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub pairings: Vec<Pairing>,
    #[serde(default)]
    pub total_flights: Option<u32>,
    #[serde(default)]
    pub total_block: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleDocument {
    Wrapped(Schedule),
    Bare(Vec<Pairing>),
}

impl Schedule {
    /// Parse a schedule document: either `{"pairings": [...]}` or a bare
    /// array of pairings.
    ///
    /// # Errors
    ///
    /// Returns [`Far117Error::InvalidSchedule`] if the JSON matches neither
    /// shape.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: ScheduleDocument = serde_json::from_str(json)
            .map_err(|e| Far117Error::InvalidSchedule(e.to_string()))?;
        Ok(match doc {
            ScheduleDocument::Wrapped(schedule) => schedule,
            ScheduleDocument::Bare(pairings) => Self {
                pairings,
                ..Self::default()
            },
        })
    }
}

/// Every day of every duty-bearing pairing, in roster order.
pub fn duty_days(pairings: &[Pairing]) -> impl Iterator<Item = &DutyDay> {
    pairings
        .iter()
        .filter(|p| p.is_duty())
        .flat_map(|p| p.days.iter())
}

/// Total block hours flown on days within `[now - window_days, now]`.
///
/// A day counts by its flight date at midnight UTC. Legs with a missing or
/// malformed block time add nothing; days with a malformed date are skipped.
/// The result is rounded to a tenth of an hour.
pub fn cumulative_flight_time(pairings: &[Pairing], window_days: i64, now: DateTime<Utc>) -> f64 {
    let cutoff = now - Duration::days(window_days);
    let total_minutes: i64 = duty_days(pairings)
        .filter(|day| {
            day.date()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
                .is_some_and(|start| start >= cutoff && start <= now)
        })
        .map(DutyDay::block_minutes)
        .fold(0, i64::saturating_add);
    round_tenth(total_minutes as f64 / 60.0)
}

/// The most recent duty release at or before `now`.
///
/// Days without a report timestamp or a positive duty time are ignored.
pub fn last_release(pairings: &[Pairing], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    duty_days(pairings)
        .filter_map(DutyDay::release_utc)
        .filter(|release| *release <= now)
        .max()
}

/// Today's duty as seen from the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutySnapshot {
    pub flight_date: NaiveDate,
    /// Local report time as printed on the roster.
    pub report_time: Option<String>,
    pub report_utc: Option<DateTime<Utc>>,
    pub duty_minutes: i64,
    pub release_utc: Option<DateTime<Utc>>,
    /// Release as `"HH:MMZ"`.
    pub release_time: Option<String>,
    /// Operating (non-deadhead) segments.
    pub legs: usize,
    pub block_hours: f64,
    pub on_duty: bool,
}

/// Find the first duty day dated today (UTC) that has at least one leg.
pub fn today_duty(pairings: &[Pairing], now: DateTime<Utc>) -> Option<DutySnapshot> {
    let today = now.date_naive();
    let day = duty_days(pairings).find(|d| d.date() == Some(today) && !d.legs.is_empty())?;

    let report_utc = day.report_utc();
    let release_utc = day.release_utc();
    let on_duty = match (report_utc, release_utc) {
        (Some(report), Some(release)) => report <= now && now <= release,
        _ => false,
    };

    Some(DutySnapshot {
        flight_date: today,
        report_time: day.report_time.clone(),
        report_utc,
        duty_minutes: day.duty_minutes(),
        release_utc,
        release_time: release_utc.map(|r| r.format("%H:%MZ").to_string()),
        legs: day.legs.iter().filter(|l| !l.is_deadhead).count(),
        block_hours: round_tenth(day.block_minutes() as f64 / 60.0),
        on_duty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // Tuesday, March 10 2026, 15:00 UTC
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()
    }

    fn leg(block: &str) -> FlightLeg {
        FlightLeg {
            block_time: Some(block.to_string()),
            ..FlightLeg::default()
        }
    }

    fn day(date: &str, legs: Vec<FlightLeg>) -> DutyDay {
        DutyDay {
            flight_date: date.to_string(),
            legs,
            ..DutyDay::default()
        }
    }

    fn duty(date: &str, report_utc: &str, duty_time: &str) -> DutyDay {
        DutyDay {
            flight_date: date.to_string(),
            report_time_utc: Some(report_utc.to_string()),
            duty_time: Some(duty_time.to_string()),
            legs: vec![leg("2:00")],
            ..DutyDay::default()
        }
    }

    fn pairing(days: Vec<DutyDay>) -> Pairing {
        Pairing {
            pairing_id: "P1".to_string(),
            days,
            ..Pairing::default()
        }
    }

    // ── cumulative_flight_time ──────────────────────────────────────────

    #[test]
    fn test_cumulative_empty_roster() {
        assert_eq!(cumulative_flight_time(&[], 28, now()), 0.0);
    }

    #[test]
    fn test_cumulative_window_edges() {
        let pairings = vec![pairing(vec![
            day("2026-02-10", vec![leg("5:00")]), // 28 days back, before cutoff
            day("2026-03-09", vec![leg("6:00")]),
        ])];
        assert_eq!(cumulative_flight_time(&pairings, 28, now()), 6.0);
    }

    #[test]
    fn test_cumulative_excludes_future_days() {
        let pairings = vec![pairing(vec![
            day("2026-03-10", vec![leg("1:30")]),
            day("2026-03-11", vec![leg("4:00")]),
        ])];
        assert_eq!(cumulative_flight_time(&pairings, 28, now()), 1.5);
    }

    #[test]
    fn test_cumulative_malformed_block_counts_zero() {
        let bad = leg("n/a");
        let missing = FlightLeg::default();
        let pairings = vec![pairing(vec![day(
            "2026-03-08",
            vec![bad, missing, leg("2:15")],
        )])];
        assert_eq!(cumulative_flight_time(&pairings, 28, now()), 2.3);
    }

    #[test]
    fn test_cumulative_skips_malformed_date_and_non_duty() {
        let mut vacation = pairing(vec![day("2026-03-08", vec![leg("8:00")])]);
        vacation.event_type = EventType::Vac;
        let pairings = vec![
            vacation,
            pairing(vec![day("not-a-date", vec![leg("3:00")])]),
        ];
        assert_eq!(cumulative_flight_time(&pairings, 28, now()), 0.0);
    }

    #[test]
    fn test_cumulative_is_idempotent() {
        let pairings = vec![pairing(vec![day("2026-03-01", vec![leg("3:20")])])];
        let first = cumulative_flight_time(&pairings, 28, now());
        let second = cumulative_flight_time(&pairings, 28, now());
        assert_eq!(first, second);
        assert_eq!(first, 3.3);
    }

    // ── last_release ────────────────────────────────────────────────────

    #[test]
    fn test_last_release_picks_latest_past() {
        let pairings = vec![pairing(vec![
            duty("2026-03-08", "2026-03-08T12:00:00Z", "8:00"),
            duty("2026-03-09", "2026-03-09T13:00:00Z", "9:30"),
            duty("2026-03-11", "2026-03-11T12:00:00Z", "8:00"),
        ])];
        let expected = Utc.with_ymd_and_hms(2026, 3, 9, 22, 30, 0).unwrap();
        assert_eq!(last_release(&pairings, now()), Some(expected));
    }

    #[test]
    fn test_last_release_ignores_release_after_now() {
        // Reports at 10:00, releases at 16:00, after now (15:00).
        let pairings = vec![pairing(vec![duty(
            "2026-03-10",
            "2026-03-10T10:00:00Z",
            "6:00",
        )])];
        assert_eq!(last_release(&pairings, now()), None);
    }

    #[test]
    fn test_last_release_skips_incomplete_days() {
        let mut no_report = duty("2026-03-08", "x", "8:00");
        no_report.report_time_utc = None;
        let zero_duty = duty("2026-03-07", "2026-03-07T12:00:00Z", "0:00");
        let mut no_duty = duty("2026-03-06", "2026-03-06T12:00:00Z", "8:00");
        no_duty.duty_time = None;
        let pairings = vec![pairing(vec![no_report, zero_duty, no_duty])];
        assert_eq!(last_release(&pairings, now()), None);
    }

    #[test]
    fn test_last_release_ignores_overflowing_duty_time() {
        let huge = duty("2026-03-08", "2026-03-08T12:00:00Z", "3000000000:00");
        let sane = duty("2026-03-09", "2026-03-09T12:00:00Z", "8:00");
        assert_eq!(huge.release_utc(), None);
        let pairings = vec![pairing(vec![huge, sane])];
        let expected = Utc.with_ymd_and_hms(2026, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(last_release(&pairings, now()), Some(expected));
    }

    #[test]
    fn test_cumulative_oversized_block_times_do_not_panic() {
        let pairings = vec![pairing(vec![day(
            "2026-03-09",
            vec![
                leg("153722867280912931:00"),
                leg("0:9223372036854775807"),
                leg("0:9223372036854775807"),
            ],
        )])];
        let hours = cumulative_flight_time(&pairings, 28, now());
        assert!(hours.is_finite() && hours > 0.0);
    }

    // ── today_duty ──────────────────────────────────────────────────────

    #[test]
    fn test_today_duty_on_duty() {
        let mut today = duty("2026-03-10", "2026-03-10T12:00:00Z", "8:15");
        today.report_time = Some("05:00".to_string());
        let mut deadhead = leg("1:10");
        deadhead.is_deadhead = true;
        today.legs = vec![leg("2:00"), leg("1:45"), deadhead];
        let snapshot = today_duty(&[pairing(vec![today])], now()).unwrap();

        assert!(snapshot.on_duty);
        assert_eq!(snapshot.legs, 2);
        assert_eq!(snapshot.block_hours, 4.9);
        assert_eq!(snapshot.duty_minutes, 495);
        assert_eq!(snapshot.release_time.as_deref(), Some("20:15Z"));
        assert_eq!(snapshot.report_time.as_deref(), Some("05:00"));
    }

    #[test]
    fn test_today_duty_without_duty_time() {
        let mut today = duty("2026-03-10", "2026-03-10T12:00:00Z", "8:00");
        today.duty_time = None;
        let snapshot = today_duty(&[pairing(vec![today])], now()).unwrap();
        assert!(!snapshot.on_duty);
        assert_eq!(snapshot.release_utc, None);
        assert_eq!(snapshot.release_time, None);
    }

    #[test]
    fn test_today_duty_skips_days_without_legs() {
        let mut empty = duty("2026-03-10", "2026-03-10T12:00:00Z", "8:00");
        empty.legs.clear();
        assert_eq!(today_duty(&[pairing(vec![empty])], now()), None);
        assert_eq!(today_duty(&[], now()), None);
    }

    // ── Schedule parsing ────────────────────────────────────────────────

    #[test]
    fn test_schedule_wrapped_document() {
        let json = r#"{
            "pairings": [{
                "pairing_id": "T1234",
                "summary": "3-day",
                "event_type": "pairing",
                "days": [{
                    "flight_date": "2026-03-09",
                    "duty_time": "9:30",
                    "legs": [{"flight_number": "SK100", "block_time": "2:05", "is_deadhead": false}]
                }]
            }],
            "total_flights": 1
        }"#;
        let schedule = Schedule::from_json(json).unwrap();
        assert_eq!(schedule.pairings.len(), 1);
        assert_eq!(schedule.total_flights, Some(1));
        assert_eq!(schedule.pairings[0].days[0].legs[0].block_minutes(), 125);
    }

    #[test]
    fn test_schedule_bare_array_and_unknown_event_type() {
        let json = r#"[{"pairing_id": "X", "event_type": "sick", "days": []}]"#;
        let schedule = Schedule::from_json(json).unwrap();
        assert_eq!(schedule.pairings[0].event_type, EventType::Other);
        assert!(!schedule.pairings[0].is_duty());
    }

    #[test]
    fn test_schedule_rejects_non_schedule_json() {
        let err = Schedule::from_json("42").unwrap_err().to_string();
        assert!(err.contains("Invalid schedule"), "got: {err}");
        assert!(Schedule::from_json("{not json").is_err());
    }
}
