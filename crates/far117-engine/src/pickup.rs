//! Pickup simulator: can a pilot legally accept an extra trip?
//!
//! The check is advisory. The FDP estimate is block time plus a fixed one-hour
//! buffer ([`PICKUP_DUTY_BUFFER_HOURS`]: 30 minutes before the first block-out
//! and 30 minutes after the last block-in). Real duty periods start at report
//! and end at release, so this is a simplification of the actual boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Far117Error, Result};
use crate::limits::{fdp_limit, FLIGHT_TIME_28D_LIMIT_HOURS, MIN_REST_HOURS};
use crate::roster::{cumulative_flight_time, last_release, Pairing};
use crate::timefmt::{add_hours_to_time, round_tenth};

/// Hours added to block time to estimate the FDP of a pickup.
pub const PICKUP_DUTY_BUFFER_HOURS: f64 = 1.0;

/// A hypothetical trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupInput {
    /// Acclimated local report hour, 0-23.
    pub report_hour: i32,
    pub report_minute: i32,
    pub legs: i32,
    pub block_hours: i32,
    pub block_minutes: i32,
}

impl Default for PickupInput {
    /// A mid-morning three-leg day, the simulator's starting point.
    fn default() -> Self {
        Self {
            report_hour: 7,
            report_minute: 0,
            legs: 3,
            block_hours: 6,
            block_minutes: 0,
        }
    }
}

impl PickupInput {
    pub fn block_time_hours(&self) -> f64 {
        f64::from(self.block_hours) + f64::from(self.block_minutes) / 60.0
    }

    pub fn estimated_fdp_hours(&self) -> f64 {
        self.block_time_hours() + PICKUP_DUTY_BUFFER_HOURS
    }

    /// Estimated local release as `"HH:MM"`, with `" +1d"` past midnight.
    pub fn estimated_release(&self) -> String {
        add_hours_to_time(self.report_hour, self.report_minute, self.estimated_fdp_hours())
    }
}

/// Rolling-history context taken from the pilot's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupContext {
    /// Block hours flown in the trailing 28 days.
    pub flight_time_28d: f64,
    pub last_release: Option<DateTime<Utc>>,
}

impl PickupContext {
    /// Build the context from a roster.
    ///
    /// Returns `None` while the roster has no completed duty, in which case
    /// the simulation runs on the FDP check alone.
    pub fn from_pairings(pairings: &[Pairing], now: DateTime<Utc>) -> Option<Self> {
        let released = last_release(pairings, now)?;
        Some(Self {
            flight_time_28d: cumulative_flight_time(pairings, 28, now),
            last_release: Some(released),
        })
    }
}

/// Outcome of [`simulate_pickup`].
///
/// `None` sub-checks had no data to run on and never block the pickup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupResult {
    pub fdp_hours: f64,
    pub fdp_limit: f64,
    pub fdp_ok: bool,
    pub flight_28d: Option<f64>,
    pub flight_28d_after: Option<f64>,
    pub flight_28d_ok: Option<bool>,
    pub rest_gap_hours: Option<f64>,
    pub rest_gap_ok: Option<bool>,
    pub can_pickup: bool,
    /// In evaluation order: 28-day, rest gap, FDP.
    pub warnings: Vec<String>,
}

/// Decide whether `input` is compliant given the optional roster context.
///
/// The FDP check passes when the estimate is at or below the Table B limit.
/// With context, the trip's block time is added to the 28-day total (100h
/// ceiling) and the time since the last release is compared against the 10h
/// minimum rest.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use far117_engine::pickup::{simulate_pickup, PickupInput};
///
/// let result = simulate_pickup(&PickupInput::default(), None, Utc::now());
/// assert_eq!(result.fdp_hours, 7.0);
/// assert_eq!(result.fdp_limit, 14.0);
/// assert!(result.can_pickup);
/// ```
pub fn simulate_pickup(
    input: &PickupInput,
    context: Option<&PickupContext>,
    now: DateTime<Utc>,
) -> PickupResult {
    let block_hours = input.block_time_hours();
    let estimated_fdp = input.estimated_fdp_hours();
    let limit = fdp_limit(input.report_hour, input.legs);
    let fdp_ok = estimated_fdp <= limit;

    let mut warnings = Vec::new();
    let mut flight_28d = None;
    let mut flight_28d_after = None;
    let mut flight_28d_ok = None;
    let mut rest_gap_hours = None;
    let mut rest_gap_ok = None;

    if let Some(ctx) = context {
        let after = ctx.flight_time_28d + block_hours;
        let ok = after <= FLIGHT_TIME_28D_LIMIT_HOURS;
        if !ok {
            warnings.push(format!(
                "28-day flight time {after:.1}h exceeds {FLIGHT_TIME_28D_LIMIT_HOURS}h limit"
            ));
        }
        flight_28d = Some(ctx.flight_time_28d);
        flight_28d_after = Some(round_tenth(after));
        flight_28d_ok = Some(ok);

        if let Some(released) = ctx.last_release {
            let gap = round_tenth((now - released).num_milliseconds() as f64 / 3_600_000.0);
            let ok = gap >= MIN_REST_HOURS;
            if !ok {
                warnings.push(format!(
                    "Rest gap {gap:.1}h is less than {MIN_REST_HOURS}h minimum"
                ));
            }
            rest_gap_hours = Some(gap);
            rest_gap_ok = Some(ok);
        }
    }

    if !fdp_ok {
        warnings.push(format!("FDP {estimated_fdp:.1}h exceeds {limit}h limit"));
    }

    let can_pickup = fdp_ok && flight_28d_ok != Some(false) && rest_gap_ok != Some(false);

    PickupResult {
        fdp_hours: round_tenth(estimated_fdp),
        fdp_limit: limit,
        fdp_ok,
        flight_28d,
        flight_28d_after,
        flight_28d_ok,
        rest_gap_hours,
        rest_gap_ok,
        can_pickup,
        warnings,
    }
}

/// A named, commonly flown trip shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PickupPreset {
    pub label: &'static str,
    pub report_hour: i32,
    pub report_minute: i32,
    pub legs: i32,
    pub block_hours: i32,
    pub block_minutes: i32,
}

impl PickupPreset {
    const fn new(label: &'static str, report_hour: i32, legs: i32, block_hours: i32) -> Self {
        Self {
            label,
            report_hour,
            report_minute: 0,
            legs,
            block_hours,
            block_minutes: 0,
        }
    }

    /// Look up a preset by label, ignoring ASCII case.
    pub fn find(label: &str) -> Result<&'static PickupPreset> {
        PICKUP_PRESETS
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| Far117Error::InvalidPreset(format!("'{label}'")))
    }
}

pub const PICKUP_PRESETS: [PickupPreset; 4] = [
    PickupPreset::new("Early 2", 5, 2, 4),
    PickupPreset::new("Mid 3", 7, 3, 6),
    PickupPreset::new("Late 3", 14, 3, 5),
    PickupPreset::new("Red-eye", 22, 2, 4),
];

impl From<&PickupPreset> for PickupInput {
    fn from(preset: &PickupPreset) -> Self {
        Self {
            report_hour: preset.report_hour,
            report_minute: preset.report_minute,
            legs: preset.legs,
            block_hours: preset.block_hours,
            block_minutes: preset.block_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{DutyDay, FlightLeg};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()
    }

    fn input(report_hour: i32, legs: i32, block_hours: i32, block_minutes: i32) -> PickupInput {
        PickupInput {
            report_hour,
            report_minute: 0,
            legs,
            block_hours,
            block_minutes,
        }
    }

    fn context(flight_time_28d: f64, rested_hours: Option<i64>) -> PickupContext {
        PickupContext {
            flight_time_28d,
            last_release: rested_hours.map(|h| now() - Duration::hours(h)),
        }
    }

    #[test]
    fn test_pickup_without_history() {
        let result = simulate_pickup(&input(7, 3, 6, 0), None, now());
        assert_eq!(result.fdp_hours, 7.0);
        assert_eq!(result.fdp_limit, 14.0);
        assert!(result.fdp_ok);
        assert!(result.can_pickup);
        assert!(result.warnings.is_empty());
        assert_eq!(result.flight_28d_ok, None);
        assert_eq!(result.rest_gap_ok, None);
    }

    #[test]
    fn test_pickup_fdp_equal_to_limit_passes() {
        let result = simulate_pickup(&input(7, 3, 13, 0), None, now());
        assert_eq!(result.fdp_hours, 14.0);
        assert!(result.fdp_ok);
        assert!(result.can_pickup);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_pickup_fdp_one_minute_over_limit_fails() {
        let result = simulate_pickup(&input(7, 3, 13, 1), None, now());
        assert!(!result.fdp_ok);
        assert!(!result.can_pickup);
        assert_eq!(result.warnings, vec!["FDP 14.0h exceeds 14h limit"]);
    }

    #[test]
    fn test_pickup_with_clean_history() {
        let result = simulate_pickup(&input(7, 3, 6, 0), Some(&context(40.0, Some(30))), now());
        assert_eq!(result.flight_28d, Some(40.0));
        assert_eq!(result.flight_28d_after, Some(46.0));
        assert_eq!(result.flight_28d_ok, Some(true));
        assert_eq!(result.rest_gap_hours, Some(30.0));
        assert_eq!(result.rest_gap_ok, Some(true));
        assert!(result.can_pickup);
    }

    #[test]
    fn test_pickup_28_day_ceiling() {
        let result = simulate_pickup(&input(7, 3, 6, 0), Some(&context(95.0, None)), now());
        assert_eq!(result.flight_28d_after, Some(101.0));
        assert_eq!(result.flight_28d_ok, Some(false));
        assert_eq!(result.rest_gap_ok, None);
        assert!(result.fdp_ok);
        assert!(!result.can_pickup);
        assert_eq!(result.warnings, vec!["28-day flight time 101.0h exceeds 100h limit"]);
    }

    #[test]
    fn test_pickup_28_day_exactly_at_ceiling_passes() {
        let result = simulate_pickup(&input(7, 3, 6, 0), Some(&context(94.0, None)), now());
        assert_eq!(result.flight_28d_ok, Some(true));
        assert!(result.can_pickup);
    }

    #[test]
    fn test_pickup_short_rest() {
        let result = simulate_pickup(&input(7, 3, 6, 0), Some(&context(10.0, Some(8))), now());
        assert_eq!(result.rest_gap_hours, Some(8.0));
        assert_eq!(result.rest_gap_ok, Some(false));
        assert!(!result.can_pickup);
        assert_eq!(result.warnings, vec!["Rest gap 8.0h is less than 10h minimum"]);
    }

    #[test]
    fn test_pickup_rest_gap_rounds_to_tenth() {
        let ctx = PickupContext {
            flight_time_28d: 0.0,
            last_release: Some(now() - Duration::minutes(10 * 60 + 2)),
        };
        let result = simulate_pickup(&input(7, 3, 6, 0), Some(&ctx), now());
        assert_eq!(result.rest_gap_hours, Some(10.0));
        assert_eq!(result.rest_gap_ok, Some(true));
    }

    #[test]
    fn test_pickup_warning_order_when_everything_fails() {
        let result = simulate_pickup(&input(22, 7, 12, 0), Some(&context(95.0, Some(2))), now());
        assert!(!result.can_pickup);
        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings[0].starts_with("28-day"));
        assert!(result.warnings[1].starts_with("Rest gap"));
        assert!(result.warnings[2].starts_with("FDP"));
    }

    #[test]
    fn test_pickup_is_idempotent() {
        let ctx = context(60.0, Some(12));
        let a = simulate_pickup(&input(5, 4, 9, 30), Some(&ctx), now());
        let b = simulate_pickup(&input(5, 4, 9, 30), Some(&ctx), now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_estimated_release() {
        assert_eq!(input(7, 3, 6, 0).estimated_release(), "14:00");
        assert_eq!(input(22, 2, 4, 0).estimated_release(), "03:00 +1d");
    }

    #[test]
    fn test_context_from_pairings() {
        let day = DutyDay {
            flight_date: "2026-03-09".to_string(),
            report_time_utc: Some("2026-03-09T12:00:00Z".to_string()),
            duty_time: Some("10:00".to_string()),
            legs: vec![FlightLeg {
                block_time: Some("6:00".to_string()),
                ..FlightLeg::default()
            }],
            ..DutyDay::default()
        };
        let pairings = vec![Pairing {
            days: vec![day],
            ..Pairing::default()
        }];
        let ctx = PickupContext::from_pairings(&pairings, now()).unwrap();
        assert_eq!(ctx.flight_time_28d, 6.0);
        assert_eq!(
            ctx.last_release,
            Some(Utc.with_ymd_and_hms(2026, 3, 9, 22, 0, 0).unwrap())
        );
        assert!(PickupContext::from_pairings(&[], now()).is_none());
    }

    #[test]
    fn test_presets() {
        let preset = PickupPreset::find("red-eye").unwrap();
        let input = PickupInput::from(preset);
        assert_eq!(input.report_hour, 22);
        assert_eq!(input.legs, 2);
        let result = simulate_pickup(&input, None, now());
        assert_eq!(result.fdp_limit, 11.0);
        assert!(result.can_pickup);

        assert!(PickupPreset::find("Mid 3").is_ok());
        assert!(PickupPreset::find("Graveyard").is_err());
    }

    #[test]
    fn test_all_presets_fit_their_limit() {
        for preset in &PICKUP_PRESETS {
            let result = simulate_pickup(&PickupInput::from(preset), None, now());
            assert!(result.fdp_ok, "{} should fit", preset.label);
        }
    }
}
