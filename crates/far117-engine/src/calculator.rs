//! Duty-period status: where a pilot stands right now under FAR 117.
//!
//! Roster days are first converted into concrete [`DutyPeriod`]s (report and
//! release instants plus the legs flown). [`Far117Calculator`] then answers
//! questions about them relative to an injected "now":
//!
//! - the FDP of the current (or next) duty against its Table B limit
//! - 28-day and 365-day cumulative flight time
//! - rest since the last release and the weekly 56-hour rest
//! - the effect of a delay on the current duty
//!
//! Not covered: augmented crews, split duty, and the paperwork side of
//! unforeseen-circumstance extensions.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Far117Error, Result};
use crate::limits::{
    fdp_limit, fdp_status, FdpStatus, FLIGHT_TIME_28D_LIMIT_HOURS, FLIGHT_TIME_365D_LIMIT_HOURS,
    MAX_EXTENSION_HOURS, MIN_REST_HOURS, WEEKLY_REST_HOURS,
};
use crate::roster::Pairing;
use crate::timefmt::{parse_utc_timestamp, round_tenth};

/// Release assumed after the last block-in when a day has no duty time.
const RELEASE_AFTER_LAST_ARRIVAL_MINUTES: i64 = 30;

/// 28-day flight time above which a heads-up warning is raised.
const FLIGHT_TIME_28D_WARNING_HOURS: f64 = 90.0;

const WEEKLY_REST_WINDOW_HOURS: i64 = 168;

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

/// A leg with resolved UTC times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegRecord {
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub depart_utc: DateTime<Utc>,
    pub arrive_utc: DateTime<Utc>,
    pub block_hours: f64,
    pub flight_date: String,
}

/// One flight duty period, report to release.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DutyPeriod {
    pub report_utc: DateTime<Utc>,
    pub release_utc: DateTime<Utc>,
    pub legs: Vec<LegRecord>,
    pub flight_date: String,
}

impl DutyPeriod {
    pub fn fdp_hours(&self) -> f64 {
        hours_between(self.report_utc, self.release_utc)
    }

    pub fn num_legs(&self) -> usize {
        self.legs.len()
    }

    pub fn total_block_hours(&self) -> f64 {
        self.legs.iter().map(|l| l.block_hours).sum()
    }

    fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.report_utc <= instant && instant <= self.release_utc
    }
}

/// Rest between two consecutive duty periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestPeriod {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl RestPeriod {
    pub fn duration_hours(&self) -> f64 {
        hours_between(self.start_utc, self.end_utc)
    }
}

/// Convert roster pairings into duty periods sorted by report time.
///
/// Per duty day:
/// - days without a parseable report timestamp are skipped
/// - release is report + duty time; without a duty time it falls back to the
///   last leg's arrival plus 30 minutes; days with neither are skipped
/// - legs missing a departure or arrival timestamp are dropped
/// - a release at or before report is taken to be on the next day
pub fn duty_periods_from_pairings(pairings: &[Pairing]) -> Vec<DutyPeriod> {
    let mut periods = Vec::new();

    for pairing in pairings.iter().filter(|p| p.is_duty()) {
        for day in &pairing.days {
            let Some(report_utc) = day.report_utc() else {
                tracing::trace!(
                    pairing = %pairing.pairing_id,
                    date = %day.flight_date,
                    "skipping day without report time"
                );
                continue;
            };

            let legs: Vec<LegRecord> = day
                .legs
                .iter()
                .filter_map(|leg| {
                    let depart_utc = leg.depart_utc.as_deref().and_then(parse_utc_timestamp)?;
                    let arrive_utc = leg.arrive_utc.as_deref().and_then(parse_utc_timestamp)?;
                    Some(LegRecord {
                        flight_number: leg.flight_number.clone(),
                        origin: leg.origin.clone(),
                        destination: leg.destination.clone(),
                        depart_utc,
                        arrive_utc,
                        block_hours: leg.block_minutes() as f64 / 60.0,
                        flight_date: day.flight_date.clone(),
                    })
                })
                .collect();

            let release = day.release_utc().or_else(|| {
                legs.last().and_then(|l| {
                    l.arrive_utc
                        .checked_add_signed(Duration::minutes(RELEASE_AFTER_LAST_ARRIVAL_MINUTES))
                })
            });
            let release = match release {
                Some(r) if r <= report_utc => r.checked_add_signed(Duration::days(1)),
                other => other,
            };
            let Some(release_utc) = release else {
                tracing::trace!(
                    pairing = %pairing.pairing_id,
                    date = %day.flight_date,
                    "skipping day without release time"
                );
                continue;
            };

            periods.push(DutyPeriod {
                report_utc,
                release_utc,
                legs,
                flight_date: day.flight_date.clone(),
            });
        }
    }

    periods.sort_by_key(|p| p.report_utc);
    periods
}

/// Where the pilot is acclimated, for converting report instants to the
/// local hour Table B is keyed by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HomeBase {
    /// Fixed offset from UTC in hours (e.g. `-7.0`).
    FixedOffset(f64),
    /// IANA zone, DST-aware.
    Zone(Tz),
}

impl Default for HomeBase {
    fn default() -> Self {
        Self::FixedOffset(-7.0)
    }
}

impl HomeBase {
    /// Parse an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`Far117Error::InvalidTimezone`] for unknown names.
    pub fn parse_zone(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Zone)
            .map_err(|_| Far117Error::InvalidTimezone(format!("'{name}'")))
    }

    /// Local hour of day (0-23) of `instant` at this home base.
    pub fn local_hour(&self, instant: DateTime<Utc>) -> i32 {
        match self {
            Self::FixedOffset(hours) => {
                let offset = Duration::seconds((hours * 3600.0).round() as i64);
                instant
                    .checked_add_signed(offset)
                    .unwrap_or(instant)
                    .hour() as i32
            }
            Self::Zone(tz) => instant.with_timezone(tz).hour() as i32,
        }
    }
}

/// FDP of the current duty, or of the next one when off duty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdpSummary {
    /// Elapsed FDP; `0.0` when off duty.
    pub current_hours: f64,
    pub limit_hours: f64,
    pub remaining_hours: f64,
    pub legs: usize,
    pub report_hour_local: i32,
    pub on_duty: bool,
    /// Set when the summary describes an upcoming duty.
    pub next_duty_date: Option<String>,
    pub status: FdpStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightTimeSummary {
    pub last_28d: f64,
    pub limit_28d: f64,
    pub last_365d: f64,
    pub limit_365d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestSummary {
    /// Hours since the last release; `None` while on duty or before any
    /// completed duty.
    pub last_rest_hours: Option<f64>,
    pub min_required: f64,
    pub next_report_earliest: Option<DateTime<Utc>>,
    pub longest_rest_168h: f64,
    pub rest_56h_met: bool,
}

/// Snapshot produced by [`Far117Calculator::current_status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Far117Status {
    /// `None` when there is neither a current nor an upcoming duty.
    pub fdp: Option<FdpSummary>,
    pub flight_time: FlightTimeSummary,
    pub rest: RestSummary,
    pub warnings: Vec<String>,
}

/// Outcome of [`Far117Calculator::simulate_delay`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayResult {
    pub scenario: String,
    /// False only when the delayed FDP passes the extension ceiling.
    pub feasible: bool,
    pub new_fdp_hours: f64,
    pub fdp_limit: f64,
    pub status: FdpStatus,
    pub warnings: Vec<String>,
}

/// FAR 117 calculator over a fixed set of duty periods and a fixed "now".
#[derive(Debug, Clone)]
pub struct Far117Calculator {
    duty_periods: Vec<DutyPeriod>,
    home_base: HomeBase,
    now: DateTime<Utc>,
}

impl Far117Calculator {
    pub fn new(mut duty_periods: Vec<DutyPeriod>, home_base: HomeBase, now: DateTime<Utc>) -> Self {
        duty_periods.sort_by_key(|p| p.report_utc);
        Self {
            duty_periods,
            home_base,
            now,
        }
    }

    /// Shorthand for [`duty_periods_from_pairings`] followed by [`Self::new`].
    pub fn from_pairings(pairings: &[Pairing], home_base: HomeBase, now: DateTime<Utc>) -> Self {
        Self::new(duty_periods_from_pairings(pairings), home_base, now)
    }

    pub fn duty_periods(&self) -> &[DutyPeriod] {
        &self.duty_periods
    }

    pub fn current_duty(&self) -> Option<&DutyPeriod> {
        self.duty_periods.iter().find(|p| p.contains(self.now))
    }

    pub fn next_duty(&self) -> Option<&DutyPeriod> {
        self.duty_periods.iter().find(|p| p.report_utc > self.now)
    }

    pub fn last_release(&self) -> Option<DateTime<Utc>> {
        self.duty_periods
            .iter()
            .map(|p| p.release_utc)
            .filter(|release| *release <= self.now)
            .max()
    }

    /// Gaps between consecutive duty periods.
    pub fn rest_periods(&self) -> Vec<RestPeriod> {
        self.duty_periods
            .windows(2)
            .filter(|pair| pair[1].report_utc > pair[0].release_utc)
            .map(|pair| RestPeriod {
                start_utc: pair[0].release_utc,
                end_utc: pair[1].report_utc,
            })
            .collect()
    }

    /// Block hours of legs departing within `[now - window_days, now]`.
    pub fn flight_time_in_window(&self, window_days: i64) -> f64 {
        let cutoff = self.now - Duration::days(window_days);
        let total: f64 = self
            .duty_periods
            .iter()
            .flat_map(|p| p.legs.iter())
            .filter(|leg| leg.depart_utc >= cutoff && leg.depart_utc <= self.now)
            .map(|leg| leg.block_hours)
            .sum();
        round_tenth(total)
    }

    /// Longest rest inside the trailing `window_hours`, each rest clipped to
    /// the window.
    ///
    /// While off duty the open rest since the last release counts too; with
    /// no completed duty in the window the whole window is rest.
    pub fn longest_rest_in_window(&self, window_hours: i64) -> f64 {
        let cutoff = self.now - Duration::hours(window_hours);
        let clipped = |start: DateTime<Utc>, end: DateTime<Utc>| {
            let start = start.max(cutoff);
            let end = end.min(self.now);
            if end > start {
                hours_between(start, end)
            } else {
                0.0
            }
        };

        let mut longest = self
            .rest_periods()
            .iter()
            .map(|r| clipped(r.start_utc, r.end_utc))
            .fold(0.0, f64::max);

        if self.current_duty().is_none() {
            let open_since = self.last_release().unwrap_or(cutoff);
            longest = longest.max(clipped(open_since, self.now));
        }

        round_tenth(longest)
    }

    fn fdp_limit_for(&self, period: &DutyPeriod) -> (i32, f64) {
        let hour = self.home_base.local_hour(period.report_utc);
        (hour, fdp_limit(hour, period.num_legs() as i32))
    }

    /// Compute the full FAR 117 status at `now`.
    pub fn current_status(&self) -> Far117Status {
        let mut warnings = Vec::new();
        let current = self.current_duty();

        let fdp = if let Some(period) = current {
            let elapsed = hours_between(period.report_utc, self.now);
            let (report_hour_local, limit) = self.fdp_limit_for(period);
            let remaining = round_tenth(limit - elapsed);

            if remaining > 0.0 && remaining < 1.0 {
                warnings.push(format!("Less than {remaining:.1}h remaining until FDP limit"));
            }
            if remaining <= 0.0 {
                warnings.push("FDP limit exceeded".to_string());
            }

            Some(FdpSummary {
                current_hours: round_tenth(elapsed),
                limit_hours: limit,
                remaining_hours: remaining,
                legs: period.num_legs(),
                report_hour_local,
                on_duty: true,
                next_duty_date: None,
                status: fdp_status(elapsed, limit),
            })
        } else {
            self.next_duty().map(|period| {
                let (report_hour_local, limit) = self.fdp_limit_for(period);
                FdpSummary {
                    current_hours: 0.0,
                    limit_hours: limit,
                    remaining_hours: limit,
                    legs: period.num_legs(),
                    report_hour_local,
                    on_duty: false,
                    next_duty_date: Some(period.flight_date.clone()),
                    status: FdpStatus::Normal,
                }
            })
        };

        let flight_time = FlightTimeSummary {
            last_28d: self.flight_time_in_window(28),
            limit_28d: FLIGHT_TIME_28D_LIMIT_HOURS,
            last_365d: self.flight_time_in_window(365),
            limit_365d: FLIGHT_TIME_365D_LIMIT_HOURS,
        };
        if flight_time.last_28d >= FLIGHT_TIME_28D_LIMIT_HOURS {
            warnings.push(format!(
                "28-day {FLIGHT_TIME_28D_LIMIT_HOURS}h flight time limit reached"
            ));
        } else if flight_time.last_28d > FLIGHT_TIME_28D_WARNING_HOURS {
            warnings.push(format!(
                "28-day flight time {:.1}h, approaching {FLIGHT_TIME_28D_LIMIT_HOURS}h limit",
                flight_time.last_28d
            ));
        }

        let last_release = self.last_release();
        let mut last_rest_hours = None;
        let mut next_report_earliest = None;
        if let (Some(released), None) = (last_release, current) {
            let rest = hours_between(released, self.now);
            last_rest_hours = Some(round_tenth(rest));
            next_report_earliest =
                released.checked_add_signed(Duration::seconds((MIN_REST_HOURS * 3600.0) as i64));
            if rest < MIN_REST_HOURS {
                warnings.push(format!(
                    "Minimum {MIN_REST_HOURS}h rest not met (current {rest:.1}h)"
                ));
            }
        }

        let longest_rest_168h = self.longest_rest_in_window(WEEKLY_REST_WINDOW_HOURS);
        let rest_56h_met = longest_rest_168h >= WEEKLY_REST_HOURS;
        if !rest_56h_met {
            warnings.push(format!(
                "Longest consecutive rest in {WEEKLY_REST_WINDOW_HOURS}h: \
                 {longest_rest_168h:.1}h ({WEEKLY_REST_HOURS}h required)"
            ));
        }

        tracing::debug!(
            on_duty = current.is_some(),
            flight_time_28d = flight_time.last_28d,
            longest_rest_168h,
            warnings = warnings.len(),
            "computed FAR 117 status"
        );

        Far117Status {
            fdp,
            flight_time,
            rest: RestSummary {
                last_rest_hours,
                min_required: MIN_REST_HOURS,
                next_report_earliest,
                longest_rest_168h,
                rest_56h_met,
            },
            warnings,
        }
    }

    /// What happens to the current (or next) duty if release slips by
    /// `delay_minutes`.
    ///
    /// Over the base limit but within the +2h extension the delay is feasible
    /// with a warning (extension at the captain's discretion). Past that it
    /// is not feasible.
    pub fn simulate_delay(&self, delay_minutes: i64) -> DelayResult {
        let scenario = format!("+{delay_minutes}min delay");
        let Some(period) = self.current_duty().or_else(|| self.next_duty()) else {
            return DelayResult {
                scenario,
                feasible: true,
                new_fdp_hours: 0.0,
                fdp_limit: 0.0,
                status: FdpStatus::Normal,
                warnings: vec!["No scheduled duty period".to_string()],
            };
        };

        // Delays too large to represent pin the release to the representable bound.
        let new_release = Duration::try_minutes(delay_minutes)
            .and_then(|d| period.release_utc.checked_add_signed(d))
            .unwrap_or(if delay_minutes < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        let new_fdp = hours_between(period.report_utc, new_release);
        let (_, limit) = self.fdp_limit_for(period);
        let hard_limit = limit + MAX_EXTENSION_HOURS;

        let mut warnings = Vec::new();
        let mut feasible = true;
        if new_fdp > hard_limit {
            warnings.push(format!(
                "FDP {new_fdp:.1}h > absolute limit {hard_limit:.0}h, cannot operate"
            ));
            feasible = false;
        } else if new_fdp > limit {
            warnings.push(format!(
                "FDP {new_fdp:.1}h > base limit {limit:.0}h, \
                 unforeseen circumstances extension required (PIC decision)"
            ));
        }

        DelayResult {
            scenario,
            feasible,
            new_fdp_hours: round_tenth(new_fdp),
            fdp_limit: limit,
            status: fdp_status(new_fdp, limit),
            warnings,
        }
    }
}
