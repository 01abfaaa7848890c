//! FAR 117.11 Table B flight duty period limits and FDP classification.
//!
//! The table is fixed regulatory data, so it is a static array with a single
//! lookup function. Rows are keyed by the acclimated local report hour and
//! columns by the number of flight segments.

use serde::Serialize;

/// One row of Table B: an inclusive report-hour range and its six limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdpRow {
    pub start_hour: i32,
    pub end_hour: i32,
    /// Limits in hours for 1-2, 3, 4, 5, 6 and 7+ segments.
    pub limits: [f64; 6],
}

impl FdpRow {
    const fn new(start_hour: i32, end_hour: i32, limits: [f64; 6]) -> Self {
        Self {
            start_hour,
            end_hour,
            limits,
        }
    }

    pub fn contains(&self, hour: i32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// 14 CFR 117 Table B (unaugmented operations).
pub const FDP_TABLE: [FdpRow; 8] = [
    FdpRow::new(0, 3, [9.0, 9.0, 9.0, 9.0, 9.0, 9.0]),
    FdpRow::new(4, 4, [10.0, 10.0, 10.0, 9.0, 9.0, 9.0]),
    FdpRow::new(5, 5, [12.0, 12.0, 11.0, 11.0, 10.0, 9.0]),
    FdpRow::new(6, 6, [13.0, 13.0, 12.0, 12.0, 11.0, 10.0]),
    FdpRow::new(7, 12, [14.0, 14.0, 13.0, 13.0, 12.0, 11.0]),
    FdpRow::new(13, 16, [13.0, 13.0, 12.0, 12.0, 11.0, 10.0]),
    FdpRow::new(17, 21, [12.0, 12.0, 11.0, 11.0, 10.0, 9.0]),
    FdpRow::new(22, 23, [11.0, 11.0, 10.0, 10.0, 9.0, 9.0]),
];

/// Returned when no table row covers the report hour.
pub const DEFAULT_FDP_LIMIT_HOURS: f64 = 9.0;

/// How far past the base limit an FDP may be extended (117.19).
pub const MAX_EXTENSION_HOURS: f64 = 2.0;

/// Rolling 28-day flight time ceiling (117.23(b)(1)).
pub const FLIGHT_TIME_28D_LIMIT_HOURS: f64 = 100.0;

/// Rolling 365-day flight time ceiling (117.23(b)(2)).
pub const FLIGHT_TIME_365D_LIMIT_HOURS: f64 = 1000.0;

/// Minimum rest before a flight duty period (117.25(e)).
pub const MIN_REST_HOURS: f64 = 10.0;

/// Consecutive rest required in any 168 hours (117.25(b)).
pub const WEEKLY_REST_HOURS: f64 = 56.0;

/// Table column for a segment count: 1-2 → 0, 3..=6 → count - 2, 7+ → 5.
fn leg_column(legs: i32) -> usize {
    match legs {
        i32::MIN..=2 => 0,
        3..=6 => (legs - 2) as usize,
        _ => 5,
    }
}

/// Look up the maximum FDP in hours for a report hour and segment count.
///
/// Rows are scanned in table order and the first row containing
/// `report_hour` wins. Hours outside `0..=23` (malformed upstream data) fall
/// back to [`DEFAULT_FDP_LIMIT_HOURS`].
///
/// # Examples
///
/// ```
/// use far117_engine::limits::fdp_limit;
///
/// assert_eq!(fdp_limit(7, 3), 14.0);
/// assert_eq!(fdp_limit(22, 1), 11.0);
/// assert_eq!(fdp_limit(4, 5), 9.0);
/// ```
pub fn fdp_limit(report_hour: i32, legs: i32) -> f64 {
    let col = leg_column(legs);
    FDP_TABLE
        .iter()
        .find(|row| row.contains(report_hour))
        .map(|row| row.limits[col])
        .unwrap_or_else(|| {
            tracing::debug!(report_hour, legs, "report hour outside FDP table, using default");
            DEFAULT_FDP_LIMIT_HOURS
        })
}

/// Severity of an FDP relative to its limit, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FdpStatus {
    /// More than an hour of margin left.
    Normal,
    /// Within an hour of the base limit.
    Warning,
    /// Over the base limit, inside the extension window.
    Extend,
    /// Beyond the extension window.
    Critical,
}

impl FdpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Extend => "extend",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for FdpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an FDP value against its limit.
pub fn fdp_status(fdp_hours: f64, limit: f64) -> FdpStatus {
    let hard_limit = limit + MAX_EXTENSION_HOURS;
    if fdp_hours > hard_limit {
        FdpStatus::Critical
    } else if fdp_hours > limit {
        FdpStatus::Extend
    } else if limit - fdp_hours < 1.0 {
        FdpStatus::Warning
    } else {
        FdpStatus::Normal
    }
}

/// Cap on [`FdpGauge::percent`], so an overrun still fits a progress bar.
const GAUGE_MAX_PERCENT: f64 = 120.0;

/// Progress-bar view of an FDP against its limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdpGauge {
    pub fdp_hours: f64,
    pub limit: f64,
    pub hard_limit: f64,
    /// Negative once the base limit is passed.
    pub remaining: f64,
    pub percent: f64,
    pub status: FdpStatus,
}

impl FdpGauge {
    pub fn new(fdp_hours: f64, limit: f64) -> Self {
        let percent = if limit > 0.0 {
            (fdp_hours / limit * 100.0).min(GAUGE_MAX_PERCENT)
        } else {
            GAUGE_MAX_PERCENT
        };
        Self {
            fdp_hours,
            limit,
            hard_limit: limit + MAX_EXTENSION_HOURS,
            remaining: limit - fdp_hours,
            percent,
            status: fdp_status(fdp_hours, limit),
        }
    }
}
