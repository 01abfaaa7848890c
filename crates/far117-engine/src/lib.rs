//! # far117-engine
//!
//! Deterministic FAR 117 (14 CFR Part 117) duty-time computation for a
//! pilot-scheduling assistant.
//!
//! Every function is pure and synchronous. Nothing reads the system clock:
//! callers pass the "now" instant, so results are reproducible and safe to
//! compute from any thread. Rule evaluation never fails; malformed roster
//! data falls back to conservative or zero values instead of erroring.
//!
//! Advisory only. Augmented crews, split duty and unforeseen-circumstance
//! paperwork are not modelled.
//!
//! ## Modules
//!
//! - [`limits`]: Table B FDP limits, FDP status classification
//! - [`pickup`]: Pickup feasibility simulation and trip presets
//! - [`roster`]: Schedule records, cumulative flight time, last release, today's duty
//! - [`calculator`]: Duty periods, current FAR 117 status, delay simulation
//! - [`timefmt`]: Hour formatting and clock arithmetic
//! - [`error`]: Error types

pub mod calculator;
pub mod error;
pub mod limits;
pub mod pickup;
pub mod roster;
pub mod timefmt;

pub use calculator::{
    duty_periods_from_pairings, DelayResult, DutyPeriod, Far117Calculator, Far117Status,
    HomeBase, RestPeriod,
};
pub use error::Far117Error;
pub use limits::{fdp_limit, fdp_status, FdpGauge, FdpStatus, FDP_TABLE};
pub use pickup::{
    simulate_pickup, PickupContext, PickupInput, PickupPreset, PickupResult, PICKUP_PRESETS,
};
pub use roster::{
    cumulative_flight_time, last_release, today_duty, DutySnapshot, Pairing, Schedule,
};
pub use timefmt::{add_hours_to_time, format_fdp_time};
