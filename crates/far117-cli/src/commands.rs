//! Handlers for each `far117` subcommand.
//!
//! The clock is read here, once per invocation, and handed to the engine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use far117_engine::pickup::{PickupPreset, PICKUP_PRESETS};
use far117_engine::timefmt::{parse_block_time, parse_clock, parse_instant};
use far117_engine::{
    fdp_limit, fdp_status, format_fdp_time, simulate_pickup, today_duty, Far117Calculator,
    FdpGauge, PickupContext, PickupInput, Schedule,
};
use serde::Serialize;
use serde_json::json;

use crate::cli::{
    ClassifyArgs, Command, ConfigCommand, DelayArgs, LimitArgs, OutputArgs, PickupArgs,
    RosterArgs,
};
use crate::config::Config;

pub fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Limit(args) => limit(&args),
        Command::Classify(args) => classify(&args),
        Command::Pickup(args) => pickup(&args, config),
        Command::Presets(output) => presets(&output),
        Command::Today(args) => today(&args, config),
        Command::Status(args) => status(&args, config),
        Command::Delay(args) => delay(&args, config),
        Command::Config(cmd) => show_config(cmd, config),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ok_label(ok: bool) -> &'static str {
    if ok {
        "OK"
    } else {
        "FAIL"
    }
}

fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(value) => parse_instant(value).context("invalid --now value"),
        None => Ok(Utc::now()),
    }
}

fn schedule_path(args: &RosterArgs, config: &Config) -> Option<PathBuf> {
    args.schedule.clone().or_else(|| config.schedule.path.clone())
}

fn load_schedule(path: &Path) -> Result<Schedule> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schedule {}", path.display()))?;
    let schedule = Schedule::from_json(&text)
        .with_context(|| format!("failed to parse schedule {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        pairings = schedule.pairings.len(),
        "loaded schedule"
    );
    Ok(schedule)
}

fn require_schedule(args: &RosterArgs, config: &Config) -> Result<Schedule> {
    match schedule_path(args, config) {
        Some(path) => load_schedule(&path),
        None => bail!("no schedule file given; pass --schedule or set schedule.path in the config"),
    }
}

fn limit(args: &LimitArgs) -> Result<()> {
    let limit = fdp_limit(args.report_hour, args.legs);
    if args.output.json {
        return print_json(&json!({
            "report_hour": args.report_hour,
            "legs": args.legs,
            "fdp_limit": limit,
        }));
    }
    println!(
        "FDP limit: {limit}h (report hour {:02}, {} legs)",
        args.report_hour, args.legs
    );
    Ok(())
}

fn classify(args: &ClassifyArgs) -> Result<()> {
    let limit = match (args.limit, args.report_hour, args.legs) {
        (Some(limit), _, _) => limit,
        (None, Some(hour), Some(legs)) => fdp_limit(hour, legs),
        _ => bail!("pass either --limit or both --report-hour and --legs"),
    };
    let gauge = FdpGauge::new(args.fdp, limit);
    if args.output.json {
        return print_json(&gauge);
    }
    println!(
        "FDP {} / limit {}h: {} ({:.0}%)",
        format_fdp_time(gauge.fdp_hours),
        gauge.limit,
        gauge.status,
        gauge.percent
    );
    Ok(())
}

fn pickup_input(args: &PickupArgs) -> Result<PickupInput> {
    let mut input = match &args.preset {
        Some(label) => PickupInput::from(PickupPreset::find(label)?),
        None => PickupInput::default(),
    };
    if let Some(report) = &args.report {
        let (hour, minute) = parse_clock(report)?;
        input.report_hour = hour;
        input.report_minute = minute;
    }
    if let Some(legs) = args.legs {
        input.legs = legs;
    }
    if let Some(block) = &args.block {
        let (hours, minutes) = parse_block_time(block)?;
        input.block_hours = hours;
        input.block_minutes = minutes;
    }
    Ok(input)
}

fn pickup(args: &PickupArgs, config: &Config) -> Result<()> {
    let input = pickup_input(args)?;
    let now = resolve_now(args.roster.now.as_deref())?;

    let context = match schedule_path(&args.roster, config) {
        Some(path) if !args.no_history => {
            let schedule = load_schedule(&path)?;
            PickupContext::from_pairings(&schedule.pairings, now)
        }
        _ => None,
    };
    if context.is_none() {
        tracing::debug!("no roster history, running FDP check only");
    }

    let result = simulate_pickup(&input, context.as_ref(), now);
    let release = input.estimated_release();

    if args.roster.output.json {
        return print_json(&json!({
            "input": input,
            "estimated_release": release,
            "status": fdp_status(input.estimated_fdp_hours(), result.fdp_limit),
            "result": result,
        }));
    }

    println!(
        "Report {:02}:{:02}, {} legs, block {}",
        input.report_hour,
        input.report_minute,
        input.legs,
        format_fdp_time(input.block_time_hours())
    );
    println!(
        "FDP:       {} / {}h  {}",
        format_fdp_time(result.fdp_hours),
        result.fdp_limit,
        ok_label(result.fdp_ok)
    );
    println!("Release:   {release}");
    if let (Some(after), Some(ok)) = (result.flight_28d_after, result.flight_28d_ok) {
        println!("28-day:    {after:.1}h / 100h  {}", ok_label(ok));
    }
    if let (Some(gap), Some(ok)) = (result.rest_gap_hours, result.rest_gap_ok) {
        println!("Rest gap:  {gap:.1}h / 10h  {}", ok_label(ok));
    }
    println!(
        "Can pick up: {}",
        if result.can_pickup { "yes" } else { "no" }
    );
    for warning in &result.warnings {
        println!("  ! {warning}");
    }
    Ok(())
}

fn presets(output: &OutputArgs) -> Result<()> {
    if output.json {
        return print_json(&PICKUP_PRESETS);
    }
    for preset in &PICKUP_PRESETS {
        let input = PickupInput::from(preset);
        println!(
            "{:<8} report {:02}:{:02}  {} legs  block {}  limit {}h",
            preset.label,
            preset.report_hour,
            preset.report_minute,
            preset.legs,
            format_fdp_time(input.block_time_hours()),
            fdp_limit(preset.report_hour, preset.legs)
        );
    }
    Ok(())
}

fn today(args: &RosterArgs, config: &Config) -> Result<()> {
    let schedule = require_schedule(args, config)?;
    let now = resolve_now(args.now.as_deref())?;
    let snapshot = today_duty(&schedule.pairings, now);

    if args.output.json {
        return print_json(&snapshot);
    }
    let Some(duty) = snapshot else {
        println!("No duty today ({})", now.date_naive());
        return Ok(());
    };
    println!("Duty {}", duty.flight_date);
    println!(
        "  Report:  {}",
        duty.report_time.as_deref().unwrap_or("unknown")
    );
    println!(
        "  Release: {}",
        duty.release_time.as_deref().unwrap_or("unknown")
    );
    println!("  Legs:    {}", duty.legs);
    println!("  Block:   {:.1}h", duty.block_hours);
    println!(
        "  {}",
        if duty.on_duty { "On duty" } else { "Off duty" }
    );
    Ok(())
}

fn status(args: &RosterArgs, config: &Config) -> Result<()> {
    let schedule = require_schedule(args, config)?;
    let now = resolve_now(args.now.as_deref())?;
    let calc = Far117Calculator::from_pairings(&schedule.pairings, config.home_base()?, now);
    let status = calc.current_status();

    if args.output.json {
        return print_json(&status);
    }

    match &status.fdp {
        Some(fdp) if fdp.on_duty => println!(
            "On duty:   FDP {} / {}h ({} remaining, {} legs, {})",
            format_fdp_time(fdp.current_hours),
            fdp.limit_hours,
            format_fdp_time(fdp.remaining_hours),
            fdp.legs,
            fdp.status
        ),
        Some(fdp) => println!(
            "Next duty: {} ({}h limit, {} legs)",
            fdp.next_duty_date.as_deref().unwrap_or("unknown"),
            fdp.limit_hours,
            fdp.legs
        ),
        None => println!("No current or upcoming duty"),
    }
    let ft = &status.flight_time;
    println!(
        "Flight:    {:.1}h / {}h (28d), {:.1}h / {}h (365d)",
        ft.last_28d, ft.limit_28d, ft.last_365d, ft.limit_365d
    );
    let rest = &status.rest;
    if let Some(hours) = rest.last_rest_hours {
        println!("Rest:      {hours:.1}h (min {}h)", rest.min_required);
    }
    if let Some(earliest) = rest.next_report_earliest {
        println!("Earliest:  {}", earliest.format("%Y-%m-%d %H:%MZ"));
    }
    println!(
        "Weekly:    longest rest {:.1}h in 168h ({})",
        rest.longest_rest_168h,
        ok_label(rest.rest_56h_met)
    );
    for warning in &status.warnings {
        println!("  ! {warning}");
    }
    Ok(())
}

fn delay(args: &DelayArgs, config: &Config) -> Result<()> {
    let schedule = require_schedule(&args.roster, config)?;
    let now = resolve_now(args.roster.now.as_deref())?;
    let calc = Far117Calculator::from_pairings(&schedule.pairings, config.home_base()?, now);
    let result = calc.simulate_delay(args.minutes);

    if args.roster.output.json {
        return print_json(&result);
    }
    println!(
        "{}: FDP {} / {}h, {}",
        result.scenario,
        format_fdp_time(result.new_fdp_hours),
        result.fdp_limit,
        if result.feasible { "feasible" } else { "not feasible" }
    );
    for warning in &result.warnings {
        println!("  ! {warning}");
    }
    Ok(())
}

fn show_config(cmd: ConfigCommand, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommand::Show(output) if output.json => print_json(config),
        ConfigCommand::Show(_) => {
            println!("[home_base]");
            println!("  utc_offset_hours: {}", config.home_base.utc_offset_hours);
            println!(
                "  timezone:         {}",
                config.home_base.timezone.as_deref().unwrap_or("(none)")
            );
            println!("[schedule]");
            println!(
                "  path:             {}",
                config
                    .schedule
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            );
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
            Ok(())
        }
    }
}
