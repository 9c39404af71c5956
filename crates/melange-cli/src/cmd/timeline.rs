use super::Invocation;
use crate::output::{fmt_time, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use melange_core::phase::ProgramPhase;
use melange_core::timeline::{self, Event, Period};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum TimelineSubcommand {
    /// Show every event and the current phase
    Show,

    /// Evaluate a period or event name at the current instant
    Check {
        /// Period (program, org_signup, student_signup, ...) or event name
        name: String,
    },

    /// Rewrite the timeline so the program is in the given phase
    Phase {
        /// Phase name, e.g. student_signup or tasks_publicly_visible
        phase: String,
    },

    /// Set or clear a single event
    Set {
        /// Event name, e.g. task_claim_deadline
        event: String,
        /// RFC 3339 timestamp, or `none` to clear
        value: String,
    },
}

pub fn run(
    root: &Path,
    subcmd: TimelineSubcommand,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        TimelineSubcommand::Show => show(root, inv, json),
        TimelineSubcommand::Check { name } => check(root, &name, inv, json),
        TimelineSubcommand::Phase { phase } => set_phase(root, &phase, inv, json),
        TimelineSubcommand::Set { event, value } => set_event(root, &event, &value, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let program = &reg.program;
    let phase = program.timeline.current_phase(program.kind, inv.now);

    if json {
        return print_json(&serde_json::json!({
            "program": program.key,
            "kind": program.kind,
            "phase": phase,
            "timeline": program.timeline,
        }));
    }

    println!("{} ({}), phase: {phase}", program.name, program.kind);
    let rows: Vec<Vec<String>> = Event::all()
        .iter()
        .map(|e| vec![e.to_string(), fmt_time(program.timeline.get(*e))])
        .collect();
    print_table(&["EVENT", "AT"], &rows, "No events.");
    Ok(())
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn check(root: &Path, name: &str, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let tl = &reg.program.timeline;
    let now = inv.now;

    let value = if let Some(period) = Period::lookup(name) {
        let (start, end) = timeline::active_period(tl, name);
        serde_json::json!({
            "name": name,
            "period": period,
            "before": timeline::is_before_period(tl, name, now),
            "active": timeline::is_active_period(tl, name, now),
            "after": timeline::is_after_period(tl, name, now),
            "start": start,
            "end": end,
        })
    } else if let Some(event) = Event::lookup(name) {
        serde_json::json!({
            "name": name,
            "event": event,
            "before": timeline::is_before_event(tl, name, now),
            "after": timeline::is_after_event(tl, name, now),
            "at": timeline::get_date_time_by_name(tl, name),
        })
    } else {
        anyhow::bail!("unknown period or event: {name}");
    };

    if json {
        return print_json(&value);
    }
    let flag = |key: &str| value.get(key).and_then(|v| v.as_bool());
    let mut parts = Vec::new();
    for key in ["before", "active", "after"] {
        if let Some(b) = flag(key) {
            parts.push(format!("{key}={b}"));
        }
    }
    println!("{name}: {}", parts.join(" "));
    Ok(())
}

// ---------------------------------------------------------------------------
// phase / set
// ---------------------------------------------------------------------------

fn set_phase(root: &Path, phase: &str, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let phase: ProgramPhase = phase.parse()?;
    let kind = reg.program.kind;
    phase
        .apply(&mut reg.program.timeline, kind, inv.now)
        .with_context(|| format!("cannot move program to phase {phase}"))?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(&serde_json::json!({ "phase": phase, "timeline": reg.program.timeline }));
    }
    println!("Program {} is now in phase {phase}", reg.program.key);
    Ok(())
}

fn set_event(root: &Path, event: &str, value: &str, json: bool) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let Some(ev) = Event::lookup(event) else {
        anyhow::bail!("unknown event: {event}");
    };
    let at = match value {
        "none" | "" => None,
        raw => Some(
            raw.parse::<chrono::DateTime<chrono::Utc>>()
                .with_context(|| format!("invalid timestamp: {raw}"))?,
        ),
    };
    reg.program.timeline.set(ev, at);
    super::save(root, &mut reg)?;

    if json {
        return print_json(&serde_json::json!({ "event": ev, "at": at }));
    }
    println!("{ev} = {}", fmt_time(at));
    Ok(())
}
