use std::path::PathBuf;

use clap::Args;
use flexworkout_core::{Config, Database, Session, ValidationError};

use super::plan;
use crate::console::ConsoleOutput;
use crate::driver::{self, print_event, print_events, Outcome};

#[derive(Args)]
pub struct RunArgs {
    /// Saved plan ID to play instead of the active plan
    #[arg(long, conflicts_with = "file")]
    plan: Option<String>,
    /// Plan JSON file to play instead of the active plan
    #[arg(long)]
    file: Option<PathBuf>,
    /// Start with narration off
    #[arg(long)]
    no_narration: bool,
    /// Time multiplier (2 plays twice as fast)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
    /// Rounds for a section, e.g. --rounds Strength=3 (repeatable)
    #[arg(long = "rounds", value_name = "SECTION=N", value_parser = parse_rounds)]
    rounds: Vec<(String, u32)>,
    /// Step index to start from
    #[arg(long)]
    from: Option<usize>,
}

fn parse_rounds(s: &str) -> Result<(String, u32), String> {
    let (section, n) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected SECTION=N, got '{s}'"))?;
    let n = n
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad round count '{n}': {e}"))?;
    Ok((section.trim().to_string(), n))
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let plan = plan::resolve(&db, args.plan.as_deref(), args.file.as_deref())?;
    if plan.is_empty() {
        return Err("plan has no steps".into());
    }

    let output = ConsoleOutput::new(config.narration.chars_per_second);
    let mut session = Session::from_config(plan, &config, Box::new(output));
    if args.no_narration && session.narration_enabled() {
        print_events(session.toggle_narration())?;
    }
    for (section, n) in &args.rounds {
        match session.set_rounds(section, *n) {
            Some(event) => print_event(&event)?,
            None => tracing::warn!(%section, "section does not take rounds"),
        }
    }
    if let Some(idx) = args.from {
        let event = session.jump_to(idx).ok_or_else(|| ValidationError::OutOfBounds {
            collection: "plan steps".into(),
            index: idx,
            len: session.playback().steps().len(),
        })?;
        print_event(&event)?;
    }

    print_events(session.start())?;
    let outcome = driver::drive(&mut session, args.speed, |_, _| false)?;
    if outcome == Outcome::Interrupted {
        print_events(session.pause())?;
    }
    print_event(&session.playback().snapshot_event())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_section_rounds() {
        assert_eq!(parse_rounds("Strength=3"), Ok(("Strength".into(), 3)));
        assert_eq!(parse_rounds("A=B = 2"), Ok(("A=B".into(), 2)));
        assert!(parse_rounds("Strength").is_err());
        assert!(parse_rounds("Strength=x").is_err());
    }
}
