use clap::Args;
use flexworkout_core::{default_plan, Config, Event, Mode, Session};

use crate::console::ConsoleOutput;
use crate::driver::{self, print_events, Outcome};

#[derive(Args)]
pub struct RemindArgs {
    /// Minutes between breaks (defaults to reminder.interval_minutes)
    #[arg(long)]
    interval: Option<u64>,
    /// Exit after this many breaks
    #[arg(long)]
    breaks: Option<usize>,
    /// Start with narration off
    #[arg(long)]
    no_narration: bool,
    /// Time multiplier (60 turns minutes into seconds)
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

pub fn run(args: RemindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let output = ConsoleOutput::new(config.narration.chars_per_second);
    let mut session = Session::from_config(default_plan(), &config, Box::new(output));
    if args.no_narration && session.narration_enabled() {
        print_events(session.toggle_narration())?;
    }

    print_events(session.set_mode(Mode::Reminder))?;
    if let Some(minutes) = args.interval {
        print_events(session.set_reminder_interval(minutes))?;
    }
    print_events(session.start_reminder())?;

    let mut ended = 0;
    let outcome = driver::drive(&mut session, args.speed, |session, events| {
        ended += events
            .iter()
            .filter(|e| matches!(e, Event::BreakEnded { .. }))
            .count();
        // Let the closing line finish before leaving.
        args.breaks.is_some_and(|n| ended >= n) && !session.reminder_state().is_speaking
    })?;

    if outcome != Outcome::Idle {
        print_events(session.stop_reminder())?;
    }
    Ok(())
}
