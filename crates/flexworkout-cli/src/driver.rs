//! Real-time driver: sleeps until the session's next timer, then advances
//! the virtual clock by the same amount and prints what happened.

use std::time::Duration;

use flexworkout_core::{Event, Session};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// How a drive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing left to wait for.
    Idle,
    /// The stop condition was met.
    Done,
    Interrupted,
}

pub fn print_event(event: &Event) -> Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn print_events(events: impl IntoIterator<Item = Event>) -> Result<()> {
    for event in events {
        print_event(&event)?;
    }
    Ok(())
}

/// Run `session` until no timer is armed, `done` returns true, or Ctrl-C.
/// `speed` scales wall-clock sleeps (2.0 runs twice as fast).
pub fn drive(
    session: &mut Session,
    speed: f64,
    done: impl FnMut(&Session, &[Event]) -> bool,
) -> Result<Outcome> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(format!("speed must be a positive number, got {speed}").into());
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive_async(session, speed, done))
}

async fn drive_async(
    session: &mut Session,
    speed: f64,
    mut done: impl FnMut(&Session, &[Event]) -> bool,
) -> Result<Outcome> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while let Some(wait) = session.until_next_wake() {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                return Ok(Outcome::Interrupted);
            }
            _ = tokio::time::sleep(scaled(wait, speed)) => {}
        }

        let events = session.advance(wait);
        for event in &events {
            print_event(event)?;
        }
        if done(session, &events) {
            return Ok(Outcome::Done);
        }
    }
    Ok(Outcome::Idle)
}

fn scaled(wait: Duration, speed: f64) -> Duration {
    wait.div_f64(speed)
}
