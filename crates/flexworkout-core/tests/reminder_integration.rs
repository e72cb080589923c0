//! Break reminder scenarios on the virtual clock.

use std::collections::HashSet;
use std::time::Duration;

use flexworkout_core::narration::{Announcer, AudioLog, RecordingOutput, Utterance};
use flexworkout_core::plan::{default_plan, flattened_stretches, Stretch};
use flexworkout_core::reminder::{ReminderEngine, ReminderTiming, StretchPool, BREAK_STEPS};
use flexworkout_core::timer::PlaybackEngine;
use flexworkout_core::{Event, Mode, Session};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn session(pool: StretchPool, interval_secs: u64) -> (Session, AudioLog) {
    let (output, log) = RecordingOutput::new();
    let session = Session::new(
        PlaybackEngine::new(default_plan()),
        ReminderEngine::new(
            pool,
            ReminderTiming {
                interval_secs,
                ..ReminderTiming::default()
            },
        ),
        Announcer::new(Box::new(output)),
    );
    (session, log)
}

fn finish_speech(session: &mut Session) {
    let (_, token) = session.speech_in_flight().expect("speech in flight");
    assert!(session.speech_finished(token));
}

#[test]
fn test_break_begins_after_interval() {
    let items = flattened_stretches();
    let (mut session, log) = session(StretchPool::in_order(items.clone()), 900);
    session.set_mode(Mode::Reminder);
    assert!(session.start_reminder().is_some());
    assert_eq!(log.last_spoken().as_deref(), Some("Break reminders are on."));

    // Frozen until the opening line is done.
    session.advance(secs(5));
    assert_eq!(session.reminder_state().time_left_secs, 900);
    finish_speech(&mut session);

    let events = session.advance(secs(900));
    let suggestions = events
        .iter()
        .find_map(|e| match e {
            Event::BreakStarted { suggestions, .. } => Some(suggestions.clone()),
            _ => None,
        })
        .expect("break started");
    assert_eq!(suggestions, items[..3].to_vec());

    let state = session.reminder_state();
    assert!(state.is_break_active);
    assert_eq!(state.break_step_index, 0);
    assert_eq!(state.break_time_left_secs, 30);
    assert_eq!(state.last_suggested, items[..3].to_vec());
    assert_eq!(state.stretch_pool[state.stretch_pool.len() - 3..], items[..3]);
    assert_eq!(log.tone_count(), 1);
    assert!(log
        .last_spoken()
        .unwrap()
        .starts_with(&format!("Break time. First move: {}.", items[0].name)));
}

#[test]
fn test_full_break_cycle_ends_with_closing_line() {
    let items = flattened_stretches();
    let (mut session, log) = session(StretchPool::in_order(items.clone()), 60);
    log.respond_with(Utterance::Finished);
    session.start_reminder();
    session.advance(secs(60));
    assert!(session.reminder_state().is_break_active);

    let events = session.advance(secs(100));
    let steps: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::BreakStepAdvanced { break_step, .. } => Some(*break_step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, vec![1, 2]);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, Event::BreakEnded { next_reminder_secs: 60, .. }))
            .count(),
        1
    );

    let spoken = log.spoken();
    assert!(spoken.contains(&format!("Next move: {}. {}", items[1].name, items[1].desc)));
    assert!(spoken.contains(&format!("Next move: {}. {}", items[2].name, items[2].desc)));
    assert_eq!(spoken.last().map(String::as_str), Some("Break over, back to work."));

    let state = session.reminder_state();
    assert!(!state.is_break_active);
    assert!(state.is_running);
    assert!(state.time_left_secs < 60);
    // Three double-cues: break start plus two step changes, and one at the end.
    assert_eq!(log.tone_count(), 2 * (BREAK_STEPS + 1));
}

#[test]
fn test_pool_of_twelve_covered_in_four_breaks() {
    let items = flattened_stretches();
    assert_eq!(items.len(), 12);
    let (mut session, log) = session(StretchPool::seeded(items.clone(), Some(42)), 60);
    log.respond_with(Utterance::Finished);
    session.start_reminder();

    let mut drawn: Vec<Stretch> = Vec::new();
    let mut breaks = 0;
    while breaks < 4 {
        for event in session.advance(secs(1)) {
            if let Event::BreakStarted { suggestions, .. } = event {
                assert_eq!(suggestions.len(), BREAK_STEPS);
                drawn.extend(suggestions);
                breaks += 1;
            }
        }
    }

    assert_eq!(drawn.len(), 12);
    let unique: HashSet<_> = drawn.iter().collect();
    assert_eq!(unique.len(), 12);
    let all: HashSet<_> = items.iter().collect();
    assert_eq!(unique, all);
}

#[test]
fn test_stop_mid_break_keeps_history_and_silences_pending_narration() {
    let (mut session, log) = session(StretchPool::in_order(flattened_stretches()), 60);
    log.respond_with(Utterance::Finished);
    session.set_mode(Mode::Reminder);
    session.start_reminder();
    session.advance(secs(90));
    let spoken = log.spoken().len();
    let state = session.reminder_state();
    assert_eq!(state.break_step_index, 1);
    assert!(state.is_speaking);

    // Switching modes stops the reminder.
    assert!(matches!(
        session.set_mode(Mode::Workout),
        Some(Event::ModeChanged {
            mode: Mode::Workout,
            ..
        })
    ));
    let state = session.reminder_state();
    assert!(!state.is_running);
    assert!(!state.is_break_active);
    assert_eq!(state.time_left_secs, 60);
    assert_eq!(state.last_suggested.len(), BREAK_STEPS);

    session.advance(secs(10));
    assert_eq!(log.spoken().len(), spoken);
    assert_eq!(session.until_next_wake(), None);
    assert!(session.stop_reminder().is_none());
}

#[test]
fn test_interval_change_waits_for_break_to_end() {
    let (mut session, log) = session(StretchPool::in_order(flattened_stretches()), 60);
    log.respond_with(Utterance::Finished);
    session.start_reminder();
    session.advance(secs(60));
    assert!(session.reminder_state().is_break_active);

    session.set_reminder_interval(2);
    assert_eq!(session.reminder_state().interval_secs, 120);
    assert_eq!(session.reminder_state().time_left_secs, 0);

    let events = session.advance(secs(100));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::BreakEnded { next_reminder_secs: 120, .. })));
}
