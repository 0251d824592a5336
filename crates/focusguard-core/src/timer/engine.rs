//! Timer engine implementation.
//!
//! The timer engine is a caller-driven state machine. It does not use
//! internal threads or read the wall clock - the external scheduler calls
//! `tick()` at roughly 1 Hz and each call subtracts exactly one logical
//! second. Drift between ticks is tolerated, never reconciled.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running-Focus -> (Paused) -> Running-Break -> Running-Focus ...
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(&settings);
//! engine.start();
//! // In a loop:
//! engine.tick(&settings); // Returns Some(Event) on phase completion
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::Settings;

/// Current segment of the work/break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    /// Configured duration of this phase, in seconds.
    pub fn duration_secs(self, settings: &Settings) -> u32 {
        let minutes = match self {
            Phase::Focus => settings.focus_minutes,
            Phase::ShortBreak => settings.short_break_minutes,
            Phase::LongBreak => settings.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }

    /// Notification message for completing this phase.
    pub fn completion_message(self) -> &'static str {
        match self {
            Phase::Focus => "Focus session complete! Time for a break.",
            Phase::ShortBreak => "Break over! Ready for another focus session?",
            Phase::LongBreak => "Long break over! Ready to focus again?",
        }
    }

    pub fn is_focus(self) -> bool {
        matches!(self, Phase::Focus)
    }
}

/// Minimal durable record of the timer, saved across restarts.
///
/// Settings are persisted separately on their own update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    pub is_running: bool,
    pub is_paused: bool,
    pub time_left_secs: u32,
    pub completed_focus_cycles: u32,
}

/// Core timer state machine.
///
/// Every operation is total: calls from a disallowed state are silent
/// no-ops returning `None`, and no call can leave the state invalid.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    phase: Phase,
    is_running: bool,
    is_paused: bool,
    time_left_secs: u32,
    completed_focus_cycles: u32,
}

impl TimerEngine {
    /// Create an idle engine with a full Focus phase ready.
    pub fn new(settings: &Settings) -> Self {
        Self {
            phase: Phase::Focus,
            is_running: false,
            is_paused: false,
            time_left_secs: Phase::Focus.duration_secs(settings),
            completed_focus_cycles: 0,
        }
    }

    /// Rebuild the engine from a persisted snapshot.
    ///
    /// `is_paused` without `is_running` cannot arise from normal operation;
    /// a snapshot carrying it is repaired rather than rejected.
    pub fn restore(snapshot: Snapshot) -> Self {
        Self {
            phase: snapshot.phase,
            is_running: snapshot.is_running,
            is_paused: snapshot.is_paused && snapshot.is_running,
            time_left_secs: snapshot.time_left_secs,
            completed_focus_cycles: snapshot.completed_focus_cycles,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    pub fn completed_focus_cycles(&self) -> u32 {
        self.completed_focus_cycles
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            is_running: self.is_running,
            is_paused: self.is_paused,
            time_left_secs: self.time_left_secs,
            completed_focus_cycles: self.completed_focus_cycles,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Idempotent: returns `None` while already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running {
            return None;
        }
        self.is_running = true;
        self.is_paused = false;
        Some(Event::TimerStarted {
            phase: self.phase,
            time_left_secs: self.time_left_secs,
            at: Utc::now(),
        })
    }

    /// Flip the pause flag. Only meaningful while running; remaining time
    /// is untouched either way.
    pub fn toggle_pause(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.is_paused = !self.is_paused;
        Some(Event::TimerPaused {
            paused: self.is_paused,
            at: Utc::now(),
        })
    }

    /// Return to Idle with a full Focus phase. Valid from any state.
    /// `completed_focus_cycles` survives a timer reset.
    pub fn reset(&mut self, settings: &Settings) -> Option<Event> {
        self.is_running = false;
        self.is_paused = false;
        self.phase = Phase::Focus;
        self.time_left_secs = Phase::Focus.duration_secs(settings);
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Manual pre-session adjustment of the remaining time, distinct from
    /// a settings update. Rejected (silent no-op) while running.
    pub fn set_duration(&mut self, minutes: u32, phase: Option<Phase>) -> Option<Event> {
        if self.is_running {
            return None;
        }
        let minutes = minutes.clamp(1, 120);
        if let Some(phase) = phase {
            self.phase = phase;
        }
        self.time_left_secs = minutes.saturating_mul(60);
        Some(Event::DurationAdjusted {
            phase: self.phase,
            time_left_secs: self.time_left_secs,
            at: Utc::now(),
        })
    }

    /// Subtract one logical second. No-op unless running and not paused.
    ///
    /// Reaching zero completes the phase atomically within this call, so
    /// no observer ever sees an expired countdown with the old phase still
    /// active.
    pub fn tick(&mut self, settings: &Settings) -> Option<Event> {
        if !self.is_running || self.is_paused {
            return None;
        }
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        if self.time_left_secs == 0 {
            return Some(self.complete_phase(settings));
        }
        None
    }

    /// Advance to the next phase after the current one counted down.
    ///
    /// A completed Focus phase increments the cycle counter and credits
    /// its full configured duration to the ledger. The break after every
    /// `cycles_before_long_break`-th focus cycle is long.
    fn complete_phase(&mut self, settings: &Settings) -> Event {
        let completed = self.phase;
        let mut focused_secs = None;

        if completed.is_focus() {
            self.completed_focus_cycles += 1;
            focused_secs = Some(Phase::Focus.duration_secs(settings));
        }

        let next = match completed {
            Phase::Focus => {
                let threshold = settings.cycles_before_long_break.max(1);
                if self.completed_focus_cycles % threshold == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
        };

        self.phase = next;
        self.time_left_secs = next.duration_secs(settings);

        Event::PhaseCompleted {
            completed,
            next,
            focused_secs,
            completed_focus_cycles: self.completed_focus_cycles,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn starts_idle_with_full_focus_phase() {
        let engine = TimerEngine::new(&settings());
        assert_eq!(engine.phase(), Phase::Focus);
        assert!(!engine.is_running());
        assert!(!engine.is_paused());
        assert_eq!(engine.time_left_secs(), 25 * 60);
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = TimerEngine::new(&settings());
        assert!(engine.start().is_some());
        let first = engine.snapshot();
        assert!(engine.start().is_none());
        assert_eq!(engine.snapshot(), first);
    }

    #[test]
    fn pause_requires_running() {
        let mut engine = TimerEngine::new(&settings());
        assert!(engine.toggle_pause().is_none());
        engine.start();
        assert!(engine.toggle_pause().is_some());
        assert!(engine.is_paused());
        assert!(engine.toggle_pause().is_some());
        assert!(!engine.is_paused());
    }

    #[test]
    fn pause_does_not_touch_remaining_time() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        engine.start();
        engine.tick(&s);
        let left = engine.time_left_secs();
        engine.toggle_pause();
        assert_eq!(engine.time_left_secs(), left);
        engine.tick(&s);
        assert_eq!(engine.time_left_secs(), left);
    }

    #[test]
    fn tick_is_noop_while_idle() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        assert!(engine.tick(&s).is_none());
        assert_eq!(engine.time_left_secs(), 25 * 60);
    }

    #[test]
    fn focus_completion_selects_short_break() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        engine.start();
        engine.set_duration(1, None); // no-op while running
        assert_eq!(engine.time_left_secs(), 25 * 60);

        let event = run_out(&mut engine, &s);
        match event {
            Event::PhaseCompleted {
                completed,
                next,
                focused_secs,
                completed_focus_cycles,
                ..
            } => {
                assert_eq!(completed, Phase::Focus);
                assert_eq!(next, Phase::ShortBreak);
                assert_eq!(focused_secs, Some(25 * 60));
                assert_eq!(completed_focus_cycles, 1);
            }
            other => panic!("expected PhaseCompleted, got {other:?}"),
        }
        assert_eq!(engine.time_left_secs(), 5 * 60);
    }

    #[test]
    fn break_completion_returns_to_focus_without_counting() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        engine.start();
        run_out(&mut engine, &s); // Focus -> ShortBreak
        let cycles = engine.completed_focus_cycles();

        let event = run_out(&mut engine, &s);
        match event {
            Event::PhaseCompleted {
                completed,
                next,
                focused_secs,
                ..
            } => {
                assert_eq!(completed, Phase::ShortBreak);
                assert_eq!(next, Phase::Focus);
                assert_eq!(focused_secs, None);
            }
            other => panic!("expected PhaseCompleted, got {other:?}"),
        }
        assert_eq!(engine.completed_focus_cycles(), cycles);
    }

    #[test]
    fn every_fourth_focus_earns_long_break() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        engine.start();
        let mut breaks = Vec::new();
        // 5 full focus phases with their breaks in between.
        for _ in 0..5 {
            if let Event::PhaseCompleted { next, .. } = run_out(&mut engine, &s) {
                breaks.push(next);
            }
            run_out(&mut engine, &s); // finish the break
        }
        assert_eq!(
            breaks,
            vec![
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak,
                Phase::ShortBreak,
            ]
        );
    }

    #[test]
    fn reset_returns_to_idle_focus_but_keeps_cycles() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        engine.start();
        run_out(&mut engine, &s);
        assert_eq!(engine.completed_focus_cycles(), 1);

        engine.reset(&s);
        assert!(!engine.is_running());
        assert!(!engine.is_paused());
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.time_left_secs(), 25 * 60);
        assert_eq!(engine.completed_focus_cycles(), 1);
    }

    #[test]
    fn set_duration_applies_only_while_idle() {
        let s = settings();
        let mut engine = TimerEngine::new(&s);
        assert!(engine.set_duration(10, Some(Phase::ShortBreak)).is_some());
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert_eq!(engine.time_left_secs(), 10 * 60);

        engine.start();
        assert!(engine.set_duration(99, None).is_none());
        assert_eq!(engine.time_left_secs(), 10 * 60);
    }

    #[test]
    fn set_duration_clamps_minutes() {
        let mut engine = TimerEngine::new(&settings());
        engine.set_duration(0, None);
        assert_eq!(engine.time_left_secs(), 60);
        engine.set_duration(10_000, None);
        assert_eq!(engine.time_left_secs(), 120 * 60);
    }

    #[test]
    fn restore_repairs_paused_without_running() {
        let engine = TimerEngine::restore(Snapshot {
            phase: Phase::ShortBreak,
            is_running: false,
            is_paused: true,
            time_left_secs: 42,
            completed_focus_cycles: 3,
        });
        assert!(!engine.is_paused());
        assert_eq!(engine.time_left_secs(), 42);
        assert_eq!(engine.completed_focus_cycles(), 3);
    }

    /// Tick until the current phase completes, returning the completion event.
    fn run_out(engine: &mut TimerEngine, settings: &Settings) -> Event {
        for _ in 0..engine.time_left_secs() {
            if let Some(event) = engine.tick(settings) {
                return event;
            }
        }
        panic!("phase did not complete");
    }
}
