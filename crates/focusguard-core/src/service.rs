//! The timer service: single writer over the engine, the rule
//! synchronizer, the stats aggregator and storage.
//!
//! External commands and the periodic tick both enter here and are applied
//! sequentially, so a tick that crosses zero finishes its whole
//! transition (rule sync, stat recording, broadcast) before the next
//! stimulus is seen. Persistence and rule installation are best-effort:
//! failures are logged and the in-memory state keeps ticking.

use std::path::PathBuf;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::blocking::{RuleBackend, RuleSynchronizer};
use crate::events::Event;
use crate::stats::StatsAggregator;
use crate::storage::{Database, Settings, SettingsPatch};
use crate::timer::{Phase, Snapshot, TimerEngine};

/// Broadcast channel capacity; slow subscribers lose old events, never
/// block the writer.
const EVENT_CAPACITY: usize = 64;

/// The command surface. Wire names match the original message protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    GetState,
    StartTimer,
    PauseTimer,
    ResetTimer,
    UpdateSettings { settings: SettingsPatch },
    SetTimerDuration {
        minutes: u32,
        #[serde(default)]
        mode: Option<Phase>,
    },
}

/// Synchronous command response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    State(Box<FullState>),
    Ack { success: bool },
}

/// The full broadcast state: timer snapshot with settings embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullState {
    #[serde(flatten)]
    pub timer: Snapshot,
    pub settings: Settings,
}

/// Single-writer service owning all mutable state.
pub struct TimerService {
    engine: TimerEngine,
    settings: Settings,
    settings_path: PathBuf,
    stats: StatsAggregator,
    sync: RuleSynchronizer,
    db: Database,
    events: broadcast::Sender<Event>,
}

impl TimerService {
    /// Build the service, running the recovery sequence: restore the timer
    /// snapshot (fresh engine on first run or unreadable snapshot), load
    /// the stats counters, roll the day over if needed, and re-sync the
    /// rule set with the restored phase.
    pub fn new(
        db: Database,
        settings: Settings,
        settings_path: PathBuf,
        backend: Box<dyn RuleBackend>,
    ) -> Self {
        let engine = match db.load_snapshot() {
            Ok(Some(snapshot)) => TimerEngine::restore(snapshot),
            Ok(None) => TimerEngine::new(&settings),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load timer snapshot, starting fresh");
                TimerEngine::new(&settings)
            }
        };

        let mut stats = StatsAggregator::load(&db);
        stats.rollover_if_needed(&db, Local::now().date_naive());

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut service = Self {
            engine,
            settings,
            settings_path,
            stats,
            sync: RuleSynchronizer::new(backend),
            db,
            events,
        };
        service.sync_rules();
        service
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn full_state(&self) -> FullState {
        FullState {
            timer: self.engine.snapshot(),
            settings: self.settings.clone(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Subscribe to the event broadcast. Zero subscribers is fine.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one command synchronously. Commands from a disallowed state
    /// are silent no-ops; the response still reports success.
    pub fn dispatch(&mut self, command: Command) -> Response {
        match command {
            Command::GetState => Response::State(Box::new(self.full_state())),
            Command::StartTimer => {
                if let Some(event) = self.engine.start() {
                    if self.engine.phase().is_focus() {
                        self.sync.install(&self.settings.blocked_sites);
                    }
                    self.emit(event);
                }
                self.broadcast_state();
                Response::Ack { success: true }
            }
            Command::PauseTimer => {
                if let Some(event) = self.engine.toggle_pause() {
                    self.emit(event);
                }
                self.broadcast_state();
                Response::Ack { success: true }
            }
            Command::ResetTimer => {
                if let Some(event) = self.engine.reset(&self.settings) {
                    self.emit(event);
                }
                // Removal always wins, whatever state we were in.
                self.sync.remove();
                self.broadcast_state();
                Response::Ack { success: true }
            }
            Command::UpdateSettings { settings } => {
                self.settings.apply(settings);
                if let Err(e) = self.settings.save_to(&self.settings_path) {
                    tracing::warn!(error = %e, "failed to persist settings");
                }
                self.emit(Event::SettingsUpdated { at: Utc::now() });
                self.broadcast_state();
                Response::Ack { success: true }
            }
            Command::SetTimerDuration { minutes, mode } => {
                if let Some(event) = self.engine.set_duration(minutes, mode) {
                    self.emit(event);
                    self.broadcast_state();
                }
                Response::Ack { success: true }
            }
        }
    }

    // ── Tick path ────────────────────────────────────────────────────

    /// One logical second. Called by the external scheduler at ~1 Hz; this
    /// component never assumes the calls are evenly spaced.
    pub fn tick(&mut self) {
        if !self.engine.is_running() || self.engine.is_paused() {
            return;
        }

        if let Some(event) = self.engine.tick(&self.settings) {
            self.handle_completion(&event);
            self.emit(event);
        }
        self.broadcast_state();
    }

    fn handle_completion(&mut self, event: &Event) {
        let Event::PhaseCompleted {
            completed,
            next,
            focused_secs,
            ..
        } = event
        else {
            return;
        };

        tracing::info!(?completed, ?next, "phase completed");

        if self.settings.enable_notifications {
            self.emit(Event::NotificationRequested {
                message: completed.completion_message().to_string(),
                chime: self.settings.enable_chime,
                at: Utc::now(),
            });
        }

        if let Some(secs) = focused_secs {
            self.stats
                .record_focused_seconds(&self.db, Local::now().date_naive(), *secs);
        }

        match next {
            Phase::Focus => self.sync.install(&self.settings.blocked_sites),
            Phase::ShortBreak | Phase::LongBreak => self.sync.remove(),
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Durably record the timer snapshot. Runs on the save cadence and at
    /// shutdown; a failure only widens the restart gap.
    pub fn save_snapshot(&self) {
        if let Err(e) = self.db.save_snapshot(&self.engine.snapshot()) {
            tracing::warn!(error = %e, "failed to save timer snapshot");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn sync_rules(&mut self) {
        if self.engine.is_running() && self.engine.phase().is_focus() {
            self.sync.install(&self.settings.blocked_sites);
        } else {
            self.sync.remove();
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn broadcast_state(&self) {
        self.emit(Event::StateUpdate {
            state: self.full_state(),
            at: Utc::now(),
        });
    }
}
