use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::FullState;
use crate::timer::Phase;

/// Every state change in the system produces an Event.
/// The CLI daemon logs them; UI collaborators subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        paused: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A phase counted down to zero and the next phase was selected.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        /// Focused seconds credited to the ledger; only set when the
        /// completed phase was Focus.
        focused_secs: Option<u32>,
        completed_focus_cycles: u32,
        at: DateTime<Utc>,
    },
    /// Manual pre-session adjustment of the remaining time.
    DurationAdjusted {
        phase: Phase,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
    /// A collaborator should surface a notification with this message.
    /// Delivery is out of core scope.
    NotificationRequested {
        message: String,
        chime: bool,
        at: DateTime<Utc>,
    },
    /// Full-state broadcast emitted after every mutation.
    StateUpdate {
        state: FullState,
        at: DateTime<Utc>,
    },
}
