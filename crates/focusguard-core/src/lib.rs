//! # Focusguard Core Library
//!
//! Core business logic for the Focusguard focus timer: a background engine
//! that drives the work/break cycle, keeps hostname-blocking rules in step
//! with the current phase, and maintains a persistent ledger of focused
//! time. The CLI binary is a thin layer over this library; all operations
//! are available without any UI.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a caller-driven state machine; an external
//!   scheduler invokes `tick()` at ~1 Hz and each call subtracts one
//!   logical second
//! - **Blocking**: derives a redirect rule set from the blocked-site list
//!   and installs it exactly while a Focus session runs
//! - **Stats**: day-scoped focus counter plus an append-only per-day
//!   ledger with rollover detection
//! - **Storage**: SQLite snapshot/ledger persistence and TOML settings
//! - **Service**: the single writer tying it together behind a command
//!   dispatch surface and an event broadcast
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerService`]: command dispatch, tick path, broadcast
//! - [`Database`]: snapshot and ledger persistence
//! - [`Settings`]: user configuration management

pub mod blocking;
pub mod error;
pub mod events;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timer;

pub use blocking::{HostsBackend, MemoryBackend, RuleBackend, RuleSynchronizer};
pub use error::{BlockingError, CoreError, DatabaseError, SettingsError};
pub use events::Event;
pub use service::{Command, FullState, Response, TimerService};
pub use stats::StatsAggregator;
pub use storage::{Database, Settings, SettingsPatch};
pub use timer::{Phase, Snapshot, TimerEngine};
