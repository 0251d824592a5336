//! Phase-synchronized site blocking.
//!
//! The synchronizer derives a redirect rule set from the blocked-site list
//! and keeps it installed exactly while a Focus session is running.
//! Blocking is best-effort: a backend failure is logged and never gates
//! the timer.

mod backend;
mod rules;
mod sync;

pub use backend::{HostsBackend, MemoryBackend, RuleBackend};
pub use rules::{build_rules, RedirectRule, RULE_ID_BASE};
pub use sync::RuleSynchronizer;
