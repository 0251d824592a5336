use serde::{Deserialize, Serialize};

/// First rule identifier; rule ids are `RULE_ID_BASE + index` into the
/// blocked-site list at install time.
pub const RULE_ID_BASE: u32 = 1000;

/// A single redirect instruction: navigation to `host` (and its `www.`
/// form) is sent to the loopback address while the rule is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub id: u32,
    pub host: String,
}

impl RedirectRule {
    /// The `www.`-prefixed form, blocked alongside the bare host.
    pub fn www_host(&self) -> String {
        format!("www.{}", self.host)
    }
}

/// Derive the complete rule set from an ordered site list. Deterministic:
/// the same list always yields the same ids.
pub fn build_rules(sites: &[String]) -> Vec<RedirectRule> {
    sites
        .iter()
        .enumerate()
        .map(|(index, host)| RedirectRule {
            id: RULE_ID_BASE + index as u32,
            host: host.clone(),
        })
        .collect()
}
