use super::backend::RuleBackend;
use super::rules::build_rules;

/// Keeps the installed rule set in step with the current phase.
///
/// Install recomputes and reissues the complete set from the site list
/// rather than diffing against what is installed, so no partial or stale
/// set can survive a phase transition. Failures are logged and left
/// alone: blocking is never load-bearing for timer correctness, and the
/// next transition will attempt sync again.
pub struct RuleSynchronizer {
    backend: Box<dyn RuleBackend>,
}

impl RuleSynchronizer {
    pub fn new(backend: Box<dyn RuleBackend>) -> Self {
        Self { backend }
    }

    /// Install the rule set derived from `sites`. Idempotent.
    pub fn install(&mut self, sites: &[String]) {
        let rules = build_rules(sites);
        let count = rules.len();
        match self.backend.apply(&rules) {
            Ok(()) => tracing::debug!(rules = count, "blocking rules installed"),
            Err(e) => tracing::warn!(error = %e, "failed to install blocking rules"),
        }
    }

    /// Remove every installed rule. Idempotent.
    pub fn remove(&mut self) {
        match self.backend.clear() {
            Ok(()) => tracing::debug!("blocking rules removed"),
            Err(e) => tracing::warn!(error = %e, "failed to remove blocking rules"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocking::backend::MemoryBackend;
    use crate::blocking::rules::RULE_ID_BASE;

    fn sites(hosts: &[&str]) -> Vec<String> {
        hosts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn install_reissues_the_complete_set() {
        let backend = MemoryBackend::new();
        let mut sync = RuleSynchronizer::new(Box::new(backend.clone()));

        sync.install(&sites(&["reddit.com", "x.com"]));
        assert_eq!(backend.installed().len(), 2);

        sync.install(&sites(&["x.com"]));
        let installed = backend.installed();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].id, RULE_ID_BASE);
        assert_eq!(installed[0].host, "x.com");
    }

    #[test]
    fn remove_is_idempotent() {
        let backend = MemoryBackend::new();
        let mut sync = RuleSynchronizer::new(Box::new(backend.clone()));
        sync.install(&sites(&["reddit.com"]));
        sync.remove();
        sync.remove();
        assert!(backend.installed().is_empty());
    }

    #[test]
    fn failures_do_not_panic_or_propagate() {
        let backend = MemoryBackend::new();
        backend.set_fail(true);
        let mut sync = RuleSynchronizer::new(Box::new(backend.clone()));
        sync.install(&sites(&["reddit.com"]));
        sync.remove();
        assert!(backend.installed().is_empty());
    }
}
