//! Rule backends.
//!
//! A backend installs the derived rule set into whatever mechanism
//! actually intercepts navigation. The default is a managed block of
//! loopback entries in a hosts-format file; tests use the in-memory
//! backend.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::rules::RedirectRule;
use crate::error::BlockingError;

/// Markers delimiting the managed block in the hosts file. Everything
/// between them belongs to focusguard; everything else is never touched.
const BLOCK_BEGIN: &str = "# focusguard:begin";
const BLOCK_END: &str = "# focusguard:end";

/// Where blocked hostnames are redirected.
const REDIRECT_TARGET: &str = "127.0.0.1";

/// Seam between the synchronizer and the redirect mechanism.
///
/// `apply` must fully replace any previously installed set, and both
/// operations must be idempotent; the synchronizer reissues the complete
/// set on every Focus entry rather than diffing.
pub trait RuleBackend: Send {
    /// Install exactly this rule set, replacing whatever was installed.
    fn apply(&mut self, rules: &[RedirectRule]) -> Result<(), BlockingError>;

    /// Remove every installed rule.
    fn clear(&mut self) -> Result<(), BlockingError>;
}

/// Hosts-file backend: maintains a marker-delimited block of loopback
/// entries, one line per rule covering the bare and `www.` forms.
pub struct HostsBackend {
    path: PathBuf,
}

impl HostsBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend over the system hosts file, honoring the
    /// FOCUSGUARD_HOSTS_FILE override.
    pub fn from_env() -> Self {
        let path = std::env::var("FOCUSGUARD_HOSTS_FILE")
            .unwrap_or_else(|_| "/etc/hosts".to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, BlockingError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(BlockingError::ReadFailed {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, content: &str) -> Result<(), BlockingError> {
        std::fs::write(&self.path, content).map_err(|source| BlockingError::WriteFailed {
            path: self.path.clone(),
            source,
        })
    }

    /// Drop the managed block, keeping every foreign line byte-for-byte.
    fn strip_managed_block(content: &str) -> String {
        let mut kept = String::with_capacity(content.len());
        let mut inside = false;
        for line in content.lines() {
            if line.trim() == BLOCK_BEGIN {
                inside = true;
                continue;
            }
            if line.trim() == BLOCK_END {
                inside = false;
                continue;
            }
            if !inside {
                kept.push_str(line);
                kept.push('\n');
            }
        }
        kept
    }

    fn render_block(rules: &[RedirectRule]) -> String {
        let mut block = String::new();
        block.push_str(BLOCK_BEGIN);
        block.push('\n');
        for rule in rules {
            block.push_str(&format!(
                "{REDIRECT_TARGET} {} {} # rule {}\n",
                rule.host,
                rule.www_host(),
                rule.id
            ));
        }
        block.push_str(BLOCK_END);
        block.push('\n');
        block
    }
}

impl RuleBackend for HostsBackend {
    fn apply(&mut self, rules: &[RedirectRule]) -> Result<(), BlockingError> {
        let content = self.read()?;
        let mut next = Self::strip_managed_block(&content);
        if !rules.is_empty() {
            next.push_str(&Self::render_block(rules));
        }
        self.write(&next)
    }

    fn clear(&mut self) -> Result<(), BlockingError> {
        let content = self.read()?;
        self.write(&Self::strip_managed_block(&content))
    }
}

/// In-memory backend for tests and dry runs.
///
/// Clones share state, so a test can keep a handle while the synchronizer
/// owns another and observe what is installed.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    installed: Vec<RedirectRule>,
    fail: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed(&self) -> Vec<RedirectRule> {
        self.state.lock().expect("memory backend poisoned").installed.clone()
    }

    /// Make every subsequent call fail; exercises the best-effort paths.
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().expect("memory backend poisoned").fail = fail;
    }

    fn unavailable() -> BlockingError {
        BlockingError::WriteFailed {
            path: "<memory>".into(),
            source: std::io::Error::other("backend unavailable"),
        }
    }
}

impl RuleBackend for MemoryBackend {
    fn apply(&mut self, rules: &[RedirectRule]) -> Result<(), BlockingError> {
        let mut state = self.state.lock().expect("memory backend poisoned");
        if state.fail {
            return Err(Self::unavailable());
        }
        state.installed = rules.to_vec();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BlockingError> {
        let mut state = self.state.lock().expect("memory backend poisoned");
        if state.fail {
            return Err(Self::unavailable());
        }
        state.installed.clear();
        Ok(())
    }
}
