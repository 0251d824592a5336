//! TOML-based user settings.
//!
//! Stores the phase durations, the long-break cycle threshold, the
//! notification toggles and the blocked-site list. Field names match the
//! wire names used on the command/broadcast surface, so the file at
//! `~/.config/focusguard/config.toml` reads the same as a `getState`
//! response.
//!
//! Numeric updates are clamped to their documented ranges rather than
//! rejected; hostnames are normalized before they are stored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{Result, SettingsError};

/// Inclusive clamping ranges for the numeric settings.
const FOCUS_MINUTES_RANGE: (u32, u32) = (1, 120);
const SHORT_BREAK_MINUTES_RANGE: (u32, u32) = (1, 60);
const LONG_BREAK_MINUTES_RANGE: (u32, u32) = (1, 120);
const CYCLES_RANGE: (u32, u32) = (1, 10);

/// User-configurable settings, persisted separately from the timer
/// snapshot on their own update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
    /// Consumed by UI collaborators; gates the notification-request event.
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    /// Consumed by UI collaborators; carried opaquely by the core.
    #[serde(default = "default_true")]
    pub enable_chime: bool,
    /// Ordered list of distinct normalized hostnames.
    #[serde(default = "default_blocked_sites")]
    pub blocked_sites: Vec<String>,
}

/// Partial settings update, merged field-by-field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub focus_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub cycles_before_long_break: Option<u32>,
    pub enable_notifications: Option<bool>,
    pub enable_chime: Option<bool>,
    pub blocked_sites: Option<Vec<String>>,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_cycles_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_blocked_sites() -> Vec<String> {
    ["facebook.com", "instagram.com", "reddit.com", "x.com"]
        .map(String::from)
        .to_vec()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            cycles_before_long_break: default_cycles_before_long_break(),
            enable_notifications: true,
            enable_chime: true,
            blocked_sites: default_blocked_sites(),
        }
    }
}

/// Reduce a raw site entry to a bare hostname: strip the scheme, a leading
/// `www.`, surrounding whitespace and any trailing path. Returns `None`
/// for entries that normalize to nothing.
pub fn normalize_host(raw: &str) -> Option<String> {
    let mut host = raw.trim();
    for scheme in ["https://", "http://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            host = rest;
            break;
        }
    }
    host = host.strip_prefix("www.").unwrap_or(host);
    if let Some(slash) = host.find('/') {
        host = &host[..slash];
    }
    let host = host.trim().to_ascii_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Normalize a site list: clean each entry and drop duplicates, keeping
/// the order of first occurrence.
pub fn normalize_sites(raw: &[String]) -> Vec<String> {
    let mut sites = Vec::new();
    for entry in raw {
        if let Some(host) = normalize_host(entry) {
            if !sites.contains(&host) {
                sites.push(host);
            }
        }
    }
    sites
}

fn clamp(value: u32, (min, max): (u32, u32)) -> u32 {
    value.clamp(min, max)
}

impl Settings {
    /// Merge a partial update, clamping numeric values and normalizing the
    /// site list. Does not persist; callers save explicitly.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.focus_minutes {
            self.focus_minutes = clamp(v, FOCUS_MINUTES_RANGE);
        }
        if let Some(v) = patch.short_break_minutes {
            self.short_break_minutes = clamp(v, SHORT_BREAK_MINUTES_RANGE);
        }
        if let Some(v) = patch.long_break_minutes {
            self.long_break_minutes = clamp(v, LONG_BREAK_MINUTES_RANGE);
        }
        if let Some(v) = patch.cycles_before_long_break {
            self.cycles_before_long_break = clamp(v, CYCLES_RANGE);
        }
        if let Some(v) = patch.enable_notifications {
            self.enable_notifications = v;
        }
        if let Some(v) = patch.enable_chime {
            self.enable_chime = v;
        }
        if let Some(v) = patch.blocked_sites {
            self.blocked_sites = normalize_sites(&v);
        }
    }

    /// Default on-disk location: `<data_dir>/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default settings cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load from `path`, writing defaults there on first run.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings = toml::from_str(&content).map_err(|e| {
                    SettingsError::ParseFailed(format!("{}: {e}", path.display()))
                })?;
                Ok(settings.normalized())
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SettingsError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| SettingsError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from the default location, falling back to defaults on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Clamp every numeric field and normalize the site list. Applied to
    /// whatever was read from disk, so a hand-edited file cannot smuggle
    /// out-of-range values in.
    fn normalized(mut self) -> Self {
        self.focus_minutes = clamp(self.focus_minutes, FOCUS_MINUTES_RANGE);
        self.short_break_minutes = clamp(self.short_break_minutes, SHORT_BREAK_MINUTES_RANGE);
        self.long_break_minutes = clamp(self.long_break_minutes, LONG_BREAK_MINUTES_RANGE);
        self.cycles_before_long_break = clamp(self.cycles_before_long_break, CYCLES_RANGE);
        self.blocked_sites = normalize_sites(&self.blocked_sites);
        self
    }

    /// Get a settings value as string by wire-name key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by wire-name key, parsing `value` against the
    /// existing field's type. Clamping and normalization apply afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be
    /// parsed as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| SettingsError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| SettingsError::ParseFailed("settings are not an object".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| SettingsError::ParseFailed(format!("{key}: {e}")))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .parse::<u64>()
                    .map_err(|e| SettingsError::ParseFailed(format!("{key}: {e}")))?;
                serde_json::Value::Number(n.into())
            }
            serde_json::Value::Array(_) => serde_json::from_str(value)
                .map_err(|e| SettingsError::ParseFailed(format!("{key}: {e}")))?,
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        *self = serde_json::from_value::<Settings>(json)
            .map_err(|e| SettingsError::ParseFailed(e.to_string()))?
            .normalized();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Settings = toml::from_str("focusMinutes = 50\n").unwrap();
        assert_eq!(parsed.focus_minutes, 50);
        assert_eq!(parsed.short_break_minutes, 5);
        assert_eq!(parsed.cycles_before_long_break, 4);
        assert!(parsed.enable_notifications);
    }

    #[test]
    fn apply_clamps_numeric_fields() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            focus_minutes: Some(500),
            short_break_minutes: Some(0),
            long_break_minutes: Some(121),
            cycles_before_long_break: Some(0),
            ..Default::default()
        });
        assert_eq!(settings.focus_minutes, 120);
        assert_eq!(settings.short_break_minutes, 1);
        assert_eq!(settings.long_break_minutes, 120);
        assert_eq!(settings.cycles_before_long_break, 1);
    }

    #[test]
    fn apply_leaves_unset_fields_alone() {
        let mut settings = Settings::default();
        settings.apply(SettingsPatch {
            enable_chime: Some(false),
            ..Default::default()
        });
        assert_eq!(settings.focus_minutes, 25);
        assert!(!settings.enable_chime);
        assert!(settings.enable_notifications);
    }

    #[test]
    fn normalize_host_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_host("https://www.Example.com/feed/"),
            Some("example.com".into())
        );
        assert_eq!(normalize_host("  reddit.com  "), Some("reddit.com".into()));
        assert_eq!(normalize_host("http://x.com"), Some("x.com".into()));
        assert_eq!(normalize_host("   "), None);
        assert_eq!(normalize_host("https://"), None);
    }

    #[test]
    fn normalize_sites_dedupes_preserving_order() {
        let raw = vec![
            "reddit.com".to_string(),
            "https://www.reddit.com".to_string(),
            "x.com".to_string(),
            "".to_string(),
            "reddit.com/r/rust".to_string(),
        ];
        assert_eq!(normalize_sites(&raw), vec!["reddit.com", "x.com"]);
    }

    #[test]
    fn load_from_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn load_from_clamps_hand_edited_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "focusMinutes = 999\nblockedSites = [\"https://www.reddit.com\"]\n",
        )
        .unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.focus_minutes, 120);
        assert_eq!(settings.blocked_sites, vec!["reddit.com"]);
    }

    #[test]
    fn get_returns_wire_name_values() {
        let settings = Settings::default();
        assert_eq!(settings.get("focusMinutes").as_deref(), Some("25"));
        assert_eq!(settings.get("enableChime").as_deref(), Some("true"));
        assert!(settings.get("missingKey").is_none());
    }

    #[test]
    fn set_parses_and_clamps() {
        let mut settings = Settings::default();
        settings.set("focusMinutes", "45").unwrap();
        assert_eq!(settings.focus_minutes, 45);
        settings.set("focusMinutes", "999").unwrap();
        assert_eq!(settings.focus_minutes, 120);
        settings
            .set("blockedSites", r#"["https://www.news.ycombinator.com"]"#)
            .unwrap();
        assert_eq!(settings.blocked_sites, vec!["news.ycombinator.com"]);
        assert!(settings.set("nonexistent", "1").is_err());
        assert!(settings.set("focusMinutes", "abc").is_err());
    }
}
