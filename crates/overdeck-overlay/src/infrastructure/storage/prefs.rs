//! TOML-based preference persistence for the overlay host.
//!
//! Reads and writes [`Prefs`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Overdeck\prefs.toml`
//! - Linux:    `~/.config/overdeck/prefs.toml`
//! - macOS:    `~/Library/Application Support/Overdeck/prefs.toml`
//!
//! Example file:
//!
//! ```toml
//! [overlay]
//! size_m = 0.17
//! anchor = "head"
//! multi_click_window_secs = 0.5
//!
//! [modules]
//! extra_roots = ["/srv/overdeck-modules"]
//! scan_concurrency = 4
//!
//! [logging]
//! directive = "info"
//! ```
//!
//! # Serde default values
//!
//! Every section struct carries `#[serde(default)]`, so any field or whole
//! section absent from the TOML file falls back to its `Default` value.  This
//! allows the app to work correctly on first run (before a prefs file exists)
//! and when upgrading from an older file that is missing newer fields.
//!
//! # Recovery
//!
//! Loading never fails.  A missing file yields defaults; an unreadable or
//! unparseable file is renamed to `prefs.toml.bak-<timestamp>` so the broken
//! content survives for inspection, and defaults are returned.  The caller is
//! expected to surface [`LoadOutcome::recovered`] to the user.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use overdeck_core::timing::Deadline;

use crate::application::session::OverlayAnchor;

/// Delay between the last preference edit and the autosave write.
const AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(3);

/// Error type for preference file operations.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing prefs at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The prefs could not be serialized to TOML.
    #[error("failed to serialize prefs: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Preference schema types ───────────────────────────────────────────────────

/// Top-level preferences stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prefs {
    pub overlay: OverlayPrefs,
    pub modules: ModulePrefs,
    pub logging: LoggingPrefs,
}

/// Overlay placement and input shaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayPrefs {
    /// Overlay width in metres; clamped into the permitted range on apply.
    pub size_m: f32,
    /// Tracked-space attachment of the panel.
    pub anchor: OverlayAnchor,
    /// Multi-click merge window in seconds.
    pub multi_click_window_secs: f32,
}

/// Module deck discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModulePrefs {
    /// Extra module roots scanned in addition to the platform defaults.
    pub extra_roots: Vec<PathBuf>,
    /// Maximum number of module folders scanned concurrently.
    pub scan_concurrency: usize,
}

/// Log filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingPrefs {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub directive: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_size_m() -> f32 {
    0.17
}
fn default_multi_click_window_secs() -> f32 {
    0.5
}
fn default_scan_concurrency() -> usize {
    4
}
fn default_directive() -> String {
    "info".to_string()
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            overlay: OverlayPrefs::default(),
            modules: ModulePrefs::default(),
            logging: LoggingPrefs::default(),
        }
    }
}

impl Default for OverlayPrefs {
    fn default() -> Self {
        Self {
            size_m: default_size_m(),
            anchor: OverlayAnchor::Head,
            multi_click_window_secs: default_multi_click_window_secs(),
        }
    }
}

impl Default for ModulePrefs {
    fn default() -> Self {
        Self {
            extra_roots: Vec::new(),
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

impl Default for LoggingPrefs {
    fn default() -> Self {
        Self {
            directive: default_directive(),
        }
    }
}

// ── Prefs repository ──────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the prefs file.
///
/// # Errors
///
/// Returns [`PrefsError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn prefs_dir() -> Result<PathBuf, PrefsError> {
    platform_config_dir().ok_or(PrefsError::NoPlatformConfigDir)
}

/// Resolves the full path to the prefs file.
///
/// # Errors
///
/// Returns [`PrefsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn prefs_file_path() -> Result<PathBuf, PrefsError> {
    Ok(prefs_dir()?.join("prefs.toml"))
}

/// What [`load_prefs`] found on disk.
#[derive(Debug)]
pub struct LoadOutcome {
    pub prefs: Prefs,
    /// Set when a broken file was moved aside and defaults restored.
    pub recovered: Option<PrefsRecovery>,
}

/// Details of a preference-file recovery.
#[derive(Debug)]
pub struct PrefsRecovery {
    /// Where the broken file was moved to; `None` when the rename failed.
    pub backup: Option<PathBuf>,
    pub reason: String,
}

/// Loads preferences from `path`.  Never fails: a missing file yields
/// defaults, a broken one is moved aside first.
pub fn load_prefs(path: &Path) -> LoadOutcome {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<Prefs>(&content) {
            Ok(prefs) => LoadOutcome {
                prefs,
                recovered: None,
            },
            Err(e) => LoadOutcome {
                prefs: Prefs::default(),
                recovered: Some(PrefsRecovery {
                    backup: move_broken_file_aside(path),
                    reason: format!("parse error: {e}"),
                }),
            },
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LoadOutcome {
            prefs: Prefs::default(),
            recovered: None,
        },
        Err(e) => LoadOutcome {
            prefs: Prefs::default(),
            recovered: Some(PrefsRecovery {
                backup: move_broken_file_aside(path),
                reason: format!("read error: {e}"),
            }),
        },
    }
}

fn move_broken_file_aside(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let backup = path.with_file_name(format!("{file_name}.bak-{timestamp}"));
    std::fs::rename(path, &backup).ok()?;
    Some(backup)
}

/// Persists `prefs` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PrefsError::Io`] for file-system failures or
/// [`PrefsError::Serialize`] if serialization fails.
pub fn save_prefs(path: &Path, prefs: &Prefs) -> Result<(), PrefsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| PrefsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(prefs)?;
    std::fs::write(path, content).map_err(|source| PrefsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the `Overdeck`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Overdeck"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("overdeck"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/Overdeck
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Overdeck")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── In-memory store with debounced autosave ───────────────────────────────────

/// Current preferences plus a debounced autosave deadline.
///
/// Edits go through [`PrefsStore::modify`]; the write happens once the edit
/// burst has been quiet for the debounce interval, or immediately on
/// [`PrefsStore::flush`] at shutdown.
pub struct PrefsStore {
    path: PathBuf,
    prefs: Prefs,
    dirty: bool,
    save_at: Deadline,
}

impl PrefsStore {
    pub fn new(path: PathBuf, prefs: Prefs) -> Self {
        PrefsStore {
            path,
            prefs,
            dirty: false,
            save_at: Deadline::new(),
        }
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    /// Applies an edit and re-arms the autosave debounce.
    pub fn modify(&mut self, now: Instant, edit: impl FnOnce(&mut Prefs)) {
        edit(&mut self.prefs);
        self.dirty = true;
        self.save_at.schedule(now + AUTOSAVE_DEBOUNCE);
    }

    /// Writes pending edits once their debounce deadline has passed.
    pub fn maintain(&mut self, now: Instant) {
        if self.save_at.fire(now) && self.dirty {
            self.persist();
        }
    }

    /// Writes pending edits immediately; call on shutdown.
    pub fn flush(&mut self) {
        self.save_at.cancel();
        if self.dirty {
            self.persist();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn persist(&mut self) {
        match save_prefs(&self.path, &self.prefs) {
            Ok(()) => {
                self.dirty = false;
                debug!(path = %self.path.display(), "preferences saved");
            }
            Err(e) => warn!(error = %e, "failed to save preferences"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_prefs_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("overdeck_prefs_{tag}_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("prefs.toml")
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_prefs_default_has_expected_values() {
        // Arrange / Act
        let prefs = Prefs::default();

        // Assert
        assert!((prefs.overlay.size_m - 0.17).abs() < f32::EPSILON);
        assert_eq!(prefs.overlay.anchor, OverlayAnchor::Head);
        assert!((prefs.overlay.multi_click_window_secs - 0.5).abs() < f32::EPSILON);
        assert!(prefs.modules.extra_roots.is_empty());
        assert_eq!(prefs.modules.scan_concurrency, 4);
        assert_eq!(prefs.logging.directive, "info");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let prefs: Prefs = toml::from_str("").expect("deserialize empty");
        assert_eq!(prefs, Prefs::default());
    }

    #[test]
    fn test_deserialize_partial_overlay_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[overlay]
size_m = 0.25
anchor = "left-hand"
"#;

        // Act
        let prefs: Prefs = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert!((prefs.overlay.size_m - 0.25).abs() < f32::EPSILON);
        assert_eq!(prefs.overlay.anchor, OverlayAnchor::LeftHand);
        // Unspecified fields keep their defaults
        assert!((prefs.overlay.multi_click_window_secs - 0.5).abs() < f32::EPSILON);
        assert_eq!(prefs.modules.scan_concurrency, 4);
    }

    #[test]
    fn test_prefs_round_trips_through_toml() {
        // Arrange
        let mut prefs = Prefs::default();
        prefs.overlay.anchor = OverlayAnchor::RightHand;
        prefs.modules.extra_roots.push(PathBuf::from("/srv/mods"));
        prefs.logging.directive = "overdeck_core=trace".to_string();

        // Act
        let toml_str = toml::to_string_pretty(&prefs).expect("serialize");
        let restored: Prefs = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(prefs, restored);
        assert!(
            toml_str.contains("right-hand"),
            "anchor must serialize kebab-case, got:\n{toml_str}"
        );
    }

    // ── load_prefs ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_prefs_missing_file_returns_defaults_without_recovery() {
        let path = temp_prefs_path("missing");
        let outcome = load_prefs(&path);
        assert_eq!(outcome.prefs, Prefs::default());
        assert!(outcome.recovered.is_none());
    }

    #[test]
    fn test_load_prefs_corrupt_file_backs_up_and_returns_defaults() {
        // Arrange
        let path = temp_prefs_path("corrupt");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let outcome = load_prefs(&path);

        // Assert
        assert_eq!(outcome.prefs, Prefs::default());
        let recovery = outcome.recovered.expect("corrupt file must recover");
        assert!(recovery.reason.contains("parse error"));
        let backup = recovery.backup.expect("backup rename should succeed");
        assert!(backup.exists(), "backup file must exist");
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("prefs.toml.bak-"),
            "backup keeps the original name plus a timestamp suffix"
        );
        assert!(!path.exists(), "broken original must be moved aside");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_save_and_load_round_trip() {
        // Arrange
        let path = temp_prefs_path("round_trip");
        let mut prefs = Prefs::default();
        prefs.overlay.size_m = 0.3;
        prefs.logging.directive = "debug".to_string();

        // Act
        save_prefs(&path, &prefs).expect("save");
        let outcome = load_prefs(&path);

        // Assert
        assert_eq!(outcome.prefs, prefs);
        assert!(outcome.recovered.is_none());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_save_prefs_creates_parent_directories() {
        // Arrange – a nested path that does not exist yet
        let path = temp_prefs_path("nested")
            .parent()
            .unwrap()
            .join("deeper")
            .join("prefs.toml");

        // Act
        save_prefs(&path, &Prefs::default()).expect("save into fresh directory");

        // Assert
        assert!(path.exists());

        std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap()).ok();
    }

    // ── PrefsStore debounce ───────────────────────────────────────────────────

    #[test]
    fn test_store_autosave_waits_for_debounce() {
        // Arrange
        let path = temp_prefs_path("debounce");
        let mut store = PrefsStore::new(path.clone(), Prefs::default());
        let t0 = Instant::now();

        // Act – edit, then maintain before the debounce elapses
        store.modify(t0, |p| p.overlay.size_m = 0.4);
        store.maintain(t0 + Duration::from_secs(2));

        // Assert – nothing written yet
        assert!(store.is_dirty());
        assert!(!path.exists());

        // Act – past the debounce
        store.maintain(t0 + Duration::from_millis(3100));

        // Assert
        assert!(!store.is_dirty());
        let outcome = load_prefs(&path);
        assert!((outcome.prefs.overlay.size_m - 0.4).abs() < f32::EPSILON);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_store_edit_burst_restarts_debounce() {
        // Arrange
        let path = temp_prefs_path("burst");
        let mut store = PrefsStore::new(path.clone(), Prefs::default());
        let t0 = Instant::now();

        // Act – a second edit two seconds in restarts the window
        store.modify(t0, |p| p.overlay.size_m = 0.4);
        store.modify(t0 + Duration::from_secs(2), |p| p.overlay.size_m = 0.5);
        store.maintain(t0 + Duration::from_secs(4));

        // Assert – first deadline (t0+3s) must not have fired
        assert!(!path.exists(), "write must wait for the restarted debounce");

        store.maintain(t0 + Duration::from_millis(5100));
        assert!((load_prefs(&path).prefs.overlay.size_m - 0.5).abs() < f32::EPSILON);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_store_flush_writes_immediately() {
        // Arrange
        let path = temp_prefs_path("flush");
        let mut store = PrefsStore::new(path.clone(), Prefs::default());
        store.modify(Instant::now(), |p| p.modules.scan_concurrency = 8);

        // Act
        store.flush();

        // Assert
        assert!(!store.is_dirty());
        assert_eq!(load_prefs(&path).prefs.modules.scan_concurrency, 8);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_store_flush_without_edits_writes_nothing() {
        let path = temp_prefs_path("clean_flush");
        let mut store = PrefsStore::new(path.clone(), Prefs::default());
        store.flush();
        assert!(!path.exists());
    }

    // ── prefs_file_path ───────────────────────────────────────────────────────

    #[test]
    fn test_prefs_file_path_ends_with_prefs_toml() {
        if let Ok(path) = prefs_file_path() {
            assert!(
                path.ends_with("prefs.toml"),
                "prefs file must be named prefs.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir (e.g. in a stripped CI env) is also acceptable.
    }
}
