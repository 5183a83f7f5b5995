//! Module deck: discovery, manifests, validation, and the loaded-module
//! registry.
//!
//! A *module* is a folder dropped into one of the module roots that the
//! overlay can launch as an external process.  Each folder either carries a
//! `module.json` manifest or is simple enough to be inferred (exactly one
//! executable file).
//!
//! # Manifest format
//!
//! `module.json` is parsed with `serde_json`; every field has a default so a
//! minimal manifest stays minimal:
//!
//! ```json
//! {
//!   "name": "screenshot",
//!   "author": "someone",
//!   "command": {
//!     "exec_mode": "normal",
//!     "file_name": "grab.sh",
//!     "timeout_secs": 5,
//!     "exit_codes": [{ "min": 64, "max": 79, "class": "warning" }]
//!   },
//!   "icon": "icon.png"
//! }
//! ```
//!
//! # Scan pipeline
//!
//! ```text
//! roots ──► candidate folders (dedup) ──► per-folder scan (semaphore-limited)
//!                                              │
//!                          manifest | inference | failure message
//!                                              │
//!                                     validation messages
//!                                              │
//!                        ModuleScanOutcome + module_scan_report.txt
//! ```
//!
//! Per-folder failures are isolated: one broken module never aborts the scan.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Manifest file name looked up in each module folder.
pub const MANIFEST_FILE: &str = "module.json";
/// Per-folder scan report file name.
pub const SCAN_REPORT_FILE: &str = "module_scan_report.txt";

/// Maximum length of module and parameter names.
const NAME_MAX: usize = 16;
/// Maximum length of parameter descriptions.
const PARAM_DESCRIPTION_MAX: usize = 100;

// ── Manifest schema types ─────────────────────────────────────────────────────

/// How a module's command is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Launched once on demand.
    #[default]
    Normal,
    /// Re-launched on a fixed interval while loaded.
    Repeat,
}

/// Severity bucket a finished module run is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    Warning,
    Error,
}

impl ExitClass {
    /// Parses a manifest class name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "success" => Some(ExitClass::Success),
            "warning" => Some(ExitClass::Warning),
            "error" => Some(ExitClass::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExitClass::Success => "success",
            ExitClass::Warning => "warning",
            ExitClass::Error => "error",
        };
        f.write_str(name)
    }
}

/// Inclusive exit-code range mapped to a class name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitCodeRange {
    pub min: i32,
    pub max: i32,
    pub class: String,
}

/// One declared command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestParameter {
    pub name: String,
    pub description: String,
    /// Current value passed to the process as one argument.
    pub value: String,
}

/// The launchable command of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestCommand {
    pub exec_mode: ExecMode,
    /// Executable file name, relative to the module folder.
    pub file_name: String,
    pub arguments: Vec<ManifestParameter>,
    /// Wall-clock limit for one run, in seconds.
    pub timeout_secs: u64,
    /// Re-launch interval for [`ExecMode::Repeat`] modules, in seconds.
    pub repeat_interval_secs: u64,
    pub exit_codes: Vec<ExitCodeRange>,
}

impl Default for ManifestCommand {
    fn default() -> Self {
        ManifestCommand {
            exec_mode: ExecMode::Normal,
            file_name: String::new(),
            arguments: Vec::new(),
            timeout_secs: default_timeout_secs(),
            repeat_interval_secs: default_repeat_interval_secs(),
            exit_codes: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    3
}
fn default_repeat_interval_secs() -> u64 {
    10
}

/// Parsed `module.json` contents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleManifest {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
    pub repository: String,
    pub command: ManifestCommand,
    /// Icon file name, relative to the module folder.  Empty when none.
    pub icon: String,
}

// ── Folder facts, inference, and validation ───────────────────────────────────

/// What the scanner learned about one file in a module folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub name: String,
    pub executable: bool,
    pub image: bool,
}

/// Windows executability heuristic; Unix uses permission bits instead.
fn is_executable_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["exe", "bat", "cmd", "com"]
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["png", "jpg", "jpeg", "gif", "bmp", "ico"]
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

fn is_executable(name: &str, metadata: &std::fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = name;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        is_executable_name(name)
    }
}

/// Builds a manifest for a folder that carries none.
///
/// Succeeds only when the folder contains exactly one executable file; the
/// folder name becomes the module name and the first image file (if any)
/// becomes the icon.
pub fn infer_manifest(folder_name: &str, files: &[FileFacts]) -> Option<ModuleManifest> {
    let executables: Vec<&FileFacts> = files.iter().filter(|f| f.executable).collect();
    let [only] = executables.as_slice() else {
        return None;
    };

    let mut manifest = ModuleManifest {
        name: folder_name.to_string(),
        ..ModuleManifest::default()
    };
    manifest.command.file_name = only.name.clone();
    if let Some(image) = files.iter().find(|f| f.image) {
        manifest.icon = image.name.clone();
    }
    Some(manifest)
}

/// Checks a manifest against the folder contents, collecting every problem
/// instead of stopping at the first.
pub fn validate_manifest(manifest: &ModuleManifest, files: &[FileFacts]) -> Vec<String> {
    let mut messages = Vec::new();
    let file_exists = |name: &str| files.iter().any(|f| f.name == name);

    if manifest.name.is_empty() {
        messages.push("module name is required".to_string());
    } else if manifest.name.chars().count() > NAME_MAX {
        messages.push(format!("module name exceeds {NAME_MAX} characters"));
    }

    if manifest.command.file_name.is_empty() {
        messages.push("command file is required".to_string());
    } else if !file_exists(&manifest.command.file_name) {
        messages.push(format!(
            "command file {} not found in module folder",
            manifest.command.file_name
        ));
    }

    if !manifest.icon.is_empty() {
        if !has_image_extension(&manifest.icon) {
            messages.push(format!("icon {} is not an image file", manifest.icon));
        } else if !file_exists(&manifest.icon) {
            messages.push(format!("icon {} not found in module folder", manifest.icon));
        }
    }

    for parameter in &manifest.command.arguments {
        if parameter.name.is_empty() {
            messages.push("parameter name is required".to_string());
        } else if parameter.name.chars().count() > NAME_MAX {
            messages.push(format!(
                "parameter name {} exceeds {NAME_MAX} characters",
                parameter.name
            ));
        }
        if parameter.description.chars().count() > PARAM_DESCRIPTION_MAX {
            messages.push(format!(
                "parameter {} description exceeds {PARAM_DESCRIPTION_MAX} characters",
                parameter.name
            ));
        }
    }

    for range in &manifest.command.exit_codes {
        if ExitClass::from_name(&range.class).is_none() {
            messages.push(format!("unknown exit-code class {}", range.class));
        }
        if range.min > range.max {
            messages.push(format!(
                "exit-code range {}..{} has min greater than max",
                range.min, range.max
            ));
        }
    }

    messages
}

/// Classifies a finished run by the manifest's exit-code ranges.
///
/// A missing code (killed or timed out) is always an error.  Codes outside
/// every range fall back to the conventional zero-is-success rule.
pub fn classify_exit(code: Option<i32>, ranges: &[ExitCodeRange]) -> ExitClass {
    let Some(code) = code else {
        return ExitClass::Error;
    };
    for range in ranges {
        if code >= range.min && code <= range.max {
            if let Some(class) = ExitClass::from_name(&range.class) {
                return class;
            }
        }
    }
    if code == 0 {
        ExitClass::Success
    } else {
        ExitClass::Error
    }
}

// ── Folder scanning ───────────────────────────────────────────────────────────

/// Result of scanning one candidate module folder.
#[derive(Debug, Clone)]
pub struct ModuleScanOutcome {
    pub folder: PathBuf,
    pub manifest: ModuleManifest,
    pub valid: bool,
    pub messages: Vec<String>,
}

/// Scans every immediate subdirectory of `roots` as a module candidate.
///
/// Candidates appearing under more than one root (symlinks, duplicate
/// configuration) are scanned once.  At most `concurrency` folders are
/// scanned at a time; outcomes are returned sorted by folder path.
pub async fn scan_module_roots(roots: &[PathBuf], concurrency: usize) -> Vec<ModuleScanOutcome> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

    for root in roots {
        let mut dir = match tokio::fs::read_dir(root).await {
            Ok(dir) => dir,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "module root not readable");
                continue;
            }
        };
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|kind| kind.is_dir())
                        .unwrap_or(false);
                    if !is_dir {
                        continue;
                    }
                    let path = entry.path();
                    let key = tokio::fs::canonicalize(&path)
                        .await
                        .unwrap_or_else(|_| path.clone());
                    if seen.insert(key) {
                        candidates.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "module root listing failed");
                    break;
                }
            }
        }
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for folder in candidates {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            scan_folder(&folder).await
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!(error = %e, "module scan task failed"),
        }
    }
    outcomes.sort_by(|a, b| a.folder.cmp(&b.folder));
    outcomes
}

/// Scans one folder: load or infer the manifest, validate, write the report.
async fn scan_folder(folder: &Path) -> ModuleScanOutcome {
    let facts = match collect_file_facts(folder).await {
        Ok(facts) => facts,
        Err(e) => {
            let outcome = ModuleScanOutcome {
                folder: folder.to_path_buf(),
                manifest: ModuleManifest::default(),
                valid: false,
                messages: vec![format!("module folder not readable: {e}")],
            };
            write_scan_report(&outcome).await;
            return outcome;
        }
    };

    let folder_name = folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (manifest, mut messages) = match tokio::fs::read_to_string(folder.join(MANIFEST_FILE)).await
    {
        Ok(text) => match serde_json::from_str::<ModuleManifest>(&text) {
            Ok(manifest) => (manifest, Vec::new()),
            Err(e) => (
                ModuleManifest::default(),
                vec![format!("{MANIFEST_FILE}: {e}")],
            ),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            match infer_manifest(&folder_name, &facts) {
                Some(manifest) => {
                    debug!(folder = %folder.display(), "manifest inferred from folder contents");
                    (manifest, Vec::new())
                }
                None => (
                    ModuleManifest::default(),
                    vec![format!(
                        "no {MANIFEST_FILE} and no single executable to infer from"
                    )],
                ),
            }
        }
        Err(e) => (
            ModuleManifest::default(),
            vec![format!("{MANIFEST_FILE}: {e}")],
        ),
    };

    if messages.is_empty() {
        messages = validate_manifest(&manifest, &facts);
    }

    let outcome = ModuleScanOutcome {
        folder: folder.to_path_buf(),
        valid: messages.is_empty(),
        manifest,
        messages,
    };
    write_scan_report(&outcome).await;
    outcome
}

async fn collect_file_facts(folder: &Path) -> std::io::Result<Vec<FileFacts>> {
    let mut facts = Vec::new();
    let mut dir = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = dir.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        facts.push(FileFacts {
            executable: is_executable(&name, &metadata),
            image: has_image_extension(&name),
            name,
        });
    }
    facts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(facts)
}

fn render_scan_report(outcome: &ModuleScanOutcome) -> String {
    let mut report = String::new();
    report.push_str("overdeck module scan report\n");
    report.push_str(&format!("folder: {}\n", outcome.folder.display()));
    let name = if outcome.manifest.name.is_empty() {
        "(unnamed)"
    } else {
        &outcome.manifest.name
    };
    report.push_str(&format!("module: {name}\n"));
    report.push_str(&format!(
        "result: {}\n",
        if outcome.valid { "VALID" } else { "INVALID" }
    ));
    if !outcome.messages.is_empty() {
        report.push('\n');
        for message in &outcome.messages {
            report.push_str(&format!("- {message}\n"));
        }
    }
    report
}

/// Writes the report into the module folder, falling back to a timestamped
/// name when the canonical one is not writable.
async fn write_scan_report(outcome: &ModuleScanOutcome) {
    let report = render_scan_report(outcome);
    let path = outcome.folder.join(SCAN_REPORT_FILE);
    if let Err(e) = tokio::fs::write(&path, &report).await {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let fallback = outcome
            .folder
            .join(format!("module_scan_report-{timestamp}.txt"));
        debug!(path = %path.display(), error = %e, "scan report not writable; trying fallback");
        if let Err(e) = tokio::fs::write(&fallback, &report).await {
            warn!(folder = %outcome.folder.display(), error = %e, "could not write scan report");
        }
    }
}

// ── Loaded-module registry ────────────────────────────────────────────────────

/// A validated module the host can launch.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub id: Uuid,
    pub name: String,
    pub folder: PathBuf,
    pub manifest: ModuleManifest,
}

impl LoadedModule {
    /// Promotes a successful scan outcome into a loaded module.
    pub fn from_outcome(outcome: &ModuleScanOutcome) -> Self {
        LoadedModule {
            id: Uuid::new_v4(),
            name: outcome.manifest.name.clone(),
            folder: outcome.folder.clone(),
            manifest: outcome.manifest.clone(),
        }
    }
}

/// In-memory registry of all loaded modules.
///
/// A `HashMap<Uuid, LoadedModule>` provides O(1) lookup by instance id.
/// Iteration order is not guaranteed, so [`ModuleRegistry::list`] sorts by
/// display name before returning.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<Uuid, LoadedModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: LoadedModule) {
        info!(module = %module.name, id = %module.id, "module loaded");
        self.modules.insert(module.id, module);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<LoadedModule> {
        let removed = self.modules.remove(&id);
        if let Some(module) = &removed {
            info!(module = %module.name, %id, "module unloaded");
        }
        removed
    }

    pub fn get(&self, id: Uuid) -> Option<&LoadedModule> {
        self.modules.get(&id)
    }

    pub fn list(&self) -> Vec<&LoadedModule> {
        let mut modules: Vec<&LoadedModule> = self.modules.values().collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ── Repeat scheduling ─────────────────────────────────────────────────────────

struct RepeatEntry {
    module: Uuid,
    interval: Duration,
    next_at: Instant,
}

/// Deadline table for [`ExecMode::Repeat`] modules.
///
/// The host polls [`RepeatScheduler::due`] each tick and launches whatever
/// comes back.  A slow launch does not accumulate missed runs; the next run
/// is always scheduled one full interval after the poll that reported it.
#[derive(Default)]
pub struct RepeatScheduler {
    entries: Vec<RepeatEntry>,
}

impl RepeatScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a module's first run one interval from `now`, replacing any
    /// earlier schedule for the same module.
    pub fn schedule(&mut self, module: Uuid, interval: Duration, now: Instant) {
        self.remove(module);
        self.entries.push(RepeatEntry {
            module,
            interval,
            next_at: now + interval,
        });
    }

    pub fn remove(&mut self, module: Uuid) {
        self.entries.retain(|entry| entry.module != module);
    }

    /// Returns every module due at `now` and re-arms each for one interval
    /// later.
    pub fn due(&mut self, now: Instant) -> Vec<Uuid> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if now >= entry.next_at {
                due.push(entry.module);
                entry.next_at = now + entry.interval;
            }
        }
        due
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
