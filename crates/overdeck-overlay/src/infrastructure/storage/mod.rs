//! File-system storage adapters: preference persistence and well-known paths.

pub mod prefs;

use std::path::PathBuf;

/// Module roots searched on startup, before preference-supplied extras:
/// the per-user data directory and a `modules` folder next to the binary.
///
/// Roots that do not exist are simply skipped by the scanner.
pub fn default_module_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(data) = platform_data_dir() {
        roots.push(data.join("modules"));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            roots.push(dir.join("modules"));
        }
    }
    roots
}

/// Resolves the platform data base directory including the `Overdeck` subdirectory.
fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Overdeck"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_DATA_HOME or ~/.local/share
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_module_roots_all_end_with_modules() {
        let roots = default_module_roots();
        for root in &roots {
            assert!(
                root.ends_with("modules"),
                "every default root must be a modules directory, got {root:?}"
            );
        }
    }
}
