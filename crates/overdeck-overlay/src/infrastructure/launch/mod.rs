//! Module process launching.
//!
//! Runs a module's command as a child process with a wall-clock limit and
//! classifies the exit code by the manifest's ranges.  The launcher is a
//! trait so application-level flows can be tested with a recording double.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::modules::{classify_exit, ExitClass, LoadedModule};

/// Error type for module launches.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The manifest declares no command file.
    #[error("module {module} has no command file")]
    MissingCommand { module: String },

    /// The child process could not be spawned.
    #[error("failed to spawn {file}: {source}")]
    Spawn {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed waiting for {file}: {source}")]
    Wait {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one finished (or killed) module run.
#[derive(Debug, Clone)]
pub struct ModuleRun {
    /// Unique id of this launch instance.
    pub instance: Uuid,
    /// Raw exit code; `None` when the process was killed.
    pub exit_code: Option<i32>,
    pub class: ExitClass,
    /// Whether the wall-clock limit expired before the process finished.
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Trait for launching a module's command.
///
/// The production implementation spawns real processes; test implementations
/// record calls.
#[async_trait]
pub trait ModuleLauncher: Send + Sync {
    /// Runs the module's command to completion or to its timeout.
    async fn launch(&self, module: &LoadedModule) -> Result<ModuleRun, LaunchError>;
}

/// Launches modules as tokio child processes.
///
/// The child runs with the module folder as its working directory and is
/// killed if it outlives the manifest's `timeout_secs`.  `kill_on_drop`
/// guarantees no orphan survives a host shutdown mid-run.
pub struct ProcessLauncher;

#[async_trait]
impl ModuleLauncher for ProcessLauncher {
    async fn launch(&self, module: &LoadedModule) -> Result<ModuleRun, LaunchError> {
        let command = &module.manifest.command;
        if command.file_name.is_empty() {
            return Err(LaunchError::MissingCommand {
                module: module.name.clone(),
            });
        }

        let program = module.folder.join(&command.file_name);
        let arguments: Vec<&str> = command
            .arguments
            .iter()
            .map(|parameter| parameter.value.as_str())
            .filter(|value| !value.is_empty())
            .collect();

        let mut child = Command::new(&program)
            .args(&arguments)
            .current_dir(&module.folder)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                file: command.file_name.clone(),
                source,
            })?;

        let instance = Uuid::new_v4();
        let started = Instant::now();
        info!(module = %module.name, %instance, file = %command.file_name, "launching module");

        let limit = Duration::from_secs(command.timeout_secs);
        match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let exit_code = status.code();
                let class = classify_exit(exit_code, &command.exit_codes);
                debug!(module = %module.name, %instance, ?exit_code, %class, "module finished");
                Ok(ModuleRun {
                    instance,
                    exit_code,
                    class,
                    timed_out: false,
                    elapsed: started.elapsed(),
                })
            }
            Ok(Err(source)) => Err(LaunchError::Wait {
                file: command.file_name.clone(),
                source,
            }),
            Err(_) => {
                warn!(
                    module = %module.name,
                    %instance,
                    limit_secs = command.timeout_secs,
                    "module run timed out; killing"
                );
                child.start_kill().ok();
                Ok(ModuleRun {
                    instance,
                    exit_code: None,
                    class: ExitClass::Error,
                    timed_out: true,
                    elapsed: started.elapsed(),
                })
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
