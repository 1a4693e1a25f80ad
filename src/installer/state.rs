//! Install state tracking and reporting.

use crate::error::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Version of the report format
pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Phase of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstallPhase {
    /// Nothing touched yet
    Welcome,
    /// Copying application files and staging values
    FilePlacement,
    /// Running the configuration helper
    PostInstall,
    /// Installation complete, whatever the helper outcome
    Finish,
    /// Stopped before any file was placed, or while placing
    Aborted,
}

impl InstallPhase {
    /// Phase that normally follows this one.
    pub fn next(self) -> Option<Self> {
        match self {
            InstallPhase::Welcome => Some(InstallPhase::FilePlacement),
            InstallPhase::FilePlacement => Some(InstallPhase::PostInstall),
            InstallPhase::PostInstall => Some(InstallPhase::Finish),
            InstallPhase::Finish | InstallPhase::Aborted => None,
        }
    }

    /// Whether the installation ended in this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, InstallPhase::Finish | InstallPhase::Aborted)
    }

    fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to) || (to == InstallPhase::Aborted && !self.is_terminal())
    }
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallPhase::Welcome => "welcome",
            InstallPhase::FilePlacement => "file placement",
            InstallPhase::PostInstall => "post-install",
            InstallPhase::Finish => "finish",
            InstallPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Progress information
    Info,
    /// Step completed
    Success,
    /// Installation usable, attention needed
    Warning,
    /// Something failed
    Error,
}

/// Message the installer shows to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallMessage {
    /// Severity
    pub level: MessageLevel,
    /// Phase the message was raised in
    pub phase: InstallPhase,
    /// Text shown
    pub text: String,
    /// When it was raised
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Checkpoint reached during the installation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallCheckpoint {
    /// Checkpoint name
    pub name: String,
    /// Phase this checkpoint belongs to
    pub phase: InstallPhase,
    /// Timestamp when checkpoint was reached
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// How the configuration helper ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfiguratorOutcome {
    /// Exit code 0
    Succeeded,
    /// Non-zero exit code
    Failed {
        /// Exit code reported by the helper
        code: i32,
    },
    /// Ended without an exit code (killed by a signal)
    Terminated,
    /// Could not be started or waited on
    LaunchFailed {
        /// OS error text
        reason: String,
    },
    /// Still running after the wait bound; killed
    TimedOut {
        /// Bound that elapsed
        after_secs: u64,
    },
}

/// Complete install operation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallState {
    /// Version of the report format
    pub format_version: u32,
    /// Unique ID for this installation
    pub install_id: String,
    /// Timestamp when the installation started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Timestamp of the last change
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Current phase
    pub current_phase: InstallPhase,
    /// Checkpoints passed
    pub checkpoints: Vec<InstallCheckpoint>,
    /// Messages shown to the user
    pub messages: Vec<InstallMessage>,
    /// Files and directories placed in the target directory
    pub placed: Vec<PathBuf>,
    /// Configuration helper result, once it ran
    pub configurator: Option<ConfiguratorOutcome>,
    /// Whether the staged values file is gone
    pub staged_values_removed: bool,
}

impl Default for InstallState {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallState {
    /// Fresh state in the welcome phase.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            format_version: REPORT_FORMAT_VERSION,
            install_id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            updated_at: now,
            current_phase: InstallPhase::Welcome,
            checkpoints: Vec::new(),
            messages: Vec::new(),
            placed: Vec::new(),
            configurator: None,
            staged_values_removed: false,
        }
    }

    /// Move to `phase`, rejecting out-of-order transitions.
    pub fn set_phase(&mut self, phase: InstallPhase) -> Result<(), InstallError> {
        if !self.current_phase.can_transition_to(phase) {
            return Err(InstallError::InvalidTransition {
                from: self.current_phase.to_string(),
                to: phase.to_string(),
            });
        }
        log::debug!("Install phase: {} -> {}", self.current_phase, phase);
        self.current_phase = phase;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Record a checkpoint in the current phase.
    pub fn add_checkpoint(&mut self, name: impl Into<String>) {
        self.checkpoints.push(InstallCheckpoint {
            name: name.into(),
            phase: self.current_phase,
            timestamp: chrono::Utc::now(),
        });
        self.updated_at = chrono::Utc::now();
    }

    /// Whether a checkpoint with `name` was reached.
    pub fn has_checkpoint(&self, name: &str) -> bool {
        self.checkpoints.iter().any(|c| c.name == name)
    }

    /// Record a user-visible message and mirror it to the log.
    pub fn message(&mut self, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            MessageLevel::Info | MessageLevel::Success => log::info!("{}", text),
            MessageLevel::Warning => log::warn!("{}", text),
            MessageLevel::Error => log::error!("{}", text),
        }
        self.messages.push(InstallMessage {
            level,
            phase: self.current_phase,
            text,
            timestamp: chrono::Utc::now(),
        });
        self.updated_at = chrono::Utc::now();
    }

    /// Record an error and move to [`InstallPhase::Aborted`].
    pub fn abort(&mut self, text: impl Into<String>) {
        self.message(MessageLevel::Error, text);
        if !self.current_phase.is_terminal() {
            self.current_phase = InstallPhase::Aborted;
            self.updated_at = chrono::Utc::now();
        }
    }

    /// Messages at `level`.
    pub fn messages_at(&self, level: MessageLevel) -> impl Iterator<Item = &InstallMessage> {
        self.messages.iter().filter(move |m| m.level == level)
    }

    /// Files are installed and the sequence reached its end.
    pub fn is_complete(&self) -> bool {
        self.current_phase == InstallPhase::Finish
    }

    /// One-line summary for terminal output.
    pub fn summary(&self) -> String {
        let configurator = match &self.configurator {
            None => "not run".to_string(),
            Some(ConfiguratorOutcome::Succeeded) => "succeeded".to_string(),
            Some(ConfiguratorOutcome::Failed { code }) => format!("exited with code {code}"),
            Some(ConfiguratorOutcome::Terminated) => "terminated".to_string(),
            Some(ConfiguratorOutcome::LaunchFailed { .. }) => "could not start".to_string(),
            Some(ConfiguratorOutcome::TimedOut { after_secs }) => {
                format!("timed out after {after_secs}s")
            }
        };
        format!(
            "Install {}: phase={}, files placed={}, configurator {}",
            self.install_id,
            self.current_phase,
            self.placed.len(),
            configurator
        )
    }

    /// Write the state as pretty JSON, via a temp file and rename.
    pub fn write_report(&self, path: &Path) -> Result<(), InstallError> {
        let failed = |reason: String| InstallError::ReportFailed {
            path: path.to_path_buf(),
            reason,
        };

        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| failed(format!("Failed to serialize state: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&temp_path)
                .map_err(|e| failed(format!("Failed to create temp file: {e}")))?;
            file.write_all(serialized.as_bytes())
                .map_err(|e| failed(format!("Failed to write report: {e}")))?;
            file.sync_all()
                .map_err(|e| failed(format!("Failed to sync file: {e}")))?;
        }

        std::fs::rename(&temp_path, path)
            .map_err(|e| failed(format!("Failed to rename temp file: {e}")))
    }
}
