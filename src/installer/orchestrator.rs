//! Native install sequence.
//!
//! Runs the same phases the generated installer script encodes, against a
//! local target directory:
//!
//! 1. **Welcome**: verify both required artifacts exist (fail-closed)
//! 2. **FilePlacement**: copy the application and the helper, stage the values
//! 3. **PostInstall**: run the helper with a bounded wait
//! 4. **Finish**: the staged values are removed whatever the helper did

use crate::INSTALL_VALUES_FILE;
use crate::bundler::utils::fs;
use crate::bundler::{BundleMode, executable_name};
use crate::error::InstallError;
use crate::installer::state::{
    ConfiguratorOutcome, InstallPhase, InstallState, MessageLevel,
};
use crate::postinstall::INSTALL_VALUES_ENV;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bound on the helper run.
pub const DEFAULT_POSTINSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Argument that puts the helper in write mode.
pub const WRITE_ENV_FLAG: &str = "--write-env";

/// Where things come from and where they go.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Main application: its executable, or its onedir collection directory
    pub app_source: PathBuf,
    /// Layout of `app_source`
    pub app_mode: BundleMode,
    /// Post-install helper executable
    pub helper_source: PathBuf,
    /// Installation directory
    pub target_dir: PathBuf,
    /// Values to stage for the helper, if any
    pub values_source: Option<PathBuf>,
    /// Staging location read by the helper
    pub staged_values: PathBuf,
    /// Bound on the helper run
    pub timeout: Duration,
    /// Extra environment for the helper
    pub helper_env: Vec<(String, String)>,
}

impl InstallPlan {
    /// Plan with the default staging location and timeout.
    pub fn new(
        app_source: impl Into<PathBuf>,
        helper_source: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            app_source: app_source.into(),
            app_mode: BundleMode::OneFile,
            helper_source: helper_source.into(),
            target_dir: target_dir.into(),
            values_source: None,
            staged_values: std::env::temp_dir().join(INSTALL_VALUES_FILE),
            timeout: DEFAULT_POSTINSTALL_TIMEOUT,
            helper_env: Vec::new(),
        }
    }

    /// Plan for bundle outputs laid out in `build_dir`.
    pub fn from_build_dir(
        build_dir: &Path,
        app_name: &str,
        app_mode: BundleMode,
        helper_name: &str,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        let app_source = match app_mode {
            BundleMode::OneFile => build_dir.join(executable_name(app_name)),
            BundleMode::OneDir => build_dir.join(app_name),
        };
        Self::new(
            app_source,
            build_dir.join(executable_name(helper_name)),
            target_dir,
        )
        .with_app_mode(app_mode)
    }

    /// Treat `app_source` as a onefile executable or a onedir collection.
    pub fn with_app_mode(mut self, mode: BundleMode) -> Self {
        self.app_mode = mode;
        self
    }

    /// Main executable that must exist before anything is placed.
    ///
    /// A onedir collection holds `<dir name><EXE>` at its top level.
    pub fn app_executable(&self) -> PathBuf {
        match self.app_mode {
            BundleMode::OneFile => self.app_source.clone(),
            BundleMode::OneDir => {
                let stem = self
                    .app_source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.app_source.join(executable_name(&stem))
            }
        }
    }

    /// Stage `path` for the helper.
    pub fn with_values(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_source = Some(path.into());
        self
    }

    /// Use a different staging location.
    pub fn with_staged_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.staged_values = path.into();
        self
    }

    /// Bound the helper run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pass an extra environment variable to the helper.
    pub fn with_helper_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.helper_env.push((key.into(), value.into()));
        self
    }

    /// Installed location of the helper.
    pub fn installed_helper(&self) -> PathBuf {
        self.target_dir.join(file_name_or(&self.helper_source, "helper"))
    }
}

fn file_name_or(path: &Path, fallback: &str) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// What an install run produced.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Final state, including user-visible messages
    pub state: InstallState,
    /// Installed helper path, once placed
    pub installed_helper: Option<PathBuf>,
}

impl InstallOutcome {
    /// Phase the run ended in.
    pub fn phase(&self) -> InstallPhase {
        self.state.current_phase
    }

    /// Files are in place and the sequence finished.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Helper result, if it ran.
    pub fn configurator(&self) -> Option<&ConfiguratorOutcome> {
        self.state.configurator.as_ref()
    }
}

/// Runs an [`InstallPlan`].
#[derive(Debug)]
pub struct Installer {
    plan: InstallPlan,
}

impl Installer {
    /// Installer for `plan`.
    pub fn new(plan: InstallPlan) -> Self {
        Self { plan }
    }

    /// The plan being executed.
    pub fn plan(&self) -> &InstallPlan {
        &self.plan
    }

    /// Verify both required executables exist.
    pub fn check_artifacts(&self) -> Result<(), InstallError> {
        for path in [self.plan.app_executable(), self.plan.helper_source.clone()] {
            if !path.is_file() {
                return Err(InstallError::MissingArtifact { path });
            }
        }
        Ok(())
    }

    /// Run every phase. Failures are recorded in the returned state.
    pub async fn run(&self) -> InstallOutcome {
        let mut state = InstallState::new();

        state.message(
            MessageLevel::Info,
            format!("Installing into {}", self.plan.target_dir.display()),
        );

        if let Err(e) = self.check_artifacts() {
            state.abort(format!("{e}. Nothing was installed."));
            return InstallOutcome {
                state,
                installed_helper: None,
            };
        }
        state.add_checkpoint("artifacts_verified");

        if let Err(e) = self.advance(&mut state, InstallPhase::FilePlacement) {
            state.abort(e.to_string());
            return InstallOutcome {
                state,
                installed_helper: None,
            };
        }

        let installed_helper = match self.place_files(&mut state).await {
            Ok(helper) => Some(helper),
            Err(e) => {
                state.abort(format!("{e}. Installation stopped."));
                None
            }
        };

        if let Some(helper) = &installed_helper {
            if self.advance(&mut state, InstallPhase::PostInstall).is_ok() {
                let result = self.run_configurator(helper).await;
                self.report_configurator(&mut state, &result);
                state.configurator = Some(result);
            }
        }

        self.remove_staged_values(&mut state).await;

        if state.current_phase == InstallPhase::PostInstall {
            let _ = self.advance(&mut state, InstallPhase::Finish);
        }
        log::info!("{}", state.summary());

        InstallOutcome {
            state,
            installed_helper,
        }
    }

    fn advance(&self, state: &mut InstallState, phase: InstallPhase) -> Result<(), InstallError> {
        state.set_phase(phase)?;
        state.add_checkpoint(format!("entered_{}", phase).replace([' ', '-'], "_"));
        Ok(())
    }

    async fn place_files(&self, state: &mut InstallState) -> Result<PathBuf, InstallError> {
        let plan = &self.plan;
        let placement_failed = |path: &Path, e: crate::bundler::Error| {
            InstallError::PlacementFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        };

        fs::create_dir_all(&plan.target_dir, false)
            .await
            .map_err(|e| placement_failed(&plan.target_dir, e))?;

        if plan.app_mode == BundleMode::OneDir {
            fs::copy_dir(&plan.app_source, &plan.target_dir)
                .await
                .map_err(|e| placement_failed(&plan.app_source, e))?;
            state.placed.push(plan.target_dir.clone());
        } else {
            let dest = plan
                .target_dir
                .join(file_name_or(&plan.app_source, "app"));
            fs::copy_file(&plan.app_source, &dest)
                .await
                .map_err(|e| placement_failed(&plan.app_source, e))?;
            state.placed.push(dest);
        }
        state.add_checkpoint("application_placed");

        let helper = plan.installed_helper();
        fs::copy_file(&plan.helper_source, &helper)
            .await
            .map_err(|e| placement_failed(&plan.helper_source, e))?;
        state.placed.push(helper.clone());
        state.add_checkpoint("helper_placed");

        if let Some(values) = &plan.values_source {
            fs::copy_file(values, &plan.staged_values)
                .await
                .map_err(|e| placement_failed(values, e))?;
            state.add_checkpoint("values_staged");
        }

        state.message(MessageLevel::Success, "Application files installed.");
        Ok(helper)
    }

    async fn run_configurator(&self, helper: &Path) -> ConfiguratorOutcome {
        log::info!("Running {} {}", helper.display(), WRITE_ENV_FLAG);

        let mut command = tokio::process::Command::new(helper);
        command
            .arg(WRITE_ENV_FLAG)
            .env(INSTALL_VALUES_ENV, &self.plan.staged_values)
            .envs(self.plan.helper_env.iter().map(|(k, v)| (k, v)))
            .current_dir(&self.plan.target_dir)
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ConfiguratorOutcome::LaunchFailed {
                    reason: e.to_string(),
                };
            }
        };

        match tokio::time::timeout(self.plan.timeout, child.wait()).await {
            Ok(Ok(status)) => match status.code() {
                Some(0) => ConfiguratorOutcome::Succeeded,
                Some(code) => ConfiguratorOutcome::Failed { code },
                None => ConfiguratorOutcome::Terminated,
            },
            Ok(Err(e)) => ConfiguratorOutcome::LaunchFailed {
                reason: e.to_string(),
            },
            Err(_) => {
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to stop configuration helper: {}", e);
                }
                ConfiguratorOutcome::TimedOut {
                    after_secs: self.plan.timeout.as_secs(),
                }
            }
        }
    }

    fn report_configurator(&self, state: &mut InstallState, outcome: &ConfiguratorOutcome) {
        let helper = self.plan.installed_helper();
        let manual = format!(
            "Run \"{} {}\" to finish the configuration.",
            helper.display(),
            WRITE_ENV_FLAG
        );
        match outcome {
            ConfiguratorOutcome::Succeeded => {
                state.message(MessageLevel::Success, "Configuration completed successfully.")
            }
            ConfiguratorOutcome::Failed { code } => state.message(
                MessageLevel::Warning,
                format!(
                    "The configuration helper exited with code {code}. Configuration may be \
                     incomplete; the application files were kept. {manual}"
                ),
            ),
            ConfiguratorOutcome::Terminated => state.message(
                MessageLevel::Warning,
                format!(
                    "The configuration helper was terminated. Configuration may be incomplete; \
                     the application files were kept. {manual}"
                ),
            ),
            ConfiguratorOutcome::LaunchFailed { reason } => state.message(
                MessageLevel::Error,
                format!(
                    "Could not start the configuration helper ({reason}). The application \
                     files were installed. {manual}"
                ),
            ),
            ConfiguratorOutcome::TimedOut { after_secs } => state.message(
                MessageLevel::Error,
                format!(
                    "The configuration helper did not finish within {after_secs}s and was \
                     stopped. The application files were installed. {manual}"
                ),
            ),
        }
    }

    async fn remove_staged_values(&self, state: &mut InstallState) {
        let staged = &self.plan.staged_values;
        match tokio::fs::remove_file(staged).await {
            Ok(()) => {
                log::debug!("Removed staged values {}", staged.display());
                state.staged_values_removed = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                state.staged_values_removed = true;
            }
            Err(e) => state.message(
                MessageLevel::Warning,
                format!("Could not remove staged values {}: {}", staged.display(), e),
            ),
        }
    }
}
