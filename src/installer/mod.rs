//! Installer Orchestrator.
//!
//! Sequences an installation through [`InstallPhase`]s. Two renditions share
//! the sequence:
//!
//! - [`Installer`] runs it natively against a local directory, with a bounded
//!   wait on the configuration helper and a JSON report of the outcome.
//! - [`InstallScript`] renders it as an NSIS script for the shipped installer.

mod orchestrator;
mod script;
mod state;
mod template;

pub use orchestrator::{
    DEFAULT_POSTINSTALL_TIMEOUT, InstallOutcome, InstallPlan, Installer, WRITE_ENV_FLAG,
};
pub use script::{
    InstallScript, NSI_FILE_NAME, compile, format_version_for_nsis, has_makensis, write_utf8_bom,
};
pub use state::{
    ConfiguratorOutcome, InstallCheckpoint, InstallMessage, InstallPhase, InstallState,
    MessageLevel,
};
