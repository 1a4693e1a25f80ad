//! Install command implementation.
//!
//! Runs the install sequence locally: guard, file placement, the
//! post-install helper, then cleanup of the staged values.

use super::helpers::load_config;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ConfigError, Result};
use crate::installer::{InstallPhase, InstallPlan, Installer};
use std::time::Duration;

/// Execute install command
pub(super) async fn execute_install(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Install {
        build_dir,
        target_dir,
        values,
        timeout_secs,
        report,
    } = &args.command
    else {
        unreachable!("execute_install called with non-Install command");
    };
    let output = config.output();

    let packaging = load_config(config)?;
    let installer_section = &packaging.installer;
    let (Some(app_name), Some(helper_name)) = (
        installer_section.app_target.as_deref(),
        installer_section.helper_target.as_deref(),
    ) else {
        return Err(ConfigError::Invalid {
            path: config.config_path().to_path_buf(),
            reason: "[installer] app_target and helper_target must both be set".to_string(),
        }
        .into());
    };
    let app = packaging.target(app_name)?;

    let build_dir = build_dir.clone().unwrap_or_else(|| packaging.dist_dir());
    let timeout = timeout_secs.unwrap_or(installer_section.postinstall_timeout_secs);

    let mut plan = InstallPlan::from_build_dir(&build_dir, app_name, app.mode, helper_name, target_dir)
        .with_timeout(Duration::from_secs(timeout));
    let values = values
        .clone()
        .or_else(|| installer_section.values_file.as_deref().map(|p| packaging.resolve(p)));
    if let Some(path) = values {
        plan = plan.with_values(path);
    }

    let outcome = Installer::new(plan).run().await;

    for message in &outcome.state.messages {
        output.install_message(message);
    }
    output.verbose(&outcome.state.summary());

    if let Some(path) = report {
        outcome.state.write_report(path)?;
        output.verbose(&format!("Install report written to {}", path.display()));
    }

    Ok(match outcome.phase() {
        InstallPhase::Finish => 0,
        _ => 1,
    })
}
