//! Installer command implementation.

use super::helpers::load_config;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::installer::{InstallScript, compile, has_makensis};

/// Execute installer command
pub(super) async fn execute_installer(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Installer {
        no_compile,
        output_dir,
    } = &args.command
    else {
        unreachable!("execute_installer called with non-Installer command");
    };
    let output = config.output();

    let packaging = load_config(config)?;
    let mut script = InstallScript::from_config(&packaging)?;
    let output_dir = match output_dir {
        Some(dir) => dir.clone(),
        None => packaging.resolve(&packaging.installer.output_dir),
    };
    if let Some(file_name) = script.output_file.file_name().map(|n| n.to_os_string()) {
        script.output_file = output_dir.join(file_name);
    }

    // Refuse to produce an installer that would ship without either artifact
    script.check_artifacts()?;

    let nsi_path = script.write(&output_dir).await?;
    output.success(&format!("Installer script written to {}", nsi_path.display()));

    if *no_compile {
        output.verbose("Skipping compilation (--no-compile specified)");
        return Ok(0);
    }
    if !has_makensis() {
        output.warn("makensis not found on PATH; compile the script on a machine with NSIS");
        return Ok(0);
    }

    compile(&nsi_path, &script.output_file).await?;
    output.success(&format!("Installer built: {}", script.output_file.display()));
    Ok(0)
}
