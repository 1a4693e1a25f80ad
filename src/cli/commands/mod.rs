//! Command execution for the packaging steps.

mod bundle;
mod collect;
mod helpers;
mod install;
mod installer;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, Result};

use bundle::execute_bundle;
use collect::execute_collect;
use install::execute_install;
use installer::execute_installer;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        // Validation errors are never quiet
        let output = super::OutputManager::new(false, false);
        output.error(
            &CliError::InvalidArguments {
                reason: validation_error,
            }
            .to_string(),
        );
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    let result = match &args.command {
        Command::Collect { .. } => execute_collect(&args, &config).await,
        Command::Bundle { .. } => execute_bundle(&args, &config).await,
        Command::Installer { .. } => execute_installer(&args, &config).await,
        Command::Install { .. } => execute_install(&args, &config).await,
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            let output = config.output();
            output.error(&format!("Command '{}' failed: {}", args.command.name(), e));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&format!("• {}", suggestion));
                }
            }

            Ok(1)
        }
    }
}
