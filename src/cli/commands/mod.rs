//! Command execution functions.
//!
//! Every Gitflow subcommand runs one action around the main build; `status`
//! only reads the build history.

mod run;
mod status;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{CliError, GitflowError, Result};

use run::execute_action;
use status::execute_status;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    if let Err(reason) = args.validate() {
        let error = GitflowError::from(CliError::InvalidArguments { reason });
        report_failure(&config, args.command.name(), &error);
        return Ok(1);
    }

    let result = match &args.command {
        Command::Status { json } => execute_status(*json, &config).await.map(|()| 0),
        command => match command.to_action(args.dry_run) {
            Ok(Some(action)) => execute_action(&args, &config, action).await,
            Ok(None) => Ok(0),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(e) => {
            report_failure(&config, args.command.name(), &e);
            Ok(1)
        }
    }
}

fn report_failure(config: &RuntimeConfig, command: &str, error: &GitflowError) {
    config.error_println(&format!("Command '{}' failed: {}", command, error));

    // Show recovery suggestions if available
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() && !config.is_quiet() {
        config.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            config.println(&format!("  • {}", suggestion));
        }
    }
}
