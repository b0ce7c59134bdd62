//! Action command implementation.
//!
//! Runs one Gitflow action around the main build command and persists the
//! resulting build in the history.

use crate::action::{Action, GitflowAction, GitflowRun, Runtime};
use crate::build::{Build, FileBuildHistory};
use crate::cli::{Args, RuntimeConfig};
use crate::config::CONFIG_FILE_NAME;
use crate::console::{Console, LogConsole};
use crate::data::BuildResult;
use crate::error::{CliError, GitflowError, Result};
use crate::git::{GitCli, GitOperations};
use crate::version::{BuildTypeAction, CargoBuildType};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as ProcessCommand;

/// Execute a Gitflow action command
pub(super) async fn execute_action(
    args: &Args,
    config: &RuntimeConfig,
    action: Action,
) -> Result<i32> {
    let gitflow_config = config.load_gitflow_config()?;
    let history = FileBuildHistory::new(config.state_dir(&gitflow_config));
    let git = GitCli::open(&config.repo, &gitflow_config.remote)
        .await?
        .preserve_on_clean(&gitflow_config.state_dir)
        .preserve_on_clean(CONFIG_FILE_NAME);
    let build_type = CargoBuildType::new(&config.repo);

    let number = history.next_number()?;
    config.section(&format!("{} (build #{})", action.action_name(), number));
    if action.is_dry_run() {
        config.warning_println("Dry Run: nothing will be pushed");
    }

    // Quiet runs still keep the Gitflow lines in the log
    let console: &dyn Console = if config.is_quiet() {
        &LogConsole
    } else {
        config.output()
    };
    let runtime = Runtime {
        git: &git,
        build_type: &build_type,
        config: &gitflow_config,
        console,
    };
    let mut run = GitflowRun::new(action, Build::new(number), &history, runtime).await?;

    let outcome = drive(&mut run, args.command.main_build(), &config.repo, config).await;
    if let Err(e) = &outcome {
        let result = if e.is_interrupted() {
            BuildResult::Aborted
        } else {
            BuildResult::Failure
        };
        run.set_build_result(result);
    }

    // Persisted even when the run failed, so the next run sees how far it got
    let build = run.into_build();
    let path = history.save(&build).await?;
    log::debug!("Saved build #{} to {}", build.number, path.display());
    outcome?;

    let result = build.result_non_null();
    match result {
        BuildResult::Success => {
            config.success_println(&format!("Build #{} finished: {}", build.number, result));
            Ok(0)
        }
        BuildResult::Unstable => {
            config.warning_println(&format!("Build #{} finished: {}", build.number, result));
            Ok(0)
        }
        _ => {
            config.error_println(&format!("Build #{} finished: {}", build.number, result));
            Ok(1)
        }
    }
}

/// Before-hook, main build and after-hook, each cancellable with Ctrl-C
async fn drive<G, B>(
    run: &mut GitflowRun<'_, Action, G, B>,
    main_build: &[String],
    repo: &Path,
    config: &RuntimeConfig,
) -> Result<()>
where
    G: GitOperations,
    B: BuildTypeAction,
{
    tokio::select! {
        result = run.before_main_build() => result?,
        _ = tokio::signal::ctrl_c() => {
            return Err(GitflowError::Interrupted {
                operation: "before main build".to_string(),
            });
        }
    }

    if run.is_omit_main_build() {
        config.verbose_println("Main build omitted");
    } else if let Some((program, program_args)) = main_build.split_first() {
        for (key, value) in run.env_vars() {
            config.verbose_println(&format!("{}={}", key, value));
        }
        config.section("Main build");

        let mut child = ProcessCommand::new(program)
            .args(program_args)
            .envs(run.env_vars())
            .current_dir(repo)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CliError::ExecutionFailed {
                command: main_build.join(" "),
                reason: e.to_string(),
            })?;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::signal::ctrl_c() => {
                let _ = child.kill().await;
                return Err(GitflowError::Interrupted {
                    operation: "main build".to_string(),
                });
            }
        };

        let result = match status.code() {
            Some(0) => BuildResult::Success,
            Some(_) => BuildResult::Failure,
            None => BuildResult::Aborted,
        };
        log::info!("Main build exited with {}: {}", status, result);
        run.set_build_result(result);
    } else {
        config.verbose_println("No main build command given");
    }

    tokio::select! {
        result = run.after_main_build() => result?,
        _ = tokio::signal::ctrl_c() => {
            return Err(GitflowError::Interrupted {
                operation: "after main build".to_string(),
            });
        }
    }

    Ok(())
}
