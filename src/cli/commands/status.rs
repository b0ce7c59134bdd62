//! Status command implementation.
//!
//! Displays the branch records of the latest build.

use crate::build::FileBuildHistory;
use crate::cli::RuntimeConfig;
use crate::data::BuildResult;
use crate::error::Result;
use serde_json::json;

/// Execute status command
pub(super) async fn execute_status(json: bool, config: &RuntimeConfig) -> Result<()> {
    let gitflow_config = config.load_gitflow_config()?;
    let history = FileBuildHistory::new(config.state_dir(&gitflow_config));
    config.verbose_println(&format!(
        "Reading build history from {}",
        history.builds_dir().display()
    ));

    let Some(build) = history.latest()? else {
        if json {
            println!("{}", json!({ "status": "no_builds" }));
        } else {
            config.println("No builds recorded");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&build)?);
        return Ok(());
    }

    let action = build
        .badge
        .as_ref()
        .map_or("no Gitflow action", |badge| badge.action_name.as_str());
    config.println(&format!(
        "📊 Build #{} ({}): {}",
        build.number,
        action,
        build.result_non_null()
    ));
    config.verbose_println(&format!("Started: {}", build.started_at));
    if let Some(finished_at) = build.finished_at {
        config.verbose_println(&format!("Finished: {}", finished_at));
    }

    let Some(store) = build.gitflow_data.as_ref().filter(|store| !store.is_empty()) else {
        config.println("No branches recorded");
        return Ok(());
    };
    if store.dry_run {
        config.warning_println("Recorded by a Dry Run");
    }

    config.println("\nBranches:");
    for record in store.records() {
        let result = record
            .last_build_result
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        let version = record.last_build_version.as_deref().unwrap_or("-");
        config.indent(&format!(
            "{:<30} {:<10} {}",
            record.branch_name(),
            result,
            version
        ));
    }

    let unstable = store.group_unstable_by_result(BuildResult::Success);
    if !unstable.is_empty() {
        config.warning_println(&format!("Unstable branches: {}", unstable));
    }

    Ok(())
}
