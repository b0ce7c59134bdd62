mod common;

use common::{Fixture, MockBuildType, MockGit, store_with_successful};
use kodegen_gitflow::action::{
    BranchBuildAction, BranchCause, FinishFeatureAction, GIT_BRANCH_TYPE, StartFeatureAction,
};
use kodegen_gitflow::data::BuildResult;

fn develop_at(version: &str) -> kodegen_gitflow::data::BranchRecordStore {
    let mut store = store_with_successful("develop");
    if let Some(develop) = store.get_mut("develop") {
        develop.last_build_version = Some(version.to_string());
    }
    store
}

#[tokio::test]
async fn test_start_feature_branches_from_develop() {
    let fixture = Fixture::new();
    fixture.history.push_store(1, develop_at("1.1.0-SNAPSHOT"));
    let mut run = fixture
        .start(StartFeatureAction::new(BranchCause::new("login")))
        .await;

    run.before_main_build().await.expect("before main build");
    assert_eq!(
        fixture.git.calls_starting_with("checkout"),
        ["checkout feature/login origin/develop"]
    );
    assert_eq!(run.env_vars()[GIT_BRANCH_TYPE], "feature");
    assert!(fixture.console.contains("Gitflow - Start Feature: Created feature branch feature/login"));

    run.after_main_build().await.expect("after main build");

    assert_eq!(
        fixture.git.calls_starting_with("push"),
        ["push origin refs/heads/feature/login:refs/heads/feature/login"]
    );
    let feature = run.store().get("feature/login").expect("feature record");
    assert_eq!(feature.last_build_result, Some(BuildResult::Success));
    assert_eq!(feature.last_build_version.as_deref(), Some("1.1.0-SNAPSHOT"));
}

#[tokio::test]
async fn test_start_feature_accepts_prefixed_name() {
    let fixture = Fixture::new();
    fixture.history.push_store(1, develop_at("1.1.0-SNAPSHOT"));
    let mut run = fixture
        .start(StartFeatureAction::new(BranchCause::new("feature/login")))
        .await;

    run.before_main_build().await.expect("before main build");

    assert_eq!(
        fixture.git.calls_starting_with("checkout"),
        ["checkout feature/login origin/develop"]
    );
}

#[tokio::test]
async fn test_finish_feature_merges_and_deletes_branch() {
    let mut fixture = Fixture::with_git(
        MockGit::new()
            .with_remote_head("feature/login", "f00d00")
            .with_local_branch("feature/login"),
    );
    fixture.build_type = MockBuildType::new().with_current_version("1.1.0-SNAPSHOT");
    let mut store = develop_at("1.0.0-SNAPSHOT");
    store.get_or_add("feature/login").last_build_result = Some(BuildResult::Success);
    fixture.history.push_store(1, store);

    let mut run = fixture
        .start(FinishFeatureAction::new(BranchCause::new("login")))
        .await;

    run.before_main_build().await.expect("before main build");
    run.after_main_build().await.expect("after main build");

    assert_eq!(
        fixture.git.calls(),
        [
            "fetch origin",
            "clean",
            "checkout develop origin/develop",
            "merge origin/feature/login Merged feature branch feature/login into develop branch",
            "push origin refs/heads/develop:refs/heads/develop",
            "delete feature/login",
            "push origin :refs/heads/feature/login",
        ]
    );
    assert!(!run.store().contains("feature/login"));
    let develop = run.store().get("develop").expect("develop record");
    assert_eq!(develop.last_build_version.as_deref(), Some("1.1.0-SNAPSHOT"));
}

#[tokio::test]
async fn test_finish_feature_failure_keeps_branch() {
    let fixture = Fixture::with_git(MockGit::new().with_remote_head("feature/login", "f00d00"));
    let mut run = fixture
        .start(FinishFeatureAction::new(BranchCause::new("login")))
        .await;

    run.before_main_build().await.expect("before main build");
    fixture.git.clear_calls();
    run.set_build_result(BuildResult::Failure);
    run.after_main_build().await.expect("after main build");

    assert!(fixture.git.calls().is_empty());
    assert_eq!(
        run.store()
            .get("feature/login")
            .and_then(|r| r.last_build_result),
        Some(BuildResult::Failure)
    );
}

#[tokio::test]
async fn test_branch_build_records_result_and_version() {
    let mut fixture = Fixture::new();
    fixture.build_type = MockBuildType::new().with_current_version("2.3.0-SNAPSHOT");
    let mut run = fixture
        .start(BranchBuildAction::new(BranchCause::new("develop")))
        .await;

    run.before_main_build().await.expect("before main build");
    assert_eq!(
        fixture.git.calls(),
        ["fetch origin", "clean", "checkout develop origin/develop"]
    );
    run.set_build_result(BuildResult::Unstable);
    run.after_main_build().await.expect("after main build");

    let develop = run.store().get("develop").expect("develop record");
    assert_eq!(develop.last_build_result, Some(BuildResult::Unstable));
    assert_eq!(develop.last_build_version.as_deref(), Some("2.3.0-SNAPSHOT"));
    assert_eq!(run.build_result(), BuildResult::Unstable);
}
