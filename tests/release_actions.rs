mod common;

use common::{Fixture, MockBuildType, MockGit, add_project_files, store_with_successful};
use kodegen_gitflow::action::{
    BranchCause, FinishAction, GIT_BRANCH_TYPE, GIT_SIMPLE_BRANCH_NAME, PublishAction,
    StartReleaseAction, StartReleaseCause, TestAction, TestCause,
};
use kodegen_gitflow::data::{BranchRecordStore, BuildResult};
use kodegen_gitflow::error::GitflowError;

const RELEASE_PUSH: &str = "push origin refs/heads/release/1.0.0:refs/heads/release/1.0.0";

fn start_release(version: &str) -> StartReleaseAction {
    StartReleaseAction::new(StartReleaseCause::new(version).expect("valid version"))
}

#[tokio::test]
async fn test_start_release_prepares_branch_before_main_build() {
    let fixture = Fixture::new();
    fixture
        .history
        .push_store(1, store_with_successful("develop"));
    let mut run = fixture.start(start_release("1.0.0")).await;

    run.before_main_build().await.expect("before main build");

    let mut expected = vec![
        "fetch origin".to_string(),
        "clean".to_string(),
        "checkout release/1.0.0 origin/develop".to_string(),
    ];
    expected.extend(add_project_files());
    expected.push("commit Updated project files to release version 1.0.0".to_string());
    assert_eq!(fixture.git.calls(), expected);
    assert_eq!(fixture.build_type.versions(), ["1.0.0"]);

    assert_eq!(run.env_vars()[GIT_SIMPLE_BRANCH_NAME], "release/1.0.0");
    assert_eq!(run.env_vars()[GIT_BRANCH_TYPE], "release");
    assert!(fixture.console.contains("Gitflow - Start Release: Created release branch release/1.0.0"));
}

#[tokio::test]
async fn test_start_release_skips_commit_when_version_is_current() {
    let mut fixture = Fixture::new();
    fixture.build_type = MockBuildType::new().with_current_version("1.0.0");
    fixture
        .history
        .push_store(1, store_with_successful("develop"));
    let mut run = fixture.start(start_release("1.0.0")).await;

    run.before_main_build().await.expect("before main build");

    assert_eq!(
        fixture.git.calls(),
        ["fetch origin", "clean", "checkout release/1.0.0 origin/develop"]
    );
    assert!(fixture.console.contains(
        "Gitflow - Start Release: Project files already at version 1.0.0"
    ));
}

#[tokio::test]
async fn test_start_release_after_successful_build() {
    let fixture = Fixture::with_git(MockGit::new().with_remote_head("release/1.0.0", "abc123"));
    fixture
        .history
        .push_store(1, store_with_successful("develop"));
    let mut run = fixture.start(start_release("1.0.0")).await;

    run.before_main_build().await.expect("before main build");
    fixture.git.clear_calls();
    run.after_main_build().await.expect("after main build");

    let mut expected = vec![
        RELEASE_PUSH.to_string(),
        "tag v1.0.0 Created release version tag v1.0.0".to_string(),
        "push origin refs/tags/v1.0.0:refs/tags/v1.0.0".to_string(),
    ];
    expected.extend(add_project_files());
    expected.push("commit Updated project files to fixes development version 1.0.1-SNAPSHOT".to_string());
    expected.push(RELEASE_PUSH.to_string());
    expected.push("checkout develop origin/develop".to_string());
    expected.extend(add_project_files());
    expected.push(
        "commit Updated project files on develop branch to next development version 1.1.0-SNAPSHOT"
            .to_string(),
    );
    expected.push("push origin refs/heads/develop:refs/heads/develop".to_string());
    assert_eq!(fixture.git.calls(), expected);

    let release = run.store().get("release/1.0.0").expect("release record");
    assert_eq!(release.last_build_result, Some(BuildResult::Success));
    assert_eq!(release.last_build_version.as_deref(), Some("1.0.1-SNAPSHOT"));
    assert_eq!(release.last_release_version.as_deref(), Some("1.0.0"));
    assert_eq!(release.base_release_version.as_deref(), Some("1.0.0"));
    assert_eq!(release.last_release_version_commit.as_deref(), Some("abc123"));

    let develop = run.store().get("develop").expect("develop record");
    assert_eq!(develop.last_build_result, Some(BuildResult::Success));
    assert_eq!(develop.last_build_version.as_deref(), Some("1.1.0-SNAPSHOT"));

    assert_eq!(run.build_result(), BuildResult::Success);
}

#[tokio::test]
async fn test_start_release_after_failed_build_only_records_develop() {
    let mut store = store_with_successful("develop");
    store.get_or_add("develop").last_build_version = Some("1.0.0-SNAPSHOT".to_string());
    let fixture = Fixture::new();
    fixture.history.push_store(1, store);
    let mut run = fixture.start(start_release("1.0.0")).await;

    run.before_main_build().await.expect("before main build");
    fixture.git.clear_calls();
    run.set_build_result(BuildResult::Failure);
    run.after_main_build().await.expect("after main build");

    assert!(fixture.git.calls().is_empty());
    assert!(run.store().get("release/1.0.0").is_none());
    let develop = run.store().get("develop").expect("develop record");
    assert_eq!(develop.last_build_result, Some(BuildResult::Failure));
    assert_eq!(develop.last_build_version.as_deref(), Some("1.0.0-SNAPSHOT"));
    assert_eq!(run.build_result(), BuildResult::Failure);
}

#[tokio::test]
async fn test_start_release_warns_about_missing_develop_record() {
    let fixture = Fixture::new();
    let mut run = fixture.start(start_release("1.0.0")).await;

    run.before_main_build().await.expect("before main build");

    assert!(fixture.console.contains(
        "Gitflow - Start Release: No record exists for branch develop, creating an empty one"
    ));
    assert!(run.store().contains("develop"));
}

#[tokio::test]
async fn test_test_release_tags_patch_version() {
    let mut store = BranchRecordStore::new();
    let record = store.get_or_add("release/1.0");
    record.last_build_result = Some(BuildResult::Success);
    record.last_build_version = Some("1.0.1-SNAPSHOT".to_string());

    let fixture = Fixture::with_git(MockGit::new().with_remote_head("release/1.0", "def456"));
    fixture.history.push_store(4, store);
    let mut run = fixture
        .start(TestAction::release(TestCause::new("release/1.0")))
        .await;

    run.before_main_build().await.expect("before main build");
    assert_eq!(fixture.build_type.versions(), ["1.0.1"]);
    assert_eq!(
        fixture.git.calls_starting_with("checkout"),
        ["checkout release/1.0 origin/release/1.0"]
    );

    run.after_main_build().await.expect("after main build");

    assert_eq!(fixture.build_type.versions(), ["1.0.1", "1.0.2-SNAPSHOT"]);
    assert_eq!(
        fixture.git.calls_starting_with("tag"),
        ["tag v1.0.1 Created release version tag v1.0.1"]
    );
    let record = run.store().get("release/1.0").expect("record");
    assert_eq!(record.last_build_version.as_deref(), Some("1.0.2-SNAPSHOT"));
    assert_eq!(record.last_release_version.as_deref(), Some("1.0.1"));
    assert_eq!(record.last_release_version_commit.as_deref(), Some("def456"));
}

#[tokio::test]
async fn test_test_release_rejects_other_branch_types() {
    let fixture = Fixture::new();
    let mut run = fixture
        .start(TestAction::release(TestCause::new("hotfix/1.0")))
        .await;

    let err = run.before_main_build().await.expect_err("wrong branch type");
    assert!(matches!(err, GitflowError::Prerequisite { .. }));
    assert!(fixture.git.calls_starting_with("checkout").is_empty());
}

#[tokio::test]
async fn test_publish_release_merges_release_commit_into_master() {
    let mut store = BranchRecordStore::new();
    let record = store.get_or_add("release/1.0");
    record.last_build_result = Some(BuildResult::Success);
    record.last_build_version = Some("1.0.2-SNAPSHOT".to_string());
    record.last_release_version = Some("1.0.1".to_string());
    record.base_release_version = Some("1.0".to_string());
    record.last_release_version_commit = Some("def456".to_string());

    let fixture = Fixture::with_git(MockGit::new().with_remote_head("release/1.0", "0ff1ce"));
    fixture.history.push_store(7, store);
    let mut run = fixture
        .start(PublishAction::release(BranchCause::new("release/1.0")))
        .await;
    assert!(run.is_omit_main_build());

    run.before_main_build().await.expect("before main build");

    assert_eq!(
        fixture.git.calls(),
        [
            "fetch origin",
            "clean",
            "checkout master origin/master",
            "merge def456 Merged release version 1.0.1 into master branch",
            "push origin refs/heads/master:refs/heads/master",
        ]
    );
    let master = run.store().get("master").expect("master record");
    assert_eq!(master.last_build_result, Some(BuildResult::Success));
    assert_eq!(master.last_release_version.as_deref(), Some("1.0.1"));
    assert_eq!(master.base_release_version.as_deref(), Some("1.0"));
    assert_eq!(master.last_release_version_commit.as_deref(), Some("def456"));
}

#[tokio::test]
async fn test_publish_release_requires_successful_build() {
    let mut store = BranchRecordStore::new();
    store.get_or_add("release/1.0").last_build_result = Some(BuildResult::Failure);

    let fixture = Fixture::with_git(MockGit::new().with_remote_head("release/1.0", "0ff1ce"));
    fixture.history.push_store(1, store);
    let mut run = fixture
        .start(PublishAction::release(BranchCause::new("release/1.0")))
        .await;

    let err = run.before_main_build().await.expect_err("failed branch");
    assert!(matches!(err, GitflowError::Prerequisite { .. }));
    assert!(fixture.git.calls_starting_with("merge").is_empty());
}

#[tokio::test]
async fn test_finish_release_deletes_branch_missing_locally() {
    let fixture = Fixture::with_git(MockGit::new().with_remote_head("release/1.0", "0ff1ce"));
    fixture
        .history
        .push_store(3, store_with_successful("release/1.0"));
    let mut run = fixture
        .start(FinishAction::release(BranchCause::new("release/1.0")))
        .await;

    run.before_main_build().await.expect("before main build");

    assert!(fixture.git.calls_starting_with("delete").is_empty());
    assert_eq!(
        fixture.git.calls_starting_with("push"),
        ["push origin :refs/heads/release/1.0"]
    );
    assert!(fixture.console.contains("Gitflow - Finish Release: Deleted branch release/1.0"));
    assert!(!run.store().contains("release/1.0"));

    let build = run.into_build();
    let store = build.gitflow_data.expect("store attached");
    assert_eq!(store.tombstones().count(), 0);
}

#[tokio::test]
async fn test_finish_release_deletes_local_branch() {
    let fixture = Fixture::with_git(
        MockGit::new()
            .with_remote_head("release/1.0", "0ff1ce")
            .with_local_branch("release/1.0"),
    );
    let mut run = fixture
        .start(FinishAction::release(BranchCause::new("release/1.0")))
        .await;

    run.before_main_build().await.expect("before main build");

    assert_eq!(fixture.git.calls_starting_with("delete"), ["delete release/1.0"]);
}
