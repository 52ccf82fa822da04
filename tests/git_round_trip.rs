//! Full branch/commit/push cycle against a local bare remote.

mod common;

use common::{assert_success, skip_if_git_missing, stdout, Fixture, TEAM_DOC};
use std::fs;

/// Initialise `work` on `main`, commit the team document and publish it to a
/// bare `remote.git` next to it.
fn seed_repository(fixture: &Fixture) -> std::path::PathBuf {
    let root = fixture.repo.parent().expect("repo parent").to_path_buf();
    fs::create_dir_all(fixture.home()).expect("create home");
    let remote = root.join("remote.git");
    fixture.git(&root, &["init", "--bare", "--quiet", "remote.git"]);
    fixture.git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    let work = &fixture.repo;
    fixture.git(work, &["init", "--quiet"]);
    fixture.git(work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fixture.git(work, &["config", "user.name", "Access Bot"]);
    fixture.git(work, &["config", "user.email", "bot@example.com"]);
    // Signing always fails here, which exercises the unsigned retry.
    fixture.git(work, &["config", "gpg.program", "false"]);
    fixture.write("accounts/team.yaml", TEAM_DOC);
    fixture.git(work, &["add", "."]);
    fixture.git(work, &["commit", "--quiet", "-m", "seed"]);
    let remote_arg = remote.display().to_string();
    fixture.git(work, &["remote", "add", "origin", remote_arg.as_str()]);
    fixture.git(work, &["push", "--quiet", "-u", "origin", "main"]);
    remote
}

#[test]
fn add_pushes_a_review_branch() {
    if skip_if_git_missing() {
        return;
    }
    let fixture = Fixture::new("account_name");
    let remote = seed_repository(&fixture);

    let output = fixture.run(&[
        "add",
        "--env",
        "KP",
        "--ref",
        "T-10",
        "--accounts",
        "team-b",
        "--roles",
        "viewer",
        "--users",
        "dave@example.com",
        "--json",
    ]);
    assert_success(&output);

    let summary: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("stdout is a JSON summary");
    assert_eq!(summary["branch"], "access/T-10");
    assert_eq!(summary["commit_message"], "add access: add user T-10");
    assert_eq!(summary["pushed"], true);
    assert_eq!(summary["signed"], false);
    assert_eq!(
        summary["pull_request_url"],
        "https://git.example.com/kp/pull/new/access/T-10"
    );

    let subject = fixture.git(&remote, &["log", "-1", "--format=%s", "access/T-10"]);
    assert_eq!(subject, "add access: add user T-10");
    let changed = fixture.git(&remote, &["diff", "--name-only", "main", "access/T-10"]);
    assert_eq!(changed, "accounts/team.yaml");
    assert_eq!(
        fixture.git(&fixture.repo, &["rev-parse", "--abbrev-ref", "HEAD"]),
        "access/T-10"
    );
    assert!(fixture
        .read("accounts/team.yaml")
        .contains("      - alice@example.com\n      - dave@example.com\n"));
}

#[test]
fn remove_without_matches_abandons_the_branch() {
    if skip_if_git_missing() {
        return;
    }
    let fixture = Fixture::new("account_name");
    seed_repository(&fixture);

    let output = fixture.run(&[
        "remove",
        "--env",
        "KP",
        "--ref",
        "T-11",
        "--users",
        "nobody@example.com",
    ]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(text.contains("==> created branch chore/T-11"), "{text}");
    assert!(text.contains("no matching users were found"), "{text}");
    assert!(text.contains("abandoning work branch"), "{text}");
    assert_eq!(
        fixture.git(&fixture.repo, &["rev-parse", "--abbrev-ref", "HEAD"]),
        "main"
    );
    assert_eq!(
        fixture.git(&fixture.repo, &["branch", "--list", "chore/T-11"]),
        ""
    );
}

#[test]
fn add_reuses_an_existing_work_branch() {
    if skip_if_git_missing() {
        return;
    }
    let fixture = Fixture::new("account_name");
    let remote = seed_repository(&fixture);
    fixture.git(&fixture.repo, &["branch", "access/T-12"]);

    let output = fixture.run(&[
        "add",
        "--env",
        "KP",
        "--ref",
        "T-12",
        "--accounts",
        "team-a",
        "--roles",
        "editor",
        "--users",
        "erin@example.com",
    ]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(
        text.contains("==> switched to existing branch access/T-12"),
        "{text}"
    );
    assert!(text.contains("pushed branch access/T-12"), "{text}");
    assert_eq!(
        fixture.git(&fixture.repo, &["rev-parse", "--abbrev-ref", "HEAD"]),
        "access/T-12"
    );
    let subject = fixture.git(&remote, &["log", "-1", "--format=%s", "access/T-12"]);
    assert_eq!(subject, "add access: add user T-12");
    assert_eq!(
        fixture.git(&fixture.repo, &["rev-parse", "access/T-12"]),
        fixture.git(&remote, &["rev-parse", "access/T-12"])
    );
    assert!(fixture
        .read("accounts/team.yaml")
        .contains("      editor: [erin@example.com]\n"));
}

#[test]
fn root_outside_the_repository_is_rejected_before_editing() {
    let fixture = Fixture::new("account_name");
    let outside = fixture.repo.parent().expect("repo parent").join("elsewhere");
    fs::create_dir_all(&outside).expect("create outside dir");
    fs::write(outside.join("accounts.yml"), TEAM_DOC).expect("write outside document");
    let outside_arg = outside.display().to_string();

    let output = fixture.run(&[
        "remove",
        "--env",
        "KP",
        "--ref",
        "T-13",
        "--users",
        "alice@example.com",
        "--root",
        outside_arg.as_str(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("outside the repository"), "{stderr}");
    assert!(!stdout(&output).contains("==>"));
    assert_eq!(
        fs::read_to_string(outside.join("accounts.yml")).expect("read outside document"),
        TEAM_DOC
    );
}
