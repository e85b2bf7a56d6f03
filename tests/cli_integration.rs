//! Integration tests for the `kit` binary.
//!
//! These tests exercise the full CLI against repositories in temporary
//! directories.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A throwaway repository plus an isolated global config.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        dir.child("home/config.toml")
            .write_str("[user]\nname = \"Test User\"\nemail = \"test@example.com\"\n")
            .unwrap();
        dir.child("work").create_dir_all().unwrap();
        Self { dir }
    }

    fn initialized() -> Self {
        let sandbox = Self::new();
        sandbox.kit(&["init"]).assert().success();
        sandbox
    }

    /// Run `kit` inside the work directory.
    fn kit(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("kit").unwrap();
        cmd.current_dir(self.dir.child("work").path())
            .env("KIT_CONFIG", self.dir.child("home/config.toml").path())
            .env_remove("KIT_LOG")
            .args(args);
        cmd
    }

    fn file(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.dir.child("work").child(path)
    }

    fn commit(&self, path: &str, content: &str, message: &str) {
        self.file(path).write_str(content).unwrap();
        self.kit(&["add", path]).assert().success();
        self.kit(&["commit", "-m", message]).assert().success();
    }

    /// `main` and `feature` both change the single line of `f`.
    fn conflicting_branches(&self) {
        self.commit("f", "x\n", "base");
        self.kit(&["branch", "feature"]).assert().success();
        self.commit("f", "y\n", "ours");
        self.kit(&["checkout", "feature"]).assert().success();
        self.commit("f", "z\n", "theirs");
        self.kit(&["checkout", "main"]).assert().success();
    }
}

mod basics {
    use super::*;

    #[test]
    fn version_flag_works() {
        Command::cargo_bin("kit")
            .unwrap()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kit"));
    }

    #[test]
    fn init_creates_metadata_directory() {
        let sandbox = Sandbox::new();
        sandbox.kit(&["init"]).assert().success();
        sandbox.file(".kit/HEAD").assert("ref: refs/heads/main\n");
        sandbox.file(".kit/objects").assert(predicate::path::is_dir());
    }

    #[test]
    fn init_twice_fails() {
        let sandbox = Sandbox::initialized();
        sandbox.kit(&["init"]).assert().failure();
    }

    #[test]
    fn commands_outside_a_repository_fail() {
        let sandbox = Sandbox::new();
        sandbox
            .kit(&["log"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn commit_then_log() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "hello\n", "first commit");
        sandbox.commit("a.txt", "hello again\n", "second commit");

        sandbox
            .kit(&["log"])
            .assert()
            .success()
            .stdout(predicate::str::contains("first commit"))
            .stdout(predicate::str::contains("second commit"))
            .stdout(predicate::str::contains("Author: Test User <test@example.com>"));

        sandbox
            .kit(&["log", "-n", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("second commit"))
            .stdout(predicate::str::contains("first commit").not());
    }

    #[test]
    fn commit_without_changes_fails() {
        let sandbox = Sandbox::initialized();
        sandbox.kit(&["commit", "-m", "empty"]).assert().failure();
    }

    #[test]
    fn verify_clean_repository() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "1\n", "c1");
        sandbox.kit(&["verify"]).assert().success();
    }

    #[test]
    fn verify_reports_corruption() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "1\n", "c1");
        sandbox
            .file(".kit/refs/heads/broken")
            .write_str(&format!("{}\n", "ab".repeat(32)))
            .unwrap();
        sandbox.kit(&["verify"]).assert().failure();
    }

    #[test]
    fn completion_bash() {
        Command::cargo_bin("kit")
            .unwrap()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kit"));
    }
}

mod diff {
    use super::*;

    #[test]
    fn worktree_changes_show_a_hunk() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "one\ntwo\nthree\n", "c1");
        sandbox.file("a.txt").write_str("one\nTWO\nthree\n").unwrap();

        sandbox
            .kit(&["diff"])
            .assert()
            .success()
            .stdout(predicate::str::contains("@@ -1,3 +1,3 @@"))
            .stdout(predicate::str::contains("-two"))
            .stdout(predicate::str::contains("+TWO"));
    }

    #[test]
    fn two_files_outside_a_repository() {
        let sandbox = Sandbox::new();
        sandbox.file("old.txt").write_str("a\nb\n").unwrap();
        sandbox.file("new.txt").write_str("a\nc\n").unwrap();

        sandbox
            .kit(&["diff", "old.txt", "new.txt", "-U", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("@@ -2,1 +2,1 @@"));
    }

    #[test]
    fn unknown_argument_fails() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "1\n", "c1");
        sandbox.kit(&["diff", "no-such-thing"]).assert().failure();
    }
}

mod merge {
    use super::*;

    #[test]
    fn conflict_is_reported_not_an_error() {
        let sandbox = Sandbox::initialized();
        sandbox.conflicting_branches();

        sandbox
            .kit(&["merge", "feature", "--strategy", "manual"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CONFLICT (content): f"));
        sandbox.file("f").assert(predicate::str::contains("<<<<<<< OURS"));
        sandbox.file(".kit/MERGE_HEAD").assert(predicate::path::exists());

        sandbox
            .kit(&["commit", "-m", "too early"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unresolved conflicts in f"));
        sandbox.file("f").write_str("resolved\n").unwrap();
        sandbox.kit(&["add", "f"]).assert().success();
        sandbox.kit(&["commit", "-m", "merge"]).assert().success();
        sandbox.file(".kit/MERGE_HEAD").assert(predicate::path::missing());
    }

    #[test]
    fn auto_strategy_commits_and_warns() {
        let sandbox = Sandbox::initialized();
        sandbox.conflicting_branches();

        sandbox
            .kit(&["merge", "feature"])
            .assert()
            .success()
            .stderr(predicate::str::contains("CONFLICT (content): f kept our version"))
            .stdout(predicate::str::contains("Merged 'feature' into main"));
        sandbox.file("f").assert("y\n");
        sandbox.file(".kit/MERGE_HEAD").assert(predicate::path::missing());
    }

    #[test]
    fn unknown_strategy_exits_with_one() {
        let sandbox = Sandbox::initialized();
        sandbox.conflicting_branches();

        sandbox
            .kit(&["merge", "feature", "--strategy", "octopus"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("octopus"));
    }

    #[test]
    fn help_exits_with_zero() {
        Command::cargo_bin("kit")
            .unwrap()
            .args(["merge", "--help"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("--strategy"));
    }

    #[test]
    fn theirs_strategy_commits() {
        let sandbox = Sandbox::initialized();
        sandbox.conflicting_branches();

        sandbox
            .kit(&["merge", "feature", "--strategy", "theirs"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Merged 'feature' into main"));
        sandbox.file("f").assert("z\n");
        sandbox
            .kit(&["log", "-n", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Merge:"));
    }

    #[test]
    fn fast_forward() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "1\n", "c1");
        sandbox.kit(&["branch", "feature"]).assert().success();
        sandbox.commit("b.txt", "2\n", "c2");
        sandbox.kit(&["checkout", "feature"]).assert().success();

        sandbox
            .kit(&["merge", "main"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Fast-forward"));
        sandbox.file("b.txt").assert("2\n");
    }

    #[test]
    fn unknown_branch_fails() {
        let sandbox = Sandbox::initialized();
        sandbox.commit("a.txt", "1\n", "c1");
        sandbox
            .kit(&["merge", "nope"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("nope"));
    }

    #[test]
    fn quiet_still_reports_conflicts() {
        let sandbox = Sandbox::initialized();
        sandbox.conflicting_branches();

        sandbox
            .kit(&["-q", "merge", "feature", "--strategy", "manual"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CONFLICT"));
    }
}
