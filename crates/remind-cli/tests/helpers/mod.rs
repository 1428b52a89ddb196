#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("remind").expect("Failed to find remind binary");

        cmd.current_dir(self.temp_dir.path())
            .env("REMIND_DATABASE_PATH", &self.db_path)
            .env("REMIND_DISPLAY_TIMEZONE", "UTC")
            // Nothing listens on the discard port, so geocoding fails fast.
            .env("REMIND_GEOCODING__BASE_URL", "http://127.0.0.1:9")
            .env_remove("REMIND_USER")
            .env_remove("RUST_LOG");

        cmd
    }

    /// Same as [`command`](Self::command), acting as `user`.
    pub fn as_user(&self, user: u32) -> Command {
        let mut cmd = self.command();
        cmd.args(["--user", &user.to_string()]);
        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Run `args` as `user` and assert success
    pub fn user_success(&self, user: u32, args: &[&str]) -> assert_cmd::assert::Assert {
        self.as_user(user).args(args).assert().success()
    }

    /// Run `args` as `user` and assert failure
    pub fn user_failure(&self, user: u32, args: &[&str]) -> assert_cmd::assert::Assert {
        self.as_user(user).args(args).assert().failure()
    }

    /// Registers Ana (#1) and Ben (#2) and makes them friends
    pub fn with_two_friends(&self) {
        self.run_success(&["user", "add", "Ana", "ana@example.com"]);
        self.run_success(&["user", "add", "Ben", "ben@example.com"]);
        self.user_success(1, &["friend", "request", "2"]);
        self.user_success(2, &["friend", "accept", "1"]);
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output indicates successful reminder creation
    pub fn reminder_created() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Created"))
    }

    /// Predicate to check for empty result set
    pub fn empty_result() -> impl Predicate<str> {
        predicate::str::contains("No reminders found")
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
