#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// An objcopy that cannot exist, so the tests never depend on a real one.
pub const MISSING_OBJCOPY: &str = "elfbin-test-objcopy-that-does-not-exist";

pub fn file_exists_and_not_empty() -> impl Predicate<Path> {
    predicate::path::exists().and(predicate::function(|path: &Path| {
        fs::metadata(path)
            .map(|metadata| metadata.len() > 0)
            .unwrap_or(false)
    }))
}

pub fn file_binary_content_is_same_as(expected: impl Into<PathBuf>) -> impl Predicate<Path> {
    predicate::path::eq_file(expected)
}

pub struct ElfBinCommand {
    command: Command,
}

impl ElfBinCommand {
    /// Logs at `warn` unless told otherwise, so that the per image events do
    /// not clutter the test output.
    pub fn new() -> Self {
        Self::with_log_level("warn")
    }

    pub fn with_log_level(level: &str) -> Self {
        let mut command = Command::cargo_bin("elfbin").unwrap();
        command.arg("--log-level").arg(level);
        Self { command }
    }

    pub fn config<P: AsRef<Path>>(mut self, config: P) -> Self {
        self.command.arg("--config").arg(config.as_ref());
        self
    }

    pub fn convert(mut self) -> ConvertCommand {
        self.command.arg("convert");
        ConvertCommand {
            command: self.command,
        }
    }

    pub fn build(self) -> Command {
        self.command
    }
}

pub struct ConvertCommand {
    command: Command,
}

impl ConvertCommand {
    pub fn objcopy<P: AsRef<Path>>(mut self, objcopy: P) -> Self {
        self.command.arg("--objcopy").arg(objcopy.as_ref());
        self
    }

    pub fn copy_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.command.arg("--copy-suffix").arg(suffix.into());
        self
    }

    pub fn elfs(mut self, elfs: &[&Path]) -> Self {
        let mut list = OsString::new();
        for path in elfs {
            if !list.is_empty() {
                list.push(" ");
            }
            list.push(path);
        }
        self.command.arg(list);
        self
    }

    pub fn build(self) -> Command {
        println!("{:?}", self.command);
        self.command
    }
}
