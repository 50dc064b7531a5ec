use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway data directory, isolated from any real rc file or
/// environment the developer running the tests might have.
pub struct BoardHome {
    dir: TempDir,
}

impl BoardHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_data_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.data_file(name);
        fs::write(&path, contents).expect("write data file");
        path
    }
}

pub fn perch_cmd(home: &BoardHome) -> Command {
    let mut cmd = Command::cargo_bin("perch").expect("binary");
    cmd.arg("--data").arg(home.path());
    cmd.env("PERCHRC", "/dev/null");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("PERCH_TIMEZONE");
    cmd.env_remove("PERCH_TIME_CONFIG");
    cmd
}

/// Extracts the id from a `Created task <id>.` / `Created category <id>.`
/// feedback line.
pub fn created_id(stdout: &[u8]) -> String {
    let text = std::str::from_utf8(stdout).expect("utf8 stdout");
    let line = text
        .lines()
        .find(|line| line.starts_with("Created "))
        .expect("created line");
    line.trim_end_matches('.')
        .rsplit(' ')
        .next()
        .expect("id token")
        .to_string()
}
