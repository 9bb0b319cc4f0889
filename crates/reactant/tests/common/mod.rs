//! Common test utilities for reactant integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory; the binary sees no inherited environment
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".reactant");

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Command with a clean environment rooted at the temp home
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_reactant"));
        cmd.env_clear();
        cmd.env("HOME", self.temp_dir.path());
        cmd.current_dir(self.temp_dir.path());
        cmd
    }

    /// Write a config file
    pub fn write_config(&self, json: &serde_json::Value) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::write(self.config_file(), serde_json::to_string_pretty(json)?)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
