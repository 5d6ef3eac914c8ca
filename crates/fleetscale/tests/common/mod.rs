use assert_cmd::Command;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Working directory isolated from the user's config and credentials
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("fleetscale.yml"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_public_key(&self) -> PathBuf {
        let path = self.root.path().join("id_test.pub");
        fs::write(&path, "ssh-ed25519 AAAATEST tester@example\n").unwrap();
        path
    }

    /// Write a state file tracking `count` nodes named `ftl2-scale-N`
    #[allow(dead_code)]
    pub fn write_state(&self, count: usize) {
        let resources: serde_json::Map<String, serde_json::Value> = (0..count)
            .map(|i| {
                let name = format!("ftl2-scale-{}", i);
                let record = json!({
                    "name": name,
                    "provider": "linode",
                    "provider_id": format!("{}", 1000 + i),
                    "addresses": [format!("203.0.113.{}", 10 + i)],
                    "label": name,
                    "created_at": "2026-01-01T00:00:00Z",
                });
                (name, record)
            })
            .collect();
        let document = json!({
            "version": 1,
            "updated_at": "2026-01-01T00:00:00Z",
            "resources": resources,
        });
        fs::write(
            self.state_path(),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .unwrap();
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.path().join(".ftl2-state.json")
    }

    #[allow(dead_code)]
    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.root.path().join(relative).exists()
    }

    /// `fleetscale` running inside the project with no ambient configuration
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("fleetscale").unwrap();
        cmd.current_dir(self.root.path())
            .env("XDG_CONFIG_HOME", self.root.path().join("xdg"))
            .env("HOME", self.root.path())
            .env_remove("FLEETSCALE_CONFIG")
            .env_remove("LINODE_TOKEN")
            .env_remove("LINODE_ROOT_PASS")
            .env_remove("RUST_LOG");
        cmd
    }
}
