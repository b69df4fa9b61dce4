//! Shared helpers for integration tests.

pub mod global_test;
pub mod properties_test;
pub mod suite_test;

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::MockServer;

/// Initialize test environment (run once)
pub fn init_test_env() {
    aloe::init_logging();
}

/// A test-data tree in a temporary directory.
pub struct DataTree {
    dir: TempDir,
}

impl DataTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Writes `content` to `relative`, creating parent directories.
    pub fn file(&self, relative: &str, content: &str) -> &Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create data dir");
        }
        fs::write(&path, content).expect("Failed to write data file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }
}

/// `ip:port` of a mock server, ready for the `host` presetter.
pub fn host_of(server: &MockServer) -> String {
    let address = server.address();
    format!("{}:{}", address.ip(), address.port())
}

/// Context file that points every round trip at the `host` variable.
pub const HOST_CONTEXT: &str = r#"
presetters:
  - name: host
    args:
      host: "%{host}"
"#;
