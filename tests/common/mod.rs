use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch home with its own config and cache directories, so runs never
/// touch the developer's real welt.toml or upload cache.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        for dir in ["home", "config", "cache", "work"] {
            fs::create_dir_all(temp_dir.path().join(dir))?;
        }
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.path().join("home")
    }

    pub fn config_home(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn cache_home(&self) -> PathBuf {
        self.path().join("cache")
    }

    /// Working directory for the binary; test inputs live here
    pub fn work_dir(&self) -> PathBuf {
        self.path().join("work")
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.work_dir().join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_home().join("welt").join("welt.toml")
    }
}
