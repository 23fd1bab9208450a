//! Engine Configuration
//!
//! A small explicit record passed into parse-tree construction. No
//! process-wide state: embedders that select against several trees can
//! give each its own configuration.

/// Configuration consumed by the selection engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory under which per-step working directories are created.
    /// Resolved to an absolute path by the filesystem adapter.
    pub tmpdir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmpdir: ".datamake".to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with the given temporary directory root.
    pub fn with_tmpdir(tmpdir: impl Into<String>) -> Self {
        Self {
            tmpdir: tmpdir.into(),
        }
    }
}
