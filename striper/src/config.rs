//! Pipeline configuration.

use tracing::warn;

use crate::error::Error;
use crate::placement::Node;

/// Environment variable overriding the block size in bytes.
pub const BLOCK_SIZE_ENV: &str = "STRIPER_BLOCK_SIZE";

/// Default block size: 5 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 5 * 1024 * 1024;

/// Default flush threshold, as a multiple of the block size.
pub const DEFAULT_FLUSH_FACTOR: usize = 10;

/// What the reassembler does with a record that fails verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrityPolicy {
    /// Abort the reconstruct with an error naming the offending index.
    #[default]
    Strict,
    /// Skip the corrupt block, log a warning and keep going.
    ///
    /// The output is then shorter than the original stream while the
    /// operation still reports success. Opt-in only, never the default.
    SkipCorrupt,
}

/// Tunables for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of every block except possibly the last one, in bytes.
    pub block_size: usize,
    /// Flush the accumulation buffer once it holds this many blocks.
    pub flush_factor: usize,
    /// Maximum number of concurrently in-flight record fetches.
    pub fetch_window: usize,
    /// Ordered placement targets. Labels only; retrieval never uses them.
    pub nodes: Vec<Node>,
    /// Checksum-mismatch policy for reconstruction.
    pub integrity: IntegrityPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let nodes: Vec<Node> = ["node-1", "node-2", "node-3"].map(Node::new).into();
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            flush_factor: DEFAULT_FLUSH_FACTOR,
            fetch_window: nodes.len(),
            nodes,
            integrity: IntegrityPolicy::default(),
        }
    }
}

impl Config {
    /// Defaults with the block size taken from [`BLOCK_SIZE_ENV`] when set.
    ///
    /// An unset variable keeps the default; an unparsable or zero value logs
    /// a warning and keeps the default rather than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(BLOCK_SIZE_ENV) {
            match raw.parse::<usize>() {
                Ok(size) if size > 0 => config.block_size = size,
                _ => warn!(
                    value = %raw,
                    default = config.block_size,
                    "ignoring unusable {BLOCK_SIZE_ENV}, keeping default"
                ),
            }
        }

        config
    }

    /// Check the configuration before an operation starts.
    pub fn validate(&self) -> Result<(), Error> {
        if self.block_size == 0 {
            return Err(Error::Config("block size must be positive"));
        }
        if self.flush_factor == 0 {
            return Err(Error::Config("flush factor must be positive"));
        }
        if self.fetch_window == 0 {
            return Err(Error::Config("fetch window must be positive"));
        }
        if self.nodes.is_empty() {
            return Err(Error::Config("node list must not be empty"));
        }
        Ok(())
    }

    /// Accumulation buffer size that triggers a flush of full blocks.
    pub fn flush_threshold(&self) -> usize {
        self.flush_factor * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.block_size, 5 * 1024 * 1024);
        assert_eq!(config.flush_threshold(), 50 * 1024 * 1024);
        assert_eq!(config.fetch_window, config.nodes.len());
    }

    #[test]
    fn test_zero_block_size_is_rejected() {
        let config = Config {
            block_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_node_list_is_rejected() {
        let config = Config {
            nodes: vec![],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_fetch_window_is_rejected() {
        let config = Config {
            fetch_window: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_override_applies() {
        // Env vars are process-global; keep the two env tests in one place
        // to avoid racing other tests on the same variable.
        std::env::set_var(BLOCK_SIZE_ENV, "4096");
        assert_eq!(Config::from_env().block_size, 4096);

        std::env::set_var(BLOCK_SIZE_ENV, "not-a-number");
        assert_eq!(Config::from_env().block_size, DEFAULT_BLOCK_SIZE);

        std::env::set_var(BLOCK_SIZE_ENV, "0");
        assert_eq!(Config::from_env().block_size, DEFAULT_BLOCK_SIZE);

        std::env::remove_var(BLOCK_SIZE_ENV);
        assert_eq!(Config::from_env().block_size, DEFAULT_BLOCK_SIZE);
    }
}
