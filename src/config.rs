//! Hashing configuration.
//!
//! Defaults are chosen so that two processes with no configuration agree on
//! every digest. [`IdentityConfig::from_env`] lets deployments override them:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `DESTRUCT_MAX_DEPTH` | Nesting limit before failing with `TooDeep` | `512` |
//! | `DESTRUCT_DIGEST` | `sha512`, `sha384` or `sha256` | `sha512` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Environment variable overriding [`IdentityConfig::max_depth`].
pub const MAX_DEPTH_ENV: &str = "DESTRUCT_MAX_DEPTH";

/// Environment variable overriding [`IdentityConfig::algorithm`].
pub const DIGEST_ENV: &str = "DESTRUCT_DIGEST";

/// Digest used by the hash sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    #[default]
    Sha512,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Unknown digest name.
    #[error("Unknown digest algorithm: {0}")]
    UnknownDigest(String),
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnknownDigest(s.to_string())),
        }
    }
}

/// Configuration for identity hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Maximum nesting depth before failing with `TooDeep`.
    pub max_depth: usize,
    /// Digest fed by the hash sink.
    pub algorithm: DigestAlgorithm,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            algorithm: DigestAlgorithm::default(),
        }
    }
}

impl IdentityConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the digest algorithm.
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Load overrides from `DESTRUCT_MAX_DEPTH` and `DESTRUCT_DIGEST`.
    ///
    /// Unset variables keep their defaults; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(
                    variable = MAX_DEPTH_ENV,
                    value = %raw,
                    default = DEFAULT_MAX_DEPTH,
                    "Ignoring invalid max depth"
                ),
            }
        }

        if let Some(raw) = lookup(DIGEST_ENV) {
            match raw.parse::<DigestAlgorithm>() {
                Ok(algorithm) => config.algorithm = algorithm,
                Err(e) => tracing::warn!(
                    variable = DIGEST_ENV,
                    error = %e,
                    default = %config.algorithm,
                    "Ignoring invalid digest algorithm"
                ),
            }
        }

        config
    }
}
