//! Configuration for the coordinator.
//!
//! ```toml
//! [llm]
//! model = "qwen3-32b"
//! api_url = "http://localhost:4000/v1"
//!
//! [history]
//! directory = "./data/sessions"
//! ```
//!
//! # File permissions
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use serde::{Deserialize, Serialize};
use std::path::Path;
use switchboard_llm::config::ENV_API_KEYS;
use switchboard_llm::LlmConfig;
use switchboard_memory::HistoryConfig;
use tracing::warn;

/// Main coordinator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Text-generation backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Session history storage
    #[serde(default)]
    pub history: HistoryConfig,
}

impl CoordinatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix systems, this function validates that:
    /// - The file is a regular file
    /// - The file is not world-writable
    /// - The file is not world-readable if it contains an API key
    ///
    /// and warns if an API key is stored in the file at all.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let config = Self::from_file_unchecked(path)?;

        if config.llm.api_key.is_some() {
            warn!(
                "API key found in config file '{}'. For better security, \
                 use environment variables instead ({}).",
                path.display(),
                ENV_API_KEYS.join(", ")
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    ///
    /// Use this only for testing or when you've already validated the file.
    pub fn from_file_unchecked(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `SWITCHBOARD_LLM_URL` and `SWITCHBOARD_MODEL` when set.
    pub fn apply_env_overrides(&mut self) {
        self.llm.apply_env_overrides();
    }
}

/// Validate config file permissions on Unix systems.
///
/// Requirements:
/// - File must be a regular file (not a directory, device, etc.)
/// - File must not be world-writable (mode & 0o002 == 0)
/// - If file contains API key patterns, must not be world-readable
#[cfg(unix)]
fn validate_config_file_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!("Config path '{}' is not a regular file.", path.display());
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)?;
    let has_api_key = content
        .lines()
        .map(str::trim_start)
        .any(|line| line.starts_with("api_key") && line.contains('='));

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}
