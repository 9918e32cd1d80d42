//! Derivation configuration, parsed from TOML with environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bitcoin::bip32::DerivationPath;

use crate::path::{is_absolute, parse_path};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HdConfig {
    #[serde(default)]
    pub derivation: DerivationSection,

    #[serde(default)]
    pub signing: SigningSection,

    #[serde(default)]
    pub memory: MemorySection,
}

/// Which key to derive from a seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationSection {
    /// Path derived from the master node
    #[serde(default = "default_path")]
    pub path: String,

    /// Skip invalid derivation candidates instead of failing
    #[serde(default)]
    pub best_effort: bool,
}

impl Default for DerivationSection {
    fn default() -> Self {
        Self {
            path: default_path(),
            best_effort: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningSection {
    /// Added to the recovery bit to form `v` (27 for legacy Ethereum-style, 0 for raw)
    #[serde(default = "default_recovery_id_offset")]
    pub recovery_id_offset: u8,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            recovery_id_offset: default_recovery_id_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_true")]
    pub disable_core_dumps: bool,

    /// mlock() key buffers (best effort)
    #[serde(default = "default_true")]
    pub lock_key_pages: bool,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            disable_core_dumps: true,
            lock_key_pages: true,
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_path() -> String {
    "m/44'/60'/0'/0/0".to_string()
}

fn default_recovery_id_offset() -> u8 {
    27
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl HdConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse TOML config")
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `HDSAFE_DERIVATION_PATH`
    /// - `HDSAFE_BEST_EFFORT`
    /// - `HDSAFE_RECOVERY_ID_OFFSET`
    /// - `HDSAFE_DISABLE_CORE_DUMPS`
    /// - `HDSAFE_LOCK_KEY_PAGES`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HDSAFE_DERIVATION_PATH") {
            self.derivation.path = v;
        }
        if let Ok(v) = std::env::var("HDSAFE_BEST_EFFORT") {
            if let Ok(flag) = v.parse::<bool>() {
                self.derivation.best_effort = flag;
            }
        }
        if let Ok(v) = std::env::var("HDSAFE_RECOVERY_ID_OFFSET") {
            if let Ok(offset) = v.parse::<u8>() {
                self.signing.recovery_id_offset = offset;
            }
        }
        if let Ok(v) = std::env::var("HDSAFE_DISABLE_CORE_DUMPS") {
            if let Ok(flag) = v.parse::<bool>() {
                self.memory.disable_core_dumps = flag;
            }
        }
        if let Ok(v) = std::env::var("HDSAFE_LOCK_KEY_PAGES") {
            if let Ok(flag) = v.parse::<bool>() {
                self.memory.lock_key_pages = flag;
            }
        }
    }

    /// The configured derivation path, parsed.
    pub fn derivation_path(&self) -> Result<DerivationPath> {
        parse_path(&self.derivation.path)
            .with_context(|| format!("Invalid derivation.path: {}", self.derivation.path))
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let path = self.derivation_path()?;
        anyhow::ensure!(
            is_absolute(&self.derivation.path),
            "derivation.path must start at the master (m/...)"
        );
        anyhow::ensure!(
            !path.is_empty(),
            "derivation.path must name at least one child"
        );

        anyhow::ensure!(
            matches!(self.signing.recovery_id_offset, 0 | 27),
            "signing.recovery_id_offset must be 0 or 27"
        );

        Ok(())
    }

    /// Apply process-level hardening requested by the `[memory]` section.
    ///
    /// Returns `false` if a requested measure could not be applied.
    pub fn harden_process(&self) -> bool {
        if self.memory.disable_core_dumps {
            crate::memory::disable_core_dumps()
        } else {
            true
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
