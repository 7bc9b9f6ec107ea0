//! zkzru Configuration
//!
//! Configuration is looked up in order:
//! 1. ZKZRU_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.zkzru/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".zkzru";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_BALANCE_DEPTH: usize = 4;
const DEFAULT_TX_DEPTH: usize = 2;
const DEFAULT_DEPOSIT_SUBTREE_DEPTH: usize = 2;
const DEFAULT_OUTPUT_PATH: &str = "input.json";
const DEFAULT_MIMC_ROUNDS: usize = 91;
const DEFAULT_MIMC_SEED: &str = "mimc";
const DEFAULT_PEDERSEN_SEED: &str = "zkzru_pedersen_h";

/// Upper bound on tree depths; a dense tree is held fully in memory.
const MAX_DEPTH: usize = 24;

// ============================================================================
// Config Structs
// ============================================================================

/// Engine configuration, one TOML table per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub witness: WitnessConfig,
    #[serde(default)]
    pub crypto: CryptoConfig,
}

/// Tree shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Depth of the balance tree (2^depth accounts)
    #[serde(default = "default_balance_depth")]
    pub balance_depth: usize,
    /// Depth of the per-batch transaction tree (2^depth transactions)
    #[serde(default = "default_tx_depth")]
    pub tx_depth: usize,
    /// Height of one on-chain deposit subtree
    #[serde(default = "default_deposit_subtree_depth")]
    pub deposit_subtree_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            balance_depth: DEFAULT_BALANCE_DEPTH,
            tx_depth: DEFAULT_TX_DEPTH,
            deposit_subtree_depth: DEFAULT_DEPOSIT_SUBTREE_DEPTH,
        }
    }
}

fn default_balance_depth() -> usize {
    DEFAULT_BALANCE_DEPTH
}
fn default_tx_depth() -> usize {
    DEFAULT_TX_DEPTH
}
fn default_deposit_subtree_depth() -> usize {
    DEFAULT_DEPOSIT_SUBTREE_DEPTH
}

/// Witness output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    /// Hide balances and amounts behind Pedersen commitments
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub pretty: bool,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.into(),
            confidential: false,
            pretty: false,
        }
    }
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.into()
}

/// Hash and commitment parameters. These must match the circuit and the
/// contract, so they are rarely changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    #[serde(default = "default_mimc_rounds")]
    pub mimc_rounds: usize,
    #[serde(default = "default_mimc_seed")]
    pub mimc_seed: String,
    #[serde(default = "default_pedersen_seed")]
    pub pedersen_seed: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            mimc_rounds: DEFAULT_MIMC_ROUNDS,
            mimc_seed: DEFAULT_MIMC_SEED.into(),
            pedersen_seed: DEFAULT_PEDERSEN_SEED.into(),
        }
    }
}

fn default_mimc_rounds() -> usize {
    DEFAULT_MIMC_ROUNDS
}
fn default_mimc_seed() -> String {
    DEFAULT_MIMC_SEED.into()
}
fn default_pedersen_seed() -> String {
    DEFAULT_PEDERSEN_SEED.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Overwrite `field` with `key`, if set
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Overwrite `field` with the parsed value of `key`, if set and valid
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={:?}", key, v),
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl RollupConfig {
    /// Locate, parse and validate the configuration, then apply `ZKZRU_*` overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check ZKZRU_CONFIG env var
        if let Ok(path) = env::var("ZKZRU_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("ZKZRU_CONFIG points at {}, which does not exist", path.display());
        }

        // 2. Check ./config.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.zkzru/config.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Tree
        env_parse("ZKZRU_BALANCE_DEPTH", &mut self.tree.balance_depth);
        env_parse("ZKZRU_TX_DEPTH", &mut self.tree.tx_depth);
        env_parse(
            "ZKZRU_DEPOSIT_SUBTREE_DEPTH",
            &mut self.tree.deposit_subtree_depth,
        );

        // Witness
        env_string("ZKZRU_OUTPUT", &mut self.witness.output_path);
        if let Some(v) = env_bool("ZKZRU_CONFIDENTIAL") {
            self.witness.confidential = v;
        }
        if let Some(v) = env_bool("ZKZRU_PRETTY") {
            self.witness.pretty = v;
        }

        // Crypto
        env_parse("ZKZRU_MIMC_ROUNDS", &mut self.crypto.mimc_rounds);
        env_string("ZKZRU_MIMC_SEED", &mut self.crypto.mimc_seed);
        env_string("ZKZRU_PEDERSEN_SEED", &mut self.crypto.pedersen_seed);
    }

    /// Reject tree shapes the engine cannot build.
    pub fn validate(&self) -> Result<()> {
        let tree = &self.tree;
        ensure!(
            (1..=MAX_DEPTH).contains(&tree.balance_depth),
            "balance_depth must be between 1 and {}, got {}",
            MAX_DEPTH,
            tree.balance_depth
        );
        ensure!(
            (1..=MAX_DEPTH).contains(&tree.tx_depth),
            "tx_depth must be between 1 and {}, got {}",
            MAX_DEPTH,
            tree.tx_depth
        );
        ensure!(
            tree.deposit_subtree_depth <= tree.balance_depth,
            "deposit_subtree_depth {} exceeds balance_depth {}",
            tree.deposit_subtree_depth,
            tree.balance_depth
        );
        ensure!(self.crypto.mimc_rounds > 0, "mimc_rounds must be positive");
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Render the defaults as a TOML file suitable for `config.toml`
    pub fn generate_sample() -> Result<String> {
        let mut sample = Self::default();
        sample.witness.pretty = true;
        toml::to_string_pretty(&sample).context("Failed to render sample config")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RollupConfig::default();
        assert_eq!(config.tree.balance_depth, DEFAULT_BALANCE_DEPTH);
        assert_eq!(config.tree.tx_depth, DEFAULT_TX_DEPTH);
        assert_eq!(config.witness.output_path, DEFAULT_OUTPUT_PATH);
        assert!(!config.witness.confidential);
        assert_eq!(config.crypto.mimc_rounds, 91);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_sample() {
        let sample = RollupConfig::generate_sample().unwrap();
        assert!(sample.contains("[tree]"));
        assert!(sample.contains("[witness]"));
        assert!(sample.contains("[crypto]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = RollupConfig::generate_sample().unwrap();
        let parsed: RollupConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.crypto.mimc_seed, DEFAULT_MIMC_SEED);
        assert!(parsed.witness.pretty);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: RollupConfig = toml::from_str("[tree]\nbalance_depth = 12\n").unwrap();
        assert_eq!(parsed.tree.balance_depth, 12);
        assert_eq!(parsed.tree.tx_depth, DEFAULT_TX_DEPTH);
        assert_eq!(parsed.crypto, CryptoConfig::default());
    }

    #[test]
    fn test_validate_rejects_oversized_subtree() {
        let mut config = RollupConfig::default();
        config.tree.deposit_subtree_depth = config.tree.balance_depth + 1;
        assert!(config.validate().is_err());

        config = RollupConfig::default();
        config.tree.tx_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join(format!("zkzru-config-{}.toml", std::process::id()));
        fs::write(&path, "[witness]\nconfidential = true\n").unwrap();

        let config = RollupConfig::load_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.tree, TreeConfig::default());
        // ZKZRU_CONFIDENTIAL may override the file in a dirty environment
        if env::var("ZKZRU_CONFIDENTIAL").is_err() {
            assert!(config.witness.confidential);
        }
    }
}
