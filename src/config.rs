//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `CompressionPolicy`, i parametri passati a ogni trasformazione
//! - Definisce `Config`, la configurazione completa di un run
//! - Fornisce validazione dei parametri di input
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità JPEG/WebP (1-100, default: 85)
//! - `max_width`: Larghezza massima in pixel (default: 1920)
//! - `max_height`: Altezza massima in pixel (default: 1080)
//! - `dry_run`: Simulazione senza modifiche (default: false)
//! - `json_output`: Output JSON su stdout (default: false)
//! - `assume_yes`: Salta la conferma interattiva (default: false)
//!
//! ## Esempio:
//! ```rust
//! use upload_compressor::config::{CompressionPolicy, Config};
//!
//! let config = Config {
//!     policy: CompressionPolicy { quality: 75, ..Default::default() },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{CompressError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Encode parameters shared by every file of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionPolicy {
    /// Lossy encode quality (1-100), ignored for PNG
    pub quality: u8,
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl CompressionPolicy {
    /// Build a policy from raw (possibly out of range) CLI values.
    pub fn from_raw(quality: i64, max_width: i64, max_height: i64) -> Result<Self> {
        if !(1..=100).contains(&quality) {
            return Err(CompressError::Validation(
                "Quality must be between 1 and 100".to_string(),
            ));
        }
        if max_width <= 0 || max_height <= 0 {
            return Err(CompressError::Validation(
                "Max width and height must be positive".to_string(),
            ));
        }
        let max_width = u32::try_from(max_width).map_err(|_| {
            CompressError::Validation(format!("Max width is too large: {}", max_width))
        })?;
        let max_height = u32::try_from(max_height).map_err(|_| {
            CompressError::Validation(format!("Max height is too large: {}", max_height))
        })?;

        let policy = Self {
            quality: quality as u8,
            max_width,
            max_height,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Validate policy parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(CompressError::Validation(
                "Quality must be between 1 and 100".to_string(),
            ));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressError::Validation(
                "Max width and height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a compression run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Encode parameters
    pub policy: CompressionPolicy,
    /// Dry run - report only, never touch files
    pub dry_run: bool,
    /// Output progress and summary as JSON lines
    pub json_output: bool,
    /// Skip the interactive confirmation
    pub assume_yes: bool,
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()
    }

    /// Whether the run needs an explicit "y" before touching files.
    pub fn needs_confirmation(&self) -> bool {
        !self.dry_run && !self.assume_yes
    }
}

/// Check that the upload root exists and is a directory
pub fn validate_upload_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CompressError::Validation(format!(
            "Upload path does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(CompressError::Validation(format!(
            "Upload path is not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Raw command line values, before any validation
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub upload_path: PathBuf,
    pub quality: i64,
    pub max_width: i64,
    pub max_height: i64,
    pub dry_run: bool,
    pub assume_yes: bool,
    pub json_output: bool,
}

impl RunRequest {
    /// Validates path, quality and dimensions, in that order
    pub fn to_config(&self) -> Result<Config> {
        validate_upload_path(&self.upload_path)?;
        let policy = CompressionPolicy::from_raw(self.quality, self.max_width, self.max_height)?;

        Ok(Config {
            policy,
            dry_run: self.dry_run,
            json_output: self.json_output,
            assume_yes: self.assume_yes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.policy.quality, 85);
        assert_eq!(config.policy.max_width, 1920);
        assert_eq!(config.policy.max_height, 1080);
        assert!(!config.dry_run);
        assert!(!config.json_output);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_validation() {
        let mut policy = CompressionPolicy::default();
        assert!(policy.validate().is_ok());

        policy.quality = 0;
        assert!(policy.validate().is_err());

        policy.quality = 101;
        assert!(policy.validate().is_err());

        policy.quality = 100;
        policy.max_width = 0;
        assert!(policy.validate().is_err());

        policy.max_width = 10;
        policy.max_height = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_policy_from_raw() {
        let policy = CompressionPolicy::from_raw(80, 1200, 800).unwrap();
        assert_eq!(policy.quality, 80);
        assert_eq!(policy.max_width, 1200);
        assert_eq!(policy.max_height, 800);

        let err = CompressionPolicy::from_raw(150, 1920, 1080).unwrap_err();
        assert_eq!(err.to_string(), "Quality must be between 1 and 100");

        assert!(CompressionPolicy::from_raw(0, 1920, 1080).is_err());
        assert!(CompressionPolicy::from_raw(85, -5, 1080).is_err());
        assert!(CompressionPolicy::from_raw(85, 1920, 0).is_err());
        assert!(CompressionPolicy::from_raw(85, i64::MAX, 1080).is_err());
    }

    #[test]
    fn test_needs_confirmation() {
        let mut config = Config::default();
        assert!(config.needs_confirmation());

        config.dry_run = true;
        assert!(!config.needs_confirmation());

        config.dry_run = false;
        config.assume_yes = true;
        assert!(!config.needs_confirmation());
    }

    #[test]
    fn test_config_serializes_policy() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["policy"]["quality"], 85);
        assert_eq!(json["dry_run"], false);
    }

    #[test]
    fn test_validate_upload_path() {
        let dir = TempDir::new().unwrap();
        assert!(validate_upload_path(dir.path()).is_ok());

        let missing = dir.path().join("missing");
        let err = validate_upload_path(&missing).unwrap_err();
        assert!(err.to_string().starts_with("Upload path does not exist"));

        let file = dir.path().join("file.jpg");
        std::fs::write(&file, b"x").unwrap();
        let err = validate_upload_path(&file).unwrap_err();
        assert!(err.to_string().starts_with("Upload path is not a directory"));
    }

    #[test]
    fn test_request_checks_path_before_policy() {
        let dir = TempDir::new().unwrap();
        let mut request = RunRequest {
            upload_path: dir.path().join("missing"),
            quality: 150,
            max_width: 1920,
            max_height: 1080,
            dry_run: false,
            assume_yes: false,
            json_output: true,
        };
        let err = request.to_config().unwrap_err();
        assert!(err.to_string().starts_with("Upload path does not exist"));

        request.upload_path = dir.path().to_path_buf();
        let err = request.to_config().unwrap_err();
        assert_eq!(err.to_string(), "Quality must be between 1 and 100");

        request.quality = 60;
        let config = request.to_config().unwrap();
        assert_eq!(config.policy.quality, 60);
        assert!(config.json_output);
    }
}
