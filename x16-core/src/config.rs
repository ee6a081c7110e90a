//! Virtual disk configuration.
//!
//! Stored as JSON; every field has a default so partial files are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DosError, DosResult};
use crate::kernal::{RomSymbols, DEFAULT_DEVICE};

/// Configuration for one virtual disk session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DosConfig {
    /// Host directory backing the virtual disk
    pub sdcard_dir: PathBuf,
    /// Swap upper and lower case in filenames and listings
    pub swap_case: bool,
    /// Unit number the virtual disk answers to
    pub device: u8,
    /// ROM symbol table.
    ///
    /// `symbols.dos` defaults to `None`, which leaves the `DOS` command
    /// channel untrapped. Set it here or pass `--dos-trap` to `x16dos`.
    pub symbols: RomSymbols,
}

impl Default for DosConfig {
    fn default() -> Self {
        Self {
            sdcard_dir: PathBuf::from("."),
            swap_case: false,
            device: DEFAULT_DEVICE,
            symbols: RomSymbols::default(),
        }
    }
}

impl DosConfig {
    /// Configuration serving files from `dir`.
    pub fn with_sdcard_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            sdcard_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> DosResult<Self> {
        let config: DosConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: &Path) -> DosResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> DosResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> DosResult<()> {
        // Serial bus units 8-31 are disk drives
        if !(8..=31).contains(&self.device) {
            return Err(DosError::InvalidConfig(format!(
                "device {} is not a disk unit (8-31)",
                self.device
            )));
        }
        if self.sdcard_dir.as_os_str().is_empty() {
            return Err(DosError::InvalidConfig("sdcardDir is empty".to_string()));
        }
        self.symbols.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DosConfig::default();
        assert_eq!(config.sdcard_dir, PathBuf::from("."));
        assert!(!config.swap_case);
        assert_eq!(config.device, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config =
            DosConfig::from_json_str(r#"{"sdcardDir": "/tmp/sd", "swapCase": true}"#).unwrap();
        assert_eq!(config.sdcard_dir, PathBuf::from("/tmp/sd"));
        assert!(config.swap_case);
        assert_eq!(config.device, 8);
        assert_eq!(config.symbols, RomSymbols::default());
    }

    #[test]
    fn test_dos_trap_off_unless_configured() {
        assert_eq!(DosConfig::default().symbols.dos, None);
        let config = DosConfig::from_json_str(r#"{"symbols": {"dos": 49408}}"#).unwrap();
        assert_eq!(config.symbols.dos, Some(0xC100));
        assert_eq!(config.symbols.load, RomSymbols::default().load);
    }

    #[test]
    fn test_rejects_bad_device() {
        let err = DosConfig::from_json_str(r#"{"device": 4}"#).unwrap_err();
        assert!(matches!(err, DosError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = DosConfig::from_json_str("{ sdcardDir").unwrap_err();
        assert!(matches!(err, DosError::Json(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = DosConfig {
            device: 9,
            ..DosConfig::with_sdcard_dir("disk")
        };
        let text = config.to_json().unwrap();
        assert_eq!(DosConfig::from_json_str(&text).unwrap(), config);
    }
}
