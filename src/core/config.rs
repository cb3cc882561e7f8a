// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parser configuration.
//!
//! The configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! max_vector_elements = 500
//! fits_chunk_records = 1000
//!
//! [csv]
//! field_separators = ","
//! record_separators = "\n"
//! detect_header = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

/// Separators and header handling for CSV/TSV input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Any of these characters separates two cells
    pub field_separators: String,
    /// Any of these characters ends a record
    pub record_separators: String,
    /// Probe the first lines for a header (off: every line is data)
    pub detect_header: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            field_separators: "\t".to_string(),
            record_separators: "\n".to_string(),
            detect_header: true,
        }
    }
}

/// Configuration shared by every format path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// CSV/TSV options
    pub csv: CsvConfig,
    /// Array cells are cut after this many elements
    pub max_vector_elements: usize,
    /// FITS rows read per block
    pub fits_chunk_records: usize,
    /// Size of the read buffer used to feed the streaming decoders
    pub read_buffer_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            csv: CsvConfig::default(),
            max_vector_elements: 1000,
            fits_chunk_records: 1000,
            read_buffer_size: 64 * 1024,
        }
    }
}

impl ParserConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ParserConfig =
            toml::from_str(text).map_err(|e| CodecError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodecError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the CSV field separators.
    pub fn with_field_separators(mut self, separators: impl Into<String>) -> Self {
        self.csv.field_separators = separators.into();
        self
    }

    /// Set the CSV record separators.
    pub fn with_record_separators(mut self, separators: impl Into<String>) -> Self {
        self.csv.record_separators = separators.into();
        self
    }

    /// Enable or disable CSV header detection.
    pub fn with_header_detection(mut self, enabled: bool) -> Self {
        self.csv.detect_header = enabled;
        self
    }

    /// Set the maximum number of decoded array elements per cell.
    pub fn with_max_vector_elements(mut self, max: usize) -> Self {
        self.max_vector_elements = max;
        self
    }

    /// Set the number of FITS rows per read block.
    pub fn with_fits_chunk_records(mut self, count: usize) -> Self {
        self.fits_chunk_records = count;
        self
    }

    /// Set the read buffer size.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Check the configuration for values the parsers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.csv.field_separators.is_empty() {
            return Err(CodecError::config("csv.field_separators must not be empty"));
        }
        if self.csv.record_separators.is_empty() {
            return Err(CodecError::config("csv.record_separators must not be empty"));
        }
        if self.max_vector_elements == 0 {
            return Err(CodecError::config("max_vector_elements must be positive"));
        }
        if self.fits_chunk_records == 0 {
            return Err(CodecError::config("fits_chunk_records must be positive"));
        }
        if self.read_buffer_size == 0 {
            return Err(CodecError::config("read_buffer_size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.csv.field_separators, "\t");
        assert_eq!(config.csv.record_separators, "\n");
        assert_eq!(config.fits_chunk_records, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ParserConfig::from_toml_str(
            r#"
            max_vector_elements = 16

            [csv]
            field_separators = ",;"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_vector_elements, 16);
        assert_eq!(config.csv.field_separators, ",;");
        assert_eq!(config.csv.record_separators, "\n");
        assert!(config.csv.detect_header);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let err = ParserConfig::from_toml_str("fits_chunk_records = 0").unwrap_err();
        assert!(matches!(err, CodecError::Config { .. }));
        assert!(ParserConfig::from_toml_str("max_vector_elements = \"x\"").is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = ParserConfig::new()
            .with_field_separators(",")
            .with_header_detection(false)
            .with_fits_chunk_records(10);
        assert_eq!(config.csv.field_separators, ",");
        assert!(!config.csv.detect_header);
        assert_eq!(config.fits_chunk_records, 10);
    }
}
