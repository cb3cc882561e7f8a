// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for astrocodec.
//!
//! Only two kinds of failure terminate parsing:
//! - [`CodecError::Format`] aborts the current table (sibling tables survive)
//! - [`CodecError::Server`] aborts the whole parse with the server's message
//!
//! Everything else that can go wrong while reading a table (misaligned rows,
//! unknown coordinate systems, unsupported time scales) is reported as a
//! [`Diagnostic`](crate::core::Diagnostic) instead.

/// Errors that can occur while decoding astronomical tables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// Malformed or unrecognised table structure. Fatal to the current table.
    #[error("Format error in {context}: {message}")]
    Format {
        /// Where the problem was found (e.g. "BINTABLE", "TFORM3")
        context: String,
        /// Error message
        message: String,
    },

    /// Error reported by the data provider (QUERY_STATUS=ERROR, INFO ERRORS).
    #[error("Server error: {message}")]
    Server {
        /// Message supplied by the server
        message: String,
    },

    /// Header keyword not present.
    #[error("Key not found: '{key}'")]
    KeyNotFound {
        /// Missing keyword
        key: String,
    },

    /// Parse error in a value or header card.
    #[error("Parse error in {context}: {message}")]
    Parse {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Buffer too short for requested read.
    #[error("Buffer too short: requested {requested} bytes at position {offset}, but only {available} bytes available")]
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Read offset when the error occurred
        offset: usize,
    },

    /// Unsupported type or feature.
    #[error("Unsupported feature: '{feature}'")]
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O failure while reading the input or a referenced stream.
    #[error("I/O error: {message}")]
    Io {
        /// Error message
        message: String,
    },
}

impl CodecError {
    /// Create a format error.
    pub fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        CodecError::Server {
            message: message.into(),
        }
    }

    /// Create a "key not found" error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        CodecError::KeyNotFound { key: key.into() }
    }

    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, offset: usize) -> Self {
        CodecError::BufferTooShort {
            requested,
            available,
            offset,
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CodecError::Config {
            message: message.into(),
        }
    }

    /// Whether this error only invalidates the current table.
    pub fn is_table_fatal(&self) -> bool {
        !matches!(self, CodecError::Server { .. } | CodecError::Io { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::Format { context, message } | CodecError::Parse { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            CodecError::Server { message }
            | CodecError::Config { message }
            | CodecError::Io { message } => vec![("message", message.clone())],
            CodecError::KeyNotFound { key } => vec![("key", key.clone())],
            CodecError::BufferTooShort {
                requested,
                available,
                offset,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("offset", offset.to_string()),
            ],
            CodecError::Unsupported { feature } => vec![("feature", feature.clone())],
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for astrocodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
