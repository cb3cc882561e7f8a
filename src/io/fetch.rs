// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Opening of external `STREAM href` resources.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::{CodecError, Result};

/// Opens the byte stream behind a `STREAM href` URI.
pub trait StreamFetcher {
    fn open_stream(&self, uri: &str) -> Result<Box<dyn Read>>;
}

/// Fetcher for `file://` URIs and plain paths.
///
/// Relative paths are resolved against the base directory, normally the
/// directory of the document being parsed. Other schemes are rejected.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    base_dir: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let path = match uri.split_once("://") {
            Some(("file", rest)) => rest.strip_prefix("localhost").unwrap_or(rest),
            Some((scheme, _)) => {
                return Err(CodecError::unsupported(format!("'{scheme}' stream URI")))
            }
            None => uri,
        };
        let path = Path::new(path);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl StreamFetcher for FileFetcher {
    fn open_stream(&self, uri: &str) -> Result<Box<dyn Read>> {
        let path = self.resolve(uri)?;
        tracing::debug!(uri, path = %path.display(), "opening external stream");
        let file = File::open(&path).map_err(|e| {
            CodecError::Io {
                message: format!("{}: {e}", path.display()),
            }
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}
