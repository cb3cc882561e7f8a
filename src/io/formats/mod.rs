// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Table format implementations.
//!
//! - [`votable`]: VOTable and Astrores XML, including inline and linked streams
//! - [`csv`]: character-separated tables
//! - [`fits`]: FITS ASCII and binary table extensions

pub mod csv;
pub mod fits;
pub mod votable;
