// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! VOTable and Astrores XML tables.
//!
//! - [`events`] - Tokenizer boundary and the quick-xml driver
//! - [`scope`] - Scope frames of the state machine
//! - [`machine`] - Element semantics

pub mod events;
pub mod machine;
pub mod scope;

use std::io::BufRead;
use std::ops::ControlFlow;

pub use events::{Attributes, XmlDriver, XmlEventHandler};
pub use machine::VoTableMachine;

use crate::io::fetch::StreamFetcher;
use crate::io::session::ParseSession;
use crate::Result;

/// Parse an XML document into `session`.
///
/// Returns `Break` when the parse was cancelled.
pub fn parse_xml<R: BufRead>(
    input: R,
    session: &mut ParseSession<'_>,
    fetcher: &dyn StreamFetcher,
) -> Result<ControlFlow<()>> {
    let driver = XmlDriver::new(session.config().read_buffer_size);
    let mut machine = VoTableMachine::new(session, fetcher);
    driver.drive(input, &mut machine)
}
