// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! XML tokenizer boundary.
//!
//! The VOTable state machine only sees [`XmlEventHandler`] callbacks.
//! [`XmlDriver`] produces them from a byte stream with quick-xml; any
//! other tokenizer can drive the machine the same way.

use std::io::BufRead;
use std::ops::ControlFlow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use crate::{CodecError, Result};

/// Attributes of one start tag, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Value of `name`, trimmed; blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Receiver of XML events in document order.
///
/// Each callback may stop the document with `ControlFlow::Break` or fail
/// it with an error. `depth` is 1 for the root element.
pub trait XmlEventHandler {
    fn start_element(
        &mut self,
        name: &str,
        attrs: &Attributes,
        depth: usize,
    ) -> Result<ControlFlow<()>>;

    fn characters(&mut self, text: &str) -> Result<ControlFlow<()>>;

    fn end_element(&mut self, name: &str) -> Result<ControlFlow<()>>;
}

/// quick-xml based event source.
#[derive(Debug, Clone)]
pub struct XmlDriver {
    buffer_capacity: usize,
}

impl Default for XmlDriver {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

impl XmlDriver {
    pub fn new(buffer_capacity: usize) -> Self {
        Self { buffer_capacity }
    }

    /// Tokenize `input` and deliver every event to `handler`.
    ///
    /// Element names are reported without their namespace prefix.
    /// Returns `Break` when the handler stopped the document.
    pub fn drive<R, H>(&self, input: R, handler: &mut H) -> Result<ControlFlow<()>>
    where
        R: BufRead,
        H: XmlEventHandler + ?Sized,
    {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::with_capacity(self.buffer_capacity.min(1 << 20));
        let mut depth = 0usize;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                CodecError::parse(
                    "XML",
                    format!("{e} at byte {}", reader.buffer_position()),
                )
            })?;
            let flow = match event {
                Event::Start(start) => {
                    depth += 1;
                    let (name, attrs) = element_parts(&start);
                    handler.start_element(&name, &attrs, depth)?
                }
                Event::Empty(start) => {
                    let (name, attrs) = element_parts(&start);
                    match handler.start_element(&name, &attrs, depth + 1)? {
                        ControlFlow::Continue(()) => handler.end_element(&name)?,
                        stop => stop,
                    }
                }
                Event::End(end) => {
                    depth = depth.saturating_sub(1);
                    let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                    handler.end_element(&name)?
                }
                Event::Text(text) => match text.unescape() {
                    Ok(text) => handler.characters(&text)?,
                    Err(_) => handler.characters(&String::from_utf8_lossy(&text))?,
                },
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    handler.characters(&String::from_utf8_lossy(&bytes))?
                }
                Event::Eof => break,
                other => {
                    trace!(event = ?other, "ignored XML event");
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                return Ok(flow);
            }
            buf.clear();
        }
        Ok(ControlFlow::Continue(()))
    }
}

fn element_parts(start: &BytesStart<'_>) -> (String, Attributes) {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Attributes::new();
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attrs.push(key, value);
    }
    (name, attrs)
}
