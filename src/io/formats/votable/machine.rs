// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! VOTable and Astrores event state machine.
//!
//! Every open element is one [`Scope`] on a stack; an element's data lives
//! in its frame until the element closes. Table lifecycle calls go to the
//! [`ParseSession`]:
//!
//! ```text
//! RESOURCE  -> start_resource / end_resource
//! TABLE     -> start_table / end_table
//! FIELD     -> declare_field (on close, with VALUES and DESCRIPTION)
//! DATA      -> freeze_fields (role assignment)
//! TR        -> consume_record (on close)
//! STREAM    -> binary decoder or FITS reader -> consume_record
//! CSV       -> CSV table parser -> consume_record
//! ```
//!
//! A format error inside a table aborts that table only: the rest of its
//! data is ignored up to `</TABLE>`.

use std::io::{Cursor, Read};
use std::ops::ControlFlow;

use tracing::{debug, trace, warn};

use super::events::{Attributes, XmlEventHandler};
use super::scope::{field_from_attrs, Group, Param, Scope, StreamSink};
use crate::astro::{AstroFrame, TimeFrame};
use crate::core::{Diagnostic, DiagnosticKind};
use crate::encoding::{
    Base64StreamDecoder, BinaryFlavor, BinaryStreamDecoder, DecoderState, FeedStatus,
};
use crate::io::fetch::StreamFetcher;
use crate::io::formats::csv::{CsvTableOptions, CsvTableParser, HeaderMode};
use crate::io::formats::fits::FitsStreamParser;
use crate::io::session::ParseSession;
use crate::{CodecError, Result};

const CONTINUE: ControlFlow<()> = ControlFlow::Continue(());

/// Turns XML events into session calls.
pub struct VoTableMachine<'a, 's> {
    session: &'a mut ParseSession<'s>,
    fetcher: &'a dyn StreamFetcher,
    scopes: Vec<Scope>,
    /// The current table was aborted; its remaining content is ignored
    skip_table: bool,
    /// FIELDs declared in the current table
    field_count: usize,
    /// Systems declared without an ID
    anonymous_systems: usize,
}

impl<'a, 's> VoTableMachine<'a, 's> {
    pub fn new(session: &'a mut ParseSession<'s>, fetcher: &'a dyn StreamFetcher) -> Self {
        Self {
            session,
            fetcher,
            scopes: Vec::new(),
            skip_table: false,
            field_count: 0,
            anonymous_systems: 0,
        }
    }

    /// Nesting depth not counting GROUP elements.
    pub fn structural_depth(&self) -> usize {
        self.scopes.iter().filter(|s| s.is_structural()).count()
    }

    fn anonymous_id(&mut self) -> String {
        self.anonymous_systems += 1;
        format!("_system{}", self.anonymous_systems)
    }

    fn in_data(&self) -> bool {
        self.scopes.iter().any(|s| matches!(s, Scope::Data))
    }

    /// Abort the current table on a table-level error; pass others up.
    fn settle(&mut self, result: Result<ControlFlow<()>>) -> Result<ControlFlow<()>> {
        match result {
            Err(e) if e.is_table_fatal() => {
                self.session.abort_table(&e);
                self.skip_table = true;
                for scope in self.scopes.iter_mut().rev() {
                    if let Scope::Stream(sink) = scope {
                        *sink = StreamSink::Done;
                    }
                }
                Ok(CONTINUE)
            }
            other => other,
        }
    }

    fn open_table(&mut self, attrs: &Attributes) {
        self.skip_table = false;
        self.field_count = 0;
        let name = attrs.get("name").or_else(|| attrs.get("ID"));
        self.session.start_table(name);
    }

    fn declare_coosys(&mut self, attrs: &Attributes) {
        let id = match attrs.get("ID") {
            Some(id) => id.to_string(),
            None => self.anonymous_id(),
        };
        let frame = AstroFrame::parse(
            attrs.get("system").unwrap_or("eq_FK5"),
            attrs.get("equinox"),
            attrs.get("epoch"),
        );
        debug!(id, frame = %frame, "COOSYS");
        self.session.metadata_mut().add_coosys(id, frame);
    }

    fn declare_timesys(&mut self, attrs: &Attributes) {
        let id = match attrs.get("ID") {
            Some(id) => id.to_string(),
            None => self.anonymous_id(),
        };
        let frame = TimeFrame::from_timesys(
            attrs.get("timeorigin"),
            attrs.get("timescale").unwrap_or("UNKNOWN"),
            attrs.get("refposition"),
        );
        debug!(id, scale = ?frame.scale, "TIMESYS");
        self.session.metadata_mut().add_timesys(id, frame);
    }

    fn open_csv(&self, attrs: &Attributes) -> Scope {
        let config = &self.session.config().csv;
        let fields = attrs
            .get("colsep")
            .map_or_else(|| config.field_separators.clone(), unescape_separator);
        let records = attrs
            .get("recsep")
            .map_or_else(|| config.record_separators.clone(), unescape_separator);
        let skip = attrs
            .get("headlines")
            .and_then(|h| h.parse().ok())
            .unwrap_or(0);
        let options = CsvTableOptions::from_config(config)
            .with_separators(fields, records)
            .with_header(HeaderMode::Declared)
            .with_skip_lines(skip);
        Scope::Csv(Box::new(CsvTableParser::new(&options)))
    }

    fn open_stream(&mut self, attrs: &Attributes) -> Result<(Scope, ControlFlow<()>)> {
        let parent = match self.scopes.last() {
            Some(Scope::Binary(flavor)) => Some(Ok(*flavor)),
            Some(Scope::Fits { extnum }) => Some(Err(*extnum)),
            _ => None,
        };
        let Some(parent) = parent.filter(|_| !self.skip_table) else {
            return Ok((Scope::Stream(StreamSink::Done), CONTINUE));
        };
        let encoding = attrs.get("encoding").unwrap_or("none");
        let href = attrs.get("href");
        let inline_ok = matches!(encoding, "base64" | "none");
        let remote_ok = encoding == "none";

        if let Some(href) = href {
            if !remote_ok {
                let flow = self.settle(Err(CodecError::unsupported(format!(
                    "STREAM encoding '{encoding}'"
                ))))?;
                return Ok((Scope::Stream(StreamSink::Done), flow));
            }
            let result = match parent {
                Ok(flavor) => self.read_remote_binary(href, flavor),
                Err(extnum) => self.read_remote_fits(href, extnum),
            };
            let flow = self.settle(result)?;
            return Ok((Scope::Stream(StreamSink::Done), flow));
        }

        if !inline_ok {
            let flow = self.settle(Err(CodecError::unsupported(format!(
                "STREAM encoding '{encoding}'"
            ))))?;
            return Ok((Scope::Stream(StreamSink::Done), flow));
        }
        let sink = match parent {
            Ok(flavor) => {
                let state = match DecoderState::from_fields(self.session.fields()) {
                    Ok(state) => state,
                    Err(e) => {
                        let flow = self.settle(Err(e))?;
                        return Ok((Scope::Stream(StreamSink::Done), flow));
                    }
                };
                StreamSink::Binary {
                    decoder: BinaryStreamDecoder::new(
                        flavor,
                        self.session.config().max_vector_elements,
                    ),
                    state,
                    base64: Base64StreamDecoder::new(),
                }
            }
            Err(extnum) => StreamSink::Fits {
                extnum,
                base64: Base64StreamDecoder::new(),
                bytes: Vec::new(),
            },
        };
        Ok((Scope::Stream(sink), CONTINUE))
    }

    fn read_remote_binary(&mut self, href: &str, flavor: BinaryFlavor) -> Result<ControlFlow<()>> {
        let mut reader = self.open_href(href)?;
        let decoder = BinaryStreamDecoder::new(flavor, self.session.config().max_vector_elements);
        let mut state = DecoderState::from_fields(self.session.fields())?;
        let mut buf = vec![0u8; self.session.config().read_buffer_size.max(1)];
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| CodecError::format("STREAM", format!("{href}: {e}")))?;
            if n == 0 {
                break;
            }
            if feed_binary(self.session, &decoder, &mut state, &buf[..n])?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
            if state.finished {
                break;
            }
        }
        close_binary(self.session, &decoder, &mut state);
        Ok(CONTINUE)
    }

    fn read_remote_fits(&mut self, href: &str, extnum: usize) -> Result<ControlFlow<()>> {
        let mut reader = self.open_href(href)?;
        let status = FitsStreamParser::with_extnum(extnum).parse(&mut reader, self.session)?;
        Ok(self.after_fits(status))
    }

    fn open_href(&self, href: &str) -> Result<Box<dyn Read>> {
        // A missing external stream only loses this table.
        self.fetcher
            .open_stream(href)
            .map_err(|e| CodecError::format("STREAM href", e.to_string()))
    }

    fn after_fits(&mut self, status: FeedStatus) -> ControlFlow<()> {
        if !self.session.has_table() {
            self.skip_table = true;
        }
        if status == FeedStatus::Stopped {
            ControlFlow::Break(())
        } else {
            CONTINUE
        }
    }

    fn close_stream(&mut self, sink: StreamSink) -> Result<ControlFlow<()>> {
        match sink {
            StreamSink::Binary {
                decoder,
                mut state,
                mut base64,
            } => {
                let tail = base64.finish()?;
                if feed_binary(self.session, &decoder, &mut state, &tail)?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                close_binary(self.session, &decoder, &mut state);
                Ok(CONTINUE)
            }
            StreamSink::Fits {
                extnum,
                mut base64,
                mut bytes,
            } => {
                bytes.extend(base64.finish()?);
                let mut cursor = Cursor::new(bytes);
                let status = FitsStreamParser::with_extnum(extnum).parse(&mut cursor, self.session)?;
                Ok(self.after_fits(status))
            }
            StreamSink::Done => Ok(CONTINUE),
        }
    }

    fn close_info(&mut self, name: Option<String>, value: Option<String>, text: String) -> Result<()> {
        let Some(name) = name else {
            return Ok(());
        };
        let message = Some(text.trim())
            .filter(|t| !t.is_empty())
            .or(value.as_deref())
            .unwrap_or("")
            .to_string();
        let value = value.as_deref().unwrap_or("");
        if name.eq_ignore_ascii_case("QUERY_STATUS") {
            if value.eq_ignore_ascii_case("ERROR") {
                let message = if message.eq_ignore_ascii_case("ERROR") {
                    "Query failed".to_string()
                } else {
                    message
                };
                return Err(CodecError::server(message));
            }
            if value.eq_ignore_ascii_case("OVERFLOW") {
                self.session.diagnostic(Diagnostic::warning(
                    DiagnosticKind::Server,
                    format!("Result truncated by the server: {message}"),
                ));
            }
        } else if name.eq_ignore_ascii_case("ERRORS") {
            return Err(CodecError::server(message));
        }
        Ok(())
    }
}

/// Feed decoded stream bytes to the binary decoder.
fn feed_binary(
    session: &mut ParseSession<'_>,
    decoder: &BinaryStreamDecoder,
    state: &mut DecoderState,
    bytes: &[u8],
) -> Result<ControlFlow<()>> {
    if bytes.is_empty() {
        return Ok(CONTINUE);
    }
    let status = decoder.feed(state, bytes, |record| session.consume_record(record))?;
    if status == FeedStatus::Stopped {
        session.set_unread_tail(state.pending_bytes().to_vec());
        return Ok(ControlFlow::Break(()));
    }
    Ok(CONTINUE)
}

fn close_binary(session: &mut ParseSession<'_>, decoder: &BinaryStreamDecoder, state: &mut DecoderState) {
    let leftover = decoder.finish(state);
    if leftover > 0 {
        session.diagnostic(Diagnostic::warning(
            DiagnosticKind::Truncation,
            format!(
                "Binary stream ended inside a record after {} records; {leftover} bytes dropped",
                state.records
            ),
        ));
    }
}

/// `colsep="\t"` style attribute values.
fn unescape_separator(text: &str) -> String {
    match text {
        "\\t" => "\t".to_string(),
        "\\n" => "\n".to_string(),
        "\\r\\n" => "\r\n".to_string(),
        other => other.to_string(),
    }
}

fn stream_text(
    session: &mut ParseSession<'_>,
    sink: &mut StreamSink,
    text: &str,
) -> Result<ControlFlow<()>> {
    match sink {
        StreamSink::Binary {
            decoder,
            state,
            base64,
        } => {
            let bytes = base64.feed(text)?;
            feed_binary(session, decoder, state, &bytes)
        }
        StreamSink::Fits { base64, bytes, .. } => {
            bytes.extend(base64.feed(text)?);
            Ok(CONTINUE)
        }
        StreamSink::Done => Ok(CONTINUE),
    }
}

impl XmlEventHandler for VoTableMachine<'_, '_> {
    fn start_element(
        &mut self,
        name: &str,
        attrs: &Attributes,
        depth: usize,
    ) -> Result<ControlFlow<()>> {
        trace!(name, depth, structural = self.structural_depth(), "start element");
        let mut flow = CONTINUE;
        let scope = match name {
            "VOTABLE" | "ASTRO" => Scope::Document,
            "RESOURCE" => {
                self.session
                    .start_resource(attrs.get("name").or_else(|| attrs.get("ID")));
                Scope::Resource
            }
            "TABLE" => {
                self.open_table(attrs);
                Scope::Table
            }
            "FIELD" => Scope::Field(field_from_attrs(attrs, self.field_count)),
            "PARAM" => Scope::Param(Param::from_attrs(attrs)),
            "GROUP" => Scope::Group(Group::from_attrs(attrs)),
            "FIELDref" => {
                if let (Some(Scope::Group(group)), Some(field_ref)) =
                    (self.scopes.last_mut(), attrs.get("ref"))
                {
                    group.field_refs.push(field_ref.to_string());
                }
                Scope::Other
            }
            "VALUES" => {
                if let (Some(Scope::Field(field)), Some(null)) =
                    (self.scopes.last_mut(), attrs.get("null"))
                {
                    field.null_value = Some(null.to_string());
                }
                Scope::Values
            }
            "DESCRIPTION" => Scope::Description(String::new()),
            "INFO" => Scope::Info {
                name: attrs.get("name").map(str::to_string),
                value: attrs.get("value").map(str::to_string),
                text: String::new(),
            },
            "COOSYS" => {
                self.declare_coosys(attrs);
                Scope::Coosys
            }
            "TIMESYS" => {
                self.declare_timesys(attrs);
                Scope::Timesys
            }
            "DATA" => {
                if !self.skip_table {
                    self.session.freeze_fields();
                }
                Scope::Data
            }
            "TABLEDATA" => Scope::TableData,
            "TR" => Scope::Row(Vec::with_capacity(self.session.fields().len())),
            "TD" => Scope::Cell(String::new()),
            "BINARY" => Scope::Binary(BinaryFlavor::Binary),
            "BINARY2" => Scope::Binary(BinaryFlavor::Binary2),
            "STREAM" => {
                let (scope, stream_flow) = self.open_stream(attrs)?;
                flow = stream_flow;
                scope
            }
            "CSV" => self.open_csv(attrs),
            "FITS" => Scope::Fits {
                extnum: attrs
                    .get("extnum")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(1),
            },
            _ => Scope::Other,
        };
        self.scopes.push(scope);
        Ok(flow)
    }

    fn characters(&mut self, text: &str) -> Result<ControlFlow<()>> {
        let result = match self.scopes.last_mut() {
            Some(Scope::Cell(cell)) => {
                cell.push_str(text);
                Ok(CONTINUE)
            }
            Some(Scope::Description(buf)) | Some(Scope::Info { text: buf, .. }) => {
                buf.push_str(text);
                Ok(CONTINUE)
            }
            Some(Scope::Stream(sink)) => stream_text(self.session, sink, text),
            Some(Scope::Csv(parser)) if !self.skip_table => {
                match parser.feed(self.session, text).0 {
                    FeedStatus::Stopped => Ok(ControlFlow::Break(())),
                    _ => Ok(CONTINUE),
                }
            }
            _ => Ok(CONTINUE),
        };
        self.settle(result)
    }

    fn end_element(&mut self, name: &str) -> Result<ControlFlow<()>> {
        let Some(scope) = self.scopes.pop() else {
            warn!(name, "unbalanced end element");
            return Ok(CONTINUE);
        };
        let result = match scope {
            Scope::Resource => {
                self.session.end_resource();
                Ok(CONTINUE)
            }
            Scope::Table => {
                self.session.end_table();
                self.skip_table = false;
                Ok(CONTINUE)
            }
            Scope::Field(field) => {
                self.field_count += 1;
                if !self.skip_table && !self.in_data() {
                    self.session.declare_field(field);
                }
                Ok(CONTINUE)
            }
            Scope::Param(param) => {
                if let Some(Scope::Group(group)) = self.scopes.last_mut() {
                    group.params.push(param);
                }
                Ok(CONTINUE)
            }
            Scope::Group(group) => {
                let fallback = match group.id {
                    Some(_) => String::new(),
                    None => self.anonymous_id(),
                };
                group.apply(self.session.metadata_mut(), &fallback);
                Ok(CONTINUE)
            }
            Scope::Description(text) => {
                if let Some(Scope::Field(field)) = self.scopes.last_mut() {
                    let text = text.trim();
                    if !text.is_empty() {
                        field.description = Some(text.to_string());
                    }
                }
                Ok(CONTINUE)
            }
            Scope::Info { name, value, text } => self.close_info(name, value, text).map(|_| CONTINUE),
            Scope::Cell(text) => {
                if let Some(Scope::Row(cells)) = self.scopes.last_mut() {
                    cells.push(text.trim().to_string());
                }
                Ok(CONTINUE)
            }
            Scope::Row(cells) if !self.skip_table => Ok(self.session.consume_record(cells)),
            Scope::Stream(sink) => self.close_stream(sink),
            Scope::Csv(mut parser) if !self.skip_table => match parser.finish(self.session) {
                FeedStatus::Stopped => Ok(ControlFlow::Break(())),
                _ => Ok(CONTINUE),
            },
            _ => Ok(CONTINUE),
        };
        self.settle(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParserConfig;
    use crate::io::fetch::FileFetcher;
    use crate::io::formats::votable::events::XmlDriver;
    use crate::io::session::CancelToken;
    use crate::io::sink::CollectingSink;

    fn run(xml: &str) -> (CollectingSink, Result<ControlFlow<()>>) {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let result = {
            let mut session = ParseSession::new(&mut sink, &config, CancelToken::new());
            let fetcher = FileFetcher::new();
            let mut machine = VoTableMachine::new(&mut session, &fetcher);
            let result = XmlDriver::default().drive(xml.as_bytes(), &mut machine);
            let _ = session.finish();
            result
        };
        (sink, result)
    }

    #[test]
    fn test_field_metadata_collected() {
        let xml = r#"<VOTABLE><RESOURCE name="r"><TABLE name="t">
            <FIELD name="RA" ucd="pos.eq.ra;meta.main" datatype="double" unit="deg"/>
            <FIELD name="DE" ucd="pos.eq.dec;meta.main" datatype="double" unit="deg"/>
            <FIELD name="flag" datatype="int"><DESCRIPTION> quality </DESCRIPTION><VALUES null="-1"/></FIELD>
            <DATA><TABLEDATA><TR><TD>1</TD><TD>2</TD><TD>-1</TD></TR></TABLEDATA></DATA>
            </TABLE></RESOURCE></VOTABLE>"#;
        let (sink, result) = run(xml);
        assert!(result.unwrap().is_continue());
        let table = &sink.tables[0];
        assert_eq!(table.resource.as_deref(), Some("r"));
        assert_eq!(table.fields[2].description.as_deref(), Some("quality"));
        assert_eq!(table.fields[2].null_value.as_deref(), Some("-1"));
        assert_eq!(table.records[0].raw, vec!["1", "2", "-1"]);
        assert!(table.complete);
    }

    #[test]
    fn test_group_does_not_break_table() {
        let xml = r#"<VOTABLE><RESOURCE><TABLE>
            <GROUP ID="sys" utype="stc:AstroCoordSystem">
              <PARAM name="frame" utype="stc:AstroCoordSystem.SpaceFrame.CoordRefFrame" value="GALACTIC" datatype="char" arraysize="*"/>
            </GROUP>
            <GROUP utype="stc:AstroCoords" ref="sys"><FIELDref ref="l"/><FIELDref ref="b"/></GROUP>
            <FIELD ID="l" name="lon" ucd="pos.eq.ra" datatype="double"/>
            <FIELD ID="b" name="lat" ucd="pos.eq.dec" datatype="double"/>
            <DATA><TABLEDATA><TR><TD>0</TD><TD>90</TD></TR></TABLEDATA></DATA>
            </TABLE></RESOURCE></VOTABLE>"#;
        let (sink, _) = run(xml);
        let record = &sink.tables[0].records[0];
        // Galactic north pole in ICRS
        assert!((record.lon.unwrap() - 192.859_48).abs() < 1e-3);
        assert!((record.lat.unwrap() - 27.128_25).abs() < 1e-3);
    }

    #[test]
    fn test_query_status_error() {
        let xml = r#"<VOTABLE><RESOURCE type="results">
            <INFO name="QUERY_STATUS" value="ERROR">Table not found</INFO>
            </RESOURCE></VOTABLE>"#;
        let (_, result) = run(xml);
        match result {
            Err(CodecError::Server { message }) => assert_eq!(message, "Table not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_query_status_overflow_is_warning() {
        let xml = r#"<VOTABLE><RESOURCE><INFO name="QUERY_STATUS" value="OVERFLOW"/>
            <TABLE><FIELD name="a"/><DATA><TABLEDATA><TR><TD>1</TD></TR></TABLEDATA></DATA></TABLE>
            </RESOURCE></VOTABLE>"#;
        let (sink, result) = run(xml);
        assert!(result.is_ok());
        assert_eq!(sink.record_count(), 1);
        assert!(sink.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Server));
    }

    #[test]
    fn test_astrores_csv() {
        let xml = "<ASTRO><TABLE><FIELD name=\"RA\"/><FIELD name=\"DEC\"/>\
            <DATA><CSV colsep=\"|\" headlines=\"2\"><![CDATA[RA|DEC\n--|---\n10.5|-5.25\n20|30\n]]></CSV></DATA>\
            </TABLE></ASTRO>";
        let (sink, _) = run(xml);
        let table = &sink.tables[0];
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].lon, Some(10.5));
        assert_eq!(table.records[0].lat, Some(-5.25));
    }

    #[test]
    fn test_missing_href_aborts_only_that_table() {
        let xml = r#"<VOTABLE><RESOURCE>
            <TABLE name="a"><FIELD name="x" datatype="int"/>
              <DATA><BINARY><STREAM href="file:///nonexistent/astrocodec.bin"/></BINARY></DATA></TABLE>
            <TABLE name="b"><FIELD name="x" datatype="int"/>
              <DATA><TABLEDATA><TR><TD>7</TD></TR></TABLEDATA></DATA></TABLE>
            </RESOURCE></VOTABLE>"#;
        let (sink, result) = run(xml);
        assert!(result.is_ok());
        assert_eq!(sink.tables.len(), 2);
        assert!(sink.tables[0].records.is_empty());
        assert_eq!(sink.tables[1].records[0].raw, vec!["7"]);
        assert_eq!(
            sink.diagnostics
                .iter()
                .filter(|d| d.kind == DiagnosticKind::Format)
                .count(),
            1
        );
    }

    #[test]
    fn test_unsupported_stream_encoding() {
        let xml = r#"<VOTABLE><RESOURCE><TABLE><FIELD name="x" datatype="int"/>
            <DATA><BINARY><STREAM encoding="gzip">AAAA</STREAM></BINARY></DATA></TABLE>
            </RESOURCE></VOTABLE>"#;
        let (sink, result) = run(xml);
        assert!(result.is_ok());
        assert_eq!(sink.record_count(), 0);
        assert_eq!(sink.diagnostics.len(), 1);
    }

    #[test]
    fn test_structural_depth_ignores_groups() {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let mut session = ParseSession::new(&mut sink, &config, CancelToken::new());
        let fetcher = FileFetcher::new();
        let mut machine = VoTableMachine::new(&mut session, &fetcher);
        let none = Attributes::new();
        for name in ["VOTABLE", "RESOURCE", "GROUP", "GROUP", "PARAM"] {
            machine.start_element(name, &none, 0).unwrap();
        }
        assert_eq!(machine.structural_depth(), 3);
    }
}
