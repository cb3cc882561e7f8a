// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Typed scope frames of the VOTable state machine.

use tracing::debug;

use super::events::Attributes;
use crate::astro::{AstroFrame, FrameMetadata, TimeFrame};
use crate::core::{ArraySize, DataType, Field};
use crate::encoding::{BinaryFlavor, BinaryStreamDecoder, DecoderState};
use crate::encoding::Base64StreamDecoder;
use crate::io::formats::csv::CsvTableParser;

/// Data collected for a `PARAM`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub utype: Option<String>,
    pub ucd: Option<String>,
    pub value: Option<String>,
}

impl Param {
    pub fn from_attrs(attrs: &Attributes) -> Self {
        Self {
            name: attrs.get("name").map(str::to_string),
            utype: attrs.get("utype").map(str::to_string),
            ucd: attrs.get("ucd").map(str::to_string),
            value: attrs.get("value").map(str::to_string),
        }
    }

    /// Last component of the utype (or the name), lowercased.
    fn key(&self) -> String {
        let source = self.utype.as_deref().or(self.name.as_deref()).unwrap_or("");
        source
            .rsplit(['.', ':'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

/// What an STC `GROUP` describes, from its `utype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// `stc:AstroCoordSystem`: a coordinate and/or time system definition
    CoordSystem,
    /// `stc:AstroCoords`: binds FIELDrefs to a system
    Coords,
    /// Spectral energy distribution point
    SedPoint,
    Plain,
}

impl GroupKind {
    pub fn from_utype(utype: Option<&str>) -> Self {
        let Some(utype) = utype.map(str::to_ascii_lowercase) else {
            return GroupKind::Plain;
        };
        if utype.contains("astrocoordsystem") {
            GroupKind::CoordSystem
        } else if utype.contains("astrocoords") {
            GroupKind::Coords
        } else if utype.contains("sed") {
            GroupKind::SedPoint
        } else {
            GroupKind::Plain
        }
    }
}

/// An open `GROUP`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    pub id: Option<String>,
    /// `ref` attribute, the system an `AstroCoords` group refers to
    pub reference: Option<String>,
    pub params: Vec<Param>,
    pub field_refs: Vec<String>,
}

impl Group {
    pub fn from_attrs(attrs: &Attributes) -> Self {
        Self {
            kind: GroupKind::from_utype(attrs.get("utype")),
            id: attrs.get("ID").map(str::to_string),
            reference: attrs.get("ref").map(str::to_string),
            params: Vec::new(),
            field_refs: Vec::new(),
        }
    }

    /// Record what the group declares into `metadata`.
    ///
    /// `fallback_id` names a system group that carries no `ID`.
    pub fn apply(&self, metadata: &mut FrameMetadata, fallback_id: &str) {
        match self.kind {
            GroupKind::CoordSystem => {
                let id = self.id.as_deref().unwrap_or(fallback_id);
                let mut system = None;
                let mut equinox = None;
                let mut epoch = None;
                let mut scale = None;
                let mut ref_position = None;
                let mut origin = None;
                for param in &self.params {
                    let value = param.value.as_deref();
                    match param.key().as_str() {
                        "coordrefframe" | "coordsys" | "system" | "frame" => system = value,
                        "equinox" => equinox = value,
                        "epoch" => epoch = value,
                        "timescale" => scale = value,
                        "refposition" | "referenceposition" => ref_position = value,
                        "timeorigin" | "origin" => origin = value,
                        _ => {}
                    }
                }
                if let Some(system) = system {
                    debug!(id, system, "STC coordinate system");
                    metadata.add_coosys(id, AstroFrame::parse(system, equinox, epoch));
                }
                if let Some(scale) = scale {
                    debug!(id, scale, "STC time system");
                    metadata.add_timesys(id, TimeFrame::from_timesys(origin, scale, ref_position));
                }
            }
            GroupKind::Coords => {
                let Some(system) = self.reference.as_deref() else {
                    return;
                };
                for field_ref in &self.field_refs {
                    metadata.bind(field_ref.as_str(), system);
                }
            }
            GroupKind::SedPoint => {
                debug!(
                    params = self.params.len(),
                    fields = self.field_refs.len(),
                    "SED point group ignored"
                );
            }
            GroupKind::Plain => {}
        }
    }
}

/// Build a field from `FIELD` attributes.
pub fn field_from_attrs(attrs: &Attributes, index: usize) -> Field {
    let name = attrs
        .get("name")
        .or_else(|| attrs.get("ID"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("col{}", index + 1));
    let mut field = Field::new(name);
    field.id = attrs.get("ID").map(str::to_string);
    field.ucd = attrs.get("ucd").map(str::to_string);
    field.utype = attrs.get("utype").map(str::to_string);
    field.unit = attrs.get("unit").map(str::to_string);
    field.datatype = attrs.get("datatype").and_then(DataType::from_votable);
    field.array_size = attrs.get("arraysize").map(ArraySize::parse).unwrap_or_default();
    field.width = attrs.get("width").and_then(|w| w.parse().ok());
    field.precision = attrs.get("precision").map(str::to_string);
    field.reference = attrs.get("ref").map(str::to_string);
    field
}

/// Where the bytes of a `STREAM` go.
pub enum StreamSink {
    Binary {
        decoder: BinaryStreamDecoder,
        state: DecoderState,
        base64: Base64StreamDecoder,
    },
    /// Inline FITS, parsed once the element closes
    Fits {
        extnum: usize,
        base64: Base64StreamDecoder,
        bytes: Vec<u8>,
    },
    /// Already consumed from `href`, or unsupported; content is ignored
    Done,
}

/// One frame of the scope stack.
pub enum Scope {
    Document,
    Resource,
    Table,
    Field(Field),
    Param(Param),
    Group(Group),
    Values,
    Description(String),
    Info {
        name: Option<String>,
        value: Option<String>,
        text: String,
    },
    Coosys,
    Timesys,
    Data,
    TableData,
    Row(Vec<String>),
    Cell(String),
    Binary(BinaryFlavor),
    Stream(StreamSink),
    Csv(Box<CsvTableParser>),
    Fits { extnum: usize },
    Other,
}

impl Scope {
    /// GROUP frames do not count toward structural depth.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Scope::Group(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scope::Document => "document",
            Scope::Resource => "RESOURCE",
            Scope::Table => "TABLE",
            Scope::Field(_) => "FIELD",
            Scope::Param(_) => "PARAM",
            Scope::Group(_) => "GROUP",
            Scope::Values => "VALUES",
            Scope::Description(_) => "DESCRIPTION",
            Scope::Info { .. } => "INFO",
            Scope::Coosys => "COOSYS",
            Scope::Timesys => "TIMESYS",
            Scope::Data => "DATA",
            Scope::TableData => "TABLEDATA",
            Scope::Row(_) => "TR",
            Scope::Cell(_) => "TD",
            Scope::Binary(_) => "BINARY",
            Scope::Stream(_) => "STREAM",
            Scope::Csv(_) => "CSV",
            Scope::Fits { .. } => "FITS",
            Scope::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::frame::FrameSystem;
    use crate::astro::time::TimeScale;

    fn param(utype: &str, value: &str) -> Param {
        Param {
            utype: Some(utype.to_string()),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_kind_from_utype() {
        assert_eq!(GroupKind::from_utype(Some("stc:AstroCoordSystem")), GroupKind::CoordSystem);
        assert_eq!(GroupKind::from_utype(Some("stc:AstroCoords")), GroupKind::Coords);
        assert_eq!(GroupKind::from_utype(Some("photdm:SED")), GroupKind::SedPoint);
        assert_eq!(GroupKind::from_utype(None), GroupKind::Plain);
    }

    #[test]
    fn test_coord_system_group_declares_frames() {
        let mut group = Group::from_attrs(&Attributes::from_pairs([
            ("ID", "sys1"),
            ("utype", "stc:AstroCoordSystem"),
        ]));
        group.params = vec![
            param("stc:AstroCoordSystem.SpaceFrame.CoordRefFrame", "FK5"),
            param("stc:AstroCoordSystem.SpaceFrame.CoordRefFrame.Equinox", "J2000"),
            param("stc:AstroCoordSystem.TimeFrame.TimeScale", "TT"),
            param("stc:AstroCoordSystem.TimeFrame.ReferencePosition", "BARYCENTER"),
        ];
        let mut meta = FrameMetadata::new();
        group.apply(&mut meta, "unused");

        assert_eq!(meta.coosys("sys1").map(|f| f.system.clone()), Some(FrameSystem::Fk5));
        assert_eq!(meta.timesys("sys1").map(|t| t.scale.clone()), Some(TimeScale::Tt));
    }

    #[test]
    fn test_coords_group_binds_fields() {
        let mut group = Group::from_attrs(&Attributes::from_pairs([
            ("utype", "stc:AstroCoords"),
            ("ref", "sys1"),
        ]));
        group.field_refs = vec!["ra_col".to_string()];
        let mut meta = FrameMetadata::new();
        meta.add_coosys("sys1", AstroFrame::galactic());
        group.apply(&mut meta, "g0");

        let field = Field::new("RA").with_id("ra_col");
        assert!(matches!(
            meta.frame_for(&field),
            crate::astro::FrameLookup::Declared(frame) if frame.system == FrameSystem::Galactic
        ));
    }

    #[test]
    fn test_field_from_attrs() {
        let attrs = Attributes::from_pairs([
            ("ID", "c1"),
            ("datatype", "double"),
            ("arraysize", "3"),
            ("ucd", "pos.eq.ra"),
            ("ref", "J2000"),
        ]);
        let field = field_from_attrs(&attrs, 0);
        assert_eq!(field.name, "c1");
        assert_eq!(field.datatype, Some(DataType::Double));
        assert_eq!(field.array_size, ArraySize::Fixed(3));
        assert_eq!(field.reference.as_deref(), Some("J2000"));
        assert_eq!(field_from_attrs(&Attributes::new(), 4).name, "col5");
    }
}
