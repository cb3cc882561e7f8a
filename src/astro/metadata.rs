// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Coordinate and time system declarations collected while parsing.

use std::collections::HashMap;

use super::frame::AstroFrame;
use super::time::TimeFrame;
use crate::core::Field;

/// COOSYS/TIMESYS declarations keyed by ID, plus STC bindings of fields.
///
/// Declarations persist across tables of one document; an ID declared
/// twice keeps the latest definition.
#[derive(Debug, Clone, Default)]
pub struct FrameMetadata {
    coosys: HashMap<String, AstroFrame>,
    timesys: HashMap<String, TimeFrame>,
    /// Field ID (or name) to a COOSYS/TIMESYS ID, from STC GROUPs.
    bindings: HashMap<String, String>,
}

/// Outcome of looking up a field's coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameLookup {
    /// A system was declared for the field.
    Declared(AstroFrame),
    /// The field references an ID that was never declared.
    Dangling(String),
    /// Several systems exist and the field names none of them.
    Ambiguous,
    /// No system was declared at all.
    Undeclared,
}

impl FrameMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coosys(&mut self, id: impl Into<String>, frame: AstroFrame) {
        self.coosys.insert(id.into(), frame);
    }

    pub fn add_timesys(&mut self, id: impl Into<String>, frame: TimeFrame) {
        self.timesys.insert(id.into(), frame);
    }

    /// Bind a field (by ID or name) to a system ID, as an STC GROUP does.
    pub fn bind(&mut self, field_ref: impl Into<String>, system_id: impl Into<String>) {
        self.bindings.insert(field_ref.into(), system_id.into());
    }

    pub fn coosys(&self, id: &str) -> Option<&AstroFrame> {
        self.coosys.get(id)
    }

    pub fn timesys(&self, id: &str) -> Option<&TimeFrame> {
        self.timesys.get(id)
    }

    pub fn coosys_count(&self) -> usize {
        self.coosys.len()
    }

    pub fn timesys_count(&self) -> usize {
        self.timesys.len()
    }

    fn binding_for(&self, field: &Field) -> Option<&String> {
        field
            .id
            .as_ref()
            .and_then(|id| self.bindings.get(id))
            .or_else(|| self.bindings.get(&field.name))
    }

    /// Resolve the coordinate system of a position field.
    ///
    /// The field's `ref` wins, then an STC binding, then the sole declared
    /// COOSYS.
    pub fn frame_for(&self, field: &Field) -> FrameLookup {
        let reference = field
            .reference
            .as_ref()
            .filter(|r| self.coosys.contains_key(*r) || !self.timesys.contains_key(*r))
            .or_else(|| self.binding_for(field));
        match reference {
            Some(id) => match self.coosys.get(id) {
                Some(frame) => FrameLookup::Declared(frame.clone()),
                None => FrameLookup::Dangling(id.clone()),
            },
            None => match self.coosys.len() {
                0 => FrameLookup::Undeclared,
                1 => self
                    .coosys
                    .values()
                    .next()
                    .cloned()
                    .map_or(FrameLookup::Undeclared, FrameLookup::Declared),
                _ => FrameLookup::Ambiguous,
            },
        }
    }

    /// Resolve the time system of a time field, if any was declared.
    pub fn time_frame_for(&self, field: &Field) -> Option<TimeFrame> {
        let by_ref = field
            .reference
            .as_ref()
            .and_then(|r| self.timesys.get(r))
            .or_else(|| self.binding_for(field).and_then(|id| self.timesys.get(id)));
        match by_ref {
            Some(frame) => Some(frame.clone()),
            None if self.timesys.len() == 1 => self.timesys.values().next().cloned(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::frame::FrameSystem;

    #[test]
    fn test_frame_lookup_by_ref_and_sole_system() {
        let mut meta = FrameMetadata::new();
        assert_eq!(meta.frame_for(&Field::new("ra")), FrameLookup::Undeclared);

        meta.add_coosys("gal", AstroFrame::galactic());
        let plain = Field::new("ra");
        match meta.frame_for(&plain) {
            FrameLookup::Declared(frame) => assert_eq!(frame.system, FrameSystem::Galactic),
            other => panic!("unexpected {other:?}"),
        }

        meta.add_coosys("icrs", AstroFrame::icrs());
        assert_eq!(meta.frame_for(&plain), FrameLookup::Ambiguous);

        let with_ref = Field::new("ra").with_reference("icrs");
        assert_eq!(meta.frame_for(&with_ref), FrameLookup::Declared(AstroFrame::icrs()));

        let dangling = Field::new("ra").with_reference("nope");
        assert_eq!(meta.frame_for(&dangling), FrameLookup::Dangling("nope".into()));
    }

    #[test]
    fn test_stc_binding() {
        let mut meta = FrameMetadata::new();
        meta.add_coosys("a", AstroFrame::icrs());
        meta.add_coosys("b", AstroFrame::galactic());
        meta.bind("col_ra", "b");
        let field = Field::new("ra").with_id("col_ra");
        assert_eq!(meta.frame_for(&field), FrameLookup::Declared(AstroFrame::galactic()));
    }

    #[test]
    fn test_time_frame_lookup() {
        let mut meta = FrameMetadata::new();
        let field = Field::new("obs_time").with_reference("ts");
        assert!(meta.time_frame_for(&field).is_none());
        meta.add_timesys("ts", TimeFrame::from_timesys(None, "TT", None));
        assert!(meta.time_frame_for(&field).is_some());
    }
}
