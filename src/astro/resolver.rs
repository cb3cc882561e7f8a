// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Per-record resolution of positions and times into the target frames.

use super::angle::{detect_pair_notation, parse_angle, split_combined, AngleKind, AngleUnit};
use super::frame::{propagate, AstroFrame, FrameSystem};
use super::metadata::{FrameLookup, FrameMetadata};
use super::roles::{FrameHint, RoleAssignment, TableKind};
use super::time::{infer_encoding, value_to_jd, TimeEncoding, TimeFrame};
use crate::core::{Diagnostic, DiagnosticKind, Field, MISSING_CELL};

/// Canonical values of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedPosition {
    /// ICRS right ascension in degrees, or X for XY tables
    pub lon: Option<f64>,
    /// ICRS declination in degrees, or Y for XY tables
    pub lat: Option<f64>,
    /// JD in TCB at the barycentre
    pub time_jd: Option<f64>,
}

#[derive(Debug, Clone)]
struct ProperMotion {
    ra: usize,
    dec: usize,
    /// Multipliers to mas/yr
    ra_factor: f64,
    dec_factor: f64,
    /// RA motion is in seconds of time and still needs the cos(dec) factor.
    ra_needs_cos_dec: bool,
    /// Years from the source epoch to J2000
    years: f64,
}

#[derive(Debug, Clone)]
struct TimeColumn {
    index: usize,
    name: String,
    unit: String,
    /// `None` when no usable TIMESYS applies; values stay uncorrected.
    frame: Option<TimeFrame>,
    origin: Option<f64>,
    encoding: Option<TimeEncoding>,
}

/// Converts the cells of each record into a [`ResolvedPosition`].
///
/// Built once per table, after the roles are fixed.
#[derive(Debug, Clone)]
pub struct RecordResolver {
    kind: TableKind,
    lon: Option<usize>,
    lat: Option<usize>,
    combined: bool,
    lon_unit: AngleUnit,
    lat_unit: AngleUnit,
    frame: AstroFrame,
    proper_motion: Option<ProperMotion>,
    time: Option<TimeColumn>,
}

/// Conversion factor of a proper motion unit to mas/yr, and whether the
/// unit is seconds of time (RA motion not yet scaled by cos(dec)).
fn pm_factor(unit: &str) -> (f64, bool) {
    let unit = unit.trim().to_ascii_lowercase().replace(' ', "").replace(".yr-1", "/yr");
    let angle = unit
        .split(['/', '.'])
        .next()
        .unwrap_or("")
        .trim_matches('"');
    match angle {
        "" | "mas" => (1.0, false),
        "arcsec" | "\"" | "as" => (1_000.0, false),
        "arcmin" | "'" => (60_000.0, false),
        "deg" => (3.6e6, false),
        "rad" => (206_264_806.247, false),
        "s" => (15_000.0, true),
        "ms" => (15.0, true),
        _ => (1.0, false),
    }
}

fn cell(record: &[String], index: usize) -> &str {
    match record.get(index).map(|s| s.trim()) {
        Some(MISSING_CELL) | None => "",
        Some(text) => text,
    }
}

fn hinted_frame(hint: FrameHint) -> AstroFrame {
    match hint {
        FrameHint::Galactic => AstroFrame::galactic(),
        FrameHint::Ecliptic => AstroFrame::new(FrameSystem::Ecliptic),
        FrameHint::Supergalactic => AstroFrame::new(FrameSystem::Supergalactic),
    }
}

fn hint_matches(hint: FrameHint, frame: &AstroFrame) -> bool {
    matches!(
        (hint, &frame.system),
        (FrameHint::Galactic, FrameSystem::Galactic)
            | (FrameHint::Ecliptic, FrameSystem::Ecliptic)
            | (FrameHint::Supergalactic, FrameSystem::Supergalactic)
    )
}

fn warn_assuming_icrs(diagnostics: &mut Vec<Diagnostic>, reason: String) -> AstroFrame {
    diagnostics.push(Diagnostic::warning(
        DiagnosticKind::CoordinateSystem,
        format!("{reason}, assuming ICRS"),
    ));
    AstroFrame::icrs()
}

/// Source frame of the position columns.
fn source_frame(
    ra: &Field,
    hint: Option<FrameHint>,
    metadata: &FrameMetadata,
    diagnostics: &mut Vec<Diagnostic>,
) -> AstroFrame {
    match metadata.frame_for(ra) {
        FrameLookup::Declared(frame) => match hint {
            // A galactic UCD outranks a COOSYS the column never referenced.
            Some(hint) if ra.reference.is_none() && !hint_matches(hint, &frame) => {
                hinted_frame(hint)
            }
            _ if frame.is_supported() => frame,
            _ => warn_assuming_icrs(
                diagnostics,
                format!("Unsupported coordinate system '{}'", frame.system.name()),
            ),
        },
        FrameLookup::Dangling(id) => warn_assuming_icrs(
            diagnostics,
            format!("Coordinate system '{id}' referenced by '{}' is not declared", ra.name),
        ),
        FrameLookup::Ambiguous => match hint {
            Some(hint) => hinted_frame(hint),
            None => warn_assuming_icrs(
                diagnostics,
                format!("Several coordinate systems declared and none referenced by '{}'", ra.name),
            ),
        },
        FrameLookup::Undeclared => match hint {
            Some(hint) => hinted_frame(hint),
            None => {
                tracing::debug!(column = %ra.name, "no coordinate system declared, using ICRS");
                AstroFrame::icrs()
            }
        },
    }
}

impl RecordResolver {
    /// Prepare the conversions for a table. Frame problems found here are
    /// pushed to `diagnostics`.
    pub fn new(
        fields: &[Field],
        assignment: &RoleAssignment,
        metadata: &FrameMetadata,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut resolver = Self {
            kind: assignment.kind,
            lon: None,
            lat: None,
            combined: assignment.combined,
            lon_unit: AngleUnit::Degrees,
            lat_unit: AngleUnit::Degrees,
            frame: AstroFrame::icrs(),
            proper_motion: None,
            time: None,
        };

        match assignment.kind {
            TableKind::Celestial => {
                if let (Some(ra), Some(dec)) = (assignment.ra, assignment.dec) {
                    let ra_field = &fields[ra.index];
                    resolver.lon = Some(ra.index);
                    resolver.lat = Some(dec.index);
                    resolver.lon_unit = AngleUnit::from_unit(&ra_field.unit_lower());
                    resolver.lat_unit = AngleUnit::from_unit(&fields[dec.index].unit_lower());
                    resolver.frame =
                        source_frame(ra_field, assignment.frame_hint, metadata, diagnostics);
                }
                if let (Some(pmra), Some(pmdec)) = (assignment.pmra, assignment.pmdec) {
                    let years = 2000.0 - resolver.frame.effective_epoch();
                    if !resolver.frame.is_target() && years.abs() > 1e-9 {
                        let (ra_factor, ra_needs_cos_dec) = pm_factor(&fields[pmra.index].unit_lower());
                        let (dec_factor, _) = pm_factor(&fields[pmdec.index].unit_lower());
                        resolver.proper_motion = Some(ProperMotion {
                            ra: pmra.index,
                            dec: pmdec.index,
                            ra_factor,
                            dec_factor,
                            ra_needs_cos_dec,
                            years,
                        });
                    }
                }
            }
            TableKind::Xy => {
                resolver.lon = assignment.x.map(|c| c.index);
                resolver.lat = assignment.y.map(|c| c.index);
            }
            TableKind::CoordinateLess => {}
        }

        if let Some(time) = assignment.time {
            let field = &fields[time.index];
            let frame = metadata.time_frame_for(field);
            let origin = frame.as_ref().and_then(|f| f.origin);
            let frame = match frame {
                Some(frame) if frame.is_supported() => Some(frame),
                Some(frame) => {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::TimeSystem,
                        format!(
                            "Unsupported time system {:?}/{:?}, times are not corrected to TCB/BARYCENTER",
                            frame.scale, frame.ref_position
                        ),
                    ));
                    None
                }
                None => {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::TimeSystem,
                        format!(
                            "No time system declared for '{}', times are not corrected to TCB/BARYCENTER",
                            field.name
                        ),
                    ));
                    None
                }
            };
            resolver.time = Some(TimeColumn {
                index: time.index,
                name: field.name.clone(),
                unit: field.unit_lower(),
                frame,
                origin,
                encoding: None,
            });
        }

        resolver
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Frame the position columns are read in.
    pub fn source_frame(&self) -> &AstroFrame {
        &self.frame
    }

    /// Encoding of the time column, once the first value fixed it.
    pub fn time_encoding(&self) -> Option<TimeEncoding> {
        self.time.as_ref().and_then(|t| t.encoding)
    }

    /// Resolve one record.
    pub fn resolve(&mut self, record: &[String]) -> ResolvedPosition {
        let (lon, lat) = match self.kind {
            TableKind::Celestial => self.celestial(record).unzip(),
            TableKind::Xy => (
                self.lon.and_then(|i| cell(record, i).parse::<f64>().ok()),
                self.lat.and_then(|i| cell(record, i).parse::<f64>().ok()),
            ),
            TableKind::CoordinateLess => (None, None),
        };
        let time_jd = self.time.as_mut().and_then(|time| time.resolve(record));
        ResolvedPosition { lon, lat, time_jd }
    }

    fn celestial(&self, record: &[String]) -> Option<(f64, f64)> {
        let (ra_text, dec_text) = if self.combined {
            split_combined(cell(record, self.lon?))?
        } else {
            (cell(record, self.lon?), cell(record, self.lat?))
        };
        if ra_text.is_empty() || dec_text.is_empty() {
            return None;
        }
        let notation = detect_pair_notation(ra_text, dec_text);
        let ra = parse_angle(ra_text, notation, AngleKind::Longitude, self.lon_unit)?;
        let dec = parse_angle(dec_text, notation, AngleKind::Latitude, self.lat_unit)?;
        if !(-90.0..=90.0).contains(&dec) {
            return None;
        }

        let (mut lon, mut lat) = (ra, dec);
        if let Some(pm) = &self.proper_motion {
            let pm_ra = cell(record, pm.ra).parse::<f64>().ok();
            let pm_dec = cell(record, pm.dec).parse::<f64>().ok();
            if let (Some(pm_ra), Some(pm_dec)) = (pm_ra, pm_dec) {
                let mut pm_ra = pm_ra * pm.ra_factor;
                if pm.ra_needs_cos_dec {
                    pm_ra *= lat.to_radians().cos();
                }
                (lon, lat) = propagate(lon, lat, pm_ra, pm_dec * pm.dec_factor, pm.years);
            }
        }
        if !self.frame.is_target() {
            (lon, lat) = self.frame.to_icrs(lon, lat);
        }
        Some((lon, lat))
    }
}

impl TimeColumn {
    fn resolve(&mut self, record: &[String]) -> Option<f64> {
        let text = cell(record, self.index);
        if text.is_empty() {
            return None;
        }
        let encoding = *self
            .encoding
            .get_or_insert_with(|| infer_encoding(text, &self.unit, &self.name));
        let jd = value_to_jd(text, encoding, &self.unit, self.origin)?;
        Some(match &self.frame {
            Some(frame) => frame.to_tcb(jd),
            None => jd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::roles::RoleClassifier;

    fn record(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn build(fields: &[Field], metadata: &FrameMetadata) -> (RecordResolver, Vec<Diagnostic>) {
        let assignment = RoleClassifier::new().choose(fields);
        let mut diagnostics = Vec::new();
        let resolver = RecordResolver::new(fields, &assignment, metadata, &mut diagnostics);
        (resolver, diagnostics)
    }

    #[test]
    fn test_plain_icrs_no_warnings() {
        let fields = vec![Field::new("RA"), Field::new("DEC")];
        let (mut resolver, diagnostics) = build(&fields, &FrameMetadata::new());
        assert!(diagnostics.is_empty());
        let resolved = resolver.resolve(&record(&["10.0", "20.0"]));
        assert_eq!(resolved.lon, Some(10.0));
        assert_eq!(resolved.lat, Some(20.0));
        assert_eq!(resolved.time_jd, None);
    }

    #[test]
    fn test_sexagesimal_record() {
        let fields = vec![Field::new("RA"), Field::new("DEC")];
        let (mut resolver, _) = build(&fields, &FrameMetadata::new());
        let resolved = resolver.resolve(&record(&["12:34:56.7", "+01:02:03"]));
        assert!((resolved.lon.unwrap() - 188.73625).abs() < 1e-9);
        assert!((resolved.lat.unwrap() - 1.034166666).abs() < 1e-6);
    }

    #[test]
    fn test_missing_cells_give_no_position() {
        let fields = vec![Field::new("RA"), Field::new("DEC")];
        let (mut resolver, _) = build(&fields, &FrameMetadata::new());
        let resolved = resolver.resolve(&record(&["10.0", MISSING_CELL]));
        assert_eq!(resolved.lon, None);
        assert_eq!(resolved.lat, None);
    }

    #[test]
    fn test_dangling_ref_warns() {
        let fields = vec![
            Field::new("RA").with_reference("sys1"),
            Field::new("DEC").with_reference("sys1"),
        ];
        let (_, diagnostics) = build(&fields, &FrameMetadata::new());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::CoordinateSystem);
    }

    #[test]
    fn test_unsupported_system_warns() {
        let mut metadata = FrameMetadata::new();
        metadata.add_coosys("mars", AstroFrame::parse("MARS", None, None));
        let fields = vec![Field::new("RA"), Field::new("DEC")];
        let (resolver, diagnostics) = build(&fields, &metadata);
        assert_eq!(diagnostics.len(), 1);
        assert!(resolver.source_frame().is_target());
    }

    #[test]
    fn test_galactic_columns_converted() {
        let fields = vec![
            Field::new("GLON").with_unit("deg"),
            Field::new("GLAT").with_unit("deg"),
        ];
        let (mut resolver, diagnostics) = build(&fields, &FrameMetadata::new());
        assert!(diagnostics.is_empty());
        let resolved = resolver.resolve(&record(&["0", "0"]));
        assert!((resolved.lon.unwrap() - 266.405).abs() < 1e-2);
        assert!((resolved.lat.unwrap() + 28.936).abs() < 1e-2);
    }

    #[test]
    fn test_xy_passthrough() {
        let fields = vec![Field::new("x"), Field::new("y")];
        let (mut resolver, _) = build(&fields, &FrameMetadata::new());
        assert_eq!(resolver.kind(), TableKind::Xy);
        let resolved = resolver.resolve(&record(&["512.5", "100"]));
        assert_eq!((resolved.lon, resolved.lat), (Some(512.5), Some(100.0)));
    }

    #[test]
    fn test_combined_column_split() {
        let fields = vec![Field::new("RADEC")];
        let (mut resolver, _) = build(&fields, &FrameMetadata::new());
        let resolved = resolver.resolve(&record(&["10.5 -20.25"]));
        assert_eq!((resolved.lon, resolved.lat), (Some(10.5), Some(-20.25)));
    }

    #[test]
    fn test_proper_motion_propagation() {
        let mut metadata = FrameMetadata::new();
        metadata.add_coosys("gaia", AstroFrame::icrs().with_epoch(2010.0));
        let fields = vec![
            Field::new("ra"),
            Field::new("dec"),
            Field::new("pmra").with_unit("mas/yr"),
            Field::new("pmdec").with_unit("mas/yr"),
        ];
        let (mut resolver, _) = build(&fields, &metadata);
        // Ten years back from 2010 to 2000.
        let resolved = resolver.resolve(&record(&["10", "0", "360", "-360"]));
        assert!((resolved.lon.unwrap() - 9.999).abs() < 1e-9);
        assert!((resolved.lat.unwrap() - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_time_without_timesys_warns_and_passes_through() {
        let fields = vec![Field::new("mjd")];
        let (mut resolver, diagnostics) = build(&fields, &FrameMetadata::new());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::TimeSystem);
        let resolved = resolver.resolve(&record(&["51544.5"]));
        assert_eq!(resolved.time_jd, Some(2_451_545.0));
        assert_eq!(resolver.time_encoding(), Some(TimeEncoding::Mjd));
    }

    #[test]
    fn test_time_with_tcb_timesys() {
        let mut metadata = FrameMetadata::new();
        metadata.add_timesys("t", TimeFrame::target());
        let fields = vec![Field::new("obs_time").with_ucd("time.epoch").with_unit("d")];
        let (mut resolver, diagnostics) = build(&fields, &metadata);
        assert!(diagnostics.is_empty());
        let resolved = resolver.resolve(&record(&["2451545.0"]));
        assert_eq!(resolved.time_jd, Some(2_451_545.0));
    }

    #[test]
    fn test_pm_factor() {
        assert_eq!(pm_factor("mas/yr"), (1.0, false));
        assert_eq!(pm_factor("arcsec/yr"), (1_000.0, false));
        assert_eq!(pm_factor("mas.yr-1"), (1.0, false));
        assert_eq!(pm_factor("s/yr"), (15_000.0, true));
    }
}
