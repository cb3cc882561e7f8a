// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Column role classification.
//!
//! [`score_field`] is pure: it rates one column against every role. The
//! comparison across columns and the frame hint are applied once by
//! [`RoleClassifier::choose`], after all fields are known.
//!
//! Scores, lower is better:
//!
//! | Score | Evidence |
//! |---|---|
//! | 0 | UCD exact (`pos.eq.ra;meta.main`) |
//! | 1 | UCD prefix (`pos.eq.ra`, `POS_EQ_RA`) |
//! | 2 | name exact, unit compatible |
//! | 3 | name exact, no unit |
//! | 4 | name substring |
//! | 5 | name exact, unit incompatible |
//! | 6 | structural hint (EPN-TAP `c1min`, value probe) |

use crate::core::{Field, Role};

pub const SCORE_UCD_EXACT: u32 = 0;
pub const SCORE_UCD_PREFIX: u32 = 1;
pub const SCORE_NAME_UNIT: u32 = 2;
pub const SCORE_NAME: u32 = 3;
pub const SCORE_SUBSTRING: u32 = 4;
pub const SCORE_NAME_BAD_UNIT: u32 = 5;
pub const SCORE_STRUCTURAL: u32 = 6;

/// Penalty for a DEC/PM candidate whose `ref` differs from the chosen RA's.
const REF_MISMATCH_PENALTY: u32 = 3;

/// Frame implied by a column's UCD or name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHint {
    Galactic,
    Ecliptic,
    Supergalactic,
}

/// One column's candidacy for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCandidate {
    pub role: Role,
    pub score: u32,
    pub frame_hint: Option<FrameHint>,
    /// The column packs RA and DEC in one cell.
    pub combined: bool,
}

impl RoleCandidate {
    fn new(role: Role, score: u32) -> Self {
        Self {
            role,
            score,
            frame_hint: None,
            combined: false,
        }
    }

    fn hinted(mut self, hint: Option<FrameHint>) -> Self {
        self.frame_hint = hint;
        self
    }
}

/// Shape of the table once roles are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    Celestial,
    Xy,
    #[default]
    CoordinateLess,
}

/// Column chosen for a role, with the score that won it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chosen {
    pub index: usize,
    pub score: u32,
}

/// Result of the classifier for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleAssignment {
    pub kind: TableKind,
    pub ra: Option<Chosen>,
    pub dec: Option<Chosen>,
    pub pmra: Option<Chosen>,
    pub pmdec: Option<Chosen>,
    pub x: Option<Chosen>,
    pub y: Option<Chosen>,
    pub time: Option<Chosen>,
    /// RA and DEC share one column.
    pub combined: bool,
    pub frame_hint: Option<FrameHint>,
}

impl RoleAssignment {
    /// Roles per column index, for writing back into the fields.
    pub fn roles(&self) -> Vec<(usize, Role)> {
        let mut out = Vec::new();
        let slots = [
            (self.ra, Role::Ra),
            (self.dec, Role::Dec),
            (self.pmra, Role::PmRa),
            (self.pmdec, Role::PmDec),
            (self.x, Role::X),
            (self.y, Role::Y),
            (self.time, Role::Time),
        ];
        for (chosen, role) in slots {
            if let Some(chosen) = chosen {
                // A combined column reports itself as RA only.
                if !(self.combined && role == Role::Dec) {
                    out.push((chosen.index, role));
                }
            }
        }
        out
    }
}

const RA_NAMES: &[&str] = &[
    "ra", "raj2000", "ra2000", "ra_j2000", "ra_icrs", "ra(icrs)", "raicrs", "alpha",
    "alpha_j2000", "ra_deg", "radeg", "ra_d", "ra1950", "rab1950", "ra_b1950", "ra_obj",
    "ra_targ", "s_ra", "ra_epoch2000", "right_ascension",
];
const DEC_NAMES: &[&str] = &[
    "dec", "de", "dej2000", "decj2000", "dec2000", "dec_j2000", "de_j2000", "dec_icrs",
    "de_icrs", "dec(icrs)", "deicrs", "decl", "delta", "delta_j2000", "dec_deg", "decdeg",
    "de_deg", "dedeg", "dec_d", "dec1950", "deb1950", "dec_b1950", "de_b1950", "dec_obj",
    "dec_targ", "s_dec", "dec_epoch2000", "declination",
];
const GLON_NAMES: &[&str] = &["glon", "lii", "l_ii", "gal_long", "gal_lon", "glong"];
const GLAT_NAMES: &[&str] = &["glat", "bii", "b_ii", "gal_lat"];
const ELON_NAMES: &[&str] = &["elon", "ecl_lon", "ecl_long", "elong"];
const ELAT_NAMES: &[&str] = &["elat", "ecl_lat"];
const SGLON_NAMES: &[&str] = &["sglon", "sgl", "sglong"];
const SGLAT_NAMES: &[&str] = &["sglat", "sgb"];
const PMRA_NAMES: &[&str] = &[
    "pmra", "pm_ra", "pmra_cosdec", "pmracosdec", "pmrac", "pmalpha", "pm_alpha", "mura",
    "mu_ra", "pmra_cosdelta", "pmrastar",
];
const PMDEC_NAMES: &[&str] = &[
    "pmdec", "pm_dec", "pmde", "pm_de", "pmdelta", "pm_delta", "mudec", "mu_dec", "pmd",
];
const X_NAMES: &[&str] = &[
    "x", "xpos", "x_pos", "x_image", "ximage", "xpix", "x_pix", "xcenter", "x_center", "xc",
    "x_world",
];
const Y_NAMES: &[&str] = &[
    "y", "ypos", "y_pos", "y_image", "yimage", "ypix", "y_pix", "ycenter", "y_center", "yc",
    "y_world",
];
const TIME_NAMES: &[&str] = &[
    "jd", "mjd", "bjd", "hjd", "time", "epoch", "obs_time", "date_obs", "dateobs", "date-obs",
    "obs_date", "t_min", "mjd_obs", "obs_mjd", "jd_obs", "timestamp", "t_obs", "obstime",
];
const COMBINED_NAMES: &[&str] = &[
    "radec", "ra_dec", "ra/dec", "radecj2000", "coord", "coords", "coordinates", "position",
    "pos", "coo",
];

/// Name tokens that suggest a role when they appear inside a longer name.
const SUBSTRING_TOKENS: &[(Role, &[&str])] = &[
    (Role::Ra, &["ra", "raj2000", "alpha"]),
    (Role::Dec, &["dec", "dej2000", "decj2000", "delta"]),
    (Role::PmRa, &["pmra"]),
    (Role::PmDec, &["pmdec", "pmde"]),
    (Role::Time, &["mjd", "jd", "bjd", "hjd", "epoch"]),
];

fn normalize_name(name: &str) -> String {
    name.trim().trim_start_matches('_').to_ascii_lowercase()
}

fn is_angle_unit(unit: &str) -> bool {
    matches!(
        unit.trim_matches('"'),
        "deg" | "degree" | "degrees" | "°" | "arcdeg" | "rad" | "radian" | "radians" | "h"
            | "hour" | "hours" | "hms" | "dms" | "h:m:s" | "d:m:s" | "hh:mm:ss" | "dd:mm:ss"
    )
}

fn is_pm_unit(unit: &str) -> bool {
    let unit = unit.replace(' ', "");
    ["/yr", "/a", "yr-1", "a-1", "/year", "/y"]
        .iter()
        .any(|suffix| unit.ends_with(suffix))
}

fn is_linear_unit(unit: &str) -> bool {
    matches!(unit, "pix" | "pixel" | "pixels" | "mm" | "m" | "km" | "um" | "arcsec" | "deg")
}

fn is_time_unit(unit: &str) -> bool {
    matches!(
        unit,
        "d" | "day" | "days" | "s" | "sec" | "yr" | "a" | "year" | "years" | "jd" | "mjd" | "h"
    )
}

fn unit_score(unit: &str, compatible: fn(&str) -> bool) -> u32 {
    if unit.is_empty() {
        SCORE_NAME
    } else if compatible(unit) {
        SCORE_NAME_UNIT
    } else {
        SCORE_NAME_BAD_UNIT
    }
}

/// Score a UCD; `main` variants are exact, plain ones are prefix matches.
fn ucd_score(ucd: &str, prefixes: &[&str]) -> Option<u32> {
    for prefix in prefixes {
        if let Some(rest) = ucd.strip_prefix(prefix) {
            let exact = rest.contains("meta.main") || rest == "_main";
            // `pos.eq.ra` must not match `pos.eq.rad...`.
            if rest.is_empty() || rest.starts_with(';') || rest.starts_with('_') {
                return Some(if exact { SCORE_UCD_EXACT } else { SCORE_UCD_PREFIX });
            }
        }
    }
    None
}

/// Rate one column against every role.
pub fn score_field(field: &Field) -> Vec<RoleCandidate> {
    let ucd = field.ucd_lower();
    let unit = field.unit_lower();
    let name = normalize_name(&field.name);
    let mut out = Vec::new();

    // Proper motion UCDs start with pos.pm and must be checked before pos.eq.
    if ucd.starts_with("pos.pm") || ucd.starts_with("pos_eq_pm") {
        let main = ucd.contains("meta.main");
        let score = if main { SCORE_UCD_EXACT } else { SCORE_UCD_PREFIX };
        if ucd.contains("pos.eq.ra") || ucd.starts_with("pos_eq_pmra") {
            out.push(RoleCandidate::new(Role::PmRa, score));
        } else if ucd.contains("pos.eq.dec") || ucd.starts_with("pos_eq_pmdec") {
            out.push(RoleCandidate::new(Role::PmDec, score));
        }
        return out;
    }

    let ucd_roles: &[(Role, &[&str], Option<FrameHint>)] = &[
        (Role::Ra, &["pos.eq.ra", "pos_eq_ra"], None),
        (Role::Dec, &["pos.eq.dec", "pos_eq_dec"], None),
        (Role::Ra, &["pos.galactic.lon", "pos_gal_lon"], Some(FrameHint::Galactic)),
        (Role::Dec, &["pos.galactic.lat", "pos_gal_lat"], Some(FrameHint::Galactic)),
        (Role::Ra, &["pos.ecliptic.lon", "pos_ecl_lon"], Some(FrameHint::Ecliptic)),
        (Role::Dec, &["pos.ecliptic.lat", "pos_ecl_lat"], Some(FrameHint::Ecliptic)),
        (Role::Ra, &["pos.supergalactic.lon", "pos_sgal_lon"], Some(FrameHint::Supergalactic)),
        (Role::Dec, &["pos.supergalactic.lat", "pos_sgal_lat"], Some(FrameHint::Supergalactic)),
        (Role::X, &["pos.cartesian.x", "pos_ccd_x", "pos_plate_x", "pos_det_x"], None),
        (Role::Y, &["pos.cartesian.y", "pos_ccd_y", "pos_plate_y", "pos_det_y"], None),
        (Role::Time, &["time.epoch", "time_epoch", "time_date"], None),
    ];
    for (role, prefixes, hint) in ucd_roles {
        if let Some(score) = ucd_score(&ucd, prefixes) {
            out.push(RoleCandidate::new(*role, score).hinted(*hint));
        }
    }
    if ucd == "pos.eq" || ucd.starts_with("pos.eq;") || ucd == "pos_eq" {
        let score = if ucd.contains("meta.main") { SCORE_UCD_EXACT } else { SCORE_UCD_PREFIX };
        for role in [Role::Ra, Role::Dec] {
            let mut candidate = RoleCandidate::new(role, score);
            candidate.combined = true;
            out.push(candidate);
        }
    }
    if !out.is_empty() {
        return out;
    }

    let name_roles: &[(Role, &[&str], fn(&str) -> bool, Option<FrameHint>)] = &[
        (Role::Ra, RA_NAMES, is_angle_unit, None),
        (Role::Dec, DEC_NAMES, is_angle_unit, None),
        (Role::Ra, GLON_NAMES, is_angle_unit, Some(FrameHint::Galactic)),
        (Role::Dec, GLAT_NAMES, is_angle_unit, Some(FrameHint::Galactic)),
        (Role::Ra, ELON_NAMES, is_angle_unit, Some(FrameHint::Ecliptic)),
        (Role::Dec, ELAT_NAMES, is_angle_unit, Some(FrameHint::Ecliptic)),
        (Role::Ra, SGLON_NAMES, is_angle_unit, Some(FrameHint::Supergalactic)),
        (Role::Dec, SGLAT_NAMES, is_angle_unit, Some(FrameHint::Supergalactic)),
        (Role::PmRa, PMRA_NAMES, is_pm_unit, None),
        (Role::PmDec, PMDEC_NAMES, is_pm_unit, None),
        (Role::X, X_NAMES, is_linear_unit, None),
        (Role::Y, Y_NAMES, is_linear_unit, None),
        (Role::Time, TIME_NAMES, is_time_unit, None),
    ];
    for (role, names, compatible, hint) in name_roles {
        if names.contains(&name.as_str()) {
            out.push(RoleCandidate::new(*role, unit_score(&unit, *compatible)).hinted(*hint));
        }
    }
    if COMBINED_NAMES.contains(&name.as_str()) {
        for role in [Role::Ra, Role::Dec] {
            let mut candidate = RoleCandidate::new(role, SCORE_NAME);
            candidate.combined = true;
            out.push(candidate);
        }
    }
    if !out.is_empty() {
        return out;
    }

    let tokens: Vec<&str> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() > 1 {
        for (role, wanted) in SUBSTRING_TOKENS {
            if tokens.iter().any(|t| wanted.contains(t)) {
                out.push(RoleCandidate::new(*role, SCORE_SUBSTRING));
            }
        }
        if !out.is_empty() {
            return out;
        }
    }

    // EPN-TAP spatial bounds.
    match name.as_str() {
        "c1min" | "c1" => out.push(RoleCandidate::new(Role::Ra, SCORE_STRUCTURAL)),
        "c2min" | "c2" => out.push(RoleCandidate::new(Role::Dec, SCORE_STRUCTURAL)),
        _ => {}
    }
    out
}

/// Picks the best column for each role across a table.
#[derive(Debug, Clone, Default)]
pub struct RoleClassifier {
    hints: Vec<(Role, usize)>,
}

struct Scored<'a> {
    fields: &'a [Field],
    candidates: Vec<Vec<RoleCandidate>>,
}

impl Scored<'_> {
    /// Best column for `role`; `adjust` may modify each score, returning
    /// `None` to exclude a column. First wins ties.
    fn best(
        &self,
        role: Role,
        adjust: impl Fn(usize, &Field, u32) -> Option<u32>,
    ) -> Option<(Chosen, RoleCandidate)> {
        let mut best: Option<(Chosen, RoleCandidate)> = None;
        for (index, candidates) in self.candidates.iter().enumerate() {
            for candidate in candidates.iter().filter(|c| c.role == role) {
                let Some(score) = adjust(index, &self.fields[index], candidate.score) else {
                    continue;
                };
                if best.map_or(true, |(chosen, _)| score < chosen.score) {
                    best = Some((Chosen { index, score }, *candidate));
                }
            }
        }
        best
    }
}

impl RoleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a structural candidate found outside the field metadata, such as
    /// a value probe on a headerless table.
    pub fn with_hint(mut self, role: Role, index: usize) -> Self {
        self.hints.push((role, index));
        self
    }

    /// Assign roles to `fields`.
    pub fn choose(&self, fields: &[Field]) -> RoleAssignment {
        let mut candidates: Vec<Vec<RoleCandidate>> = fields.iter().map(score_field).collect();
        for &(role, index) in &self.hints {
            if let Some(list) = candidates.get_mut(index) {
                list.push(RoleCandidate::new(role, SCORE_STRUCTURAL));
            }
        }
        let scored = Scored { fields, candidates };
        let mut assignment = RoleAssignment::default();

        let ra = scored.best(Role::Ra, |_, _, score| Some(score));
        if let Some((chosen, candidate)) = ra {
            assignment.ra = Some(chosen);
            assignment.frame_hint = candidate.frame_hint;
            if candidate.combined {
                assignment.combined = true;
                assignment.dec = Some(chosen);
            }
        }

        let ra_ref = assignment.ra.and_then(|c| fields[c.index].reference.clone());
        let consistent = |field: &Field, score: u32| match (&ra_ref, &field.reference) {
            (Some(a), Some(b)) if a != b => score + REF_MISMATCH_PENALTY,
            _ => score,
        };
        let ra_index = assignment.ra.map(|c| c.index);

        if !assignment.combined {
            assignment.dec = scored
                .best(Role::Dec, |index, field, score| {
                    if Some(index) == ra_index {
                        return None;
                    }
                    let score = consistent(field, score);
                    let adjacent = ra_index.is_some_and(|ra| index == ra + 1);
                    Some(if adjacent { score.saturating_sub(1) } else { score })
                })
                .map(|(chosen, _)| chosen);
        }

        let dec_index = assignment.dec.map(|c| c.index);
        let taken = |index: usize| Some(index) == ra_index || Some(index) == dec_index;
        assignment.pmra = scored
            .best(Role::PmRa, |index, field, score| {
                (!taken(index)).then(|| consistent(field, score))
            })
            .map(|(chosen, _)| chosen);
        assignment.pmdec = scored
            .best(Role::PmDec, |index, field, score| {
                let used = taken(index) || assignment.pmra.is_some_and(|c| c.index == index);
                (!used).then(|| consistent(field, score))
            })
            .map(|(chosen, _)| chosen);

        if assignment.ra.is_some() && assignment.dec.is_some() {
            assignment.kind = TableKind::Celestial;
        } else {
            assignment.ra = None;
            assignment.dec = None;
            assignment.pmra = None;
            assignment.pmdec = None;
            assignment.frame_hint = None;
            assignment.combined = false;
            let x = scored.best(Role::X, |_, _, score| Some(score)).map(|(c, _)| c);
            let y = scored
                .best(Role::Y, |index, _, score| {
                    (x.map(|c| c.index) != Some(index)).then_some(score)
                })
                .map(|(c, _)| c);
            if x.is_some() && y.is_some() {
                assignment.kind = TableKind::Xy;
                assignment.x = x;
                assignment.y = y;
            }
        }

        let positional: Vec<usize> = assignment.roles().iter().map(|(i, _)| *i).collect();
        assignment.time = scored
            .best(Role::Time, |index, _, score| {
                (!positional.contains(&index)).then_some(score)
            })
            .map(|(chosen, _)| chosen);

        tracing::debug!(
            kind = ?assignment.kind,
            ra = ?assignment.ra.map(|c| c.index),
            dec = ?assignment.dec.map(|c| c.index),
            time = ?assignment.time.map(|c| c.index),
            "column roles assigned"
        );
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<Field> {
        names.iter().map(|n| Field::new(*n)).collect()
    }

    #[test]
    fn test_ucd_beats_name() {
        let fields = vec![
            Field::new("RA").with_unit("deg"),
            Field::new("alpha_best").with_ucd("pos.eq.ra;meta.main"),
            Field::new("DEC"),
        ];
        let assignment = RoleClassifier::new().choose(&fields);
        assert_eq!(assignment.ra.unwrap().index, 1);
        assert_eq!(assignment.kind, TableKind::Celestial);
    }

    #[test]
    fn test_first_wins_ties() {
        let assignment = RoleClassifier::new().choose(&fields(&["ra", "ra", "dec"]));
        assert_eq!(assignment.ra.unwrap().index, 0);
        assert_eq!(assignment.dec.unwrap().index, 2);
    }

    #[test]
    fn test_dec_adjacency_bonus() {
        // Both DEC candidates score the same; the one after RA wins.
        let f = fields(&["dec", "x1", "ra", "de"]);
        let assignment = RoleClassifier::new().choose(&f);
        assert_eq!(assignment.ra.unwrap().index, 2);
        assert_eq!(assignment.dec.unwrap().index, 3);
    }

    #[test]
    fn test_unit_refines_name_match() {
        let fields = vec![
            Field::new("ra").with_unit("km/s"),
            Field::new("raj2000").with_unit("deg"),
            Field::new("dej2000").with_unit("deg"),
        ];
        let assignment = RoleClassifier::new().choose(&fields);
        assert_eq!(assignment.ra.unwrap().index, 1);
    }

    #[test]
    fn test_xy_and_coordinate_less() {
        let assignment = RoleClassifier::new().choose(&fields(&["id", "x", "y"]));
        assert_eq!(assignment.kind, TableKind::Xy);
        assert_eq!(assignment.x.unwrap().index, 1);
        assert_eq!(assignment.y.unwrap().index, 2);

        let assignment = RoleClassifier::new().choose(&fields(&["id", "mag"]));
        assert_eq!(assignment.kind, TableKind::CoordinateLess);

        // RA without DEC is not a position.
        let assignment = RoleClassifier::new().choose(&fields(&["ra", "mag"]));
        assert_eq!(assignment.kind, TableKind::CoordinateLess);
        assert!(assignment.ra.is_none());
    }

    #[test]
    fn test_galactic_hint() {
        let fields = vec![
            Field::new("l").with_ucd("pos.galactic.lon"),
            Field::new("b").with_ucd("pos.galactic.lat"),
        ];
        let assignment = RoleClassifier::new().choose(&fields);
        assert_eq!(assignment.frame_hint, Some(FrameHint::Galactic));
        assert_eq!(assignment.kind, TableKind::Celestial);
    }

    #[test]
    fn test_combined_column() {
        let fields = vec![Field::new("name"), Field::new("RADEC")];
        let assignment = RoleClassifier::new().choose(&fields);
        assert!(assignment.combined);
        assert_eq!(assignment.ra, assignment.dec);
        assert_eq!(assignment.roles(), vec![(1, Role::Ra)]);
    }

    #[test]
    fn test_proper_motion_and_time() {
        let fields = vec![
            Field::new("ra"),
            Field::new("dec"),
            Field::new("pmRA").with_unit("mas/yr"),
            Field::new("pmDE").with_unit("mas/yr"),
            Field::new("obs").with_ucd("time.epoch"),
        ];
        let assignment = RoleClassifier::new().choose(&fields);
        assert_eq!(assignment.pmra.unwrap().index, 2);
        assert_eq!(assignment.pmdec.unwrap().index, 3);
        assert_eq!(assignment.time.unwrap().index, 4);
    }

    #[test]
    fn test_coosys_consistency() {
        let fields = vec![
            Field::new("ra").with_reference("icrs"),
            Field::new("dec").with_reference("fk4"),
            Field::new("de").with_reference("icrs"),
        ];
        let assignment = RoleClassifier::new().choose(&fields);
        assert_eq!(assignment.dec.unwrap().index, 2);
    }

    #[test]
    fn test_structural_hints() {
        let assignment = RoleClassifier::new().choose(&fields(&["c1min", "c2min"]));
        assert_eq!(assignment.kind, TableKind::Celestial);

        let assignment = RoleClassifier::new()
            .with_hint(Role::Ra, 0)
            .with_hint(Role::Dec, 1)
            .choose(&fields(&["Col_1", "Col_2"]));
        assert_eq!(assignment.kind, TableKind::Celestial);
    }

    #[test]
    fn test_substring_match() {
        let candidates = score_field(&Field::new("mean_ra"));
        assert_eq!(candidates[0].role, Role::Ra);
        assert_eq!(candidates[0].score, SCORE_SUBSTRING);
        assert!(score_field(&Field::new("radius")).is_empty());
        assert!(score_field(&Field::new("pos.eq.rad")).is_empty());
    }
}
