// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Celestial reference frames and conversion to ICRS.
//!
//! Conversions go through unit vectors. FK5 J2000 is treated as identical to
//! ICRS; the 23 mas frame bias is below the precision catalogues are usually
//! served with.

use std::fmt;

type Matrix = [[f64; 3]; 3];
type Vector = [f64; 3];

/// Julian date of J2000.0.
pub const J2000_JD: f64 = 2_451_545.0;

const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Rotation from Galactic to ICRS (transpose of the Hipparcos ICRS to
/// Galactic matrix).
const GALACTIC_TO_ICRS: Matrix = [
    [-0.054_875_560_416_215_4, 0.494_109_427_875_583_7, -0.867_666_149_019_004_7],
    [-0.873_437_090_234_885_0, -0.444_829_629_960_011_2, -0.198_076_373_431_201_5],
    [-0.483_835_015_548_713_2, 0.746_982_244_497_218_9, 0.455_983_776_175_066_9],
];

/// Rotation from Supergalactic to Galactic.
const SUPERGALACTIC_TO_GALACTIC: Matrix = [
    [-0.735_742_574_804_349_0, -0.074_553_778_365_243_8, 0.673_145_302_109_207_3],
    [0.677_261_296_413_965_2, -0.080_991_471_307_278_4, 0.731_271_165_816_629_2],
    [0.0, 0.993_922_590_912_487_4, 0.110_081_262_225_072_6],
];

/// Position part of the FK4 B1950 to FK5 J2000 transformation.
const FK4_TO_FK5: Matrix = [
    [0.999_925_678_2, -0.011_182_061_1, -0.004_857_947_7],
    [0.011_182_061_0, 0.999_937_478_4, -0.000_027_176_5],
    [0.004_857_947_9, -0.000_027_147_4, 0.999_988_199_7],
];

/// E-terms of aberration folded into FK4 catalogue positions.
const FK4_E_TERMS: Vector = [-1.625_57e-6, -0.319_19e-6, -0.138_43e-6];

/// Coordinate system of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSystem {
    Icrs,
    Fk4,
    Fk5,
    Galactic,
    Supergalactic,
    Ecliptic,
    /// A system this crate cannot convert, kept by its declared name.
    Other(String),
}

impl FrameSystem {
    /// Parse a COOSYS `system` attribute.
    pub fn parse(system: &str) -> Self {
        match system.trim().to_ascii_lowercase().as_str() {
            "icrs" | "" => FrameSystem::Icrs,
            "eq_fk5" | "fk5" | "j2000" => FrameSystem::Fk5,
            "eq_fk4" | "fk4" | "b1950" => FrameSystem::Fk4,
            "galactic" | "gal" | "galactic_iau" | "galactic_ii" => FrameSystem::Galactic,
            "supergalactic" | "supergal" | "sgal" => FrameSystem::Supergalactic,
            "ecl_fk5" | "ecl_fk4" | "ecliptic" | "ecl" | "ecl_icrs" => FrameSystem::Ecliptic,
            _ => FrameSystem::Other(system.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FrameSystem::Icrs => "ICRS",
            FrameSystem::Fk4 => "FK4",
            FrameSystem::Fk5 => "FK5",
            FrameSystem::Galactic => "GALACTIC",
            FrameSystem::Supergalactic => "SUPERGALACTIC",
            FrameSystem::Ecliptic => "ECLIPTIC",
            FrameSystem::Other(name) => name,
        }
    }
}

/// A celestial frame: system, equinox and epoch.
///
/// Equinoxes are Julian years except for FK4, where they are Besselian.
#[derive(Debug, Clone, PartialEq)]
pub struct AstroFrame {
    pub system: FrameSystem,
    pub equinox: f64,
    pub epoch: Option<f64>,
}

impl Default for AstroFrame {
    fn default() -> Self {
        Self::icrs()
    }
}

impl fmt::Display for AstroFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            FrameSystem::Fk4 => write!(f, "{} B{}", self.system.name(), self.equinox)?,
            FrameSystem::Fk5 | FrameSystem::Ecliptic => {
                write!(f, "{} J{}", self.system.name(), self.equinox)?
            }
            _ => write!(f, "{}", self.system.name())?,
        }
        if let Some(epoch) = self.epoch {
            write!(f, " epoch {epoch}")?;
        }
        Ok(())
    }
}

impl AstroFrame {
    /// The target frame: ICRS at J2000.
    pub const fn icrs() -> Self {
        Self {
            system: FrameSystem::Icrs,
            equinox: 2000.0,
            epoch: None,
        }
    }

    pub fn galactic() -> Self {
        Self {
            system: FrameSystem::Galactic,
            ..Self::icrs()
        }
    }

    pub fn new(system: FrameSystem) -> Self {
        let equinox = if system == FrameSystem::Fk4 { 1950.0 } else { 2000.0 };
        Self {
            system,
            equinox,
            epoch: None,
        }
    }

    /// Build a frame from COOSYS `system`/`equinox`/`epoch` attributes.
    pub fn parse(system: &str, equinox: Option<&str>, epoch: Option<&str>) -> Self {
        let mut frame = Self::new(FrameSystem::parse(system));
        if let Some(equinox) = equinox.and_then(parse_year) {
            frame.equinox = equinox;
        }
        frame.epoch = epoch.and_then(parse_year);
        frame
    }

    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self.system, FrameSystem::Other(_))
    }

    /// Whether positions in this frame need no conversion.
    pub fn is_target(&self) -> bool {
        self.system == FrameSystem::Icrs && self.epoch.map_or(true, |e| (e - 2000.0).abs() < 1e-9)
    }

    /// Epoch of the positions, defaulting to the equinox.
    pub fn effective_epoch(&self) -> f64 {
        match (self.epoch, &self.system) {
            (Some(epoch), _) => epoch,
            (None, FrameSystem::Fk4) => besselian_to_julian(self.equinox),
            (None, FrameSystem::Fk5 | FrameSystem::Ecliptic) => self.equinox,
            (None, _) => 2000.0,
        }
    }

    /// Convert a longitude/latitude pair in degrees to ICRS.
    ///
    /// Unsupported systems are passed through unchanged.
    pub fn to_icrs(&self, lon: f64, lat: f64) -> (f64, f64) {
        let v = to_vector(lon, lat);
        let out = match &self.system {
            FrameSystem::Icrs | FrameSystem::Other(_) => return (normalize_lon(lon), lat),
            FrameSystem::Fk5 => apply(&precession(self.equinox, 2000.0), v),
            FrameSystem::Fk4 => fk4_to_fk5(v, self.equinox),
            FrameSystem::Galactic => apply(&GALACTIC_TO_ICRS, v),
            FrameSystem::Supergalactic => {
                apply(&GALACTIC_TO_ICRS, apply(&SUPERGALACTIC_TO_GALACTIC, v))
            }
            FrameSystem::Ecliptic => {
                let equatorial = apply(&ecliptic_to_equatorial(self.equinox), v);
                apply(&precession(self.equinox, 2000.0), equatorial)
            }
        };
        from_vector(out)
    }
}

/// Parse `J2000`, `B1950.0`, `2015.5` into a year number.
pub fn parse_year(text: &str) -> Option<f64> {
    let text = text.trim();
    let digits = text
        .strip_prefix(['J', 'j', 'B', 'b'])
        .unwrap_or(text);
    digits.parse::<f64>().ok().filter(|y| y.is_finite())
}

/// Convert a Besselian year to the equivalent Julian year.
pub fn besselian_to_julian(year: f64) -> f64 {
    let jd = 2_415_020.313_52 + (year - 1900.0) * 365.242_198_781;
    2000.0 + (jd - J2000_JD) / 365.25
}

/// Propagate a position by proper motion over `years`.
///
/// `pm_lon` is the longitude motion already scaled by cos(lat); both are in
/// mas/yr.
pub fn propagate(lon: f64, lat: f64, pm_lon: f64, pm_lat: f64, years: f64) -> (f64, f64) {
    let dlat = pm_lat * years / 3.6e6;
    let cos_lat = lat.to_radians().cos();
    let dlon = if cos_lat.abs() > 1e-12 {
        pm_lon * years / 3.6e6 / cos_lat
    } else {
        0.0
    };
    let lat = (lat + dlat).clamp(-90.0, 90.0);
    (normalize_lon(lon + dlon), lat)
}

fn normalize_lon(lon: f64) -> f64 {
    let lon = lon.rem_euclid(360.0);
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}

fn to_vector(lon: f64, lat: f64) -> Vector {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_vector(v: Vector) -> (f64, f64) {
    let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if r == 0.0 {
        return (0.0, 0.0);
    }
    let lon = v[1].atan2(v[0]).to_degrees();
    let lat = (v[2] / r).clamp(-1.0, 1.0).asin().to_degrees();
    (normalize_lon(lon), lat)
}

fn apply(m: &Matrix, v: Vector) -> Vector {
    let mut out = [0.0; 3];
    for (row, value) in m.iter().zip(out.iter_mut()) {
        *value = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn rot_x(angle: f64) -> Matrix {
    let (s, c) = angle.sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]]
}

fn rot_y(angle: f64) -> Matrix {
    let (s, c) = angle.sin_cos();
    [[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]]
}

fn rot_z(angle: f64) -> Matrix {
    let (s, c) = angle.sin_cos();
    [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]]
}

/// IAU 1976 precession matrix between two Julian epochs.
fn precession(from: f64, to: f64) -> Matrix {
    let big_t = (from - 2000.0) / 100.0;
    let t = (to - from) / 100.0;
    let w = 2306.2181 + (1.39656 - 0.000139 * big_t) * big_t;
    let zeta = (w + ((0.30188 - 0.000344 * big_t) + 0.017998 * t) * t) * t * ARCSEC;
    let z = (w + ((1.09468 + 0.000066 * big_t) + 0.018203 * t) * t) * t * ARCSEC;
    let theta = ((2004.3109 + (-0.85330 - 0.000217 * big_t) * big_t)
        + ((-0.42665 - 0.000217 * big_t) - 0.041833 * t) * t)
        * t
        * ARCSEC;
    multiply(&rot_z(-z), &multiply(&rot_y(theta), &rot_z(-zeta)))
}

/// Mean obliquity of the ecliptic (IAU 1980) at a Julian epoch.
fn obliquity(epoch: f64) -> f64 {
    let t = (epoch - 2000.0) / 100.0;
    (84_381.448 + (-46.8150 + (-0.00059 + 0.001813 * t) * t) * t) * ARCSEC
}

fn ecliptic_to_equatorial(epoch: f64) -> Matrix {
    rot_x(-obliquity(epoch))
}

fn fk4_to_fk5(v: Vector, equinox: f64) -> Vector {
    let v = if (equinox - 1950.0).abs() > 1e-9 {
        apply(
            &precession(besselian_to_julian(equinox), besselian_to_julian(1950.0)),
            v,
        )
    } else {
        v
    };
    let dot: f64 = (0..3).map(|i| v[i] * FK4_E_TERMS[i]).sum();
    let mut without_e = [0.0; 3];
    for i in 0..3 {
        without_e[i] = v[i] - FK4_E_TERMS[i] + dot * v[i];
    }
    apply(&FK4_TO_FK5, without_e)
}
