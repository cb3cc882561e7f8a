// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Time frames and conversion of time cells to JD in TCB at the barycentre.
//!
//! Scale conversions chain through TT: UTC -> TAI -> TT -> TDB -> TCB.

use chrono::{NaiveDate, NaiveDateTime};

use super::frame::J2000_JD;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Offset between MJD and JD.
pub const MJD_OFFSET: f64 = 2_400_000.5;

/// JD of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// TT - TAI in seconds.
const TT_MINUS_TAI: f64 = 32.184;

/// TAI - GPS in seconds.
const TAI_MINUS_GPS: f64 = 19.0;

/// IAU 2006 B3 constants relating TDB and TCB.
const L_B: f64 = 1.550_519_768e-8;
const TDB0: f64 = -6.55e-5;
/// JD of 1977-01-01T00:00:32.184 TAI.
const T0: f64 = 2_443_144.500_372_5;
/// Rate of TCG relative to TT.
const L_G: f64 = 6.969_290_134e-10;

/// TAI - UTC steps as (MJD of start, seconds).
const LEAP_SECONDS: &[(f64, f64)] = &[
    (41_317.0, 10.0),
    (41_499.0, 11.0),
    (41_683.0, 12.0),
    (42_048.0, 13.0),
    (42_413.0, 14.0),
    (42_778.0, 15.0),
    (43_144.0, 16.0),
    (43_509.0, 17.0),
    (43_874.0, 18.0),
    (44_239.0, 19.0),
    (44_786.0, 20.0),
    (45_151.0, 21.0),
    (45_516.0, 22.0),
    (46_247.0, 23.0),
    (47_161.0, 24.0),
    (47_892.0, 25.0),
    (48_257.0, 26.0),
    (48_804.0, 27.0),
    (49_169.0, 28.0),
    (49_534.0, 29.0),
    (50_083.0, 30.0),
    (50_630.0, 31.0),
    (51_179.0, 32.0),
    (53_736.0, 33.0),
    (54_832.0, 34.0),
    (56_109.0, 35.0),
    (57_204.0, 36.0),
    (57_754.0, 37.0),
];

/// Time scale of a TIMESYS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeScale {
    Tcb,
    Tdb,
    Tt,
    Tai,
    Utc,
    Tcg,
    Gps,
    Ut,
    Other(String),
}

impl TimeScale {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "TCB" => TimeScale::Tcb,
            "TDB" | "TEB" => TimeScale::Tdb,
            "TT" | "TDT" | "ET" => TimeScale::Tt,
            "TAI" | "IAT" => TimeScale::Tai,
            "UTC" => TimeScale::Utc,
            "TCG" => TimeScale::Tcg,
            "GPS" => TimeScale::Gps,
            "UT" | "UT1" => TimeScale::Ut,
            other => TimeScale::Other(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, TimeScale::Other(_))
    }
}

/// Reference position of a TIMESYS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefPosition {
    Barycenter,
    Geocenter,
    Topocenter,
    Heliocenter,
    Other(String),
}

impl RefPosition {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "BARYCENTER" | "BARYCENTRE" | "BARYCENTRIC" => RefPosition::Barycenter,
            "GEOCENTER" | "GEOCENTRE" => RefPosition::Geocenter,
            "TOPOCENTER" | "TOPOCENTRE" => RefPosition::Topocenter,
            "HELIOCENTER" | "HELIOCENTRE" => RefPosition::Heliocenter,
            other => RefPosition::Other(other.to_string()),
        }
    }
}

/// Encoding of time cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    Jd,
    Mjd,
    /// ISO-8601 date-time, read as UTC.
    Iso,
    /// Plain `YYYY-MM-DD` date.
    Ymd,
    DecimalYears,
}

/// A time frame declared by TIMESYS.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrame {
    pub scale: TimeScale,
    pub ref_position: RefPosition,
    /// JD that cell values are offsets from, when declared.
    pub origin: Option<f64>,
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::target()
    }
}

impl TimeFrame {
    /// The target frame: TCB at the barycentre.
    pub fn target() -> Self {
        Self {
            scale: TimeScale::Tcb,
            ref_position: RefPosition::Barycenter,
            origin: None,
        }
    }

    /// Build a frame from TIMESYS `timeorigin`, `timescale` and `refposition`.
    pub fn from_timesys(origin: Option<&str>, scale: &str, ref_position: Option<&str>) -> Self {
        Self {
            scale: TimeScale::parse(scale),
            ref_position: ref_position.map_or(RefPosition::Barycenter, RefPosition::parse),
            origin: origin.and_then(parse_origin),
        }
    }

    /// Whether values in this frame can be brought to TCB/BARYCENTER.
    ///
    /// Only barycentric positions are supported since a light-time
    /// correction needs the source direction and observer ephemeris.
    pub fn is_supported(&self) -> bool {
        self.scale.is_supported() && self.ref_position == RefPosition::Barycenter
    }

    /// Convert a JD in this frame's scale to TCB.
    pub fn to_tcb(&self, jd: f64) -> f64 {
        let tt = match &self.scale {
            TimeScale::Tcb | TimeScale::Other(_) => return jd,
            TimeScale::Tdb => return tdb_to_tcb(jd),
            TimeScale::Tt => jd,
            TimeScale::Tai => jd + TT_MINUS_TAI / SECONDS_PER_DAY,
            TimeScale::Utc | TimeScale::Ut => utc_to_tai(jd) + TT_MINUS_TAI / SECONDS_PER_DAY,
            TimeScale::Gps => jd + (TAI_MINUS_GPS + TT_MINUS_TAI) / SECONDS_PER_DAY,
            TimeScale::Tcg => jd - L_G * (jd - T0),
        };
        tdb_to_tcb(tt_to_tdb(tt))
    }
}

/// Parse a TIMESYS `timeorigin`: a JD number or the MJD-origin/JD-origin keywords.
fn parse_origin(text: &str) -> Option<f64> {
    match text.trim().to_ascii_uppercase().as_str() {
        "MJD-ORIGIN" => Some(MJD_OFFSET),
        "JD-ORIGIN" => Some(0.0),
        other => other.parse().ok(),
    }
}

fn tai_minus_utc(jd_utc: f64) -> f64 {
    let mjd = jd_utc - MJD_OFFSET;
    LEAP_SECONDS
        .iter()
        .rev()
        .find(|(start, _)| mjd >= *start)
        .map_or(LEAP_SECONDS[0].1, |(_, seconds)| *seconds)
}

fn utc_to_tai(jd: f64) -> f64 {
    jd + tai_minus_utc(jd) / SECONDS_PER_DAY
}

/// Periodic TDB - TT term, good to a few microseconds.
fn tt_to_tdb(jd_tt: f64) -> f64 {
    let g = (357.53 + 0.985_600_28 * (jd_tt - J2000_JD)).to_radians();
    jd_tt + (0.001_657 * g.sin() + 0.000_014 * (2.0 * g).sin()) / SECONDS_PER_DAY
}

fn tdb_to_tcb(jd_tdb: f64) -> f64 {
    let offset = (L_B * (jd_tdb - T0) * SECONDS_PER_DAY - TDB0) / (1.0 - L_B);
    jd_tdb + offset / SECONDS_PER_DAY
}

/// Infer how a time column is encoded from its unit, name and first value.
///
/// An explicit year unit wins, then a JD/MJD unit or name hint, then the
/// shape of the value.
pub fn infer_encoding(value: &str, unit: &str, name: &str) -> TimeEncoding {
    let unit = unit.trim().to_ascii_lowercase();
    let name = name.trim().to_ascii_lowercase();
    if matches!(unit.as_str(), "yr" | "a" | "year" | "years" | "yrs" | "julianyear") {
        return TimeEncoding::DecimalYears;
    }
    if unit == "mjd" || name.contains("mjd") {
        return TimeEncoding::Mjd;
    }
    if unit == "jd" || ["jd", "bjd", "hjd"].iter().any(|p| name.starts_with(p)) {
        return TimeEncoding::Jd;
    }
    let value = value.trim();
    if value.len() > 10 && value.as_bytes().get(10) == Some(&b'T') {
        return TimeEncoding::Iso;
    }
    if parse_date(value).is_some() {
        return TimeEncoding::Ymd;
    }
    match value.parse::<f64>() {
        Ok(v) if v.abs() < 100_000.0 => TimeEncoding::Mjd,
        _ => TimeEncoding::Jd,
    }
}

/// Scale a numeric value in `unit` to days; unknown units are days.
fn to_days(value: f64, unit: &str) -> f64 {
    match unit.trim().to_ascii_lowercase().as_str() {
        "s" | "sec" | "second" | "seconds" => value / SECONDS_PER_DAY,
        "h" | "hr" | "hour" | "hours" => value / 24.0,
        "min" => value / 1440.0,
        "yr" | "a" | "year" | "years" => value * 365.25,
        _ => value,
    }
}

/// Convert a time cell to a JD in its own scale.
pub fn value_to_jd(
    value: &str,
    encoding: TimeEncoding,
    unit: &str,
    origin: Option<f64>,
) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let jd = match encoding {
        TimeEncoding::Iso => parse_iso(value)?,
        TimeEncoding::Ymd => parse_date(value)?,
        numeric => {
            let v: f64 = value.parse().ok()?;
            match (origin, numeric) {
                (_, TimeEncoding::DecimalYears) => J2000_JD + (v - 2000.0) * 365.25,
                (Some(origin), _) => origin + to_days(v, unit),
                (None, TimeEncoding::Mjd) => v + MJD_OFFSET,
                (None, _) => v,
            }
        }
    };
    jd.is_finite().then_some(jd)
}

fn datetime_to_jd(dt: NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

fn parse_iso(text: &str) -> Option<f64> {
    let text = text.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(datetime_to_jd)
}

fn parse_date(text: &str) -> Option<f64> {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(datetime_to_jd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_encoding() {
        assert_eq!(infer_encoding("2451545.0", "", "time"), TimeEncoding::Jd);
        assert_eq!(infer_encoding("51544.5", "", "time"), TimeEncoding::Mjd);
        assert_eq!(infer_encoding("2451545.0", "d", "mjd_obs"), TimeEncoding::Mjd);
        assert_eq!(infer_encoding("51544.5", "JD", "t"), TimeEncoding::Jd);
        assert_eq!(infer_encoding("2000-01-01T12:00:00", "", "t"), TimeEncoding::Iso);
        assert_eq!(infer_encoding("2000-01-01", "", "t"), TimeEncoding::Ymd);
        assert_eq!(infer_encoding("2015.5", "yr", "epoch"), TimeEncoding::DecimalYears);
    }

    #[test]
    fn test_value_to_jd() {
        let jd = value_to_jd("2000-01-01T12:00:00", TimeEncoding::Iso, "", None).unwrap();
        assert!((jd - J2000_JD).abs() < 1e-9);
        let jd = value_to_jd("51544.5", TimeEncoding::Mjd, "d", None).unwrap();
        assert!((jd - J2000_JD).abs() < 1e-9);
        let jd = value_to_jd("2000.0", TimeEncoding::DecimalYears, "yr", None).unwrap();
        assert_eq!(jd, J2000_JD);
        let jd = value_to_jd("86400", TimeEncoding::Jd, "s", Some(J2000_JD)).unwrap();
        assert_eq!(jd, J2000_JD + 1.0);
        assert!(value_to_jd("", TimeEncoding::Jd, "", None).is_none());
        assert!(value_to_jd("soon", TimeEncoding::Jd, "", None).is_none());
    }

    #[test]
    fn test_timesys_parse() {
        let frame = TimeFrame::from_timesys(Some("MJD-origin"), "TT", Some("BARYCENTER"));
        assert_eq!(frame.origin, Some(MJD_OFFSET));
        assert_eq!(frame.scale, TimeScale::Tt);
        assert!(frame.is_supported());
        let frame = TimeFrame::from_timesys(None, "UTC", Some("TOPOCENTER"));
        assert!(!frame.is_supported());
    }

    #[test]
    fn test_scale_offsets_to_tcb() {
        let tcb = TimeFrame::target().to_tcb(J2000_JD);
        assert_eq!(tcb, J2000_JD);

        // TCB - TT at J2000 is about 11.25 s.
        let tt = TimeFrame::from_timesys(None, "TT", None);
        let seconds = (tt.to_tcb(J2000_JD) - J2000_JD) * SECONDS_PER_DAY;
        assert!((seconds - 11.25).abs() < 0.05, "{seconds}");

        // UTC adds TAI-UTC (32 s in 2000) and 32.184 s on top.
        let utc = TimeFrame::from_timesys(None, "UTC", None);
        let seconds = (utc.to_tcb(J2000_JD) - J2000_JD) * SECONDS_PER_DAY;
        assert!((seconds - (11.25 + 64.184)).abs() < 0.05, "{seconds}");
    }

    #[test]
    fn test_leap_seconds() {
        assert_eq!(tai_minus_utc(57_754.0 + MJD_OFFSET), 37.0);
        assert_eq!(tai_minus_utc(57_753.9 + MJD_OFFSET), 36.0);
        assert_eq!(tai_minus_utc(30_000.0 + MJD_OFFSET), 10.0);
    }
}
