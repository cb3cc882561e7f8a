// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parsing of angle strings in decimal and sexagesimal notation.

/// Notation of a coordinate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleNotation {
    Decimal,
    Sexagesimal,
}

/// Whether an angle is a longitude (RA, hours in sexagesimal) or a latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleKind {
    Longitude,
    Latitude,
}

/// Unit of a decimal angle column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
    Hours,
}

impl AngleUnit {
    /// Interpret a declared unit string; unknown units are read as degrees.
    pub fn from_unit(unit: &str) -> Self {
        let unit = unit.trim().trim_matches('"').to_ascii_lowercase();
        match unit.as_str() {
            "rad" | "radian" | "radians" => AngleUnit::Radians,
            "h" | "hr" | "hour" | "hours" => AngleUnit::Hours,
            _ => AngleUnit::Degrees,
        }
    }

    pub fn to_degrees(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value,
            AngleUnit::Radians => value.to_degrees(),
            AngleUnit::Hours => value * 15.0,
        }
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ':' | ' ' | '\t')
}

/// Split off a trailing N/S/E/W hemisphere letter, returning the sign it implies.
fn strip_hemisphere(text: &str) -> (&str, f64) {
    let trimmed = text.trim();
    match trimmed.chars().last() {
        Some('N' | 'n' | 'E' | 'e') if trimmed.len() > 1 => (trimmed[..trimmed.len() - 1].trim_end(), 1.0),
        Some('S' | 's' | 'W' | 'w') if trimmed.len() > 1 => (trimmed[..trimmed.len() - 1].trim_end(), -1.0),
        _ => (trimmed, 1.0),
    }
}

/// Detect the notation of a single value: more than one `:`/space/tab
/// separator means sexagesimal.
pub fn detect_notation(text: &str) -> AngleNotation {
    let (body, _) = strip_hemisphere(text);
    let mut separators = 0;
    let mut previous_was_sep = false;
    for c in body.chars() {
        let sep = is_separator(c);
        if sep && !previous_was_sep {
            separators += 1;
        }
        previous_was_sep = sep;
    }
    if separators > 1 {
        AngleNotation::Sexagesimal
    } else {
        AngleNotation::Decimal
    }
}

/// Detect the notation of an RA/DEC pair; either side being sexagesimal wins.
pub fn detect_pair_notation(ra: &str, dec: &str) -> AngleNotation {
    if detect_notation(ra) == AngleNotation::Sexagesimal
        || detect_notation(dec) == AngleNotation::Sexagesimal
    {
        AngleNotation::Sexagesimal
    } else {
        AngleNotation::Decimal
    }
}

/// Parse an angle to degrees.
///
/// Sexagesimal longitudes are read as hours, latitudes as degrees. Decimal
/// values are converted with `unit`.
pub fn parse_angle(
    text: &str,
    notation: AngleNotation,
    kind: AngleKind,
    unit: AngleUnit,
) -> Option<f64> {
    let (body, hemisphere) = strip_hemisphere(text);
    if body.is_empty() {
        return None;
    }
    let value = match notation {
        AngleNotation::Decimal => {
            let body = body.trim_end_matches(['d', '°']);
            unit.to_degrees(body.trim().parse::<f64>().ok()?)
        }
        AngleNotation::Sexagesimal => {
            let sexa = parse_sexagesimal(body)?;
            match kind {
                AngleKind::Longitude => sexa * 15.0,
                AngleKind::Latitude => sexa,
            }
        }
    };
    if !value.is_finite() {
        return None;
    }
    Some(value * hemisphere)
}

/// Parse `[+-]a:b:c` / `a b c` into `a + b/60 + c/3600` with the sign applied.
pub fn parse_sexagesimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let mut total = 0.0;
    let mut divisor = 1.0;
    let mut parts = 0;
    for part in rest.split(is_separator).filter(|p| !p.is_empty()) {
        if parts == 3 {
            return None;
        }
        let value: f64 = part.parse().ok()?;
        if value < 0.0 {
            return None;
        }
        total += value / divisor;
        divisor *= 60.0;
        parts += 1;
    }
    if parts == 0 {
        return None;
    }
    Some(if negative { -total } else { total })
}

/// Whether a cell looks like a number or an angle.
pub fn looks_numeric(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let notation = detect_notation(text);
    parse_angle(text, notation, AngleKind::Latitude, AngleUnit::Degrees).is_some()
}

/// Split a combined "RA DEC" cell into its two halves.
///
/// The declination starts at a sign that follows a digit; otherwise a comma
/// or semicolon separates the halves; otherwise whitespace-separated tokens
/// are split in the middle.
pub fn split_combined(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let bytes = text.as_bytes();
    for i in 1..bytes.len() {
        if matches!(bytes[i], b'+' | b'-') {
            let prev = bytes[..i].iter().rev().find(|b| !b.is_ascii_whitespace());
            let after_exponent = matches!(bytes[i - 1], b'e' | b'E');
            if prev.is_some_and(|b| b.is_ascii_digit() || *b == b'.') && !after_exponent {
                return Some((text[..i].trim(), text[i..].trim()));
            }
        }
    }
    if let Some(pos) = text.find([',', ';']) {
        return Some((text[..pos].trim(), text[pos + 1..].trim()));
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 || tokens.len() % 2 != 0 {
        return None;
    }
    let half = tokens.len() / 2;
    // Locate the byte offset of the first token of the second half.
    let mut search_from = 0;
    let mut split_at = 0;
    for (i, token) in tokens.iter().enumerate() {
        let pos = text[search_from..].find(token)? + search_from;
        if i == half {
            split_at = pos;
            break;
        }
        search_from = pos + token.len();
    }
    Some((text[..split_at].trim(), text[split_at..].trim()))
}
