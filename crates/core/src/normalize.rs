//! Turns raw GPS tags into signed decimal degrees, validated and ready for
//! indexing. Handles every value shape the extractors emit: plain numbers,
//! degree/minute/second triples, and the stringified forms of both.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

use crate::error::{Error, Result};
use crate::extract::{tag, TagMap};

#[derive(Clone, Copy)]
enum Axis {
    Lat,
    Lon,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Lat => 90.0,
            Axis::Lon => 180.0,
        }
    }
}

enum AngleForm {
    Decimal(f64),
    Dms(f64, f64, f64),
}

/// Extracts the (latitude, longitude) pair from a raw tag map.
///
/// Returns `Ok(None)` when the file simply carries no position, which is a
/// skip for the caller rather than a failure. Present-but-invalid values
/// are an [`Error::InvalidCoordinate`], as is a position with only one of
/// its two axes.
pub fn coordinates(tags: &TagMap) -> Result<Option<(f64, f64)>> {
    let lat = angle(tags, "GPSLatitude", "GPSLatitudeRef", Axis::Lat)?;
    let lon = angle(tags, "GPSLongitude", "GPSLongitudeRef", Axis::Lon)?;
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => Ok(Some((lat, lon))),
        _ => Err(Error::InvalidCoordinate(
            "one coordinate axis is missing".to_string(),
        )),
    }
}

/// Altitude in meters, negative below sea level. Never fatal: anything
/// unusable simply yields `None`.
pub fn altitude(tags: &TagMap) -> Option<f64> {
    let value = number_value(tag(tags, "GPSAltitude")?)?;
    if !value.is_finite() {
        return None;
    }
    if below_sea_level(tags) {
        Some(-value.abs())
    } else {
        Some(value)
    }
}

/// Capture time as UTC, from `DateTimeOriginal` with `CreateDate` as the
/// fallback. EXIF timestamps carry no zone, so the naive value is taken
/// as UTC. Never fatal.
pub fn timestamp(tags: &TagMap) -> Option<DateTime<Utc>> {
    let text = tag(tags, "DateTimeOriginal")
        .or_else(|| tag(tags, "CreateDate"))
        .and_then(serde_json::Value::as_str)?;
    parse_exif_datetime(text)
}

fn angle(tags: &TagMap, value_name: &str, ref_name: &str, axis: Axis) -> Result<Option<f64>> {
    let Some(value) = tag(tags, value_name) else {
        return Ok(None);
    };
    let form = parse_angle(value)
        .ok_or_else(|| Error::InvalidCoordinate(format!("unparsable {value_name}: {value}")))?;
    let reference = tag(tags, ref_name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let signed = match form {
        AngleForm::Dms(degrees, minutes, seconds) => {
            let components = [degrees, minutes, seconds];
            if components.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(Error::InvalidCoordinate(format!(
                    "negative or non-finite {value_name} component"
                )));
            }
            if minutes >= 60.0 || seconds >= 60.0 {
                return Err(Error::InvalidCoordinate(format!(
                    "{value_name} minutes or seconds out of range"
                )));
            }
            // DMS magnitudes are unsigned; only the hemisphere reference
            // can orient them.
            let Some(reference) = reference else {
                return Err(Error::InvalidCoordinate(format!(
                    "{value_name} has no hemisphere reference"
                )));
            };
            let sign = hemisphere_sign(axis, reference)?;
            sign * (degrees + minutes / 60.0 + seconds / 3600.0)
        }
        AngleForm::Decimal(value) => {
            if !value.is_finite() {
                return Err(Error::InvalidCoordinate(format!(
                    "non-finite {value_name}"
                )));
            }
            match reference {
                Some(reference) => {
                    let sign = hemisphere_sign(axis, reference)?;
                    if value < 0.0 && sign > 0.0 {
                        return Err(Error::InvalidCoordinate(format!(
                            "{value_name} sign contradicts hemisphere reference {reference}"
                        )));
                    }
                    sign * value.abs()
                }
                None => value,
            }
        }
    };

    if signed.abs() > axis.limit() {
        return Err(Error::InvalidCoordinate(format!(
            "{value_name} out of range: {signed}"
        )));
    }
    Ok(Some(signed))
}

fn hemisphere_sign(axis: Axis, reference: &str) -> Result<f64> {
    // exiftool emits "N" in numeric mode and "North" otherwise; the
    // initial letter covers both.
    let initial = reference.chars().next().map(|c| c.to_ascii_uppercase());
    match (axis, initial) {
        (Axis::Lat, Some('N')) | (Axis::Lon, Some('E')) => Ok(1.0),
        (Axis::Lat, Some('S')) | (Axis::Lon, Some('W')) => Ok(-1.0),
        _ => Err(Error::InvalidCoordinate(format!(
            "hemisphere reference {reference:?} does not match its axis"
        ))),
    }
}

fn parse_angle(value: &serde_json::Value) -> Option<AngleForm> {
    match value {
        serde_json::Value::Number(number) => number.as_f64().map(AngleForm::Decimal),
        serde_json::Value::Array(parts) => {
            let parts: Vec<f64> = parts.iter().filter_map(serde_json::Value::as_f64).collect();
            match parts[..] {
                [degrees, minutes, seconds] => Some(AngleForm::Dms(degrees, minutes, seconds)),
                _ => None,
            }
        }
        serde_json::Value::String(text) => parse_angle_text(text),
        _ => None,
    }
}

/// Pulls the numeric tokens out of a textual angle. One number is a
/// decimal degree value, three are a DMS triple (`48 deg 51' 29.60"`),
/// anything else is unparsable.
fn parse_angle_text(text: &str) -> Option<AngleForm> {
    let numbers: Vec<f64> = text
        .split(|c: char| !c.is_ascii_digit() && c != '.' && c != '+' && c != '-')
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect();
    match numbers[..] {
        [value] => Some(AngleForm::Decimal(value)),
        [degrees, minutes, seconds] => Some(AngleForm::Dms(degrees, minutes, seconds)),
        _ => None,
    }
}

fn below_sea_level(tags: &TagMap) -> bool {
    let Some(reference) = tag(tags, "GPSAltitudeRef") else {
        return false;
    };
    if let Some(number) = reference.as_u64() {
        return number == 1;
    }
    if let Some(text) = reference.as_str() {
        let text = text.trim();
        return text == "1" || text.to_ascii_lowercase().starts_with("below");
    }
    false
}

fn number_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_exif_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    // Fractional seconds are dropped rather than parsed.
    let text = text.split('.').next().unwrap_or(text);
    let naive = NaiveDateTime::parse_from_str(text, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    if !(1970..=2100).contains(&naive.year()) {
        return None;
    }
    Some(naive.and_utc())
}
