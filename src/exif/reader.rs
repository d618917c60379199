use ::exif::{Context as TagContext, Exif, In, Reader, Tag, Value};
use anyhow::{Context, Result};
use img_parts::Bytes;
use img_parts::jpeg::Jpeg;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use super::jpeg::EXIF_IDENTIFIER;
use super::tiff::{TAG_DATE_TIME, TAG_DATE_TIME_DIGITIZED, TAG_DATE_TIME_ORIGINAL};

const XMP_IDENTIFIER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// EXIF fields of interest recovered from an image.
///
/// ASCII values are returned as stored, minus the NUL terminator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExifData {
    pub has_exif: bool,
    pub date_time: Option<String>,
    pub date_time_original: Option<String>,
    pub date_time_digitized: Option<String>,
    pub has_gps: bool,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    /// UTC hour, minute, second as (numerator, denominator) pairs.
    pub gps_time_stamp: Option<Vec<(u32, u32)>>,
    pub gps_date_stamp: Option<String>,
}

/// One JPEG segment ahead of the entropy-coded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    pub marker: u8,
    pub name: String,
    /// Payload size, excluding marker and length field.
    pub length: usize,
}

/// Read existing EXIF data from an image file.
pub fn read_exif(path: &Path) -> Result<ExifData> {
    let bytes = std::fs::read(path).context("Failed to open image file")?;
    read_exif_bytes(&bytes)
}

/// Read EXIF data from an in-memory image.
pub fn read_exif_bytes(bytes: &[u8]) -> Result<ExifData> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("No EXIF data found in {} byte image: {e}", bytes.len());
            return Ok(ExifData::default());
        }
    };

    let tiff_tag = |number| Tag(TagContext::Tiff, number);

    Ok(ExifData {
        has_exif: true,
        date_time: ascii_value(&exif, tiff_tag(TAG_DATE_TIME)),
        date_time_original: ascii_value(&exif, tiff_tag(TAG_DATE_TIME_ORIGINAL)),
        date_time_digitized: ascii_value(&exif, tiff_tag(TAG_DATE_TIME_DIGITIZED)),
        has_gps: exif.fields().any(|f| f.tag.context() == TagContext::Gps),
        gps_latitude: gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S'),
        gps_longitude: gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W'),
        gps_time_stamp: rationals(&exif, Tag::GPSTimeStamp)
            .map(|v| v.iter().map(|r| (r.num, r.denom)).collect()),
        gps_date_stamp: ascii_value(&exif, Tag::GPSDateStamp),
    })
}

/// List the segments of a JPEG up to the start of scan.
pub fn list_segments(bytes: &[u8]) -> Result<Vec<SegmentSummary>> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?;

    Ok(jpeg
        .segments()
        .iter()
        .map(|s| SegmentSummary {
            marker: s.marker(),
            name: segment_name(s.marker(), s.contents()),
            length: s.contents().len(),
        })
        .collect())
}

fn segment_name(marker: u8, contents: &[u8]) -> String {
    match marker {
        0xE0 if contents.starts_with(b"JFIF\0") => "APP0 (JFIF)".to_string(),
        0xE1 if contents.starts_with(EXIF_IDENTIFIER) => "APP1 (Exif)".to_string(),
        0xE1 if contents.starts_with(XMP_IDENTIFIER) => "APP1 (XMP)".to_string(),
        0xE0..=0xEF => format!("APP{}", marker - 0xE0),
        0xDB => "DQT".to_string(),
        0xC4 => "DHT".to_string(),
        0xC0..=0xC3 => format!("SOF{}", marker - 0xC0),
        0xDD => "DRI".to_string(),
        0xDA => "SOS".to_string(),
        0xFE => "COM".to_string(),
        _ => format!("FF{marker:02X}"),
    }
}

/// First string of an ASCII field.
fn ascii_value(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn rationals(exif: &Exif, tag: Tag) -> Option<&[::exif::Rational]> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) if v.len() == 3 => Some(v.as_slice()),
        _ => None,
    }
}

/// Convert a degrees/minutes/seconds triple plus its hemisphere reference to
/// signed decimal degrees.
fn gps_coordinate(exif: &Exif, value: Tag, reference: Tag, negative: u8) -> Option<f64> {
    let dms = rationals(exif, value)?;
    let coord = dms[0].to_f64() + dms[1].to_f64() / 60.0 + dms[2].to_f64() / 3600.0;

    let is_negative = matches!(
        &exif.get_field(reference, In::PRIMARY)?.value,
        Value::Ascii(parts) if parts.first().and_then(|p| p.first()) == Some(&negative)
    );

    Some(if is_negative { -coord } else { coord })
}
