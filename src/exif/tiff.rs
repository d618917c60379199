use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::dms::{decimal_to_dms, latitude_ref, longitude_ref};

// TIFF field types
pub const TYPE_BYTE: u16 = 1;
pub const TYPE_ASCII: u16 = 2;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;

// IFD0 tags
pub const TAG_DATE_TIME: u16 = 0x0132;
pub const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;
pub const TAG_GPS_INFO: u16 = 0x8825;

// GPS IFD tags
pub const TAG_GPS_VERSION_ID: u16 = 0x0000;
pub const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
pub const TAG_GPS_LATITUDE: u16 = 0x0002;
pub const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
pub const TAG_GPS_LONGITUDE: u16 = 0x0004;
pub const TAG_GPS_TIME_STAMP: u16 = 0x0007;
pub const TAG_GPS_DATE_STAMP: u16 = 0x001D;

/// "II", 42, first IFD at offset 8.
pub const TIFF_HEADER: [u8; 8] = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];

/// GPS version 2.3.0.0, as the four BYTE values packed into the value slot.
const GPS_VERSION: u32 = 0x0003_0002;

const ENTRY_LEN: usize = 12;
const RATIONAL_LEN: usize = 8;
/// "YYYY:MM:DD HH:MM:SS" plus NUL.
const DATE_TIME_LEN: usize = 20;
/// "YYYY:MM:DD" plus NUL.
const DATE_STAMP_LEN: usize = 11;
const SECONDS_DENOMINATOR: u32 = 1_000_000;

/// How the 11-byte GPSDateStamp string is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStampEncoding {
    /// Append the string to the data pool and point the entry at it.
    #[default]
    DataPool,
    /// Reproduce the historical layout: the value slot only receives the
    /// string when it fits in 4 bytes, which a date never does, so readers
    /// see an 11-byte string at offset 0.
    LegacyInline,
}

/// Order in which a directory's entries are emitted.
///
/// Only the position of the 12-byte entries changes; the data pool and every
/// offset stored in the entries are the same for both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrder {
    #[default]
    AsWritten,
    Ascending,
}

/// Byte-layout choices for the generated EXIF blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutOptions {
    #[serde(default)]
    pub date_stamp: DateStampEncoding,
    #[serde(default)]
    pub entry_order: EntryOrder,
}

/// An unsigned EXIF RATIONAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn whole(value: u32) -> Self {
        Self { numerator: value, denominator: 1 }
    }

    /// Fixed-point value with microsecond-of-arc resolution.
    pub fn micros(value: f64) -> Self {
        Self {
            numerator: (value * SECONDS_DENOMINATOR as f64).round() as u32,
            denominator: SECONDS_DENOMINATOR,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.numerator.to_le_bytes());
        out.extend_from_slice(&self.denominator.to_le_bytes());
    }
}

/// One 12-byte IFD entry. `value_or_offset` holds the value itself when it
/// fits in 4 bytes, otherwise an offset from the start of the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value_or_offset: u32,
}

impl IfdEntry {
    fn at_offset(tag: u16, field_type: u16, count: u32, offset: usize) -> Self {
        Self { tag, field_type, count, value_or_offset: offset as u32 }
    }

    /// ASCII entry whose bytes are packed into the value slot when there are
    /// at most 4 of them. Longer strings leave the slot zeroed.
    fn inline_ascii(tag: u16, text: &[u8]) -> Self {
        let mut value = 0u32;
        if text.len() <= 4 {
            for (i, b) in text.iter().enumerate() {
                value |= (*b as u32) << (8 * i);
            }
        }
        Self { tag, field_type: TYPE_ASCII, count: text.len() as u32, value_or_offset: value }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag.to_le_bytes());
        out.extend_from_slice(&self.field_type.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&self.value_or_offset.to_le_bytes());
    }
}

/// A directory: entry count, entries, next-directory pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub entries: Vec<IfdEntry>,
    pub next_offset: u32,
}

impl Directory {
    fn byte_len(entry_count: usize) -> usize {
        2 + entry_count * ENTRY_LEN + 4
    }

    fn write_to(&self, out: &mut Vec<u8>, order: EntryOrder) {
        let mut entries = self.entries.clone();
        if order == EntryOrder::Ascending {
            entries.sort_by_key(|e| e.tag);
        }

        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for entry in &entries {
            entry.write_to(out);
        }
        out.extend_from_slice(&self.next_offset.to_le_bytes());
    }
}

/// Hemisphere reference plus degrees, minutes and seconds rationals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsCoordinate {
    pub reference: u8,
    pub dms: [Rational; 3],
}

impl GpsCoordinate {
    pub fn latitude(lat: f64) -> Self {
        Self::new(latitude_ref(lat), lat)
    }

    pub fn longitude(lon: f64) -> Self {
        Self::new(longitude_ref(lon), lon)
    }

    fn new(reference: u8, deg: f64) -> Self {
        let dms = decimal_to_dms(deg);
        Self {
            reference,
            dms: [
                Rational::whole(dms.degrees),
                Rational::whole(dms.minutes),
                Rational::micros(dms.seconds),
            ],
        }
    }

    fn reference_entry(&self, tag: u16) -> IfdEntry {
        IfdEntry::inline_ascii(tag, &[self.reference, 0])
    }
}

/// Format a timestamp into a NUL-terminated ASCII field of exactly `len` bytes.
fn ascii_field(text: &str, len: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(len - 1, b' ');
    bytes.push(0);
    bytes
}

/// Build the TIFF/EXIF blob (header, IFD0, GPS IFD, data pool) with the
/// default layout.
pub fn build_exif(lat: f64, lon: f64, timestamp: &DateTime<FixedOffset>) -> Vec<u8> {
    build_exif_with(lat, lon, timestamp, &LayoutOptions::default())
}

/// Build the TIFF/EXIF blob.
///
/// IFD0 carries the local wall-clock time in DateTime, DateTimeOriginal and
/// DateTimeDigitized; the GPS IFD carries the UTC time and date.
pub fn build_exif_with(
    lat: f64,
    lon: f64,
    timestamp: &DateTime<FixedOffset>,
    layout: &LayoutOptions,
) -> Vec<u8> {
    let local = ascii_field(&timestamp.format("%Y:%m:%d %H:%M:%S").to_string(), DATE_TIME_LEN);
    let utc = timestamp.with_timezone(&Utc);
    let date_stamp = ascii_field(&utc.format("%Y:%m:%d").to_string(), DATE_STAMP_LEN);

    // IFD0 layout
    let ifd0_start = TIFF_HEADER.len();
    let ifd0_data_start = ifd0_start + Directory::byte_len(4);
    let date_time_offset = ifd0_data_start;
    let original_offset = date_time_offset + DATE_TIME_LEN;
    let digitized_offset = original_offset + DATE_TIME_LEN;
    let gps_ifd_offset = digitized_offset + DATE_TIME_LEN;

    // GPS IFD layout
    let gps_data_start = gps_ifd_offset + Directory::byte_len(7);
    let lat_offset = gps_data_start;
    let lon_offset = lat_offset + 3 * RATIONAL_LEN;
    let time_offset = lon_offset + 3 * RATIONAL_LEN;
    let date_stamp_offset = time_offset + 3 * RATIONAL_LEN;

    let ifd0 = Directory {
        entries: vec![
            IfdEntry::at_offset(TAG_DATE_TIME, TYPE_ASCII, DATE_TIME_LEN as u32, date_time_offset),
            IfdEntry::at_offset(TAG_DATE_TIME_ORIGINAL, TYPE_ASCII, DATE_TIME_LEN as u32, original_offset),
            IfdEntry::at_offset(TAG_DATE_TIME_DIGITIZED, TYPE_ASCII, DATE_TIME_LEN as u32, digitized_offset),
            IfdEntry::at_offset(TAG_GPS_INFO, TYPE_LONG, 1, gps_ifd_offset),
        ],
        next_offset: 0,
    };

    let latitude = GpsCoordinate::latitude(lat);
    let longitude = GpsCoordinate::longitude(lon);
    let time = [
        Rational::whole(utc.hour()),
        Rational::whole(utc.minute()),
        Rational::whole(utc.second()),
    ];

    let date_stamp_entry = match layout.date_stamp {
        DateStampEncoding::DataPool => IfdEntry::at_offset(
            TAG_GPS_DATE_STAMP,
            TYPE_ASCII,
            DATE_STAMP_LEN as u32,
            date_stamp_offset,
        ),
        DateStampEncoding::LegacyInline => IfdEntry::inline_ascii(TAG_GPS_DATE_STAMP, &date_stamp),
    };

    let gps = Directory {
        entries: vec![
            IfdEntry {
                tag: TAG_GPS_VERSION_ID,
                field_type: TYPE_BYTE,
                count: 4,
                value_or_offset: GPS_VERSION,
            },
            latitude.reference_entry(TAG_GPS_LATITUDE_REF),
            IfdEntry::at_offset(TAG_GPS_LATITUDE, TYPE_RATIONAL, 3, lat_offset),
            longitude.reference_entry(TAG_GPS_LONGITUDE_REF),
            IfdEntry::at_offset(TAG_GPS_LONGITUDE, TYPE_RATIONAL, 3, lon_offset),
            IfdEntry::at_offset(TAG_GPS_TIME_STAMP, TYPE_RATIONAL, 3, time_offset),
            date_stamp_entry,
        ],
        next_offset: 0,
    };

    let mut out = Vec::with_capacity(date_stamp_offset + DATE_STAMP_LEN);
    out.extend_from_slice(&TIFF_HEADER);

    ifd0.write_to(&mut out, layout.entry_order);
    out.extend_from_slice(&local); // DateTime
    out.extend_from_slice(&local); // DateTimeOriginal
    out.extend_from_slice(&local); // DateTimeDigitized
    debug_assert_eq!(out.len(), gps_ifd_offset);

    gps.write_to(&mut out, layout.entry_order);
    debug_assert_eq!(out.len(), gps_data_start);

    for r in latitude.dms.iter().chain(&longitude.dms).chain(&time) {
        r.write_to(&mut out);
    }

    if layout.date_stamp == DateStampEncoding::DataPool {
        debug_assert_eq!(out.len(), date_stamp_offset);
        out.extend_from_slice(&date_stamp);
    }

    out
}
