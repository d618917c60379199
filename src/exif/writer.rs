use chrono::{DateTime, FixedOffset};

use super::jpeg::embed_exif;
use super::tiff::{build_exif_with, LayoutOptions};
use crate::error::FormatError;

/// Write GPS position and capture time into a JPEG byte stream using the
/// default EXIF layout.
///
/// Any APP0/APP1 segments directly after SOI are replaced by a single EXIF
/// APP1 segment; the rest of the stream is copied unchanged. On error no
/// output is produced.
pub fn write_geotag(
    jpeg: &[u8],
    lat: f64,
    lon: f64,
    timestamp: &DateTime<FixedOffset>,
) -> Result<Vec<u8>, FormatError> {
    write_geotag_with(jpeg, lat, lon, timestamp, &LayoutOptions::default())
}

/// [`write_geotag`] with explicit layout choices.
pub fn write_geotag_with(
    jpeg: &[u8],
    lat: f64,
    lon: f64,
    timestamp: &DateTime<FixedOffset>,
    layout: &LayoutOptions,
) -> Result<Vec<u8>, FormatError> {
    log::debug!("Adding EXIF metadata: lat={lat:.6}, lon={lon:.6}, time={timestamp}");

    let exif = build_exif_with(lat, lon, timestamp, layout);
    let output = embed_exif(jpeg, &exif)?;

    log::debug!(
        "EXIF metadata added: {} byte blob, result size {} bytes",
        exif.len(),
        output.len()
    );
    Ok(output)
}
