//! EXIF geotag construction, JPEG splicing, and read-back.
//!
//! - [`decimal_to_dms`]: decimal degrees to degrees/minutes/seconds
//! - [`build_exif`]: synthesize the little-endian TIFF blob (IFD0 + GPS IFD)
//! - [`embed_exif`]: install a blob as the leading APP1 segment of a JPEG
//! - [`write_geotag`]: both of the above in one call
//! - [`read_exif`] / [`list_segments`]: inspect the result

mod dms;
mod jpeg;
mod reader;
mod tiff;
mod writer;

pub use dms::{decimal_to_dms, latitude_ref, longitude_ref, Dms};
pub use jpeg::{embed_exif, exif_segment, leading_app_segments_end};
pub use reader::{list_segments, read_exif, read_exif_bytes, ExifData, SegmentSummary};
pub use tiff::{
    build_exif, build_exif_with, DateStampEncoding, Directory, EntryOrder, GpsCoordinate, IfdEntry,
    LayoutOptions, Rational,
};
pub use writer::{write_geotag, write_geotag_with};
