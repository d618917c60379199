use thiserror::Error;

/// Reasons a JPEG stream cannot take a new EXIF segment.
///
/// Every variant is a property of the input bytes; nothing here is transient,
/// so callers should report the error rather than retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The stream does not start with the SOI marker `FF D8`.
    #[error("not a valid JPEG")]
    NotJpeg,

    /// A leading APP0/APP1 segment claims more bytes than the buffer holds.
    #[error(
        "not a valid JPEG: segment FF{marker:02X} at offset {offset} declares {declared} bytes but only {available} remain"
    )]
    TruncatedSegment {
        marker: u8,
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// A leading APP0/APP1 segment declares a length shorter than its own length field.
    #[error("not a valid JPEG: segment FF{marker:02X} at offset {offset} declares impossible length {declared}")]
    InvalidSegmentLength {
        marker: u8,
        offset: usize,
        declared: usize,
    },

    /// The EXIF payload does not fit in a single APP1 segment.
    #[error("EXIF payload of {0} bytes does not fit in one APP1 segment")]
    PayloadTooLarge(usize),
}
