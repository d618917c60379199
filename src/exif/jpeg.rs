use crate::error::FormatError;

const SOI: [u8; 2] = [0xFF, 0xD8];
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
pub const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";

/// Length field (2) + identifier (6). The marker bytes are not counted.
const APP1_OVERHEAD: usize = 2 + EXIF_IDENTIFIER.len();

/// Build a complete APP1 segment: marker, big-endian length, `Exif\0\0`, payload.
pub fn exif_segment(exif: &[u8]) -> Result<Vec<u8>, FormatError> {
    let length = exif.len() + APP1_OVERHEAD;
    let length = u16::try_from(length).map_err(|_| FormatError::PayloadTooLarge(exif.len()))?;

    let mut segment = Vec::with_capacity(2 + length as usize);
    segment.extend_from_slice(&[0xFF, MARKER_APP1]);
    segment.extend_from_slice(&length.to_be_bytes());
    segment.extend_from_slice(EXIF_IDENTIFIER);
    segment.extend_from_slice(exif);
    Ok(segment)
}

/// Offset of the first byte after the run of APP0/APP1 segments that
/// directly follows SOI.
///
/// Scanning stops at the first marker that is not APP0/APP1, or where the
/// bytes stop looking like a marker. A length field that points past the end
/// of the buffer is an error.
pub fn leading_app_segments_end(jpeg: &[u8]) -> Result<usize, FormatError> {
    let mut pos = SOI.len();

    while pos + 1 < jpeg.len() && jpeg[pos] == 0xFF {
        let marker = jpeg[pos + 1];
        if marker != MARKER_APP0 && marker != MARKER_APP1 {
            break;
        }

        let available = jpeg.len() - pos - 2;
        if available < 2 {
            return Err(FormatError::TruncatedSegment { marker, offset: pos, declared: 2, available });
        }

        let declared = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if declared < 2 {
            return Err(FormatError::InvalidSegmentLength { marker, offset: pos, declared });
        }
        if declared > available {
            return Err(FormatError::TruncatedSegment { marker, offset: pos, declared, available });
        }

        pos += 2 + declared;
    }

    Ok(pos)
}

/// Install `exif` as the first segment after SOI, dropping the leading run
/// of APP0/APP1 segments. Everything from the first other marker onward is
/// copied unchanged.
pub fn embed_exif(jpeg: &[u8], exif: &[u8]) -> Result<Vec<u8>, FormatError> {
    if !jpeg.starts_with(&SOI) {
        return Err(FormatError::NotJpeg);
    }

    let segment = exif_segment(exif)?;
    let rest = leading_app_segments_end(jpeg)?;
    log::debug!("Replacing {} bytes of leading APP0/APP1 segments", rest - SOI.len());

    let mut out = Vec::with_capacity(SOI.len() + segment.len() + jpeg.len() - rest);
    out.extend_from_slice(&SOI);
    out.extend_from_slice(&segment);
    out.extend_from_slice(&jpeg[rest..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DQT: &[u8] = &[0xFF, 0xDB, 0x00, 0x04, 0x00, 0x01];
    const EOI: &[u8] = &[0xFF, 0xD9];

    fn app(marker: u8, body: &[u8]) -> Vec<u8> {
        let mut seg = vec![0xFF, marker];
        seg.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
        seg.extend_from_slice(body);
        seg
    }

    fn jpeg(parts: &[&[u8]]) -> Vec<u8> {
        let mut out = SOI.to_vec();
        for p in parts {
            out.extend_from_slice(p);
        }
        out
    }

    // ── segment construction ─────────────────────────────────────────

    #[test]
    fn exif_segment_layout() {
        let seg = exif_segment(b"TIFF").unwrap();
        assert_eq!(&seg[..4], &[0xFF, 0xE1, 0x00, 0x0C]);
        assert_eq!(&seg[4..10], b"Exif\0\0");
        assert_eq!(&seg[10..], b"TIFF");
    }

    #[test]
    fn oversized_payload_rejected() {
        let payload = vec![0u8; u16::MAX as usize];
        assert_eq!(exif_segment(&payload), Err(FormatError::PayloadTooLarge(u16::MAX as usize)));
    }

    // ── SOI validation ───────────────────────────────────────────────

    #[test]
    fn rejects_missing_soi() {
        assert_eq!(embed_exif(b"\x89PNG\r\n", b"x"), Err(FormatError::NotJpeg));
        assert_eq!(embed_exif(&[0xFF], b"x"), Err(FormatError::NotJpeg));
        assert_eq!(embed_exif(&[], b"x"), Err(FormatError::NotJpeg));
    }

    // ── leading segment removal ──────────────────────────────────────

    #[test]
    fn no_app_segments_drops_nothing() {
        let input = jpeg(&[DQT, EOI]);
        let out = embed_exif(&input, b"TIFF").unwrap();
        let seg = exif_segment(b"TIFF").unwrap();
        assert_eq!(&out[..2], &SOI);
        assert_eq!(&out[2..2 + seg.len()], seg.as_slice());
        assert_eq!(&out[2 + seg.len()..], &input[2..]);
    }

    #[test]
    fn removes_app0_and_app1_run() {
        let app0 = app(0xE0, b"JFIF\0\x01\x01");
        let app1 = app(0xE1, b"Exif\0\0old");
        let input = jpeg(&[app0.as_slice(), app1.as_slice(), DQT, EOI]);

        let out = embed_exif(&input, b"new").unwrap();
        let seg = exif_segment(b"new").unwrap();
        assert_eq!(out.len(), 2 + seg.len() + DQT.len() + EOI.len());
        assert!(out.ends_with(&[DQT, EOI].concat()));
    }

    #[test]
    fn later_app_segments_are_kept() {
        let app0 = app(0xE0, b"JFIF\0");
        let late = app(0xE1, b"http://ns.adobe.com/xap/1.0/\0");
        let input = jpeg(&[app0.as_slice(), DQT, late.as_slice(), EOI]);

        let out = embed_exif(&input, b"new").unwrap();
        assert!(out.ends_with(&[DQT, late.as_slice(), EOI].concat()));
    }

    #[test]
    fn app2_stops_the_scan() {
        let app2 = app(0xE2, b"ICC_PROFILE\0");
        let app1 = app(0xE1, b"Exif\0\0old");
        let input = jpeg(&[app2.as_slice(), app1.as_slice(), EOI]);
        assert_eq!(leading_app_segments_end(&input).unwrap(), 2);
    }

    #[test]
    fn non_marker_byte_stops_the_scan() {
        let input = jpeg(&[&[0x00, 0x11, 0x22]]);
        assert_eq!(leading_app_segments_end(&input).unwrap(), 2);
        let lone = jpeg(&[&[0xFF]]);
        assert_eq!(leading_app_segments_end(&lone).unwrap(), 2);
    }

    #[test]
    fn segment_ending_at_buffer_end() {
        let app0 = app(0xE0, b"JFIF\0");
        let input = jpeg(&[app0.as_slice()]);
        assert_eq!(leading_app_segments_end(&input).unwrap(), input.len());
    }

    // ── malformed lengths ────────────────────────────────────────────

    #[test]
    fn length_past_end_is_format_error() {
        let input = jpeg(&[&[0xFF, 0xE1, 0x01, 0x00, b'E', b'x']]);
        assert_eq!(
            embed_exif(&input, b"new"),
            Err(FormatError::TruncatedSegment { marker: 0xE1, offset: 2, declared: 256, available: 4 })
        );
    }

    #[test]
    fn missing_length_field_is_format_error() {
        let input = jpeg(&[&[0xFF, 0xE0, 0x00]]);
        assert!(matches!(
            embed_exif(&input, b"new"),
            Err(FormatError::TruncatedSegment { marker: 0xE0, offset: 2, .. })
        ));
    }

    #[test]
    fn length_below_two_is_format_error() {
        let input = jpeg(&[&[0xFF, 0xE0, 0x00, 0x01], DQT]);
        assert_eq!(
            embed_exif(&input, b"new"),
            Err(FormatError::InvalidSegmentLength { marker: 0xE0, offset: 2, declared: 1 })
        );
    }

    #[test]
    fn embedding_twice_leaves_one_app1() {
        let app0 = app(0xE0, b"JFIF\0");
        let input = jpeg(&[app0.as_slice(), DQT, EOI]);

        let once = embed_exif(&input, b"first").unwrap();
        let twice = embed_exif(&once, b"second").unwrap();

        assert_eq!(twice, embed_exif(&input, b"second").unwrap());
        let app1_count = twice.windows(2).filter(|w| *w == [0xFF, 0xE1]).count();
        assert_eq!(app1_count, 1);
    }
}
