//! EXIF capture and reattachment for JPEG streams.
//!
//! The block is read through the `image` decoder and written back as a raw
//! APP1 segment directly after SOI, so reattaching never re-encodes pixels.

use image::{ImageDecoder, ImageReader};
use std::io::Cursor;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0_MARKER: u8 = 0xE0;
const APP1_MARKER: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// Raw EXIF payload as found in an APP1 segment, `Exif\0\0` header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifBlock(Vec<u8>);

impl ExifBlock {
    /// Wraps a TIFF-structured payload, adding the APP1 identifier if missing.
    pub fn from_payload(payload: Vec<u8>) -> Option<Self> {
        if payload.is_empty() {
            return None;
        }
        let data = if payload.starts_with(EXIF_HEADER) {
            payload
        } else {
            let mut data = Vec::with_capacity(EXIF_HEADER.len() + payload.len());
            data.extend_from_slice(EXIF_HEADER);
            data.extend_from_slice(&payload);
            data
        };
        (data.len() > EXIF_HEADER.len() && data.len() <= MAX_SEGMENT_PAYLOAD).then_some(ExifBlock(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads the EXIF block of an encoded JPEG.
///
/// `Ok(None)` means the image simply has no EXIF; `Err` means the decoder
/// could not get far enough to tell.
pub fn read_exif(jpeg: &[u8]) -> image::ImageResult<Option<ExifBlock>> {
    let mut decoder = ImageReader::with_format(Cursor::new(jpeg), image::ImageFormat::Jpeg)
        .into_decoder()?;
    Ok(decoder.exif_metadata()?.and_then(ExifBlock::from_payload))
}

/// True when the stream already carries an `Exif` APP1 segment.
pub fn has_exif_segment(jpeg: &[u8]) -> bool {
    segments(jpeg).any(|(marker, payload)| marker == APP1_MARKER && payload.starts_with(EXIF_HEADER))
}

/// Inserts `exif` as an APP1 segment after SOI, or after a leading JFIF
/// APP0 segment when there is one.
///
/// Returns `None` when `jpeg` is not a JPEG stream. A stream that already
/// has an EXIF segment is returned unchanged.
pub fn splice_exif(jpeg: &[u8], exif: &ExifBlock) -> Option<Vec<u8>> {
    if !jpeg.starts_with(&SOI) {
        return None;
    }
    if has_exif_segment(jpeg) {
        return Some(jpeg.to_vec());
    }

    let insert_at = match segments(jpeg).next() {
        Some((APP0_MARKER, payload)) => SOI.len() + 4 + payload.len(),
        _ => SOI.len(),
    };

    let segment_len = (exif.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + exif.len() + 4);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, APP1_MARKER]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(exif.as_bytes());
    out.extend_from_slice(&jpeg[insert_at..]);
    Some(out)
}

/// Iterates the marker segments preceding the scan data.
fn segments(jpeg: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut pos = if jpeg.starts_with(&SOI) { SOI.len() } else { jpeg.len() };
    std::iter::from_fn(move || {
        while pos + 4 <= jpeg.len() {
            if jpeg[pos] != 0xFF {
                return None;
            }
            let marker = jpeg[pos + 1];
            // fill bytes
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            // start of scan or end of image: no more headers
            if marker == 0xDA || marker == 0xD9 {
                return None;
            }
            let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
            let start = pos + 4;
            let end = pos + 2 + len;
            if len < 2 || end > jpeg.len() {
                return None;
            }
            pos = end;
            return Some((marker, &jpeg[start..end]));
        }
        None
    })
}
