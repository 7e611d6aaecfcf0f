//! Embedded-image extraction by signature scanning.
//!
//! The raw buffer is scanned for JPEG, PNG and WEBP signatures without
//! parsing the PDF object graph, which also finds images in documents whose
//! structure is too damaged for a PDF library. Only uncompressed image
//! streams (`DCTDecode` JPEGs, or files embedded verbatim) are found.

use std::fs;

use tracing::{debug, info, warn};

use crate::config::ImageConfig;
use crate::error::CvtextError;
use crate::model::{ImageCandidate, ImageFormat};

const JPEG_START: [u8; 2] = [0xFF, 0xD8];
const JPEG_END: [u8; 2] = [0xFF, 0xD9];
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_END: &[u8] = b"IEND";

/// Find image spans with the default size window (2 KiB, 10 MiB), largest first.
pub fn find_candidates(buffer: &[u8]) -> Vec<ImageCandidate> {
    let defaults = ImageConfig::default();
    find_candidates_within(buffer, defaults.min_bytes, defaults.max_bytes)
}

/// Find image spans whose size is strictly between `min_bytes` and
/// `max_bytes`, sorted by size descending. Equal sizes keep buffer order.
pub fn find_candidates_within(
    buffer: &[u8],
    min_bytes: usize,
    max_bytes: usize,
) -> Vec<ImageCandidate> {
    let mut candidates = Vec::new();
    let mut cursor = 0;

    while cursor < buffer.len() {
        let Some((format, end)) = span_at(buffer, cursor) else {
            cursor += 1;
            continue;
        };

        let size = end - cursor;
        if size > min_bytes && size < max_bytes {
            candidates.push(ImageCandidate {
                start: cursor,
                end,
                format,
                size,
            });
        } else {
            debug!(format = %format, start = cursor, size, "image span outside size window");
        }
        cursor = end;
    }

    candidates.sort_by(|a, b| b.size.cmp(&a.size));
    candidates
}

/// The image starting at `start`, if any, as its format and exclusive end.
fn span_at(buffer: &[u8], start: usize) -> Option<(ImageFormat, usize)> {
    let rest = &buffer[start..];

    if rest.starts_with(&JPEG_START) {
        let end = find(rest, &JPEG_END, JPEG_START.len())? + JPEG_END.len();
        return Some((ImageFormat::Jpeg, start + end));
    }

    if rest.starts_with(&PNG_SIGNATURE) {
        // IEND chunk type is followed by its 4-byte CRC
        let end = find(rest, PNG_END, PNG_SIGNATURE.len())? + PNG_END.len() + 4;
        return (end <= rest.len()).then_some((ImageFormat::Png, start + end));
    }

    if rest.starts_with(b"RIFF") && rest.get(8..12) == Some(b"WEBP".as_slice()) {
        let len = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let end = len.checked_add(8)?;
        return (end <= rest.len()).then_some((ImageFormat::Webp, start + end));
    }

    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Save the largest embedded image and return its public URL.
pub fn extract_profile_photo(buffer: &[u8], config: &ImageConfig) -> Option<String> {
    extract_gallery(buffer, config, 1).into_iter().next()
}

/// Save up to `max` embedded images, largest first, returning their public URLs.
///
/// Failures are logged and produce an empty list.
pub fn extract_gallery(buffer: &[u8], config: &ImageConfig, max: usize) -> Vec<String> {
    let candidates = find_candidates_within(buffer, config.min_bytes, config.max_bytes);
    save_gallery(buffer, &candidates, config, max)
}

/// Write up to `max` already-located candidates into the upload directory.
///
/// Candidates are written in the given order. Failures are logged and
/// produce an empty list.
pub fn save_gallery(
    buffer: &[u8],
    candidates: &[ImageCandidate],
    config: &ImageConfig,
    max: usize,
) -> Vec<String> {
    match save_candidates(buffer, candidates, config, max) {
        Ok(urls) => urls,
        Err(e) => {
            warn!(dir = %config.upload_dir.display(), error = %e, "failed to save embedded images");
            Vec::new()
        }
    }
}

fn save_candidates(
    buffer: &[u8],
    candidates: &[ImageCandidate],
    config: &ImageConfig,
    max: usize,
) -> Result<Vec<String>, CvtextError> {
    if candidates.is_empty() || max == 0 {
        debug!(found = candidates.len(), "no embedded images to save");
        return Ok(Vec::new());
    }

    fs::create_dir_all(&config.upload_dir)?;
    let timestamp = chrono::Utc::now().timestamp_millis();

    let mut urls = Vec::new();
    for (index, candidate) in candidates.iter().take(max).enumerate() {
        let filename = format!(
            "resume-photo-{timestamp}-{index}.{}",
            candidate.format.extension()
        );
        fs::write(config.upload_dir.join(&filename), candidate.bytes(buffer))?;
        urls.push(public_url(&config.public_prefix, &filename));
    }

    info!(saved = urls.len(), found = candidates.len(), "saved embedded images");
    Ok(urls)
}

fn public_url(prefix: &str, filename: &str) -> String {
    format!("{}/{filename}", prefix.trim_end_matches('/'))
}
