//! Hand-written TIFF/DNG container reader.
//!
//! DNG (and the vendor raws derived from it) is a TIFF container: a byte-order
//! header followed by linked image file directories (IFDs) of 12-byte tag
//! entries. This reader walks IFD0 and any SubIFDs, locates the directory that
//! actually carries the CFA mosaic, pulls the sensor tags out of it, reads the
//! sample strips and normalizes them against the black/white levels.

use std::collections::HashMap;

use tracing::debug;

use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawMetadata, RawMosaic};

// Baseline TIFF tags.
const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_MAKE: u16 = 271;
const TAG_MODEL: u16 = 272;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_SUB_IFDS: u16 = 330;
// Old-style JPEG pointer pair, reused by several vendor containers as the
// raw-strip locator.
const TAG_VENDOR_STRIP_OFFSET: u16 = 513;
const TAG_VENDOR_STRIP_LENGTH: u16 = 514;
const TAG_EXIF_IFD: u16 = 34665;
// EXIF tags.
const TAG_EXPOSURE_TIME: u16 = 33434;
const TAG_ISO: u16 = 34855;
// DNG / TIFF-EP tags.
const TAG_CFA_REPEAT_DIM: u16 = 33421;
const TAG_CFA_PATTERN: u16 = 33422;
const TAG_BLACK_LEVEL: u16 = 50714;
const TAG_WHITE_LEVEL: u16 = 50717;

const PHOTOMETRIC_CFA: u32 = 32803;
const COMPRESSION_NONE: u32 = 1;

/// Reader for DNG-family containers with uncompressed CFA strips.
pub struct DngReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

struct Cursor<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Cursor<'a> {
    fn u16_at(&self, offset: usize) -> Result<u16> {
        let bytes = self
            .data
            .get(offset..offset + 2)
            .ok_or_else(|| directory_overrun(offset, self.data.len()))?;
        let raw = [bytes[0], bytes[1]];
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        })
    }

    fn u32_at(&self, offset: usize) -> Result<u32> {
        let bytes = self
            .data
            .get(offset..offset + 4)
            .ok_or_else(|| directory_overrun(offset, self.data.len()))?;
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        })
    }
}

fn directory_overrun(offset: usize, len: usize) -> ProcessError {
    ProcessError::Format(format!(
        "tag directory runs past end of file (offset {offset}, file size {len})"
    ))
}

/// One parsed IFD entry with its raw value bytes resolved.
#[derive(Debug, Clone)]
struct TagEntry {
    field_type: u16,
    count: u32,
    value: Vec<u8>,
}

// TIFF field types this reader understands.
const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_UNDEFINED: u16 = 7;

fn type_size(field_type: u16) -> usize {
    match field_type {
        TYPE_BYTE | TYPE_ASCII | TYPE_UNDEFINED => 1,
        TYPE_SHORT => 2,
        TYPE_LONG => 4,
        TYPE_RATIONAL => 8,
        _ => 0,
    }
}

impl TagEntry {
    fn u32_values(&self, order: ByteOrder) -> Vec<u32> {
        let cursor = Cursor {
            data: &self.value,
            order,
        };
        let size = type_size(self.field_type);
        let mut out = Vec::with_capacity(self.count as usize);
        for i in 0..self.count as usize {
            let v = match self.field_type {
                TYPE_BYTE | TYPE_UNDEFINED => self.value.get(i).map(|&b| b as u32),
                TYPE_SHORT => cursor.u16_at(i * size).ok().map(u32::from),
                TYPE_LONG => cursor.u32_at(i * size).ok(),
                // Some writers store levels as rationals; integer-divide them.
                TYPE_RATIONAL => match (cursor.u32_at(i * size), cursor.u32_at(i * size + 4)) {
                    (Ok(num), Ok(den)) if den != 0 => Some(num / den),
                    _ => None,
                },
                _ => None,
            };
            match v {
                Some(v) => out.push(v),
                None => break,
            }
        }
        out
    }

    fn first_u32(&self, order: ByteOrder) -> Option<u32> {
        self.u32_values(order).first().copied()
    }

    fn ascii(&self) -> String {
        let end = self
            .value
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.value.len());
        String::from_utf8_lossy(&self.value[..end]).trim().to_string()
    }

    fn first_rational(&self, order: ByteOrder) -> Option<f32> {
        if self.field_type != TYPE_RATIONAL || self.value.len() < 8 {
            return None;
        }
        let cursor = Cursor {
            data: &self.value,
            order,
        };
        let num = cursor.u32_at(0).ok()? as f32;
        let den = cursor.u32_at(4).ok()? as f32;
        if den == 0.0 { None } else { Some(num / den) }
    }
}

type Ifd = HashMap<u16, TagEntry>;

/// Parse the IFD at `offset`, resolving out-of-line values.
fn parse_ifd(cursor: &Cursor<'_>, offset: usize) -> Result<(Ifd, usize)> {
    let entry_count = cursor.u16_at(offset)? as usize;
    let mut entries = HashMap::with_capacity(entry_count);

    for i in 0..entry_count {
        let base = offset + 2 + i * 12;
        let tag = cursor.u16_at(base)?;
        let field_type = cursor.u16_at(base + 2)?;
        let count = cursor.u32_at(base + 4)?;

        let byte_len = type_size(field_type).saturating_mul(count as usize);
        let value = if byte_len == 0 {
            Vec::new()
        } else if byte_len <= 4 {
            cursor
                .data
                .get(base + 8..base + 8 + byte_len)
                .ok_or_else(|| directory_overrun(base + 8, cursor.data.len()))?
                .to_vec()
        } else {
            let value_offset = cursor.u32_at(base + 8)? as usize;
            cursor
                .data
                .get(value_offset..value_offset + byte_len)
                .ok_or_else(|| directory_overrun(value_offset, cursor.data.len()))?
                .to_vec()
        };

        entries.insert(
            tag,
            TagEntry {
                field_type,
                count,
                value,
            },
        );
    }

    let next = cursor.u32_at(offset + 2 + entry_count * 12)? as usize;
    Ok((entries, next))
}

fn parse_header(data: &[u8]) -> Result<(ByteOrder, usize)> {
    if data.len() < 8 {
        return Err(ProcessError::Format(format!(
            "file too short for a TIFF header ({} bytes)",
            data.len()
        )));
    }
    let order = match &data[0..2] {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        other => {
            return Err(ProcessError::Format(format!(
                "unknown byte-order signature {other:?}"
            )));
        }
    };
    let cursor = Cursor { data, order };
    let magic = cursor.u16_at(2)?;
    if magic != 42 {
        return Err(ProcessError::Format(format!(
            "bad TIFF magic number {magic}"
        )));
    }
    let ifd0 = cursor.u32_at(4)? as usize;
    Ok((order, ifd0))
}

/// Locate the directory that carries the CFA mosaic.
///
/// DNG puts the full-resolution raw in a SubIFD (IFD0 holds a preview); some
/// vendor containers keep it directly in IFD0. Preference order: any IFD whose
/// photometric interpretation is CFA, else the first IFD with a strip locator.
fn find_raw_ifd(cursor: &Cursor<'_>, ifd0_offset: usize) -> Result<(Ifd, Ifd)> {
    let (ifd0, _next) = parse_ifd(cursor, ifd0_offset)?;

    let mut candidates: Vec<Ifd> = Vec::new();
    if let Some(sub) = ifd0.get(&TAG_SUB_IFDS) {
        for sub_offset in sub.u32_values(cursor.order) {
            let (sub_ifd, _) = parse_ifd(cursor, sub_offset as usize)?;
            candidates.push(sub_ifd);
        }
    }
    candidates.push(ifd0.clone());

    let is_cfa = |ifd: &Ifd| {
        ifd.get(&TAG_PHOTOMETRIC)
            .and_then(|e| e.first_u32(cursor.order))
            == Some(PHOTOMETRIC_CFA)
    };
    let has_strips = |ifd: &Ifd| {
        ifd.contains_key(&TAG_STRIP_OFFSETS) || ifd.contains_key(&TAG_VENDOR_STRIP_OFFSET)
    };

    let raw = candidates
        .iter()
        .find(|ifd| is_cfa(ifd))
        .or_else(|| candidates.iter().find(|ifd| has_strips(ifd)))
        .cloned()
        .ok_or_else(|| {
            ProcessError::Format("no image directory with raw strip data".to_string())
        })?;

    Ok((raw, ifd0))
}

struct StripLocation {
    offsets: Vec<u32>,
    byte_counts: Vec<u32>,
}

fn strip_location(ifd: &Ifd, order: ByteOrder) -> Result<StripLocation> {
    if let (Some(off), Some(cnt)) = (
        ifd.get(&TAG_STRIP_OFFSETS),
        ifd.get(&TAG_STRIP_BYTE_COUNTS),
    ) {
        return Ok(StripLocation {
            offsets: off.u32_values(order),
            byte_counts: cnt.u32_values(order),
        });
    }
    // Vendor variant: single strip addressed by the old JPEG pointer pair.
    if let (Some(off), Some(cnt)) = (
        ifd.get(&TAG_VENDOR_STRIP_OFFSET),
        ifd.get(&TAG_VENDOR_STRIP_LENGTH),
    ) {
        return Ok(StripLocation {
            offsets: off.u32_values(order),
            byte_counts: cnt.u32_values(order),
        });
    }
    Err(ProcessError::Format(
        "raw directory has no strip offsets".to_string(),
    ))
}

fn read_strips(data: &[u8], location: &StripLocation) -> Result<Vec<u8>> {
    if location.offsets.len() != location.byte_counts.len() {
        return Err(ProcessError::Format(format!(
            "strip offset/count mismatch: {} offsets, {} counts",
            location.offsets.len(),
            location.byte_counts.len()
        )));
    }
    let total: usize = location.byte_counts.iter().map(|&c| c as usize).sum();
    let mut out = Vec::with_capacity(total);
    for (&offset, &count) in location.offsets.iter().zip(&location.byte_counts) {
        let start = offset as usize;
        let end = start + count as usize;
        let strip = data.get(start..end).ok_or(ProcessError::TruncatedData {
            offset: offset as u64,
            expected: count as usize,
            available: data.len().saturating_sub(start),
        })?;
        out.extend_from_slice(strip);
    }
    Ok(out)
}

fn cfa_pattern(ifd: &Ifd, order: ByteOrder) -> Result<CfaPattern> {
    if let Some(dim) = ifd.get(&TAG_CFA_REPEAT_DIM) {
        let dims = dim.u32_values(order);
        if dims != [2, 2] {
            return Err(ProcessError::UnsupportedCfa(format!(
                "repeat pattern {dims:?}"
            )));
        }
    }
    let pattern = ifd
        .get(&TAG_CFA_PATTERN)
        .ok_or_else(|| ProcessError::Format("missing CFAPattern tag".to_string()))?;
    CfaPattern::from_pattern_bytes(&pattern.value)
}

impl RawImageReader for DngReader {
    fn read_raw(&self, data: &[u8]) -> Result<(RawMosaic, RawMetadata)> {
        let (order, ifd0_offset) = parse_header(data)?;
        let cursor = Cursor { data, order };
        let (raw_ifd, ifd0) = find_raw_ifd(&cursor, ifd0_offset)?;

        let width = raw_ifd
            .get(&TAG_IMAGE_WIDTH)
            .and_then(|e| e.first_u32(order))
            .ok_or_else(|| ProcessError::Format("missing ImageWidth tag".to_string()))?
            as usize;
        let height = raw_ifd
            .get(&TAG_IMAGE_LENGTH)
            .and_then(|e| e.first_u32(order))
            .ok_or_else(|| ProcessError::Format("missing ImageLength tag".to_string()))?
            as usize;
        if width == 0 || height == 0 {
            return Err(ProcessError::InvalidDimensions(width, height));
        }

        let bits = raw_ifd
            .get(&TAG_BITS_PER_SAMPLE)
            .and_then(|e| e.first_u32(order))
            .unwrap_or(16);
        if bits != 8 && bits != 16 {
            return Err(ProcessError::Format(format!(
                "unsupported bits per sample: {bits}"
            )));
        }
        let compression = raw_ifd
            .get(&TAG_COMPRESSION)
            .and_then(|e| e.first_u32(order))
            .unwrap_or(COMPRESSION_NONE);
        if compression != COMPRESSION_NONE {
            return Err(ProcessError::Format(format!(
                "unsupported strip compression: {compression}"
            )));
        }

        let cfa = cfa_pattern(&raw_ifd, order)?;

        let black_level = raw_ifd
            .get(&TAG_BLACK_LEVEL)
            .and_then(|e| e.first_u32(order))
            .unwrap_or(0) as u16;
        let white_level = raw_ifd
            .get(&TAG_WHITE_LEVEL)
            .and_then(|e| e.first_u32(order))
            .unwrap_or(((1u32 << bits) - 1).min(u16::MAX as u32)) as u16;

        let location = strip_location(&raw_ifd, order)?;
        let strip_bytes = read_strips(data, &location)?;

        let bytes_per_sample = (bits / 8) as usize;
        let expected = width * height * bytes_per_sample;
        if strip_bytes.len() < expected {
            return Err(ProcessError::TruncatedData {
                offset: location.offsets.first().copied().unwrap_or(0) as u64,
                expected,
                available: strip_bytes.len(),
            });
        }

        debug!(
            width,
            height, bits, black_level, white_level, "parsed raw directory"
        );

        // Black-level subtraction and white-level normalization into [0, 1].
        let range = (white_level.saturating_sub(black_level) as f32).max(1.0);
        let black = black_level as f32;
        let samples = width * height;
        let mut mosaic = Vec::with_capacity(samples);
        for i in 0..samples {
            let v = if bits == 8 {
                strip_bytes[i] as f32
            } else {
                let raw = [strip_bytes[i * 2], strip_bytes[i * 2 + 1]];
                match order {
                    ByteOrder::Little => u16::from_le_bytes(raw) as f32,
                    ByteOrder::Big => u16::from_be_bytes(raw) as f32,
                }
            };
            mosaic.push(((v - black) / range).clamp(0.0, 1.0));
        }

        // Camera and exposure tags live in IFD0 / the EXIF directory.
        let make = ifd0.get(&TAG_MAKE).map(|e| e.ascii()).unwrap_or_default();
        let model = ifd0.get(&TAG_MODEL).map(|e| e.ascii()).unwrap_or_default();

        let mut iso = ifd0.get(&TAG_ISO).and_then(|e| e.first_u32(order));
        let mut exposure_time = ifd0
            .get(&TAG_EXPOSURE_TIME)
            .and_then(|e| e.first_rational(order));
        if let Some(exif_offset) = ifd0.get(&TAG_EXIF_IFD).and_then(|e| e.first_u32(order)) {
            if let Ok((exif, _)) = parse_ifd(&cursor, exif_offset as usize) {
                iso = iso.or_else(|| exif.get(&TAG_ISO).and_then(|e| e.first_u32(order)));
                exposure_time = exposure_time
                    .or_else(|| exif.get(&TAG_EXPOSURE_TIME).and_then(|e| e.first_rational(order)));
            }
        }

        let metadata = RawMetadata {
            width,
            height,
            black_level,
            white_level,
            cfa,
            iso: iso.unwrap_or(100),
            make,
            model,
            exposure_time,
        };

        Ok((
            RawMosaic {
                width,
                height,
                data: mosaic,
            },
            metadata,
        ))
    }
}
