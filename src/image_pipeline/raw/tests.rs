use crate::image_pipeline::common::error::ProcessError;
use crate::image_pipeline::raw::container::DngReader;
use crate::image_pipeline::raw::demosaic::{demosaic, DemosaicAlgorithm};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawMosaic};
use crate::image_pipeline::raw::RawProcessor;

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_entry(buf: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value: [u8; 4]) {
    push_u16(buf, tag);
    push_u16(buf, field_type);
    push_u32(buf, count);
    buf.extend_from_slice(&value);
}

fn short_value(v: u16) -> [u8; 4] {
    let b = v.to_le_bytes();
    [b[0], b[1], 0, 0]
}

fn long_value(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

struct DngFixture {
    cfa_bytes: [u8; 4],
    black: u16,
    white: u16,
    vendor_strip_tags: bool,
    declared_strip_len: Option<u32>,
}

impl Default for DngFixture {
    fn default() -> Self {
        Self {
            cfa_bytes: [0, 1, 1, 2],
            black: 0,
            white: 0x3FFF,
            vendor_strip_tags: false,
            declared_strip_len: None,
        }
    }
}

/// Build a minimal little-endian DNG: header, one uncompressed 16-bit strip
/// directly after it, then a single IFD carrying the sensor tags.
fn build_dng(width: u32, height: u32, samples: &[u16], fixture: &DngFixture) -> Vec<u8> {
    let strip_offset = 8u32;
    let strip_len = (samples.len() * 2) as u32;
    let ifd_offset = strip_offset + strip_len;

    let mut buf = Vec::new();
    buf.extend_from_slice(b"II");
    push_u16(&mut buf, 42);
    push_u32(&mut buf, ifd_offset);
    for &s in samples {
        push_u16(&mut buf, s);
    }

    let declared_len = fixture.declared_strip_len.unwrap_or(strip_len);
    let (offset_tag, length_tag) = if fixture.vendor_strip_tags {
        (513u16, 514u16)
    } else {
        (273u16, 279u16)
    };

    let mut entries: Vec<(u16, u16, u32, [u8; 4])> = vec![
        (256, 4, 1, long_value(width)),
        (257, 4, 1, long_value(height)),
        (258, 3, 1, short_value(16)),
        (259, 3, 1, short_value(1)),
        (262, 3, 1, short_value(32803)),
        (271, 2, 4, *b"Acme"),
        (offset_tag, 4, 1, long_value(strip_offset)),
        (length_tag, 4, 1, long_value(declared_len)),
        (33421, 3, 2, [2, 0, 2, 0]),
        (33422, 1, 4, fixture.cfa_bytes),
        (34855, 3, 1, short_value(200)),
        (50714, 3, 1, short_value(fixture.black)),
        (50717, 3, 1, short_value(fixture.white)),
    ];
    entries.sort_by_key(|e| e.0);

    push_u16(&mut buf, entries.len() as u16);
    for (tag, field_type, count, value) in entries {
        push_entry(&mut buf, tag, field_type, count, value);
    }
    push_u32(&mut buf, 0);
    buf
}

fn uniform_mosaic(width: usize, height: usize, value: f32) -> RawMosaic {
    RawMosaic {
        width,
        height,
        data: vec![value; width * height],
    }
}

#[test]
fn parses_dimensions_and_normalizes_levels() {
    let fixture = DngFixture {
        black: 100,
        white: 1100,
        ..Default::default()
    };
    // Values at black, mid, white and above white.
    let samples = [100u16, 600, 1100, 4000];
    let data = build_dng(2, 2, &samples, &fixture);

    let (mosaic, meta) = DngReader.read_raw(&data).unwrap();
    assert_eq!((mosaic.width, mosaic.height), (2, 2));
    assert_eq!(meta.black_level, 100);
    assert_eq!(meta.white_level, 1100);
    assert!((mosaic.data[0] - 0.0).abs() < 1e-6);
    assert!((mosaic.data[1] - 0.5).abs() < 1e-6);
    assert!((mosaic.data[2] - 1.0).abs() < 1e-6);
    // Above white level clamps instead of exceeding 1.
    assert!((mosaic.data[3] - 1.0).abs() < 1e-6);
}

#[test]
fn extracts_camera_metadata() {
    let data = build_dng(2, 2, &[0, 0, 0, 0], &DngFixture::default());
    let (_, meta) = DngReader.read_raw(&data).unwrap();
    assert_eq!(meta.make, "Acme");
    assert_eq!(meta.iso, 200);
    assert_eq!(meta.cfa, CfaPattern::Rggb);
}

#[test]
fn accepts_vendor_strip_locator() {
    let fixture = DngFixture {
        vendor_strip_tags: true,
        ..Default::default()
    };
    let data = build_dng(2, 2, &[10, 20, 30, 40], &fixture);
    let (mosaic, _) = DngReader.read_raw(&data).unwrap();
    assert_eq!(mosaic.data.len(), 4);
}

#[test]
fn rejects_unknown_signature() {
    let data = build_dng(2, 2, &[0; 4], &DngFixture::default());
    let mut corrupt = data.clone();
    corrupt[0] = b'X';
    let err = DngReader.read_raw(&corrupt).unwrap_err();
    assert!(matches!(err, ProcessError::Format(_)));
}

#[test]
fn rejects_bad_magic() {
    let mut data = build_dng(2, 2, &[0; 4], &DngFixture::default());
    data[2] = 43;
    let err = DngReader.read_raw(&data).unwrap_err();
    assert!(matches!(err, ProcessError::Format(_)));
}

#[test]
fn reports_truncated_strip_with_offsets() {
    let fixture = DngFixture {
        declared_strip_len: Some(1 << 20),
        ..Default::default()
    };
    let data = build_dng(2, 2, &[0; 4], &fixture);
    let err = DngReader.read_raw(&data).unwrap_err();
    match err {
        ProcessError::TruncatedData {
            offset,
            expected,
            available,
        } => {
            assert_eq!(offset, 8);
            assert_eq!(expected, 1 << 20);
            assert!(available < expected);
        }
        other => panic!("expected TruncatedData, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_cfa_pattern() {
    let fixture = DngFixture {
        cfa_bytes: [0, 0, 2, 2],
        ..Default::default()
    };
    let data = build_dng(2, 2, &[0; 4], &fixture);
    let err = DngReader.read_raw(&data).unwrap_err();
    assert!(matches!(err, ProcessError::UnsupportedCfa(_)));
}

#[test]
fn demosaic_preserves_dimensions_for_all_cfa_patterns() {
    let mosaic = uniform_mosaic(6, 4, 0.5);
    for cfa in CfaPattern::ALL {
        for algorithm in [DemosaicAlgorithm::Bilinear, DemosaicAlgorithm::Ahd] {
            let image = demosaic(&mosaic, cfa, algorithm);
            assert_eq!(image.width, 6);
            assert_eq!(image.height, 4);
            assert_eq!(image.r.len(), 24);
            assert_eq!(image.g.len(), 24);
            assert_eq!(image.b.len(), 24);
        }
    }
}

#[test]
fn demosaic_reproduces_uniform_fields_exactly() {
    let mosaic = uniform_mosaic(8, 8, 0.25);
    for cfa in CfaPattern::ALL {
        for algorithm in [DemosaicAlgorithm::Bilinear, DemosaicAlgorithm::Ahd] {
            let image = demosaic(&mosaic, cfa, algorithm);
            for i in 0..image.pixel_count() {
                assert!((image.r[i] - 0.25).abs() < 1e-6);
                assert!((image.g[i] - 0.25).abs() < 1e-6);
                assert!((image.b[i] - 0.25).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn cfa_color_at_follows_block_layout() {
    assert_eq!(CfaPattern::Rggb.color_at(0, 0), 0);
    assert_eq!(CfaPattern::Rggb.color_at(1, 0), 1);
    assert_eq!(CfaPattern::Rggb.color_at(0, 1), 1);
    assert_eq!(CfaPattern::Rggb.color_at(1, 1), 2);
    assert_eq!(CfaPattern::Bggr.color_at(0, 0), 2);
    assert_eq!(CfaPattern::Grbg.color_at(1, 0), 0);
    assert_eq!(CfaPattern::Gbrg.color_at(0, 1), 0);
}

#[test]
fn load_raw_reads_from_disk() {
    let data = build_dng(2, 2, &[100, 200, 300, 400], &DngFixture::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.dng");
    std::fs::write(&path, &data).unwrap();

    let processor = RawProcessor::new(DemosaicAlgorithm::Bilinear);
    let (image, meta) = processor.load_raw(&path).unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    assert_eq!(meta.iso, 200);
}

#[test]
fn load_raw_missing_file_is_input_error() {
    let processor = RawProcessor::new(DemosaicAlgorithm::Bilinear);
    let err = processor.load_raw("/nonexistent/frame.dng").unwrap_err();
    assert!(matches!(err, ProcessError::InputRead(_)));
}
