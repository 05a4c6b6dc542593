use crate::image_pipeline::adjust::processor::ParallelProcessor;
use crate::image_pipeline::adjust::types::{AdjustParams, PreparedAdjust};
use crate::image_pipeline::adjust::{scalar, simd};
use crate::image_pipeline::common::image::LinearImage;

fn gradient_image(width: usize, height: usize) -> LinearImage {
    let mut img = LinearImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            img.r[idx] = x as f32 / width as f32;
            img.g[idx] = y as f32 / height as f32;
            img.b[idx] = (x + y) as f32 / (width + height) as f32;
        }
    }
    img
}

fn busy_params() -> AdjustParams {
    AdjustParams {
        exposure: 0.5,
        contrast: 1.2,
        saturation: 1.3,
        temperature: 0.2,
        tint: -0.1,
        vignette: 0.4,
        grain: 0.5,
        grain_seed: 42,
    }
}

#[test]
fn neutral_params_are_a_complete_no_op() {
    let mut img = gradient_image(9, 7);
    let original = img.clone();
    let processor = ParallelProcessor::with_options(false).unwrap();
    processor.apply(&mut img, &AdjustParams::default());
    assert_eq!(img, original);
}

#[test]
fn sub_tolerance_params_are_skipped() {
    let mut img = gradient_image(9, 7);
    let original = img.clone();
    let processor = ParallelProcessor::with_options(false).unwrap();
    let params = AdjustParams {
        exposure: 1e-5,
        contrast: 1.0 + 1e-5,
        saturation: 1.0 - 1e-5,
        temperature: 1e-5,
        ..AdjustParams::default()
    };
    processor.apply(&mut img, &params);
    assert_eq!(img, original);
}

#[test]
fn exposure_doubles_at_one_ev() {
    let mut img = LinearImage::filled(4, 4, 0.2, 0.3, 0.4);
    let processor = ParallelProcessor::with_options(false).unwrap();
    let params = AdjustParams {
        exposure: 1.0,
        ..AdjustParams::default()
    };
    processor.apply(&mut img, &params);
    assert!((img.r[0] - 0.4).abs() < 1e-6);
    assert!((img.g[0] - 0.6).abs() < 1e-6);
    assert!((img.b[0] - 0.8).abs() < 1e-6);
}

#[test]
fn contrast_pivots_around_mid_gray() {
    let mut img = LinearImage::filled(4, 4, 0.18, 0.18, 0.18);
    let processor = ParallelProcessor::with_options(false).unwrap();
    let params = AdjustParams {
        contrast: 1.6,
        ..AdjustParams::default()
    };
    processor.apply(&mut img, &params);
    assert!((img.r[0] - 0.18).abs() < 1e-6);
}

#[test]
fn output_is_floor_clamped_only() {
    // Strong negative exposure on negative-capable input would go below
    // zero; bright values above 1 must survive.
    let mut img = LinearImage::filled(4, 4, 2.5, 2.5, 2.5);
    let processor = ParallelProcessor::with_options(false).unwrap();
    let params = AdjustParams {
        exposure: 1.0,
        ..AdjustParams::default()
    };
    processor.apply(&mut img, &params);
    assert!((img.r[0] - 5.0).abs() < 1e-5, "highlights must stay open");

    let mut dark = LinearImage::filled(4, 4, 0.05, 0.05, 0.05);
    let params = AdjustParams {
        contrast: 4.0,
        ..AdjustParams::default()
    };
    processor.apply(&mut dark, &params);
    assert_eq!(dark.r[0], 0.0, "contrast push below zero clamps at zero");
}

#[test]
fn vignette_darkens_corners_not_center() {
    let mut img = LinearImage::filled(9, 9, 0.5, 0.5, 0.5);
    let processor = ParallelProcessor::with_options(false).unwrap();
    let params = AdjustParams {
        vignette: 0.5,
        ..AdjustParams::default()
    };
    processor.apply(&mut img, &params);
    let center = img.r[4 * 9 + 4];
    let corner = img.r[0];
    assert!((center - 0.5).abs() < 1e-6);
    assert!(corner < center);
}

#[test]
fn grain_is_deterministic_for_fixed_seed() {
    let make = || {
        let mut img = gradient_image(8, 8);
        let processor = ParallelProcessor::with_options(false).unwrap();
        let params = AdjustParams {
            grain: 0.8,
            grain_seed: 7,
            ..AdjustParams::default()
        };
        processor.apply(&mut img, &params);
        img
    };
    assert_eq!(make(), make());
}

#[test]
fn scalar_and_simd_paths_match() {
    if !simd::available() {
        return;
    }
    let params = busy_params();
    // Width 9 forces a remainder lane past the last full vector.
    let mut scalar_img = gradient_image(9, 7);
    let mut simd_img = scalar_img.clone();
    let prepared = PreparedAdjust::new(&params, 9, 7);

    for y in 0..7 {
        let range = y * 9..(y + 1) * 9;
        scalar::apply_row(
            &mut scalar_img.r[range.clone()],
            &mut scalar_img.g[range.clone()],
            &mut scalar_img.b[range.clone()],
            y,
            &prepared,
        );
        simd::apply_row(
            &mut simd_img.r[range.clone()],
            &mut simd_img.g[range.clone()],
            &mut simd_img.b[range.clone()],
            y,
            &prepared,
        );
    }

    for i in 0..scalar_img.pixel_count() {
        assert!(
            (scalar_img.r[i] - simd_img.r[i]).abs() < 1e-6,
            "r diverges at {i}: {} vs {}",
            scalar_img.r[i],
            simd_img.r[i]
        );
        assert!((scalar_img.g[i] - simd_img.g[i]).abs() < 1e-6);
        assert!((scalar_img.b[i] - simd_img.b[i]).abs() < 1e-6);
    }
}

#[test]
fn full_processor_simd_matches_scalar_processor() {
    if !simd::available() {
        return;
    }
    let params = busy_params();
    let mut a = gradient_image(33, 17);
    let mut b = a.clone();

    ParallelProcessor::with_options(false)
        .unwrap()
        .apply(&mut a, &params);
    ParallelProcessor::with_options(true)
        .unwrap()
        .apply(&mut b, &params);

    for i in 0..a.pixel_count() {
        assert!((a.r[i] - b.r[i]).abs() < 1e-6);
        assert!((a.g[i] - b.g[i]).abs() < 1e-6);
        assert!((a.b[i] - b.b[i]).abs() < 1e-6);
    }
}

#[test]
fn worker_pool_is_bounded() {
    let processor = ParallelProcessor::new().unwrap();
    assert!((2..=8).contains(&processor.worker_count()));
}
