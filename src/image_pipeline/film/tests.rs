use crate::image_pipeline::bilateral::BilateralConfig;
use crate::image_pipeline::common::image::LinearImage;
use crate::image_pipeline::film::curves::{apply_tone_curves, ToneCurve, ToneCurveParams};
use crate::image_pipeline::film::engine::FilmEngine;
use crate::image_pipeline::film::grain::{apply_grain, gaussian, grain_sample};
use crate::image_pipeline::film::hsl::{
    apply_hsl, hsl_to_rgb, rgb_to_hsl, segment_index,
};
use crate::image_pipeline::film::params::{
    ChannelResponseParams, CrosstalkMatrix, FilmParams, GrainParams, HslAdjustment, HslParams,
};
use crate::image_pipeline::film::response::{apply_response_curve, evaluate};
use crate::image_pipeline::film::{crosstalk, tone};
use crate::image_pipeline::raw::{CfaPattern, RawMetadata};

fn test_metadata(iso: u32) -> RawMetadata {
    RawMetadata {
        width: 4,
        height: 4,
        black_level: 0,
        white_level: 0x3FFF,
        cfa: CfaPattern::Rggb,
        iso,
        make: String::new(),
        model: String::new(),
        exposure_time: None,
    }
}

fn gradient_image(width: usize, height: usize) -> LinearImage {
    let mut img = LinearImage::new(width, height);
    for i in 0..img.pixel_count() {
        img.r[i] = (i % 7) as f32 / 7.0;
        img.g[i] = (i % 5) as f32 / 5.0;
        img.b[i] = (i % 3) as f32 / 3.0;
    }
    img
}

// ------------------------------------------------------------------------
// Crosstalk
// ------------------------------------------------------------------------

#[test]
fn identity_crosstalk_is_a_numeric_no_op() {
    let mut img = gradient_image(8, 8);
    let original = img.clone();
    crosstalk::apply_crosstalk(&mut img, &CrosstalkMatrix::IDENTITY);
    for i in 0..img.pixel_count() {
        assert!((img.r[i] - original.r[i]).abs() < 1e-6);
        assert!((img.g[i] - original.g[i]).abs() < 1e-6);
        assert!((img.b[i] - original.b[i]).abs() < 1e-6);
    }
}

#[test]
fn crosstalk_mixes_channels() {
    let mut img = LinearImage::filled(2, 2, 1.0, 0.0, 0.0);
    let matrix = CrosstalkMatrix([[0.9, 0.1, 0.0], [0.1, 0.9, 0.0], [0.0, 0.1, 0.9]]);
    crosstalk::apply_crosstalk(&mut img, &matrix);
    assert!((img.r[0] - 0.9).abs() < 1e-6);
    assert!((img.g[0] - 0.1).abs() < 1e-6);
    assert!((img.b[0] - 0.0).abs() < 1e-6);
}

// ------------------------------------------------------------------------
// Response curve
// ------------------------------------------------------------------------

fn continuity_at(p: &ChannelResponseParams, boundary: f32) {
    let eps = 1e-4;
    let below = evaluate(p, boundary - 1e-6);
    let above = evaluate(p, boundary + 1e-6);
    assert!(
        (below - above).abs() < eps,
        "discontinuity at {boundary}: {below} vs {above}"
    );
}

#[test]
fn response_curve_is_continuous_at_segment_boundaries() {
    let cases = [
        ChannelResponseParams::default(),
        ChannelResponseParams {
            toe_slope: 0.4,
            toe_strength: 1.0,
            toe_point: 0.15,
            shoulder_strength: 2.5,
            shoulder_point: 0.7,
            ..ChannelResponseParams::default()
        },
        ChannelResponseParams {
            toe_slope: 2.0,
            toe_strength: 0.6,
            toe_point: 0.25,
            linear_slope: 0.9,
            linear_offset: 0.02,
            shoulder_slope: 1.8,
            shoulder_strength: 0.8,
            shoulder_point: 0.75,
            ..ChannelResponseParams::default()
        },
    ];
    for raw in cases {
        let p = raw.sanitized();
        continuity_at(&p, p.toe_point);
        continuity_at(&p, p.shoulder_point);
    }
}

#[test]
fn response_curve_is_monotonic_on_defaults() {
    let p = ChannelResponseParams::default().sanitized();
    let mut prev = evaluate(&p, 0.0);
    for i in 1..=100 {
        let v = evaluate(&p, i as f32 / 100.0);
        assert!(v >= prev - 1e-6, "curve dipped at {i}");
        prev = v;
    }
}

#[test]
fn non_finite_parameters_fall_back_to_neutral() {
    let p = ChannelResponseParams {
        linear_slope: f32::NAN,
        shoulder_strength: f32::INFINITY,
        ..ChannelResponseParams::default()
    }
    .sanitized();
    assert_eq!(p.linear_slope, 1.0);
    assert_eq!(p.shoulder_strength, 1.0);
}

#[test]
fn per_channel_exposure_offset_shifts_one_channel() {
    let mut img = LinearImage::filled(4, 4, 0.2, 0.2, 0.2);
    let mut params = [ChannelResponseParams::default(); 3];
    params[0].exposure_offset = 1.0;
    apply_response_curve(&mut img, &params, 0.0);
    assert!((img.r[0] - 0.4).abs() < 1e-4);
    assert!((img.g[0] - 0.2).abs() < 1e-4);
    assert!((img.b[0] - 0.2).abs() < 1e-4);
}

#[test]
fn response_curve_output_is_bounded() {
    let p = ChannelResponseParams {
        linear_slope: 3.0,
        ..ChannelResponseParams::default()
    }
    .sanitized();
    for i in 0..=20 {
        let v = evaluate(&p, i as f32 / 10.0);
        assert!((0.0..=1.0).contains(&v));
    }
}

// ------------------------------------------------------------------------
// Grain
// ------------------------------------------------------------------------

#[test]
fn grain_samples_are_deterministic() {
    let params = GrainParams {
        enabled: true,
        ..GrainParams::default()
    };
    for (x, y, lum) in [(0u32, 0u32, 0.2f32), (17, 3, 0.5), (255, 255, 0.9)] {
        let a = grain_sample(&params, 1.0, x, y, lum);
        let b = grain_sample(&params, 1.0, x, y, lum);
        assert_eq!(a, b);
    }
}

#[test]
fn grain_streams_decorrelate_by_seed_and_coordinate() {
    assert_ne!(gaussian(1, 5, 5, 0), gaussian(2, 5, 5, 0));
    assert_ne!(gaussian(1, 5, 5, 0), gaussian(1, 6, 5, 0));
    assert_ne!(gaussian(1, 5, 5, 0), gaussian(1, 5, 5, 1));
}

#[test]
fn grain_scales_with_iso() {
    let params = GrainParams {
        enabled: true,
        ..GrainParams::default()
    };
    let mut low = LinearImage::filled(16, 16, 0.5, 0.5, 0.5);
    let mut high = low.clone();
    apply_grain(&mut low, &params, 100);
    apply_grain(&mut high, &params, 1600);

    let dev = |img: &LinearImage| -> f32 {
        img.r.iter().map(|v| (v - 0.5).abs()).sum::<f32>() / img.r.len() as f32
    };
    assert!(dev(&high) > dev(&low) * 2.0);
}

#[test]
fn disabled_grain_leaves_image_untouched() {
    let mut img = gradient_image(8, 8);
    let original = img.clone();
    apply_grain(&mut img, &GrainParams::default(), 3200);
    assert_eq!(img, original);
}

// ------------------------------------------------------------------------
// Tone curves
// ------------------------------------------------------------------------

#[test]
fn identity_tone_curve_is_a_no_op() {
    let mut img = gradient_image(8, 8);
    let original = img.clone();
    apply_tone_curves(&mut img, &ToneCurveParams::default());
    assert_eq!(img, original);
}

#[test]
fn identity_curve_evaluates_to_input_across_domain() {
    let curve = ToneCurve::identity();
    let params = ToneCurveParams {
        red: ToneCurve::from_points({
            let mut pts = *curve.points();
            pts[8] += 1e-7; // still identity within tolerance
            pts
        }),
        ..ToneCurveParams::default()
    };
    let mut img = LinearImage::new(101, 1);
    for i in 0..=100 {
        let v = i as f32 / 100.0;
        img.r[i] = v;
        img.g[i] = v;
        img.b[i] = v;
    }
    let original = img.clone();
    apply_tone_curves(&mut img, &params);
    for i in 0..img.pixel_count() {
        assert!((img.r[i] - original.r[i]).abs() < 1e-4);
    }
}

#[test]
fn curve_construction_forces_monotonicity() {
    let mut pts = [0.0f32; 16];
    for (i, p) in pts.iter_mut().enumerate() {
        *p = i as f32 / 15.0;
    }
    pts[7] = 0.9;
    pts[8] = 0.1; // out of order on purpose
    let curve = ToneCurve::from_points(pts);
    let points = curve.points();
    for w in points.windows(2) {
        assert!(w[1] >= w[0]);
    }
}

#[test]
fn lifted_curve_brightens_midtones() {
    let mut pts = [0.0f32; 16];
    for (i, p) in pts.iter_mut().enumerate() {
        *p = (i as f32 / 15.0).sqrt();
    }
    let params = ToneCurveParams {
        red: ToneCurve::from_points(pts),
        ..ToneCurveParams::default()
    };
    let mut img = LinearImage::filled(2, 2, 0.25, 0.25, 0.25);
    apply_tone_curves(&mut img, &params);
    assert!(img.r[0] > 0.4);
    // Untouched channels keep the identity curve.
    assert!((img.g[0] - 0.25).abs() < 1e-4);
}

// ------------------------------------------------------------------------
// HSL
// ------------------------------------------------------------------------

#[test]
fn hsl_round_trip_preserves_rgb() {
    let cases = [
        (0.8, 0.2, 0.1),
        (0.1, 0.8, 0.2),
        (0.2, 0.1, 0.8),
        (0.5, 0.5, 0.5),
        (0.9, 0.9, 0.1),
        (0.03, 0.5, 0.97),
    ];
    for (r, g, b) in cases {
        let hsl = rgb_to_hsl(r, g, b);
        let (r2, g2, b2) = hsl_to_rgb(hsl);
        assert!((r - r2).abs() < 1e-4, "r: {r} vs {r2}");
        assert!((g - g2).abs() < 1e-4, "g: {g} vs {g2}");
        assert!((b - b2).abs() < 1e-4, "b: {b} vs {b2}");
    }
}

#[test]
fn zero_saturation_has_defined_hue_and_survives() {
    let hsl = rgb_to_hsl(0.42, 0.42, 0.42);
    assert_eq!(hsl.h, 0.0);
    assert_eq!(hsl.s, 0.0);
    let (r, g, b) = hsl_to_rgb(hsl);
    assert!(r.is_finite() && g.is_finite() && b.is_finite());
    assert!((r - 0.42).abs() < 1e-4);
}

#[test]
fn hue_segments_partition_the_circle() {
    assert_eq!(segment_index(0.0), 0);
    assert_eq!(segment_index(44.9), 0);
    assert_eq!(segment_index(45.0), 1);
    assert_eq!(segment_index(359.9), 7);
    assert_eq!(segment_index(-10.0), 7);
    assert_eq!(segment_index(405.0), 1);
}

#[test]
fn hsl_adjusts_only_the_targeted_segment() {
    let mut params = HslParams::default();
    // Darken reds only.
    params.segments[0] = HslAdjustment {
        hue_shift: 0.0,
        saturation: 0.0,
        luminance: -0.2,
    };

    let mut img = LinearImage::new(2, 1);
    // Pixel 0: red; pixel 1: green (segment 2, untouched).
    img.r[0] = 0.8;
    img.g[0] = 0.1;
    img.b[0] = 0.1;
    img.r[1] = 0.1;
    img.g[1] = 0.8;
    img.b[1] = 0.1;
    let before_green = (img.r[1], img.g[1], img.b[1]);

    apply_hsl(&mut img, &params);
    assert!(img.r[0] < 0.8);
    assert!((img.r[1] - before_green.0).abs() < 1e-4);
    assert!((img.g[1] - before_green.1).abs() < 1e-4);
}

// ------------------------------------------------------------------------
// Basic tone
// ------------------------------------------------------------------------

#[test]
fn neutral_basic_tone_is_skipped() {
    let mut img = gradient_image(8, 8);
    let original = img.clone();
    tone::apply_basic_tone(&mut img, &Default::default(), None);
    assert_eq!(img, original);
}

#[test]
fn shadows_lift_dark_regions_more_than_bright() {
    let mut img = LinearImage::new(2, 1);
    img.r[0] = 0.1;
    img.g[0] = 0.1;
    img.b[0] = 0.1;
    img.r[1] = 0.8;
    img.g[1] = 0.8;
    img.b[1] = 0.8;

    let params = crate::image_pipeline::film::params::BasicToneParams {
        shadows: 0.5,
        ..Default::default()
    };
    tone::apply_basic_tone(&mut img, &params, None);
    let dark_gain = img.r[0] / 0.1;
    let bright_gain = img.r[1] / 0.8;
    assert!(dark_gain > bright_gain);
}

#[test]
fn vibrance_boosts_muted_pixels_more_than_saturated() {
    let mut img = LinearImage::new(2, 1);
    // Muted pixel.
    img.r[0] = 0.5;
    img.g[0] = 0.45;
    img.b[0] = 0.45;
    // Already saturated pixel.
    img.r[1] = 0.9;
    img.g[1] = 0.1;
    img.b[1] = 0.1;

    let sat = |r: f32, g: f32, b: f32| {
        let max = r.max(g).max(b);
        (max - r.min(g).min(b)) / max
    };
    let muted_before = sat(img.r[0], img.g[0], img.b[0]);
    let vivid_before = sat(img.r[1], img.g[1], img.b[1]);

    let params = crate::image_pipeline::film::params::BasicToneParams {
        vibrance: 0.6,
        ..Default::default()
    };
    tone::apply_basic_tone(&mut img, &params, None);

    let muted_after = sat(img.r[0], img.g[0], img.b[0]);
    let vivid_after = sat(img.r[1], img.g[1], img.b[1]);
    assert!(muted_after / muted_before > vivid_after / vivid_before);
}

// ------------------------------------------------------------------------
// Engine end-to-end
// ------------------------------------------------------------------------

fn neutral_engine() -> FilmEngine {
    FilmEngine::new(BilateralConfig::builder().gpu_enabled(false).build()).unwrap()
}

#[test]
fn neutral_params_pass_mid_gray_unchanged() {
    let engine = neutral_engine();
    let img = LinearImage::filled(4, 4, 0.18, 0.18, 0.18);
    let out = engine.process(&img, &FilmParams::default(), &test_metadata(100));
    for i in 0..out.pixel_count() {
        assert!((out.r[i] - 0.18).abs() < 1e-4);
        assert!((out.g[i] - 0.18).abs() < 1e-4);
        assert!((out.b[i] - 0.18).abs() < 1e-4);
    }
}

#[test]
fn engine_applies_exposure_through_response_curve() {
    let engine = neutral_engine();
    let img = LinearImage::filled(4, 4, 0.18, 0.18, 0.18);
    let params = FilmParams {
        exposure: 1.0,
        ..FilmParams::default()
    };
    let out = engine.process(&img, &params, &test_metadata(100));
    // One stop up in the linear segment doubles the value.
    assert!((out.r[0] - 0.36).abs() < 1e-3);
}

#[test]
fn engine_runs_clarity_through_bilateral_detail() {
    let engine = neutral_engine();
    let mut img = LinearImage::filled(8, 8, 0.3, 0.3, 0.3);
    // A bright block to give the detail layer an edge to chew on.
    for y in 0..4 {
        for x in 0..4 {
            let idx = y * 8 + x;
            img.r[idx] = 0.7;
            img.g[idx] = 0.7;
            img.b[idx] = 0.7;
        }
    }
    let params = FilmParams {
        tone: crate::image_pipeline::film::params::BasicToneParams {
            clarity: 0.8,
            ..Default::default()
        },
        ..FilmParams::default()
    };
    let out = engine.process(&img, &params, &test_metadata(100));
    assert!(engine.bilateral().stats().total_calls >= 1);
    assert_eq!((out.width, out.height), (8, 8));
}
