//! Scalar reference implementation of the adjustment chain.
//!
//! This is the ground truth the vectorized path must reproduce; keep the
//! operation order and arithmetic in sync with `simd.rs`.

use crate::image_pipeline::common::image::{LUMA_B, LUMA_G, LUMA_R};
use crate::image_pipeline::film::grain::gaussian;

use super::types::{PreparedAdjust, CONTRAST_PIVOT};

/// Grain term shared by both paths: monochrome, luminance-windowed.
#[inline]
pub fn grain_term(p: &PreparedAdjust, x: u32, y: u32, lum: f32) -> f32 {
    let l = lum.clamp(0.0, 1.0);
    let window = 4.0 * l * (1.0 - l);
    gaussian(p.grain_seed, x, y, 0) * p.grain * 0.1 * (0.25 + 0.75 * window)
}

#[inline]
pub fn vignette_factor(p: &PreparedAdjust, x: f32, y: f32) -> f32 {
    let dx = x - p.center_x;
    let dy = y - p.center_y;
    let d2 = (dx * dx + dy * dy) * p.inv_radius_sq;
    (1.0 - p.vignette * d2).max(0.0)
}

/// Apply the full chain to one row. Output is floor-clamped at zero only;
/// highlights stay unbounded for later stages.
pub fn apply_row(r: &mut [f32], g: &mut [f32], b: &mut [f32], y: usize, p: &PreparedAdjust) {
    apply_span(r, g, b, y, 0, p);
}

/// Row fragment starting at absolute column `x0`; the vectorized path uses
/// this for remainder lanes so vignette and grain see true coordinates.
pub fn apply_span(
    r: &mut [f32],
    g: &mut [f32],
    b: &mut [f32],
    y: usize,
    x0: usize,
    p: &PreparedAdjust,
) {
    for i in 0..r.len() {
        let x = x0 + i;
        let (mut rv, mut gv, mut bv) = (r[i], g[i], b[i]);

        if p.apply_exposure {
            rv *= p.exposure_gain;
            gv *= p.exposure_gain;
            bv *= p.exposure_gain;
        }
        if p.apply_contrast {
            rv = (rv - CONTRAST_PIVOT) * p.contrast + CONTRAST_PIVOT;
            gv = (gv - CONTRAST_PIVOT) * p.contrast + CONTRAST_PIVOT;
            bv = (bv - CONTRAST_PIVOT) * p.contrast + CONTRAST_PIVOT;
        }
        if p.apply_saturation {
            let lum = LUMA_R * rv + LUMA_G * gv + LUMA_B * bv;
            rv = lum + (rv - lum) * p.saturation;
            gv = lum + (gv - lum) * p.saturation;
            bv = lum + (bv - lum) * p.saturation;
        }
        if p.apply_wb {
            rv *= p.wb_gains[0];
            gv *= p.wb_gains[1];
            bv *= p.wb_gains[2];
        }
        if p.apply_vignette {
            let f = vignette_factor(p, x as f32, y as f32);
            rv *= f;
            gv *= f;
            bv *= f;
        }
        if p.apply_grain {
            let lum = LUMA_R * rv + LUMA_G * gv + LUMA_B * bv;
            let n = grain_term(p, x as u32, y as u32, lum);
            rv += n;
            gv += n;
            bv += n;
        }

        r[i] = rv.max(0.0);
        g[i] = gv.max(0.0);
        b[i] = bv.max(0.0);
    }
}
