//! 4-wide vectorized adjustment path.
//!
//! SSE2 over the planar channel rows, detected at runtime; anything the
//! vector can't cover (remainder lanes, non-x86 targets) routes through the
//! scalar reference, which both paths must match up to rounding.

use super::scalar;
use super::types::PreparedAdjust;

pub const LANES: usize = 4;

/// Whether the vectorized path can run on this machine.
pub fn available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Dispatch one row to the vector kernel when possible, scalar otherwise.
pub fn apply_row(r: &mut [f32], g: &mut [f32], b: &mut [f32], y: usize, p: &PreparedAdjust) {
    #[cfg(target_arch = "x86_64")]
    {
        if available() {
            unsafe { apply_row_sse2(r, g, b, y, p) };
            return;
        }
    }
    scalar::apply_row(r, g, b, y, p);
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn apply_row_sse2(r: &mut [f32], g: &mut [f32], b: &mut [f32], y: usize, p: &PreparedAdjust) {
    use std::arch::x86_64::*;

    use crate::image_pipeline::common::image::{LUMA_B, LUMA_G, LUMA_R};

    use super::types::CONTRAST_PIVOT;

    let len = r.len();
    let chunks = len / LANES;

    unsafe {
        let gain = _mm_set1_ps(p.exposure_gain);
        let pivot = _mm_set1_ps(CONTRAST_PIVOT);
        let contrast = _mm_set1_ps(p.contrast);
        let sat = _mm_set1_ps(p.saturation);
        let lr = _mm_set1_ps(LUMA_R);
        let lg = _mm_set1_ps(LUMA_G);
        let lb = _mm_set1_ps(LUMA_B);
        let wr = _mm_set1_ps(p.wb_gains[0]);
        let wg = _mm_set1_ps(p.wb_gains[1]);
        let wb = _mm_set1_ps(p.wb_gains[2]);
        let zero = _mm_setzero_ps();
        let lane_offsets = _mm_set_ps(3.0, 2.0, 1.0, 0.0);
        let cx = _mm_set1_ps(p.center_x);
        let dy = y as f32 - p.center_y;
        let dy2 = _mm_set1_ps(dy * dy);
        let inv_r2 = _mm_set1_ps(p.inv_radius_sq);
        let vignette = _mm_set1_ps(p.vignette);
        let one = _mm_set1_ps(1.0);

        for chunk in 0..chunks {
            let base = chunk * LANES;
            let mut rv = _mm_loadu_ps(r.as_ptr().add(base));
            let mut gv = _mm_loadu_ps(g.as_ptr().add(base));
            let mut bv = _mm_loadu_ps(b.as_ptr().add(base));

            if p.apply_exposure {
                rv = _mm_mul_ps(rv, gain);
                gv = _mm_mul_ps(gv, gain);
                bv = _mm_mul_ps(bv, gain);
            }
            if p.apply_contrast {
                rv = _mm_add_ps(_mm_mul_ps(_mm_sub_ps(rv, pivot), contrast), pivot);
                gv = _mm_add_ps(_mm_mul_ps(_mm_sub_ps(gv, pivot), contrast), pivot);
                bv = _mm_add_ps(_mm_mul_ps(_mm_sub_ps(bv, pivot), contrast), pivot);
            }
            if p.apply_saturation {
                let lum = _mm_add_ps(
                    _mm_add_ps(_mm_mul_ps(lr, rv), _mm_mul_ps(lg, gv)),
                    _mm_mul_ps(lb, bv),
                );
                rv = _mm_add_ps(lum, _mm_mul_ps(_mm_sub_ps(rv, lum), sat));
                gv = _mm_add_ps(lum, _mm_mul_ps(_mm_sub_ps(gv, lum), sat));
                bv = _mm_add_ps(lum, _mm_mul_ps(_mm_sub_ps(bv, lum), sat));
            }
            if p.apply_wb {
                rv = _mm_mul_ps(rv, wr);
                gv = _mm_mul_ps(gv, wg);
                bv = _mm_mul_ps(bv, wb);
            }
            if p.apply_vignette {
                let xv = _mm_add_ps(_mm_set1_ps(base as f32), lane_offsets);
                let dx = _mm_sub_ps(xv, cx);
                let d2 = _mm_mul_ps(_mm_add_ps(_mm_mul_ps(dx, dx), dy2), inv_r2);
                let f = _mm_max_ps(_mm_sub_ps(one, _mm_mul_ps(vignette, d2)), zero);
                rv = _mm_mul_ps(rv, f);
                gv = _mm_mul_ps(gv, f);
                bv = _mm_mul_ps(bv, f);
            }

            if p.apply_grain {
                // Grain is hash-driven; finish these lanes scalar so the
                // noise stream matches the reference path exactly.
                let mut tmp_r = [0.0f32; LANES];
                let mut tmp_g = [0.0f32; LANES];
                let mut tmp_b = [0.0f32; LANES];
                _mm_storeu_ps(tmp_r.as_mut_ptr(), rv);
                _mm_storeu_ps(tmp_g.as_mut_ptr(), gv);
                _mm_storeu_ps(tmp_b.as_mut_ptr(), bv);
                for lane in 0..LANES {
                    let x = (base + lane) as u32;
                    let lum = LUMA_R * tmp_r[lane] + LUMA_G * tmp_g[lane] + LUMA_B * tmp_b[lane];
                    let n = scalar::grain_term(p, x, y as u32, lum);
                    r[base + lane] = (tmp_r[lane] + n).max(0.0);
                    g[base + lane] = (tmp_g[lane] + n).max(0.0);
                    b[base + lane] = (tmp_b[lane] + n).max(0.0);
                }
            } else {
                rv = _mm_max_ps(rv, zero);
                gv = _mm_max_ps(gv, zero);
                bv = _mm_max_ps(bv, zero);
                _mm_storeu_ps(r.as_mut_ptr().add(base), rv);
                _mm_storeu_ps(g.as_mut_ptr().add(base), gv);
                _mm_storeu_ps(b.as_mut_ptr().add(base), bv);
            }
        }
    }

    // Pixels past the last full vector go through the scalar reference.
    let tail = chunks * LANES;
    if tail < len {
        scalar::apply_span(
            &mut r[tail..],
            &mut g[tail..],
            &mut b[tail..],
            y,
            tail,
            p,
        );
    }
}
