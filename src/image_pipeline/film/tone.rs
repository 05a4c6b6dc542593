//! Basic tonal shaping on luminance: highlights, shadows, whites, blacks,
//! plus clarity (bilateral detail) and vibrance.

use crate::image_pipeline::common::image::{luminance, LinearImage};
use crate::image_pipeline::film::params::BasicToneParams;

const TOLERANCE: f32 = 1e-4;
const LUM_EPS: f32 = 1e-6;

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Region-weighted luminance remap. Highlights/shadows scale their region
/// multiplicatively; whites/blacks push the extremes additively.
#[inline]
fn shape_luminance(p: &BasicToneParams, l: f32) -> f32 {
    let lc = l.clamp(0.0, 1.0);
    let highlight_w = smoothstep(0.5, 1.0, lc);
    let shadow_w = 1.0 - smoothstep(0.0, 0.5, lc);
    let white_w = smoothstep(0.7, 1.0, lc);
    let black_w = 1.0 - smoothstep(0.0, 0.3, lc);

    let mut out = l;
    out += l * p.highlights * 0.5 * highlight_w;
    out += l * p.shadows * 0.5 * shadow_w;
    out += p.whites * 0.25 * white_w;
    out += p.blacks * 0.25 * black_w;
    out.max(0.0)
}

pub fn is_neutral(p: &BasicToneParams) -> bool {
    p.highlights.abs() < TOLERANCE
        && p.shadows.abs() < TOLERANCE
        && p.whites.abs() < TOLERANCE
        && p.blacks.abs() < TOLERANCE
        && p.clarity.abs() < TOLERANCE
        && p.vibrance.abs() < TOLERANCE
}

/// Apply basic tone in place. `detail` is the bilateral detail layer
/// (input minus filtered base) backing the clarity control; pass `None` when
/// clarity is zero and no filtering was run.
pub fn apply_basic_tone(
    image: &mut LinearImage,
    params: &BasicToneParams,
    detail: Option<&LinearImage>,
) {
    if is_neutral(params) {
        return;
    }

    for i in 0..image.pixel_count() {
        let (mut r, mut g, mut b) = (image.r[i], image.g[i], image.b[i]);
        let l = luminance(r, g, b);

        // Luminance reshaping, re-applied as a ratio to preserve hue.
        let shaped = shape_luminance(params, l);
        if l > LUM_EPS {
            let ratio = shaped / l;
            r *= ratio;
            g *= ratio;
            b *= ratio;
        } else {
            let lift = shaped - l;
            r += lift;
            g += lift;
            b += lift;
        }

        // Clarity: add back edge-local detail, scaled.
        if params.clarity.abs() >= TOLERANCE {
            if let Some(d) = detail {
                r += d.r[i] * params.clarity;
                g += d.g[i] * params.clarity;
                b += d.b[i] * params.clarity;
            }
        }

        // Vibrance: saturation boost weighted toward muted pixels.
        if params.vibrance.abs() >= TOLERANCE {
            let max = r.max(g).max(b);
            if max > LUM_EPS {
                let sat = (max - r.min(g).min(b)) / max;
                let boost = 1.0 + params.vibrance * (1.0 - sat);
                let l2 = luminance(r, g, b);
                r = l2 + (r - l2) * boost;
                g = l2 + (g - l2) * boost;
                b = l2 + (b - l2) * boost;
            }
        }

        image.r[i] = r.max(0.0);
        image.g[i] = g.max(0.0);
        image.b[i] = b.max(0.0);
    }
}
