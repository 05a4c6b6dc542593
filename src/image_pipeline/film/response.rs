//! Per-channel film response curve: toe, linear segment, shoulder.
//!
//! The segments are parameterized to meet with value and slope continuity at
//! both boundaries. The toe is a cubic Hermite over [0, toe_point] whose
//! endpoint slopes are `toe_slope` and `linear_slope`; `toe_strength` blends
//! it against the plain linear extension (both agree at the boundary, so the
//! blend cannot break continuity). The shoulder amplitude is derived from the
//! linear slope so its derivative at `shoulder_point` matches exactly.

use crate::image_pipeline::common::image::LinearImage;
use crate::image_pipeline::film::params::ChannelResponseParams;

#[inline]
fn linear_segment(p: &ChannelResponseParams, x: f32) -> f32 {
    p.linear_slope * x + p.linear_offset
}

#[inline]
fn toe_segment(p: &ChannelResponseParams, x: f32) -> f32 {
    let tp = p.toe_point;
    if tp <= f32::EPSILON {
        return linear_segment(p, x);
    }
    // Cubic Hermite: h(0) = 0, h'(0) = toe_slope, h(tp) = linear(tp),
    // h'(tp) = linear_slope.
    let t = x / tp;
    let t2 = t * t;
    let t3 = t2 * t;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    let hermite =
        h10 * tp * p.toe_slope + h01 * linear_segment(p, tp) + h11 * tp * p.linear_slope;
    let linear = linear_segment(p, x);
    linear + (hermite - linear) * p.toe_strength
}

#[inline]
fn shoulder_segment(p: &ChannelResponseParams, x: f32) -> f32 {
    let sp = p.shoulder_point;
    let span = (1.0 - sp).max(1e-6);
    let start = linear_segment(p, sp);
    let ratio = p.shoulder_slope * (x - sp) / span;
    // Amplitude such that d/dx at sp equals linear_slope.
    let amplitude = p.linear_slope * span / (p.shoulder_strength * p.shoulder_slope);
    start + amplitude * (1.0 - (-ratio * p.shoulder_strength).exp())
}

/// Evaluate the sanitized curve at `x` (post-exposure input intensity).
#[inline]
pub fn evaluate(p: &ChannelResponseParams, x: f32) -> f32 {
    let y = if x < p.toe_point {
        toe_segment(p, x)
    } else if x < p.shoulder_point {
        linear_segment(p, x)
    } else {
        shoulder_segment(p, x)
    };
    y.clamp(0.0, 1.0)
}

/// Apply the response curves in place. `exposure` is the film-wide EV offset;
/// each channel adds its own `exposure_offset` on top.
pub fn apply_response_curve(
    image: &mut LinearImage,
    params: &[ChannelResponseParams; 3],
    exposure: f32,
) {
    let sanitized: [ChannelResponseParams; 3] = [
        params[0].sanitized(),
        params[1].sanitized(),
        params[2].sanitized(),
    ];
    for (plane, p) in [&mut image.r, &mut image.g, &mut image.b]
        .into_iter()
        .zip(&sanitized)
    {
        let gain = (exposure + p.exposure_offset).exp2();
        for v in plane.iter_mut() {
            *v = evaluate(p, *v * gain);
        }
    }
}
