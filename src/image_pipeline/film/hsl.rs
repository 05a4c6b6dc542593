//! HSL conversion and segmented hue/saturation/luminance grading.

use crate::image_pipeline::common::image::LinearImage;
use crate::image_pipeline::film::params::HslParams;

/// HSL triple: hue in degrees [0, 360), saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

const CHROMA_EPS: f32 = 1e-6;

/// RGB in [0, 1] to HSL. Near-zero chroma has no defined hue; it falls back
/// to hue 0 instead of dividing by zero.
#[inline]
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> Hsl {
    let r = r.clamp(0.0, 1.0);
    let g = g.clamp(0.0, 1.0);
    let b = b.clamp(0.0, 1.0);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta < CHROMA_EPS {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let h = if (max - r).abs() < CHROMA_EPS {
        let mut h = (g - b) / delta;
        if g < b {
            h += 6.0;
        }
        h * 60.0
    } else if (max - g).abs() < CHROMA_EPS {
        ((b - r) / delta + 2.0) * 60.0
    } else {
        ((r - g) / delta + 4.0) * 60.0
    };

    Hsl { h: h % 360.0, s, l }
}

#[inline]
fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
pub fn hsl_to_rgb(hsl: Hsl) -> (f32, f32, f32) {
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    if s < CHROMA_EPS {
        return (l, l, l);
    }

    let mut h = hsl.h % 360.0;
    if h < 0.0 {
        h += 360.0;
    }
    let h_norm = h / 360.0;

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h_norm + 1.0 / 3.0),
        hue_to_rgb(p, q, h_norm),
        hue_to_rgb(p, q, h_norm - 1.0 / 3.0),
    )
}

/// Index of the 45-degree hue segment a hue falls into.
#[inline]
pub fn segment_index(hue: f32) -> usize {
    let mut h = hue % 360.0;
    if h < 0.0 {
        h += 360.0;
    }
    ((h / 45.0) as usize).min(7)
}

/// Apply segmented HSL deltas in place. Saturation and luminance are clamped
/// back to [0, 1]; this stage is display-oriented grading, not scene light.
pub fn apply_hsl(image: &mut LinearImage, params: &HslParams) {
    if params.is_neutral() {
        return;
    }
    for i in 0..image.pixel_count() {
        let hsl = rgb_to_hsl(image.r[i], image.g[i], image.b[i]);
        let adj = &params.segments[segment_index(hsl.h)];
        let graded = Hsl {
            h: hsl.h + adj.hue_shift,
            s: (hsl.s + adj.saturation).clamp(0.0, 1.0),
            l: (hsl.l + adj.luminance).clamp(0.0, 1.0),
        };
        let (r, g, b) = hsl_to_rgb(graded);
        image.r[i] = r;
        image.g[i] = g;
        image.b[i] = b;
    }
}
