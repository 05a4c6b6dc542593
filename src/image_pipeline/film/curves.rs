//! Parametric tone curves: 16 control values per channel, Catmull-Rom
//! interpolated through a lookup table.

use crate::image_pipeline::common::image::LinearImage;

pub const CURVE_POINTS: usize = 16;
const LUT_SIZE: usize = 1024;

/// A single channel curve. Control values sit at evenly spaced inputs over
/// [0, 1] and are made monotonic non-decreasing at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurve {
    points: [f32; CURVE_POINTS],
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::identity()
    }
}

impl ToneCurve {
    pub fn identity() -> Self {
        let mut points = [0.0f32; CURVE_POINTS];
        for (i, p) in points.iter_mut().enumerate() {
            *p = i as f32 / (CURVE_POINTS - 1) as f32;
        }
        Self { points }
    }

    /// Clamp into [0, 1] and force monotonicity; out-of-order control values
    /// are lifted to the running maximum rather than rejected.
    pub fn from_points(raw: [f32; CURVE_POINTS]) -> Self {
        let mut points = raw;
        let mut running = 0.0f32;
        for p in points.iter_mut() {
            let v = if p.is_finite() { p.clamp(0.0, 1.0) } else { running };
            running = running.max(v);
            *p = running;
        }
        Self { points }
    }

    pub fn points(&self) -> &[f32; CURVE_POINTS] {
        &self.points
    }

    pub fn is_identity(&self) -> bool {
        let id = Self::identity();
        self.points
            .iter()
            .zip(&id.points)
            .all(|(a, b)| (a - b).abs() < 1e-6)
    }

    /// Catmull-Rom evaluation at `x` in [0, 1], clamped to the local segment
    /// so interpolation overshoot cannot break monotonicity.
    fn evaluate_spline(&self, x: f32) -> f32 {
        let fx = x.clamp(0.0, 1.0) * (CURVE_POINTS - 1) as f32;
        let seg = (fx.floor() as usize).min(CURVE_POINTS - 2);
        let t = fx - seg as f32;

        let p1 = self.points[seg];
        let p2 = self.points[seg + 1];
        let p0 = if seg > 0 { self.points[seg - 1] } else { 2.0 * p1 - p2 };
        let p3 = if seg + 2 < CURVE_POINTS {
            self.points[seg + 2]
        } else {
            2.0 * p2 - p1
        };

        let t2 = t * t;
        let t3 = t2 * t;
        let y = 0.5
            * ((2.0 * p1)
                + (-p0 + p2) * t
                + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
                + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3);
        y.clamp(p1.min(p2), p1.max(p2))
    }

    fn build_lut(&self) -> Vec<f32> {
        (0..LUT_SIZE)
            .map(|i| self.evaluate_spline(i as f32 / (LUT_SIZE - 1) as f32))
            .collect()
    }
}

/// Per-channel curves plus the enable switch; disabled or identity curves are
/// exact no-ops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurveParams {
    pub red: ToneCurve,
    pub green: ToneCurve,
    pub blue: ToneCurve,
    pub enabled: bool,
}

impl Default for ToneCurveParams {
    fn default() -> Self {
        Self {
            red: ToneCurve::identity(),
            green: ToneCurve::identity(),
            blue: ToneCurve::identity(),
            enabled: true,
        }
    }
}

#[inline]
fn lut_lookup(lut: &[f32], x: f32) -> f32 {
    let fx = x.clamp(0.0, 1.0) * (lut.len() - 1) as f32;
    let i = (fx.floor() as usize).min(lut.len() - 2);
    let t = fx - i as f32;
    lut[i] * (1.0 - t) + lut[i + 1] * t
}

pub fn apply_tone_curves(image: &mut LinearImage, params: &ToneCurveParams) {
    if !params.enabled {
        return;
    }
    for (plane, curve) in [
        (&mut image.r, &params.red),
        (&mut image.g, &params.green),
        (&mut image.b, &params.blue),
    ] {
        if curve.is_identity() {
            continue;
        }
        let lut = curve.build_lut();
        for v in plane.iter_mut() {
            *v = lut_lookup(&lut, *v);
        }
    }
}
