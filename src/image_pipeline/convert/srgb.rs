//! sRGB transfer function and tone mapping.

/// Piecewise sRGB encode: linear segment below the threshold, power law above.
#[inline]
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Inverse transfer, used by tests and anyone importing display-referred
/// bitmaps back into the linear pipeline.
#[inline]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Reinhard tone curve: maps [0, inf) into [0, 1), preserving shadows.
#[inline]
pub fn reinhard(v: f32) -> f32 {
    let v = v.max(0.0);
    v / (1.0 + v)
}
