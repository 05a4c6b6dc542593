//! Film emulation parameter structs.
//!
//! The caller owns these wholesale and hands them in per render; the engine
//! never mutates them. Defaults are the neutral preset: every stage a no-op.

/// Three-segment response curve parameters for one emulsion layer.
///
/// The curve is toe (quadratic-to-cubic rise) below `toe_point`, linear to
/// `shoulder_point`, then exponential-saturation compression above it.
/// `toe_point <= shoulder_point` must hold for the curve to be well defined;
/// [`sanitized`](Self::sanitized) enforces it along with finiteness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelResponseParams {
    pub toe_slope: f32,
    pub toe_strength: f32,
    pub toe_point: f32,
    pub linear_slope: f32,
    pub linear_offset: f32,
    pub shoulder_slope: f32,
    pub shoulder_strength: f32,
    pub shoulder_point: f32,
    pub exposure_offset: f32,
}

impl Default for ChannelResponseParams {
    fn default() -> Self {
        Self {
            toe_slope: 1.0,
            toe_strength: 0.0,
            toe_point: 0.1,
            linear_slope: 1.0,
            linear_offset: 0.0,
            shoulder_slope: 1.0,
            shoulder_strength: 1.0,
            shoulder_point: 0.8,
            exposure_offset: 0.0,
        }
    }
}

impl ChannelResponseParams {
    /// Replace non-finite fields with neutral values and order the segment
    /// boundaries. Numeric guards never abort a render.
    pub fn sanitized(&self) -> Self {
        let neutral = Self::default();
        let pick = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        let mut p = Self {
            toe_slope: pick(self.toe_slope, neutral.toe_slope),
            toe_strength: pick(self.toe_strength, neutral.toe_strength).clamp(0.0, 1.0),
            toe_point: pick(self.toe_point, neutral.toe_point).clamp(0.0, 1.0),
            linear_slope: pick(self.linear_slope, neutral.linear_slope),
            linear_offset: pick(self.linear_offset, neutral.linear_offset),
            shoulder_slope: pick(self.shoulder_slope, neutral.shoulder_slope).max(1e-3),
            shoulder_strength: pick(self.shoulder_strength, neutral.shoulder_strength).max(1e-3),
            shoulder_point: pick(self.shoulder_point, neutral.shoulder_point).clamp(0.0, 1.0),
            exposure_offset: pick(self.exposure_offset, neutral.exposure_offset),
        };
        if p.shoulder_point < p.toe_point {
            p.shoulder_point = p.toe_point;
        }
        p
    }
}

/// Row-major 3x3 spectral crosstalk between emulsion layers: output = m * input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrosstalkMatrix(pub [[f32; 3]; 3]);

impl Default for CrosstalkMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CrosstalkMatrix {
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn apply(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let m = &self.0;
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        )
    }
}

/// Exposure-coupled stochastic grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainParams {
    pub base_density: f32,
    pub iso_multiplier: f32,
    /// Grain cell size in pixels; values above 1 sample a coarse noise plane.
    pub size_variation: f32,
    /// 1.0 = channels share one grain field, 0.0 = fully independent.
    pub color_coupling: f32,
    pub seed: u64,
    pub enabled: bool,
}

impl Default for GrainParams {
    fn default() -> Self {
        Self {
            base_density: 0.04,
            iso_multiplier: 1.0,
            size_variation: 1.0,
            color_coupling: 0.7,
            seed: 0x5eed_f11e,
            enabled: false,
        }
    }
}

/// Global tonal shaping applied on luminance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BasicToneParams {
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub clarity: f32,
    pub vibrance: f32,
}

/// Per-segment HSL deltas; hue shift in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HslAdjustment {
    pub hue_shift: f32,
    pub saturation: f32,
    pub luminance: f32,
}

/// Eight 45-degree hue segments, red first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HslParams {
    pub segments: [HslAdjustment; 8],
}

impl HslParams {
    pub fn is_neutral(&self) -> bool {
        self.segments.iter().all(|s| {
            s.hue_shift.abs() < 1e-6 && s.saturation.abs() < 1e-6 && s.luminance.abs() < 1e-6
        })
    }
}

/// Everything the film engine needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmParams {
    pub exposure: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub crosstalk: CrosstalkMatrix,
    pub response: [ChannelResponseParams; 3],
    pub grain: GrainParams,
    pub tone: BasicToneParams,
    pub curves: super::curves::ToneCurveParams,
    pub hsl: HslParams,
}

impl Default for FilmParams {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            crosstalk: CrosstalkMatrix::IDENTITY,
            response: [ChannelResponseParams::default(); 3],
            grain: GrainParams::default(),
            tone: BasicToneParams::default(),
            curves: super::curves::ToneCurveParams::default(),
            hsl: HslParams::default(),
        }
    }
}
