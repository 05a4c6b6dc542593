//! Film emulation module
//!
//! Color crosstalk, nonlinear per-channel response, grain synthesis, tonal
//! shaping, parametric curves and segmented HSL grading, all in linear light.

pub mod crosstalk;
pub mod curves;
pub mod engine;
pub mod grain;
pub mod hsl;
pub mod params;
pub mod response;
pub mod tone;

#[cfg(test)]
mod tests;

pub use crosstalk::apply_crosstalk;
pub use curves::{apply_tone_curves, ToneCurve, ToneCurveParams};
pub use engine::FilmEngine;
pub use grain::apply_grain;
pub use hsl::{apply_hsl, hsl_to_rgb, rgb_to_hsl, Hsl};
pub use params::{
    BasicToneParams, ChannelResponseParams, CrosstalkMatrix, FilmParams, GrainParams,
    HslAdjustment, HslParams,
};
pub use response::apply_response_curve;
pub use tone::apply_basic_tone;
