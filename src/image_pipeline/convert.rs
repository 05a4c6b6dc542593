//! Display conversion module
//!
//! The single place where linear light becomes display-referred: optional
//! tone mapping, piecewise sRGB encoding, 8-bit quantization.

pub mod srgb;
pub mod types;

pub use srgb::{linear_to_srgb, reinhard, srgb_to_linear};
pub use types::DisplayImage;

use crate::image_pipeline::common::image::LinearImage;

/// Converter settings for one output target.
#[derive(Debug, Clone, Copy)]
pub struct ImageConverter {
    /// Compress dynamic range before encoding; without it, values above 1
    /// simply clip.
    pub tone_map: bool,
    pub include_alpha: bool,
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self {
            tone_map: false,
            include_alpha: false,
        }
    }
}

impl ImageConverter {
    pub fn new(tone_map: bool, include_alpha: bool) -> Self {
        Self {
            tone_map,
            include_alpha,
        }
    }

    /// Gamma-encode and quantize a linear image.
    pub fn convert(&self, image: &LinearImage) -> DisplayImage {
        let channels: usize = if self.include_alpha { 4 } else { 3 };
        let n = image.pixel_count();
        let mut data = vec![0u8; n * channels];

        for i in 0..n {
            let mut px = [image.r[i], image.g[i], image.b[i]];
            for v in px.iter_mut() {
                let linear = if self.tone_map { reinhard(*v) } else { *v };
                *v = linear_to_srgb(linear.clamp(0.0, 1.0));
            }
            let base = i * channels;
            data[base] = quantize(px[0]);
            data[base + 1] = quantize(px[1]);
            data[base + 2] = quantize(px[2]);
            if channels == 4 {
                data[base + 3] = u8::MAX;
            }
        }

        DisplayImage {
            width: image.width,
            height: image.height,
            channels: channels as u8,
            data,
        }
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}
