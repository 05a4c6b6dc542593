//! Scene-referred linear image buffer shared by every pipeline stage.

use crate::image_pipeline::common::error::{ProcessError, Result};

/// Planar, scene-referred linear RGB image.
///
/// Values are non-negative and unbounded above; stages that need a bounded
/// range clamp explicitly. The three planes always have `width * height`
/// samples each.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearImage {
    pub width: usize,
    pub height: usize,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
}

/// Rec. 709 luma coefficients, used for luminance throughout the pipeline.
pub const LUMA_R: f32 = 0.2126;
pub const LUMA_G: f32 = 0.7152;
pub const LUMA_B: f32 = 0.0722;

impl LinearImage {
    /// Create a zero-filled image.
    pub fn new(width: usize, height: usize) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            r: vec![0.0; n],
            g: vec![0.0; n],
            b: vec![0.0; n],
        }
    }

    /// Build an image from existing planes, validating their lengths.
    pub fn from_planes(
        width: usize,
        height: usize,
        r: Vec<f32>,
        g: Vec<f32>,
        b: Vec<f32>,
    ) -> Result<Self> {
        let n = width * height;
        if width == 0 || height == 0 || r.len() != n || g.len() != n || b.len() != n {
            return Err(ProcessError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            r,
            g,
            b,
        })
    }

    /// Uniform fill, handy for fixtures and neutral test inputs.
    pub fn filled(width: usize, height: usize, r: f32, g: f32, b: f32) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            r: vec![r; n],
            g: vec![g; n],
            b: vec![b; n],
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Approximate heap footprint of the three planes, used by the filter cache.
    pub fn byte_size(&self) -> usize {
        3 * self.pixel_count() * std::mem::size_of::<f32>()
    }

    #[inline]
    pub fn luminance_at(&self, idx: usize) -> f32 {
        LUMA_R * self.r[idx] + LUMA_G * self.g[idx] + LUMA_B * self.b[idx]
    }

    /// Luminance plane of the whole image.
    pub fn luminance_plane(&self) -> Vec<f32> {
        (0..self.pixel_count()).map(|i| self.luminance_at(i)).collect()
    }
}

#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}
