//! Silver-halide grain synthesis.
//!
//! Grain is exposure-coupled: its standard deviation follows sqrt(luminance)
//! (Poisson statistics, variance proportional to mean) with a midtone window,
//! unlike the additive read noise of a digital sensor. The generator is a
//! coordinate-keyed hash so repeated runs and row-parallel execution produce
//! bit-identical output for a fixed seed.

use crate::image_pipeline::common::image::{luminance, LinearImage};
use crate::image_pipeline::film::params::GrainParams;

/// splitmix64 finalizer over the seed and pixel coordinates.
#[inline]
fn hash2d(seed: u64, x: u32, y: u32, stream: u64) -> u64 {
    let mut z = seed
        ^ (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ stream.wrapping_mul(0x94D0_49BB_1331_11EB);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
fn uniform(h: u64) -> f32 {
    // Top 24 bits into (0, 1].
    (((h >> 40) as f32) + 1.0) / 16_777_216.0
}

/// Standard normal deviate via Box-Muller from two hashed uniforms.
#[inline]
pub fn gaussian(seed: u64, x: u32, y: u32, stream: u64) -> f32 {
    let u1 = uniform(hash2d(seed, x, y, stream * 2 + 1)).max(1e-10);
    let u2 = uniform(hash2d(seed, x, y, stream * 2 + 2));
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Grain deviate at a pixel, bilinearly sampled from a coarse cell grid when
/// the grain size exceeds one pixel.
fn sized_gaussian(seed: u64, x: u32, y: u32, stream: u64, size: f32) -> f32 {
    if size <= 1.0 {
        return gaussian(seed, x, y, stream);
    }
    let fx = x as f32 / size;
    let fy = y as f32 / size;
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;
    let g00 = gaussian(seed, x0, y0, stream);
    let g10 = gaussian(seed, x0 + 1, y0, stream);
    let g01 = gaussian(seed, x0, y0 + 1, stream);
    let g11 = gaussian(seed, x0 + 1, y0 + 1, stream);
    g00 * (1.0 - tx) * (1.0 - ty) + g10 * tx * (1.0 - ty) + g01 * (1.0 - tx) * ty + g11 * tx * ty
}

/// Noise amplitude for a pixel of luminance `lum`.
///
/// sqrt(lum) approximates Poisson statistics; the 4L(1-L) window pushes grain
/// toward the midtones where prints actually show it.
#[inline]
pub fn grain_sigma(params: &GrainParams, iso_scale: f32, lum: f32) -> f32 {
    let l = lum.clamp(0.0, 1.0);
    let window = 0.25 + 0.75 * (4.0 * l * (1.0 - l));
    params.base_density * params.iso_multiplier * iso_scale * lum.max(0.0).sqrt() * window
}

/// One deterministic grain sample; exposed for the determinism tests.
pub fn grain_sample(params: &GrainParams, iso_scale: f32, x: u32, y: u32, lum: f32) -> f32 {
    grain_sigma(params, iso_scale, lum) * sized_gaussian(params.seed, x, y, 0, params.size_variation)
}

/// Apply grain in place. `sensor_iso` couples film speed to grain intensity.
pub fn apply_grain(image: &mut LinearImage, params: &GrainParams, sensor_iso: u32) {
    if !params.enabled || params.base_density.abs() < 1e-6 {
        return;
    }
    let iso_scale = (sensor_iso.max(1) as f32 / 100.0).sqrt();
    let coupling = params.color_coupling.clamp(0.0, 1.0);
    let size = params.size_variation.max(1.0);

    let width = image.width as u32;
    for y in 0..image.height as u32 {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let lum = luminance(image.r[idx], image.g[idx], image.b[idx]);
            let sigma = grain_sigma(params, iso_scale, lum);
            if sigma <= 0.0 {
                continue;
            }
            let shared = sized_gaussian(params.seed, x, y, 0, size);
            for (channel, plane) in
                [&mut image.r, &mut image.g, &mut image.b].into_iter().enumerate()
            {
                let own = sized_gaussian(params.seed, x, y, 1 + channel as u64, size);
                let noise = shared * coupling + own * (1.0 - coupling);
                plane[idx] = (plane[idx] + noise * sigma).max(0.0);
            }
        }
    }
}
