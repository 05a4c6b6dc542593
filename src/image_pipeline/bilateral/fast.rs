//! Downsample/upsample bilateral approximation.
//!
//! Large spatial sigmas are visually forgiving: box-reduce the image, run the
//! standard filter at a proportionally reduced sigma, bilinearly upsample.
//! Buys a 2-4x speedup at large radii.

use crate::image_pipeline::bilateral::standard::bilateral_standard;
use crate::image_pipeline::common::image::LinearImage;

/// Downsample factor from the spatial sigma, capped to {2, 4}.
#[inline]
pub fn downsample_factor(spatial_sigma: f32, fast_sigma_threshold: f32) -> usize {
    if spatial_sigma >= 2.0 * fast_sigma_threshold {
        4
    } else {
        2
    }
}

fn box_downsample(image: &LinearImage, factor: usize) -> LinearImage {
    let width = (image.width / factor).max(1);
    let height = (image.height / factor).max(1);
    let mut out = LinearImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 3];
            let mut count = 0u32;
            for sy in y * factor..((y + 1) * factor).min(image.height) {
                for sx in x * factor..((x + 1) * factor).min(image.width) {
                    let idx = sy * image.width + sx;
                    sum[0] += image.r[idx];
                    sum[1] += image.g[idx];
                    sum[2] += image.b[idx];
                    count += 1;
                }
            }
            let n = count.max(1) as f32;
            let idx = y * width + x;
            out.r[idx] = sum[0] / n;
            out.g[idx] = sum[1] / n;
            out.b[idx] = sum[2] / n;
        }
    }
    out
}

fn bilinear_upsample(image: &LinearImage, width: usize, height: usize) -> LinearImage {
    let mut out = LinearImage::new(width, height);
    let sx = image.width as f32 / width as f32;
    let sy = image.height as f32 / height as f32;

    for y in 0..height {
        for x in 0..width {
            let fx = ((x as f32 + 0.5) * sx - 0.5).max(0.0);
            let fy = ((y as f32 + 0.5) * sy - 0.5).max(0.0);
            let x0 = (fx.floor() as usize).min(image.width - 1);
            let y0 = (fy.floor() as usize).min(image.height - 1);
            let x1 = (x0 + 1).min(image.width - 1);
            let y1 = (y0 + 1).min(image.height - 1);
            let tx = fx - x0 as f32;
            let ty = fy - y0 as f32;

            let idx = y * width + x;
            for (out_plane, in_plane) in [
                (&mut out.r, &image.r),
                (&mut out.g, &image.g),
                (&mut out.b, &image.b),
            ] {
                let v00 = in_plane[y0 * image.width + x0];
                let v10 = in_plane[y0 * image.width + x1];
                let v01 = in_plane[y1 * image.width + x0];
                let v11 = in_plane[y1 * image.width + x1];
                out_plane[idx] = v00 * (1.0 - tx) * (1.0 - ty)
                    + v10 * tx * (1.0 - ty)
                    + v01 * (1.0 - tx) * ty
                    + v11 * tx * ty;
            }
        }
    }
    out
}

pub fn bilateral_fast(
    image: &LinearImage,
    spatial_sigma: f32,
    range_sigma: f32,
    fast_sigma_threshold: f32,
    pool: &rayon::ThreadPool,
) -> LinearImage {
    let factor = downsample_factor(spatial_sigma, fast_sigma_threshold);
    let reduced = box_downsample(image, factor);
    let filtered = bilateral_standard(
        &reduced,
        spatial_sigma / factor as f32,
        range_sigma,
        pool,
    );
    bilinear_upsample(&filtered, image.width, image.height)
}
