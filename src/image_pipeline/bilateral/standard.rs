//! Standard windowed bilateral filter.

use rayon::prelude::*;

use crate::image_pipeline::common::image::LinearImage;

/// Window radius for a spatial sigma; beyond 3 sigma the gaussian weight is
/// negligible.
#[inline]
pub fn window_radius(spatial_sigma: f32) -> usize {
    (3.0 * spatial_sigma).ceil().max(1.0) as usize
}

/// Edge-preserving smoothing: each output pixel is the neighborhood average
/// weighted by spatial distance and luminance similarity. The range weight is
/// computed once per neighbor from the luminance plane and reused for all
/// three channels. Rows are partitioned across the supplied worker pool.
pub fn bilateral_standard(
    image: &LinearImage,
    spatial_sigma: f32,
    range_sigma: f32,
    pool: &rayon::ThreadPool,
) -> LinearImage {
    let (width, height) = (image.width, image.height);
    let radius = window_radius(spatial_sigma);
    let inv_spatial = -0.5 / (spatial_sigma * spatial_sigma).max(1e-12);
    let inv_range = -0.5 / (range_sigma * range_sigma).max(1e-12);

    // Spatial weights depend only on the offset; precompute the window.
    let side = 2 * radius + 1;
    let mut spatial = vec![0.0f32; side * side];
    for dy in 0..side {
        for dx in 0..side {
            let fy = dy as f32 - radius as f32;
            let fx = dx as f32 - radius as f32;
            spatial[dy * side + dx] = ((fy * fy + fx * fx) * inv_spatial).exp();
        }
    }

    let lum = image.luminance_plane();
    let mut out = LinearImage::new(width, height);

    pool.install(|| {
        let rows: Vec<(&mut [f32], &mut [f32], &mut [f32])> = out
            .r
            .chunks_mut(width)
            .zip(out.g.chunks_mut(width))
            .zip(out.b.chunks_mut(width))
            .map(|((r, g), b)| (r, g, b))
            .collect();

        rows.into_par_iter().enumerate().for_each(|(y, (rr, gr, br))| {
            for x in 0..width {
                let center = lum[y * width + x];
                let mut sum = [0.0f32; 3];
                let mut weight_sum = 0.0f32;

                let y0 = y.saturating_sub(radius);
                let y1 = (y + radius).min(height - 1);
                let x0 = x.saturating_sub(radius);
                let x1 = (x + radius).min(width - 1);

                for ny in y0..=y1 {
                    let sy = ny + radius - y;
                    for nx in x0..=x1 {
                        let sx = nx + radius - x;
                        let idx = ny * width + nx;
                        let diff = lum[idx] - center;
                        let w = spatial[sy * side + sx] * (diff * diff * inv_range).exp();
                        sum[0] += image.r[idx] * w;
                        sum[1] += image.g[idx] * w;
                        sum[2] += image.b[idx] * w;
                        weight_sum += w;
                    }
                }

                if weight_sum > 1e-12 {
                    rr[x] = sum[0] / weight_sum;
                    gr[x] = sum[1] / weight_sum;
                    br[x] = sum[2] / weight_sum;
                } else {
                    let idx = y * width + x;
                    rr[x] = image.r[idx];
                    gr[x] = image.g[idx];
                    br[x] = image.b[idx];
                }
            }
        });
    });

    out
}
