//! Spectral crosstalk between emulsion layers.

use crate::image_pipeline::common::image::LinearImage;
use crate::image_pipeline::film::params::CrosstalkMatrix;

/// Per-pixel 3x3 multiply. The identity matrix short-circuits so a neutral
/// preset costs nothing.
pub fn apply_crosstalk(image: &mut LinearImage, matrix: &CrosstalkMatrix) {
    if matrix.is_identity() {
        return;
    }
    for i in 0..image.pixel_count() {
        let (r, g, b) = matrix.apply(image.r[i], image.g[i], image.b[i]);
        image.r[i] = r.max(0.0);
        image.g[i] = g.max(0.0);
        image.b[i] = b.max(0.0);
    }
}
