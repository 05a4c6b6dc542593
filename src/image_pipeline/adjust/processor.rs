//! Row-parallel application of the global adjustment chain.

use rayon::prelude::*;
use tracing::debug;

use crate::image_pipeline::bilateral::bounded_worker_count;
use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::common::image::LinearImage;

use super::types::{AdjustParams, PreparedAdjust};
use super::{scalar, simd};

/// Applies the fixed adjustment chain across a bounded worker pool, one
/// contiguous row range per worker. The optional 4-wide vector path is
/// numerically equivalent to the scalar reference.
pub struct ParallelProcessor {
    pool: rayon::ThreadPool,
    use_simd: bool,
}

impl ParallelProcessor {
    pub fn new() -> Result<Self> {
        Self::with_options(simd::available())
    }

    pub fn with_options(use_simd: bool) -> Result<Self> {
        let workers = bounded_worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ProcessError::WorkerPool(e.to_string()))?;
        debug!(workers, use_simd, "parallel processor ready");
        Ok(Self { pool, use_simd })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn simd_enabled(&self) -> bool {
        self.use_simd
    }

    /// Apply the adjustments in place. Parameters within the skip tolerance
    /// of neutral cost nothing, including the full no-op case.
    pub fn apply(&self, image: &mut LinearImage, params: &AdjustParams) {
        let prepared = PreparedAdjust::new(params, image.width, image.height);
        if !prepared.any_active() {
            return;
        }

        let width = image.width;
        let use_simd = self.use_simd;
        let (r, g, b) = (&mut image.r, &mut image.g, &mut image.b);

        self.pool.install(|| {
            r.par_chunks_mut(width)
                .zip(g.par_chunks_mut(width))
                .zip(b.par_chunks_mut(width))
                .enumerate()
                .for_each(|(y, ((row_r, row_g), row_b))| {
                    if use_simd {
                        simd::apply_row(row_r, row_g, row_b, y, &prepared);
                    } else {
                        scalar::apply_row(row_r, row_g, row_b, y, &prepared);
                    }
                });
        });
    }
}
