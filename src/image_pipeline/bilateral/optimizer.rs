//! Implementation selection and the bilateral context.
//!
//! Selection is a pure function of image size, sigma and capability flags so
//! it can be tested without touching any hardware. The context owns the
//! worker pool, the result cache and the statistics counters; no process-wide
//! state.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::image_pipeline::bilateral::cache::{fingerprint, FilterCache};
use crate::image_pipeline::bilateral::fast::bilateral_fast;
use crate::image_pipeline::bilateral::gpu::GpuBilateral;
use crate::image_pipeline::bilateral::standard::bilateral_standard;
use crate::image_pipeline::bilateral::types::{
    BilateralConfig, BilateralStats, DeviceCaps, Implementation,
};
use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::common::image::LinearImage;

pub const MIN_WORKERS: usize = 2;
pub const MAX_WORKERS: usize = 8;

/// Bounded worker count derived from the machine's parallelism.
pub fn bounded_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Deterministic implementation choice.
///
/// Priority: accelerated when enabled, available and the frame is large
/// enough to amortize the transfer; else the downsample approximation when
/// the spatial sigma is past the configured threshold; else the standard
/// windowed filter.
pub fn select_implementation(
    width: usize,
    height: usize,
    spatial_sigma: f32,
    caps: DeviceCaps,
    config: &BilateralConfig,
) -> Implementation {
    let pixels = width * height;
    if config.gpu_enabled && caps.gpu_available && pixels > config.gpu_pixel_threshold {
        Implementation::Gpu
    } else if spatial_sigma > config.fast_sigma_threshold {
        Implementation::FastApprox
    } else {
        Implementation::Standard
    }
}

/// Explicit state for the bilateral subsystem: configuration, worker pool,
/// result cache and counters.
pub struct BilateralContext {
    config: BilateralConfig,
    pool: rayon::ThreadPool,
    gpu: Option<GpuBilateral>,
    cache: Mutex<FilterCache>,
    stats: Mutex<BilateralStats>,
}

impl BilateralContext {
    pub fn new(config: BilateralConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(bounded_worker_count())
            .build()
            .map_err(|e| ProcessError::WorkerPool(e.to_string()))?;

        let gpu = if config.gpu_enabled {
            match GpuBilateral::new() {
                Ok(gpu) => Some(gpu),
                Err(e) => {
                    debug!("GPU bilateral unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            cache: Mutex::new(FilterCache::new(
                config.cache_max_entries,
                config.cache_max_bytes,
            )),
            stats: Mutex::new(BilateralStats::default()),
            pool,
            gpu,
            config,
        })
    }

    pub fn config(&self) -> &BilateralConfig {
        &self.config
    }

    pub fn device_caps(&self) -> DeviceCaps {
        DeviceCaps {
            gpu_available: self.gpu.is_some(),
        }
    }

    /// Counters survive a worker panic; a poisoned lock just hands back the
    /// data.
    fn stats_guard(&self) -> MutexGuard<'_, BilateralStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_guard(&self) -> MutexGuard<'_, FilterCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn stats(&self) -> BilateralStats {
        *self.stats_guard()
    }

    pub fn reset(&self) {
        *self.stats_guard() = BilateralStats::default();
        self.cache_guard().clear();
    }

    /// Filter an image, going through the cache and the selected
    /// implementation. Locks are held only around lookup and insertion; the
    /// filtering itself runs unlocked.
    pub fn filter(&self, image: &LinearImage, spatial_sigma: f32, range_sigma: f32) -> LinearImage {
        self.stats_guard().total_calls += 1;

        let key = fingerprint(image, spatial_sigma, range_sigma);
        if let Some(hit) = self.cache_guard().get(key) {
            self.stats_guard().cache_hits += 1;
            return hit;
        }
        self.stats_guard().cache_misses += 1;

        let choice = select_implementation(
            image.width,
            image.height,
            spatial_sigma,
            self.device_caps(),
            &self.config,
        );
        let result = self.run(choice, image, spatial_sigma, range_sigma);

        self.cache_guard().insert(key, result.clone());
        result
    }

    fn run(
        &self,
        choice: Implementation,
        image: &LinearImage,
        spatial_sigma: f32,
        range_sigma: f32,
    ) -> LinearImage {
        match choice {
            Implementation::Gpu => {
                let attempt = self
                    .gpu
                    .as_ref()
                    .map(|gpu| gpu.process(image, spatial_sigma, range_sigma));
                match attempt {
                    Some(Ok(result)) => {
                        self.stats_guard().gpu_calls += 1;
                        return result;
                    }
                    Some(Err(e)) => {
                        // Soft failure: count it and fall back to software.
                        warn!("GPU bilateral failed, falling back: {e}");
                        self.stats_guard().gpu_failures += 1;
                    }
                    None => {}
                }
                let software = if spatial_sigma > self.config.fast_sigma_threshold {
                    Implementation::FastApprox
                } else {
                    Implementation::Standard
                };
                self.run(software, image, spatial_sigma, range_sigma)
            }
            Implementation::FastApprox => {
                self.stats_guard().fast_calls += 1;
                bilateral_fast(
                    image,
                    spatial_sigma,
                    range_sigma,
                    self.config.fast_sigma_threshold,
                    &self.pool,
                )
            }
            Implementation::Standard => {
                self.stats_guard().standard_calls += 1;
                bilateral_standard(image, spatial_sigma, range_sigma, &self.pool)
            }
        }
    }

    /// Detail layer for clarity/local contrast: input minus filtered base.
    pub fn detail(&self, image: &LinearImage, spatial_sigma: f32, range_sigma: f32) -> LinearImage {
        let base = self.filter(image, spatial_sigma, range_sigma);
        let mut detail = LinearImage::new(image.width, image.height);
        for i in 0..image.pixel_count() {
            detail.r[i] = image.r[i] - base.r[i];
            detail.g[i] = image.g[i] - base.g[i];
            detail.b[i] = image.b[i] - base.b[i];
        }
        detail
    }
}
