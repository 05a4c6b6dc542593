//! Bilateral filter configuration, selection and statistics types.

/// Filter tuning knobs. Thresholds are configuration rather than constants so
/// deployments can tune the crossover points.
#[derive(Debug, Clone)]
pub struct BilateralConfig {
    /// Spatial sigma above which the downsample/upsample approximation wins.
    pub fast_sigma_threshold: f32,
    /// Pixel count above which the accelerated path is worth the transfer.
    pub gpu_pixel_threshold: usize,
    pub gpu_enabled: bool,
    pub cache_max_entries: usize,
    pub cache_max_bytes: usize,
}

impl Default for BilateralConfig {
    fn default() -> Self {
        Self {
            fast_sigma_threshold: 4.0,
            gpu_pixel_threshold: 2_000_000,
            gpu_enabled: true,
            cache_max_entries: 8,
            cache_max_bytes: 256 * 1024 * 1024,
        }
    }
}

impl BilateralConfig {
    pub fn builder() -> BilateralConfigBuilder {
        BilateralConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct BilateralConfigBuilder {
    fast_sigma_threshold: Option<f32>,
    gpu_pixel_threshold: Option<usize>,
    gpu_enabled: Option<bool>,
    cache_max_entries: Option<usize>,
    cache_max_bytes: Option<usize>,
}

impl BilateralConfigBuilder {
    pub fn fast_sigma_threshold(mut self, sigma: f32) -> Self {
        self.fast_sigma_threshold = Some(sigma);
        self
    }

    pub fn gpu_pixel_threshold(mut self, pixels: usize) -> Self {
        self.gpu_pixel_threshold = Some(pixels);
        self
    }

    pub fn gpu_enabled(mut self, enabled: bool) -> Self {
        self.gpu_enabled = Some(enabled);
        self
    }

    pub fn cache_max_entries(mut self, entries: usize) -> Self {
        self.cache_max_entries = Some(entries);
        self
    }

    pub fn cache_max_bytes(mut self, bytes: usize) -> Self {
        self.cache_max_bytes = Some(bytes);
        self
    }

    pub fn build(self) -> BilateralConfig {
        let default = BilateralConfig::default();
        BilateralConfig {
            fast_sigma_threshold: self
                .fast_sigma_threshold
                .unwrap_or(default.fast_sigma_threshold),
            gpu_pixel_threshold: self
                .gpu_pixel_threshold
                .unwrap_or(default.gpu_pixel_threshold),
            gpu_enabled: self.gpu_enabled.unwrap_or(default.gpu_enabled),
            cache_max_entries: self.cache_max_entries.unwrap_or(default.cache_max_entries),
            cache_max_bytes: self.cache_max_bytes.unwrap_or(default.cache_max_bytes),
        }
    }
}

/// Which concrete filter runs a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Implementation {
    Standard,
    FastApprox,
    Gpu,
}

/// Device capability flags fed to the selection function. Kept as plain data
/// so selection stays a pure function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    pub gpu_available: bool,
}

/// Cumulative observability counters for one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BilateralStats {
    pub total_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub standard_calls: u64,
    pub fast_calls: u64,
    pub gpu_calls: u64,
    pub gpu_failures: u64,
}
