//! Edge-preserving bilateral filtering subsystem
//!
//! Standard windowed implementation, a downsample/upsample approximation for
//! large radii, an optional CUDA path with soft fallback, plus result caching
//! and usage statistics behind an explicit context object.

pub mod cache;
pub mod fast;
pub mod gpu;
pub mod optimizer;
pub mod standard;
pub mod types;


pub use cache::{fingerprint, FilterCache};
pub use fast::bilateral_fast;
pub use gpu::GpuBilateral;
pub use optimizer::{bounded_worker_count, select_implementation, BilateralContext};
pub use standard::bilateral_standard;
pub use types::{BilateralConfig, BilateralStats, DeviceCaps, Implementation};
