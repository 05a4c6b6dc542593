//! Hardware-accelerated bilateral filter.
//!
//! Built on cudarc behind the `cuda` feature; the kernel is compiled at
//! runtime through NVRTC, so construction fails softly on machines without a
//! CUDA driver and the caller falls back to a software implementation.

#[cfg(feature = "cuda")]
mod cuda {
    use std::sync::Arc;

    use cudarc::driver::safe::*;

    use crate::image_pipeline::common::image::LinearImage;

    const KERNEL_NAME: &str = "bilateral_planar";
    const KERNEL_SRC: &str = r#"
extern "C" __global__ void bilateral_planar(
    const float* r_in, const float* g_in, const float* b_in, const float* lum,
    float* r_out, float* g_out, float* b_out,
    int width, int height, int radius,
    float inv_spatial, float inv_range)
{
    int x = blockIdx.x * blockDim.x + threadIdx.x;
    int y = blockIdx.y * blockDim.y + threadIdx.y;
    if (x >= width || y >= height) return;

    float center = lum[y * width + x];
    float sum_r = 0.0f, sum_g = 0.0f, sum_b = 0.0f, sum_w = 0.0f;

    for (int dy = -radius; dy <= radius; dy++) {
        int ny = y + dy;
        if (ny < 0 || ny >= height) continue;
        for (int dx = -radius; dx <= radius; dx++) {
            int nx = x + dx;
            if (nx < 0 || nx >= width) continue;
            int idx = ny * width + nx;
            float diff = lum[idx] - center;
            float w = expf((float)(dx * dx + dy * dy) * inv_spatial)
                    * expf(diff * diff * inv_range);
            sum_r += r_in[idx] * w;
            sum_g += g_in[idx] * w;
            sum_b += b_in[idx] * w;
            sum_w += w;
        }
    }

    int idx = y * width + x;
    if (sum_w > 1e-12f) {
        r_out[idx] = sum_r / sum_w;
        g_out[idx] = sum_g / sum_w;
        b_out[idx] = sum_b / sum_w;
    } else {
        r_out[idx] = r_in[idx];
        g_out[idx] = g_in[idx];
        b_out[idx] = b_in[idx];
    }
}
"#;

    pub struct GpuBilateral {
        stream: Arc<CudaStream>,
        kernel: CudaFunction,
    }

    impl GpuBilateral {
        /// Initialize the CUDA context and compile the kernel.
        pub fn new() -> anyhow::Result<Self> {
            let ptx = cudarc::nvrtc::compile_ptx(KERNEL_SRC)?;

            let ctx = CudaContext::new(0)?;
            let stream = ctx.default_stream();
            let module = ctx.load_module(ptx)?;
            let kernel = module.load_function(KERNEL_NAME)?;

            Ok(Self { stream, kernel })
        }

        pub fn process(
            &self,
            image: &LinearImage,
            spatial_sigma: f32,
            range_sigma: f32,
        ) -> anyhow::Result<LinearImage> {
            let width = image.width as i32;
            let height = image.height as i32;
            let radius = super::super::standard::window_radius(spatial_sigma) as i32;
            let inv_spatial = -0.5 / (spatial_sigma * spatial_sigma).max(1e-12);
            let inv_range = -0.5 / (range_sigma * range_sigma).max(1e-12);
            let lum = image.luminance_plane();

            let mut d_r_in = self.stream.clone_htod(&image.r)?;
            let mut d_g_in = self.stream.clone_htod(&image.g)?;
            let mut d_b_in = self.stream.clone_htod(&image.b)?;
            let mut d_lum = self.stream.clone_htod(&lum)?;

            let n = image.pixel_count();
            let mut d_r_out = self.stream.alloc_zeros::<f32>(n)?;
            let mut d_g_out = self.stream.alloc_zeros::<f32>(n)?;
            let mut d_b_out = self.stream.alloc_zeros::<f32>(n)?;

            let mut launch_args = self.stream.launch_builder(&self.kernel);
            launch_args.arg(&mut d_r_in);
            launch_args.arg(&mut d_g_in);
            launch_args.arg(&mut d_b_in);
            launch_args.arg(&mut d_lum);
            launch_args.arg(&mut d_r_out);
            launch_args.arg(&mut d_g_out);
            launch_args.arg(&mut d_b_out);
            launch_args.arg(&width);
            launch_args.arg(&height);
            launch_args.arg(&radius);
            launch_args.arg(&inv_spatial);
            launch_args.arg(&inv_range);

            let threads = (16, 16, 1);
            let blocks = (
                (image.width as u32).div_ceil(16),
                (image.height as u32).div_ceil(16),
                1,
            );
            let cfg = LaunchConfig {
                grid_dim: blocks,
                block_dim: threads,
                shared_mem_bytes: 0,
            };

            unsafe { launch_args.launch(cfg)? };

            let r = self.stream.clone_dtoh(&d_r_out)?;
            let g = self.stream.clone_dtoh(&d_g_out)?;
            let b = self.stream.clone_dtoh(&d_b_out)?;

            Ok(LinearImage {
                width: image.width,
                height: image.height,
                r,
                g,
                b,
            })
        }
    }
}

#[cfg(feature = "cuda")]
pub use cuda::GpuBilateral;

// Stub when CUDA support is not compiled in: construction reports
// unavailability and the optimizer never selects the accelerated path.
#[cfg(not(feature = "cuda"))]
pub struct GpuBilateral;

#[cfg(not(feature = "cuda"))]
impl GpuBilateral {
    pub fn new() -> anyhow::Result<Self> {
        Err(anyhow::anyhow!("CUDA support not compiled in"))
    }

    pub fn process(
        &self,
        _image: &crate::image_pipeline::common::image::LinearImage,
        _spatial_sigma: f32,
        _range_sigma: f32,
    ) -> anyhow::Result<crate::image_pipeline::common::image::LinearImage> {
        Err(anyhow::anyhow!("CUDA support not compiled in"))
    }
}
