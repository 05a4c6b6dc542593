//! Film engine: the ordered emulation stages.

use tracing::{debug, info_span};

use crate::image_pipeline::bilateral::{BilateralConfig, BilateralContext};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::image::LinearImage;
use crate::image_pipeline::film::params::FilmParams;
use crate::image_pipeline::film::{crosstalk, curves, grain, hsl, response, tone};
use crate::image_pipeline::raw::RawMetadata;

// Fixed filter geometry for the clarity base layer.
const CLARITY_SPATIAL_SIGMA: f32 = 3.0;
const CLARITY_RANGE_SIGMA: f32 = 0.15;

/// Runs the film emulation chain: crosstalk, response curve, grain, basic
/// tone, parametric curves, HSL. Every sub-stage is independently callable
/// through the functions in this module's siblings.
pub struct FilmEngine {
    bilateral: BilateralContext,
}

impl FilmEngine {
    pub fn new(bilateral_config: BilateralConfig) -> Result<Self> {
        Ok(Self {
            bilateral: BilateralContext::new(bilateral_config)?,
        })
    }

    pub fn bilateral(&self) -> &BilateralContext {
        &self.bilateral
    }

    /// Process one frame. The input is untouched; the result is a new buffer.
    pub fn process(
        &self,
        input: &LinearImage,
        params: &FilmParams,
        metadata: &RawMetadata,
    ) -> LinearImage {
        let mut image = input.clone();

        {
            let _span = info_span!("crosstalk").entered();
            crosstalk::apply_crosstalk(&mut image, &params.crosstalk);
        }
        {
            let _span = info_span!("response_curve").entered();
            response::apply_response_curve(&mut image, &params.response, params.exposure);
        }
        {
            let _span = info_span!("grain").entered();
            grain::apply_grain(&mut image, &params.grain, metadata.iso);
        }
        {
            let _span = info_span!("basic_tone").entered();
            let detail = if params.tone.clarity.abs() >= 1e-4 {
                Some(self.bilateral.detail(
                    &image,
                    CLARITY_SPATIAL_SIGMA,
                    CLARITY_RANGE_SIGMA,
                ))
            } else {
                None
            };
            tone::apply_basic_tone(&mut image, &params.tone, detail.as_ref());
        }
        {
            let _span = info_span!("tone_curves").entered();
            curves::apply_tone_curves(&mut image, &params.curves);
        }
        {
            let _span = info_span!("hsl").entered();
            hsl::apply_hsl(&mut image, &params.hsl);
        }

        debug!(
            width = image.width,
            height = image.height,
            iso = metadata.iso,
            "film emulation complete"
        );
        image
    }
}
