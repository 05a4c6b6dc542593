//! Fallback RAW reader backed by the rawloader library.
//!
//! The built-in [`DngReader`](super::DngReader) handles DNG-family containers
//! with uncompressed CFA strips; everything else (compressed ARW, RAF, CR2,
//! NEF, ...) goes through rawloader, normalized into the same mosaic and
//! metadata representation so the rest of the pipeline cannot tell the two
//! readers apart.

use std::io::Cursor;

use rawloader::RawImageData;
use tracing::debug;

use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawMetadata, RawMosaic};

pub struct RawLoaderReader;

impl RawImageReader for RawLoaderReader {
    fn read_raw(&self, data: &[u8]) -> Result<(RawMosaic, RawMetadata)> {
        debug!("decoding RAW container via rawloader, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ProcessError::Decode(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        if width == 0 || height == 0 {
            return Err(ProcessError::InvalidDimensions(width, height));
        }

        let cfa = CfaPattern::from_name(&decoded.cfa.to_string())?;

        let black_level = decoded.blacklevels[0];
        let white_level = decoded.whitelevels[0].max(black_level.saturating_add(1));
        let black = black_level as f32;
        let range = (white_level - black_level) as f32;

        // rawloader hands back either integer sensor counts or pre-scaled
        // floats; both end up as the normalized [0, 1] mosaic.
        let mosaic: Vec<f32> = match &decoded.data {
            RawImageData::Integer(values) => values
                .iter()
                .map(|&v| ((v as f32 - black) / range).clamp(0.0, 1.0))
                .collect(),
            RawImageData::Float(values) => values.iter().map(|&v| v.clamp(0.0, 1.0)).collect(),
        };
        if mosaic.len() < width * height {
            return Err(ProcessError::Decode(format!(
                "mosaic shorter than {width}x{height}"
            )));
        }

        debug!(
            width,
            height,
            black_level,
            white_level,
            make = %decoded.clean_make,
            model = %decoded.clean_model,
            "rawloader decode complete"
        );

        let metadata = RawMetadata {
            width,
            height,
            black_level,
            white_level,
            cfa,
            iso: 100,
            make: decoded.clean_make.clone(),
            model: decoded.clean_model.clone(),
            exposure_time: None,
        };

        Ok((
            RawMosaic {
                width,
                height,
                data: mosaic,
            },
            metadata,
        ))
    }
}
