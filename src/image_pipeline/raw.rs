//! RAW decoding module
//!
//! Container parsing, sensor normalization and demosaicing: bytes in,
//! linear full-color image plus sensor metadata out.

pub mod container;
pub mod demosaic;
mod reader;
mod rawloader_reader;
pub mod types;

#[cfg(test)]
mod tests;

use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::common::image::LinearImage;

pub use container::DngReader;
pub use demosaic::{demosaic, demosaic_ahd, demosaic_bilinear, DemosaicAlgorithm};
pub use reader::RawImageReader;
pub use rawloader_reader::RawLoaderReader;
pub use types::{CfaPattern, RawMetadata, RawMosaic};

/// Front door of the RAW stage: reads a container and demosaics it.
pub struct RawProcessor<R: RawImageReader> {
    reader: R,
    algorithm: DemosaicAlgorithm,
}

impl RawProcessor<DngReader> {
    pub fn new(algorithm: DemosaicAlgorithm) -> Self {
        Self {
            reader: DngReader,
            algorithm,
        }
    }
}

impl<R: RawImageReader> RawProcessor<R> {
    pub fn with_reader(reader: R, algorithm: DemosaicAlgorithm) -> Self {
        Self { reader, algorithm }
    }

    /// Decode container bytes into a demosaiced linear image.
    #[instrument(skip(self, data), fields(input_size = data.len()))]
    pub fn develop(&self, data: &[u8]) -> Result<(LinearImage, RawMetadata)> {
        let (mosaic, metadata) = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(data)?
        };

        let image = {
            let _span = tracing::info_span!(
                "demosaic",
                width = mosaic.width,
                height = mosaic.height,
                algorithm = ?self.algorithm
            )
            .entered();
            demosaic(&mosaic, metadata.cfa, self.algorithm)
        };

        info!(
            width = image.width,
            height = image.height,
            cfa = ?metadata.cfa,
            "RAW develop complete"
        );
        Ok((image, metadata))
    }

    /// Read a RAW file from disk and decode it.
    pub fn load_raw<P: AsRef<Path>>(&self, path: P) -> Result<(LinearImage, RawMetadata)> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| ProcessError::InputRead(format!("{}: {}", path.display(), e)))?;
        self.develop(&data)
    }
}
