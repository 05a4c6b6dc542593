use std::io::Write;

use tracing::debug;

use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::convert::types::DisplayImage;
use crate::image_pipeline::tiff::types::{ExportConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

impl TiffWriter for StandardTiffWriter {
    fn write_display(
        &self,
        image: &DisplayImage,
        output: &mut dyn Write,
        config: &ExportConfig,
    ) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{}, {} channels",
            image.width, image.height, image.channels
        );

        let mut buffer = Vec::new();

        let compression = match config.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Fast,
            ),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Balanced,
            ),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Best,
            ),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| ProcessError::Encode(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        match image.channels {
            3 => encoder
                .write_image::<tiff::encoder::colortype::RGB8>(
                    image.width as u32,
                    image.height as u32,
                    &image.data,
                )
                .map_err(|e| ProcessError::Encode(e.to_string()))?,
            4 => encoder
                .write_image::<tiff::encoder::colortype::RGBA8>(
                    image.width as u32,
                    image.height as u32,
                    &image.data,
                )
                .map_err(|e| ProcessError::Encode(e.to_string()))?,
            other => {
                return Err(ProcessError::Encode(format!(
                    "unsupported channel count: {other}"
                )));
            }
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
