use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::convert::types::DisplayImage;
use crate::image_pipeline::tiff::types::ExportConfig;

pub trait TiffWriter {
    fn write_display(
        &self,
        image: &DisplayImage,
        output: &mut dyn Write,
        config: &ExportConfig,
    ) -> Result<()>;
}
