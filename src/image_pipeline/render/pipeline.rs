//! End-to-end develop orchestration: container bytes to display image.

use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use crate::image_pipeline::adjust::{AdjustParams, ParallelProcessor};
use crate::image_pipeline::bilateral::BilateralConfig;
use crate::image_pipeline::common::error::{ProcessError, Result};
use crate::image_pipeline::convert::{DisplayImage, ImageConverter};
use crate::image_pipeline::film::{FilmEngine, FilmParams};
use crate::image_pipeline::raw::{DemosaicAlgorithm, DngReader, RawImageReader, RawMetadata};
use crate::image_pipeline::render::timing::PipelineTimings;
use crate::image_pipeline::tiff::{ExportConfig, StandardTiffWriter, TiffWriter};

/// Full configuration for one develop run. Built once, handed to the
/// pipeline wholesale; the pipeline never reaches outside it.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub demosaic: DemosaicAlgorithm,
    pub tone_map: bool,
    pub include_alpha: bool,
    pub validate_dimensions: bool,
    pub max_dimension: Option<usize>,
    pub film: FilmParams,
    pub adjust: AdjustParams,
    pub bilateral: BilateralConfig,
    pub export: ExportConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            demosaic: DemosaicAlgorithm::default(),
            tone_map: false,
            include_alpha: false,
            validate_dimensions: true,
            max_dimension: None,
            film: FilmParams::default(),
            adjust: AdjustParams::default(),
            bilateral: BilateralConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct RenderConfigBuilder {
    demosaic: Option<DemosaicAlgorithm>,
    tone_map: Option<bool>,
    include_alpha: Option<bool>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
    film: Option<FilmParams>,
    adjust: Option<AdjustParams>,
    bilateral: Option<BilateralConfig>,
    export: Option<ExportConfig>,
}

impl RenderConfigBuilder {
    pub fn demosaic(mut self, algorithm: DemosaicAlgorithm) -> Self {
        self.demosaic = Some(algorithm);
        self
    }

    pub fn tone_map(mut self, enabled: bool) -> Self {
        self.tone_map = Some(enabled);
        self
    }

    pub fn include_alpha(mut self, enabled: bool) -> Self {
        self.include_alpha = Some(enabled);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn film(mut self, film: FilmParams) -> Self {
        self.film = Some(film);
        self
    }

    pub fn adjust(mut self, adjust: AdjustParams) -> Self {
        self.adjust = Some(adjust);
        self
    }

    pub fn bilateral(mut self, bilateral: BilateralConfig) -> Self {
        self.bilateral = Some(bilateral);
        self
    }

    pub fn export(mut self, export: ExportConfig) -> Self {
        self.export = Some(export);
        self
    }

    pub fn build(self) -> RenderConfig {
        let default = RenderConfig::default();
        RenderConfig {
            demosaic: self.demosaic.unwrap_or(default.demosaic),
            tone_map: self.tone_map.unwrap_or(default.tone_map),
            include_alpha: self.include_alpha.unwrap_or(default.include_alpha),
            validate_dimensions: self
                .validate_dimensions
                .unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
            film: self.film.unwrap_or(default.film),
            adjust: self.adjust.unwrap_or(default.adjust),
            bilateral: self.bilateral.unwrap_or(default.bilateral),
            export: self.export.unwrap_or(default.export),
        }
    }
}

/// Orchestrates RAW decode, film emulation, global adjustments, display
/// conversion and TIFF export behind reader/writer seams.
pub struct RenderPipeline<R: RawImageReader, W: TiffWriter> {
    reader: R,
    writer: W,
    config: RenderConfig,
    engine: FilmEngine,
    processor: ParallelProcessor,
}

impl RenderPipeline<DngReader, StandardTiffWriter> {
    pub fn new(config: RenderConfig) -> Result<Self> {
        Self::with_custom(DngReader, StandardTiffWriter, config)
    }
}

impl<R: RawImageReader, W: TiffWriter> RenderPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: RenderConfig) -> Result<Self> {
        let engine = FilmEngine::new(config.bilateral.clone())?;
        let processor = ParallelProcessor::new()?;
        Ok(Self {
            reader,
            writer,
            config,
            engine,
            processor,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }
        if width == 0 || height == 0 {
            return Err(ProcessError::InvalidDimensions(width, height));
        }
        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(ProcessError::InvalidDimensions(width, height));
            }
        }
        Ok(())
    }

    /// The fixed-order adjustment chain also carries the film-level global
    /// contrast and saturation; fold them into one parameter set.
    fn effective_adjust(&self) -> AdjustParams {
        let mut adjust = self.config.adjust;
        adjust.contrast *= self.config.film.contrast;
        adjust.saturation *= self.config.film.saturation;
        adjust
    }

    /// Develop container bytes into a display image.
    #[instrument(skip(self, input_data), fields(input_size = input_data.len()))]
    pub fn develop(&self, input_data: &[u8]) -> Result<(DisplayImage, RawMetadata)> {
        let mut timings = PipelineTimings::new();
        let (display, metadata) = self.develop_timed(input_data, &mut timings)?;
        Ok((display, metadata))
    }

    /// Develop with stage timings collected into `timings`.
    pub fn develop_timed(
        &self,
        input_data: &[u8],
        timings: &mut PipelineTimings,
    ) -> Result<(DisplayImage, RawMetadata)> {
        info!("Starting RAW develop");

        let (mosaic, metadata) = timings.measure("decode_raw", || {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)
        })?;

        self.validate_dimensions(mosaic.width, mosaic.height)?;

        let linear = timings.measure("demosaic", || {
            let _span = tracing::info_span!("demosaic").entered();
            crate::image_pipeline::raw::demosaic(&mosaic, metadata.cfa, self.config.demosaic)
        });

        let filmed = timings.measure("film_engine", || {
            let _span = tracing::info_span!("film_engine").entered();
            self.engine.process(&linear, &self.config.film, &metadata)
        });

        let mut adjusted = filmed;
        timings.measure("adjustments", || {
            let _span = tracing::info_span!("adjustments").entered();
            self.processor.apply(&mut adjusted, &self.effective_adjust());
        });

        let display = timings.measure("convert", || {
            let _span = tracing::info_span!("convert").entered();
            ImageConverter::new(self.config.tone_map, self.config.include_alpha)
                .convert(&adjusted)
        });

        let (out_width, out_height) = (display.width, display.height);
        info!(
            width = out_width,
            height = out_height,
            "develop complete"
        );
        Ok((display, metadata))
    }

    /// Develop bytes and write the result as TIFF to `output`.
    pub fn develop_to(&self, input_data: &[u8], output: &mut dyn Write) -> Result<()> {
        let (display, _) = self.develop(input_data)?;
        let _span = tracing::info_span!("encode_tiff").entered();
        self.writer
            .write_display(&display, output, &self.config.export)
    }

    /// File-to-file develop.
    #[instrument(skip(self, input_path, output_path))]
    pub fn develop_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<PipelineTimings> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Developing file"
        );

        let input_data = std::fs::read(input_path).map_err(|e| {
            ProcessError::InputRead(format!("{}: {}", input_path.display(), e))
        })?;

        let mut output_file = std::fs::File::create(output_path).map_err(|e| {
            ProcessError::OutputWrite(format!("{}: {}", output_path.display(), e))
        })?;

        let mut timings = PipelineTimings::new();
        let (display, _) = self.develop_timed(&input_data, &mut timings)?;
        timings.measure("encode_tiff", || {
            self.writer
                .write_display(&display, &mut output_file, &self.config.export)
        })?;

        Ok(timings)
    }
}
