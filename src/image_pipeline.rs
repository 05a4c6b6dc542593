//! Film-emulation RAW development pipeline
//!
//! Data flows strictly forward: container bytes -> RAW decode + demosaic ->
//! film emulation -> global adjustments -> display conversion, with the
//! bilateral subsystem feeding detail extraction along the way. Every stage
//! consumes and produces the same planar linear-light representation.

pub mod adjust;
pub mod bilateral;
pub mod common;
pub mod convert;
pub mod film;
pub mod raw;
pub mod render;
pub mod tiff;

pub use common::{
    error::{ProcessError, Result},
    image::LinearImage,
};

pub use raw::{
    CfaPattern,
    DemosaicAlgorithm,
    DngReader,
    RawImageReader,
    RawLoaderReader,
    RawMetadata,
    RawMosaic,
    RawProcessor,
};

pub use film::{
    ChannelResponseParams,
    CrosstalkMatrix,
    FilmEngine,
    FilmParams,
    GrainParams,
    HslParams,
    ToneCurve,
    ToneCurveParams,
};

pub use bilateral::{
    BilateralConfig,
    BilateralContext,
    BilateralStats,
    Implementation,
};

pub use adjust::{AdjustParams, ParallelProcessor};

pub use convert::{DisplayImage, ImageConverter};

pub use tiff::{ExportConfig, StandardTiffWriter, TiffCompression, TiffWriter};

pub use render::{PipelineTimings, RenderConfig, RenderPipeline};
