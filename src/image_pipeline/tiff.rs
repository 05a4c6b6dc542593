//! TIFF export module
//!
//! Writes the display-referred output image; the core performs no other
//! file-format encoding.

pub mod standard_tiff_writer;
pub mod types;
pub mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ExportConfig, ExportConfigBuilder, TiffCompression};
pub use writer::TiffWriter;
