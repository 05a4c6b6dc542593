//! Common utilities module
//!
//! Shared error and image types used across the processing pipeline.

pub mod error;
pub mod image;

pub use error::{ProcessError, Result};
pub use image::LinearImage;
