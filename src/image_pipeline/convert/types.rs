//! Display-referred output buffer.

/// 8-bit interleaved display image (RGB or RGBA), ready for presentation or
/// encoding by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub width: usize,
    pub height: usize,
    /// 3 for RGB, 4 for RGBA.
    pub channels: u8,
    pub data: Vec<u8>,
}
