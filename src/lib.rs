//! Photo to pixel-mosaic converter using nearest-palette block matching.

pub mod color;
pub mod palette;
pub mod quantize;

#[cfg(not(target_arch = "wasm32"))]
pub mod label;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use color::{delta_e, Lab, Rgb};
pub use palette::{Palette, PaletteEntry};
pub use quantize::{quantize, Quantized, TargetSize, UsageHistogram};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Palette JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: palette is empty")]
    EmptyPalette,
    #[error("Invalid size {0:?}, expected WxH with positive integers")]
    InvalidSize(String),
    #[error("Font error: {0}")]
    Font(String),
}

pub type Result<T> = std::result::Result<T, MosaicError>;

/// Main converter: fixed palette plus the requested grid size.
#[derive(Debug, Clone)]
pub struct Converter {
    size: TargetSize,
    palette: Palette,
}

impl Converter {
    pub fn new(size: TargetSize) -> Self {
        Self { size, palette: Palette::default() }
    }

    pub fn with_size(mut self, size: TargetSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn size(&self) -> TargetSize {
        self.size
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Quantize `image`. `Ok(None)` means the image was left as is (see
    /// [`quantize::quantize`]).
    pub fn convert(&self, image: &image::DynamicImage) -> Result<Option<Quantized>> {
        let rgba = image.to_rgba8();
        quantize(&rgba, self.size, &self.palette)
    }
}
