//! Block quantization - splits the source into square blocks and fills each
//! with its nearest palette color.

use crate::color::Rgb;
use crate::palette::{Palette, PaletteEntry};
use crate::{MosaicError, Result};
use image::{Rgba, RgbaImage};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Smallest block side that still changes the image.
pub const MIN_FACTOR: u32 = 2;

/// Requested grid size in blocks, parsed from `"WxH"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    width: u32,
    height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidSize(format!("{width}x{height}")));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn swapped(self) -> Self {
        Self { width: self.height, height: self.width }
    }
}

impl FromStr for TargetSize {
    type Err = MosaicError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || MosaicError::InvalidSize(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Self::new(width, height).map_err(|_| invalid())
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Orient `target` to the source and derive the block side length.
///
/// Landscape sources swap the target's width and height. The factor comes
/// from the width alone: `ceil(source_width / target_width)`.
pub fn block_factor(source_width: u32, source_height: u32, target: TargetSize) -> (TargetSize, u32) {
    let target = if source_width > source_height { target.swapped() } else { target };
    (target, source_width.div_ceil(target.width))
}

/// How many blocks matched each palette color, in first-match order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageHistogram {
    index: HashMap<Rgb, usize>,
    counts: Vec<(Rgb, u64)>,
}

impl UsageHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, rgb: Rgb) {
        match self.index.get(&rgb) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(rgb, self.counts.len());
                self.counts.push((rgb, 1));
            }
        }
    }

    pub fn get(&self, rgb: Rgb) -> u64 {
        self.index.get(&rgb).map_or(0, |&i| self.counts[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rgb, u64)> + '_ {
        self.counts.iter().copied()
    }

    /// Number of distinct colors used.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&(_, n)| n).sum()
    }
}

/// Serializes as `{"r,g,b": count, ...}`.
impl Serialize for UsageHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (rgb, n) in &self.counts {
            map.serialize_entry(&rgb.to_string(), n)?;
        }
        map.end()
    }
}

/// Result of one quantization pass.
#[derive(Debug, Clone)]
pub struct Quantized {
    /// `target.width * factor` by `target.height * factor`. Pixels no block
    /// reaches stay transparent.
    pub image: RgbaImage,
    /// Block side length in source pixels.
    pub factor: u32,
    /// Grid size after orientation.
    pub target: TargetSize,
    /// Sampled blocks per row.
    pub columns: u32,
    /// Sampled block rows.
    pub rows: u32,
    /// Index into `palette` chosen for each sampled block, row-major.
    pub blocks: Vec<usize>,
    pub histogram: UsageHistogram,
    /// The palette the blocks were matched against.
    pub palette: Palette,
}

impl Quantized {
    /// Palette index of the block at grid position (`col`, `row`).
    pub fn block(&self, col: u32, row: u32) -> Option<usize> {
        if col >= self.columns || row >= self.rows {
            return None;
        }
        self.blocks.get((row * self.columns + col) as usize).copied()
    }

    /// Palette entry matched by the block at (`col`, `row`).
    pub fn entry(&self, col: u32, row: u32) -> Option<&PaletteEntry> {
        self.block(col, row).and_then(|i| self.palette.get(i))
    }
}

/// Output raster size for `target` blocks of `factor` pixels.
///
/// Fails when a side overflows `u32` or the RGBA buffer would exceed the
/// `image` crate's default allocation limit.
fn output_dimensions(target: TargetSize, factor: u32) -> Result<(u32, u32)> {
    let too_large = || MosaicError::InvalidSize(format!("{target} at {factor}px blocks is too large"));

    let out_w = target.width.checked_mul(factor).ok_or_else(too_large)?;
    let out_h = target.height.checked_mul(factor).ok_or_else(too_large)?;
    let bytes = (out_w as u64)
        .checked_mul(out_h as u64)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(too_large)?;
    let max_alloc = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    if bytes > max_alloc || usize::try_from(bytes).is_err() {
        return Err(too_large());
    }
    Ok((out_w, out_h))
}

/// Replace every block of `source` with its nearest palette color.
///
/// Each block is represented by its top-left source pixel; alpha is ignored.
/// Returns `Ok(None)` when the source is empty or the block factor is below
/// [`MIN_FACTOR`], in which case the caller should keep the original image.
/// Returns [`MosaicError::InvalidSize`] when the output raster for `target`
/// cannot be allocated.
///
/// Blocks are sampled across the whole source. Their squares are painted
/// clipped to the output bounds, and every sampled block is counted in the
/// histogram whether or not any of its square lands inside the output.
pub fn quantize(source: &RgbaImage, target: TargetSize, palette: &Palette) -> Result<Option<Quantized>> {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        log::debug!("empty source image, nothing to do");
        return Ok(None);
    }

    let (target, factor) = block_factor(src_w, src_h, target);
    log::debug!("source {src_w}x{src_h}, grid {target}, factor {factor}");
    if factor < MIN_FACTOR {
        log::debug!("factor {factor} below {MIN_FACTOR}, skipping");
        return Ok(None);
    }

    let (out_w, out_h) = output_dimensions(target, factor)?;
    let mut image = RgbaImage::from_pixel(out_w, out_h, Rgba([0, 0, 0, 0]));

    let columns = src_w.div_ceil(factor);
    let rows = src_h.div_ceil(factor);
    let mut blocks = Vec::with_capacity((columns * rows) as usize);
    let mut histogram = UsageHistogram::new();

    for y in (0..src_h).step_by(factor as usize) {
        for x in (0..src_w).step_by(factor as usize) {
            let [r, g, b, _] = source.get_pixel(x, y).0;
            let idx = palette.nearest(Rgb::new(r, g, b));
            let rgb = palette.entries()[idx].rgb;

            fill_block(&mut image, x, y, factor, rgb.to_rgba());
            histogram.record(rgb);
            blocks.push(idx);
        }
    }

    log::debug!("{} blocks, {} distinct colors", blocks.len(), histogram.len());

    Ok(Some(Quantized {
        image,
        factor,
        target,
        columns,
        rows,
        blocks,
        histogram,
        palette: palette.clone(),
    }))
}

fn fill_block(image: &mut RgbaImage, x0: u32, y0: u32, size: u32, color: Rgba<u8>) {
    let x1 = (x0 + size).min(image.width());
    let y1 = (y0 + size).min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}
