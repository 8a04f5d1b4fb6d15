//! Optional palette-label overlay: writes each block's label in white on top
//! of its fill. Off unless the caller asks for it.

use crate::quantize::Quantized;
use crate::{MosaicError, Result};
use fontdue::{Font, FontSettings};
use image::RgbaImage;
use std::path::Path;

const LABEL_COLOR: [u8; 3] = [255, 255, 255];

pub struct LabelPainter {
    font: Font,
}

impl LabelPainter {
    pub fn new(font_data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| MosaicError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(&std::fs::read(path)?)
    }

    /// Draw the label of every sampled block, centred, at `factor` px.
    pub fn paint(&self, quantized: &mut Quantized) {
        let size = quantized.factor as f32;
        for (cx, cy, label) in block_labels(quantized) {
            self.draw_text(&mut quantized.image, &label, cx, cy, size);
        }
    }

    fn draw_text(&self, img: &mut RgbaImage, text: &str, cx: i32, cy: i32, font_size: f32) {
        let glyphs: Vec<_> = text.chars().map(|ch| self.font.rasterize(ch, font_size)).collect();
        let total_advance: f32 = glyphs.iter().map(|(m, _)| m.advance_width).sum();

        let mut pen_x = cx as f32 - total_advance / 2.0;
        for (metrics, bitmap) in &glyphs {
            if metrics.width > 0 && metrics.height > 0 {
                let x_offset = pen_x.round() as i32 + metrics.xmin;
                let y_offset = cy - metrics.height as i32 / 2;
                blend_glyph(img, bitmap, metrics.width, metrics.height, x_offset, y_offset);
            }
            pen_x += metrics.advance_width;
        }
    }
}

/// Centre point and label of every sampled block with a non-empty label,
/// row-major.
fn block_labels(quantized: &Quantized) -> Vec<(i32, i32, String)> {
    let factor = quantized.factor;
    let half = factor as i32 / 2;
    let mut labels = Vec::new();
    for row in 0..quantized.rows {
        for col in 0..quantized.columns {
            let Some(entry) = quantized.entry(col, row) else {
                continue;
            };
            if entry.label.is_empty() {
                continue;
            }
            let cx = (col * factor) as i32 + half;
            let cy = (row * factor) as i32 + half;
            labels.push((cx, cy, entry.label.clone()));
        }
    }
    labels
}

fn blend_glyph(img: &mut RgbaImage, bitmap: &[u8], w: usize, h: usize, x_offset: i32, y_offset: i32) {
    let (width, height) = (img.width() as i32, img.height() as i32);
    for sy in 0..h {
        for sx in 0..w {
            let tx = x_offset + sx as i32;
            let ty = y_offset + sy as i32;
            if tx < 0 || tx >= width || ty < 0 || ty >= height {
                continue;
            }
            let coverage = bitmap[sy * w + sx] as u32;
            if coverage == 0 {
                continue;
            }
            let px = img.get_pixel_mut(tx as u32, ty as u32);
            for c in 0..3 {
                let bg = px.0[c] as u32;
                let fg = LABEL_COLOR[c] as u32;
                px.0[c] = ((fg * coverage + bg * (255 - coverage)) / 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Palette, PaletteEntry};
    use crate::quantize::{quantize, TargetSize};
    use image::Rgba;

    #[test]
    fn labels_sit_at_block_centres_and_skip_blanks() {
        let palette = Palette::new(vec![
            PaletteEntry::new([0, 0, 0], ""),
            PaletteEntry::new([255, 255, 255], "W"),
        ])
        .unwrap();
        // 6x4 landscape at 2x3 becomes a 3x2 grid of 2px blocks. The left
        // column is black and unlabelled.
        let mut source = RgbaImage::from_pixel(6, 4, Rgba([255, 255, 255, 255]));
        for y in 0..4 {
            for x in 0..2 {
                source.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let q = quantize(&source, TargetSize::new(2, 3).unwrap(), &palette).unwrap().unwrap();
        assert_eq!(q.factor, 2);

        let labels = block_labels(&q);
        let expected: Vec<(i32, i32, String)> = [(3, 1), (5, 1), (3, 3), (5, 3)]
            .into_iter()
            .map(|(x, y)| (x, y, "W".to_string()))
            .collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn labels_come_from_the_matching_palette() {
        let palette = Palette::new(vec![PaletteEntry::new([10, 20, 30], "Q")]).unwrap();
        let source = RgbaImage::from_pixel(9, 9, Rgba([10, 20, 30, 255]));
        let q = quantize(&source, TargetSize::new(3, 3).unwrap(), &palette).unwrap().unwrap();
        let labels = block_labels(&q);
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[0], (1, 1, "Q".to_string()));
        assert!(labels.iter().all(|(_, _, l)| l == "Q"));
    }

    #[test]
    fn rejects_bad_font_data() {
        assert!(matches!(LabelPainter::new(b"not a font"), Err(MosaicError::Font(_))));
    }

    #[test]
    fn glyph_blending_clips_and_mixes() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        // 3x1 glyph hanging off the right edge.
        blend_glyph(&mut img, &[255, 0, 255], 3, 1, 0, 0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0, 255]);

        blend_glyph(&mut img, &[51], 1, 1, 1, 1);
        assert_eq!(img.get_pixel(1, 1).0, [51, 51, 51, 255]);
    }
}
