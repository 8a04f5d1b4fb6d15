//! Fixed color palettes and nearest-color lookup.

use crate::color::{delta_e, Rgb};
use crate::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting bound for the nearest-color search. Not a rejection threshold:
/// when every entry is at least this far away, the first entry is kept.
pub const INITIAL_MIN_DISTANCE: f64 = 100.0;

/// One reference color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub rgb: Rgb,
    /// Symbol drawn inside the block when label rendering is enabled.
    #[serde(default, alias = "symbol")]
    pub label: String,
    /// Reserved identifier, not used for matching.
    #[serde(default)]
    pub code: String,
}

impl PaletteEntry {
    pub fn new(rgb: impl Into<Rgb>, label: impl Into<String>) -> Self {
        Self { rgb: rgb.into(), label: label.into(), code: String::new() }
    }
}

/// Ordered, non-empty list of reference colors. Duplicate colors are allowed;
/// lookups resolve them in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(MosaicError::EmptyPalette);
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of `{"rgb": [r, g, b], "label": "A", "code": ""}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<PaletteEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let palette = Self::from_json(&std::fs::read_to_string(path.as_ref())?)?;
        log::debug!("loaded {} palette entries from {}", palette.len(), path.as_ref().display());
        Ok(palette)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// Index of the entry closest to `sample`.
    ///
    /// Ties go to the earlier entry. Distances are only accepted below
    /// [`INITIAL_MIN_DISTANCE`], so a sample that is far from everything
    /// resolves to entry 0.
    pub fn nearest(&self, sample: Rgb) -> usize {
        let mut best_idx = 0;
        let mut best_dist = INITIAL_MIN_DISTANCE;

        for (i, entry) in self.entries.iter().enumerate() {
            let dist = delta_e(sample, entry.rgb);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        best_idx
    }
}

impl Default for Palette {
    /// The built-in 108-color table.
    fn default() -> Self {
        let entries = DEFAULT_PALETTE
            .iter()
            .map(|&(rgb, label)| PaletteEntry::new(rgb, label))
            .collect();
        Self { entries }
    }
}

const DEFAULT_PALETTE: &[([u8; 3], &str)] = &[
    ([102, 125, 150], "A"),
    ([155, 114, 49], "B"),
    ([156, 200, 159], "C"),
    ([208, 194, 151], "D"),
    ([72, 58, 137], "E"),
    ([135, 151, 168], "F"),
    ([226, 189, 114], "G"),
    ([134, 134, 139], "H"),
    ([166, 60, 44], "I"),
    ([236, 151, 119], "J"),
    ([188, 118, 99], "K"),
    ([124, 125, 134], "L"),
    ([165, 165, 161], "M"),
    ([72, 40, 34], "N"),
    ([25, 40, 63], "O"),
    ([64, 63, 68], "P"),
    ([89, 89, 99], "Q"),
    ([151, 94, 88], "R"),
    ([52, 45, 41], "S"),
    ([55, 81, 77], "U"),
    ([116, 181, 138], "T"),
    ([71, 132, 144], "V"),
    ([58, 55, 41], "X"),
    ([218, 146, 123], "Y"),
    ([77, 76, 85], "Z"),
    ([205, 81, 51], "0"),
    ([150, 119, 124], "1"),
    ([209, 164, 24], "2"),
    ([107, 75, 81], "3"),
    ([100, 67, 70], "4"),
    ([214, 170, 148], "5"),
    ([120, 132, 118], "6"),
    ([205, 134, 96], "7"),
    ([69, 62, 58], "8"),
    ([237, 167, 21], "9"),
    ([223, 159, 113], "k"),
    ([207, 77, 44], "l"),
    ([155, 142, 144], "m"),
    ([115, 134, 159], "n"),
    ([124, 125, 134], "!"),
    ([134, 134, 139], "@"),
    ([52, 77, 110], "#"),
    ([89, 111, 136], "$"),
    ([157, 33, 51], "%"),
    ([89, 89, 99], "^"),
    ([135, 41, 47], "&"),
    ([249, 163, 38], "*"),
    ([238, 188, 112], "("),
    ([214, 108, 64], ")"),
    ([57, 76, 84], "-"),
    ([33, 33, 38], "+"),
    ([76, 116, 66], "="),
    ([128, 157, 81], "<"),
    ([45, 74, 50], ">"),
    ([48, 85, 44], "?"),
    ([90, 64, 143], "a"),
    ([118, 88, 164], "a"),
    ([52, 126, 182], "a"),
    ([103, 116, 35], "a"),
    ([33, 33, 38], "a"),
    ([99, 103, 43], "a"),
    ([15, 85, 152], "a"),
    ([25, 40, 63], "a"),
    ([18, 65, 133], "a"),
    ([72, 40, 34], "a"),
    ([100, 67, 70], "a"),
    ([51, 134, 124], "a"),
    ([76, 53, 46], "a"),
    ([68, 88, 84], "a"),
    ([95, 84, 69], "a"),
    ([127, 109, 118], "a"),
    ([106, 85, 45], "a"),
    ([182, 145, 66], "a"),
    ([237, 167, 21], "a"),
    ([245, 111, 40], "a"),
    ([210, 174, 88], "a"),
    ([236, 194, 91], "a"),
    ([229, 182, 22], "a"),
    ([242, 146, 41], "a"),
    ([210, 134, 80], "a"),
    ([186, 82, 69], "a"),
    ([58, 55, 41], "a"),
    ([166, 100, 68], "a"),
    ([90, 36, 39], "a"),
    ([159, 135, 30], "a"),
    ([98, 124, 118], "a"),
    ([139, 102, 87], "a"),
    ([122, 66, 58], "a"),
    ([150, 114, 100], "a"),
    ([68, 69, 51], "a"),
    ([212, 180, 161], "a"),
    ([227, 177, 154], "a"),
    ([147, 128, 135], "a"),
    ([203, 153, 124], "a"),
    ([103, 116, 35], "a"),
    ([169, 104, 44], "a"),
    ([228, 142, 57], "a"),
    ([191, 116, 46], "a"),
    ([93, 95, 94], "a"),
    ([144, 120, 91], "a"),
    ([240, 186, 99], "a"),
    ([233, 168, 36], "a"),
    ([33, 33, 38], "a"),
    ([87, 47, 40], "a"),
    ([77, 76, 85], "a"),
    ([238, 188, 112], "a"),
    ([143, 17, 31], "a"),
    ([207, 77, 44], "a"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn bw() -> Palette {
        Palette::new(vec![
            PaletteEntry::new([0, 0, 0], "B"),
            PaletteEntry::new([255, 255, 255], "W"),
        ])
        .unwrap()
    }

    #[test]
    fn empty_palette_is_rejected() {
        assert!(matches!(Palette::new(Vec::new()), Err(MosaicError::EmptyPalette)));
        assert!(matches!(Palette::from_json("[]"), Err(MosaicError::EmptyPalette)));
    }

    #[test]
    fn default_palette_shape() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 108);
        assert_eq!(palette.entries()[0].rgb, Rgb::new(102, 125, 150));
        assert_eq!(palette.entries()[0].label, "A");
        assert!(palette.entries().iter().all(|e| e.code.is_empty()));
    }

    #[test]
    fn mid_gray_matches_white() {
        assert_eq!(bw().nearest(Rgb::new(128, 128, 128)), 1);
    }

    #[test]
    fn exact_color_matches_itself() {
        let palette = Palette::default();
        let idx = palette.nearest(Rgb::new(209, 164, 24));
        assert_eq!(palette.entries()[idx].rgb, Rgb::new(209, 164, 24));
    }

    #[test]
    fn duplicates_resolve_to_first() {
        let palette = Palette::new(vec![
            PaletteEntry::new([10, 10, 10], "x"),
            PaletteEntry::new([200, 30, 30], "first"),
            PaletteEntry::new([200, 30, 30], "second"),
        ])
        .unwrap();
        assert_eq!(palette.nearest(Rgb::new(200, 30, 30)), 1);

        // The built-in table repeats [124, 125, 134] as "L" and "!".
        let default = Palette::default();
        let idx = default.nearest(Rgb::new(124, 125, 134));
        assert_eq!(default.entries()[idx].label, "L");
    }

    #[test]
    fn far_samples_keep_first_entry() {
        // Pure green is more than 100 away from both blues, so the search
        // never leaves entry 0 even though entry 1 is closer.
        let palette = Palette::new(vec![
            PaletteEntry::new([0, 0, 255], "far"),
            PaletteEntry::new([0, 0, 200], "less far"),
        ])
        .unwrap();
        assert_eq!(palette.nearest(Rgb::new(0, 255, 0)), 0);
    }

    #[test]
    fn json_defaults_label_and_code() {
        let palette = Palette::from_json(r#"[{"rgb": [1, 2, 3]}, {"rgb": [4, 5, 6], "label": "Q", "code": "310"}]"#)
            .unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.entries()[0].label, "");
        assert_eq!(palette.entries()[1].code, "310");
    }

    #[test]
    fn symbol_is_accepted_for_label() {
        let palette = Palette::from_json(r#"[{"code": "", "rgb": [102, 125, 150], "symbol": "A"}]"#).unwrap();
        assert_eq!(palette.entries()[0].label, "A");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Palette::from_json(r#"[{"rgb": [1, 2]}]"#), Err(MosaicError::Json(_))));
    }
}
