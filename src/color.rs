//! sRGB to CIE Lab conversion and the block-matching color distance.

use serde::{Deserialize, Serialize};
use std::fmt;

/// D65 reference white used to normalize XYZ.
const WHITE_X: f64 = 0.95047;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.08883;

/// An 8-bit sRGB color. Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Convert to CIE Lab (D65).
    pub fn to_lab(self) -> Lab {
        let [r, g, b] = self.0.map(|c| srgb_to_linear(c as f64 / 255.0));

        let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / WHITE_X;
        let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) / WHITE_Y;
        let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / WHITE_Z;

        let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// RGBA pixel with full opacity.
    pub fn to_rgba(self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self(c)
    }
}

/// Canonical `r,g,b` form, used as the legend key.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "{r},{g},{b}")
    }
}

/// A color in CIE Lab space. L is roughly 0..100, a/b are signed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn chroma(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

#[inline]
fn srgb_to_linear(v: f64) -> f64 {
    if v > 0.04045 {
        ((v + 0.055) / 1.055).powf(2.4)
    } else {
        v / 12.92
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.powf(1.0 / 3.0)
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Simplified CIE94-style difference between two colors.
///
/// The chroma and hue weights are derived from `a` alone, so the result is
/// not symmetric: `delta_e(a, b)` and `delta_e(b, a)` can differ whenever the
/// two chromas differ. Block matching always passes the sampled pixel as `a`.
pub fn delta_e(a: Rgb, b: Rgb) -> f64 {
    let lab_a = a.to_lab();
    let lab_b = b.to_lab();

    let delta_l = lab_a.l - lab_b.l;
    let delta_a = lab_a.a - lab_b.a;
    let delta_b = lab_a.b - lab_b.b;

    let c1 = lab_a.chroma();
    let c2 = lab_b.chroma();
    let delta_c = c1 - c2;

    // Cancellation can push this slightly below zero.
    let delta_h_sq = delta_a * delta_a + delta_b * delta_b - delta_c * delta_c;
    let delta_h = if delta_h_sq < 0.0 { 0.0 } else { delta_h_sq.sqrt() };

    let sc = 1.0 + 0.045 * c1;
    let sh = 1.0 + 0.015 * c1;

    let dc = delta_c / sc;
    let dh = delta_h / sh;
    let sum = delta_l * delta_l + dc * dc + dh * dh;
    if sum < 0.0 {
        0.0
    } else {
        sum.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn lab_of_black_and_white() {
        let black = Rgb::new(0, 0, 0).to_lab();
        assert!(black.l.abs() < EPS);
        assert!(black.a.abs() < EPS);
        assert!(black.b.abs() < EPS);

        let white = Rgb::new(255, 255, 255).to_lab();
        assert!((white.l - 100.0).abs() < EPS);
        assert!((white.a - 0.005260).abs() < 1e-5);
        assert!((white.b + 0.010408).abs() < 1e-5);
    }

    #[test]
    fn lab_of_red() {
        let red = Rgb::new(255, 0, 0).to_lab();
        assert!((red.l - 53.232882).abs() < 1e-5);
        assert!((red.a - 80.109310).abs() < 1e-5);
        assert!((red.b - 67.220068).abs() < 1e-5);
    }

    #[test]
    fn identical_colors_have_zero_distance() {
        let c = Rgb::new(102, 125, 150);
        assert_eq!(delta_e(c, c), 0.0);
    }

    #[test]
    fn gray_distances() {
        let gray = Rgb::new(128, 128, 128);
        let to_black = delta_e(gray, Rgb::new(0, 0, 0));
        let to_white = delta_e(gray, Rgb::new(255, 255, 255));
        assert!((to_black - 53.585014).abs() < 1e-5);
        assert!((to_white - 46.414987).abs() < 1e-5);
    }

    #[test]
    fn weights_come_from_first_argument() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let forward = delta_e(red, blue);
        let backward = delta_e(blue, red);
        assert!((forward - 70.575975).abs() < 1e-5);
        assert!((backward - 61.242364).abs() < 1e-5);
        assert!((forward - backward).abs() > 1.0);
    }

    #[test]
    fn display_is_legend_key() {
        assert_eq!(Rgb::new(12, 0, 255).to_string(), "12,0,255");
    }

    #[test]
    fn serializes_as_array() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Rgb = serde_json::from_str("[4,5,6]").unwrap();
        assert_eq!(back, Rgb::new(4, 5, 6));
    }
}
