//! Colour values and their CSS serialisation.

use std::fmt;

/// 8-bit RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`.
    pub const fn hex(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Brighten (positive) or darken (negative) every channel by `amount`,
    /// saturating at the channel limits.
    pub fn shade(self, amount: i32) -> Self {
        let ch = |c: u8| (c as i32 + amount).clamp(0, 255) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// Per-channel offsets, clamped.
    pub fn offset(self, dr: f32, dg: f32, db: f32) -> Self {
        let ch = |c: u8, d: f32| (c as f32 + d).round().clamp(0.0, 255.0) as u8;
        Self::new(ch(self.r, dr), ch(self.g, dg), ch(self.b, db))
    }

    pub fn scale(self, factor: f32) -> Self {
        let ch = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }

    pub fn alpha(self, a: f32) -> Color {
        Color::Rgba(self, a)
    }

    pub fn opaque(self) -> Color {
        Color::Rgba(self, 1.0)
    }

    /// Normalised channels for GL uniforms and vertex colours.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// A CSS colour with alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    Rgba(Rgb, f32),
    /// Hue in degrees, saturation and lightness in percent.
    Hsla { h: f32, s: f32, l: f32, a: f32 },
}

impl Color {
    pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        Color::Hsla { h, s, l, a }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        rgb.opaque()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgba(Rgb { r, g, b }, a) => {
                write!(f, "rgba({}, {}, {}, {:.3})", r, g, b, a.clamp(0.0, 1.0))
            }
            Color::Hsla { h, s, l, a } => write!(
                f,
                "hsla({:.1}, {:.1}%, {:.1}%, {:.3})",
                h.rem_euclid(360.0),
                s.clamp(0.0, 100.0),
                l.clamp(0.0, 100.0),
                a.clamp(0.0, 1.0)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels() {
        assert_eq!(Rgb::hex(0xFFD700), Rgb::new(255, 215, 0));
        assert_eq!(Rgb::hex(0x5E4125), Rgb::new(94, 65, 37));
    }

    #[test]
    fn shade_saturates() {
        let c = Rgb::new(10, 128, 250);
        assert_eq!(c.shade(-25), Rgb::new(0, 103, 225));
        assert_eq!(c.shade(15), Rgb::new(25, 143, 255));
    }

    #[test]
    fn css_strings() {
        assert_eq!(Rgb::new(1, 2, 3).alpha(0.5).to_string(), "rgba(1, 2, 3, 0.500)");
        assert_eq!(
            Color::hsla(400.0, 80.0, 60.0, 1.0).to_string(),
            "hsla(40.0, 80.0%, 60.0%, 1.000)"
        );
    }
}
