//! RGB color.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// RGB color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from the three most significant bytes of a word.
    pub const fn from_u32(word: u32) -> Self {
        Self { r: (word >> 24) as u8, g: (word >> 16) as u8, b: (word >> 8) as u8 }
    }

    /// Complement of every channel.
    pub const fn inverted(self) -> Self {
        Self { r: 255 - self.r, g: 255 - self.g, b: 255 - self.b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Error returned when a color does not match `0xRRGGBB`.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct ParseRgbError;

impl Display for ParseRgbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "color does not match format 0xRRGGBB")
    }
}

impl std::error::Error for ParseRgbError {}

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Rgb, ParseRgbError> {
        let chars = match s.strip_prefix("0x") {
            Some(chars) if chars.len() == 6 && chars.bytes().all(|c| c.is_ascii_hexdigit()) => {
                chars
            },
            _ => return Err(ParseRgbError),
        };

        match u32::from_str_radix(chars, 16) {
            Ok(color) => Ok(Rgb::from_u32(color << 8)),
            Err(_) => Err(ParseRgbError),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_color() {
        assert_eq!(Rgb::from_str("0x12ab3f"), Ok(Rgb::new(0x12, 0xab, 0x3f)));
        assert_eq!(Rgb::from_str("0xFFFFFF"), Ok(Rgb::WHITE));
        assert_eq!(Rgb::from_str("12ab3f"), Err(ParseRgbError));
        assert_eq!(Rgb::from_str("0x12ab3"), Err(ParseRgbError));
        assert_eq!(Rgb::from_str("0xzzzzzz"), Err(ParseRgbError));
        assert_eq!(Rgb::from_str("0x+12ab3"), Err(ParseRgbError));
    }

    #[test]
    fn display_matches_parse_format() {
        assert_eq!(Rgb::new(0x01, 0xa0, 0xff).to_string(), "0x01a0ff");
    }

    #[test]
    fn top_bytes_of_word() {
        assert_eq!(Rgb::from_u32(0x1122_3344), Rgb::new(0x11, 0x22, 0x33));
    }

    #[test]
    fn inverted_complements_channels() {
        assert_eq!(Rgb::WHITE.inverted(), Rgb::BLACK);
        assert_eq!(Rgb::new(10, 128, 255).inverted(), Rgb::new(245, 127, 0));
    }
}
