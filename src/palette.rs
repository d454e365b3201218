use std::path::Path;

use anyhow::Context as _;

use crate::error::{RainbowError, RainbowResult};

/// One palette entry, stored in the crate's B, G, R channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    /// Blue channel.
    pub b: u8,
    /// Green channel.
    pub g: u8,
    /// Red channel.
    pub r: u8,
}

impl Color {
    /// Create a color from B, G, R channel values.
    pub const fn bgr(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// Parse a `#RRGGBB` string (case-insensitive, `#` optional).
    pub fn from_hex(s: &str) -> RainbowResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> RainbowResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| RainbowError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if s.len() != 6 || !s.is_ascii() {
            return Err(RainbowError::validation(format!(
                "color must be #RRGGBB (case-insensitive), got \"{s}\""
            )));
        }
        let r = hex_byte(&s[0..2])?;
        let g = hex_byte(&s[2..4])?;
        let b = hex_byte(&s[4..6])?;
        Ok(Self { b, g, r })
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Color::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => {
                if v.len() != 3 {
                    return Err(serde::de::Error::custom(
                        "color array must have len 3 ([b, g, r])",
                    ));
                }
                Ok(Color::bgr(v[0], v[1], v[2]))
            }
        }
    }
}

/// The classic 6-color spectrum.
pub const SIX_COLOR_RAINBOW: [Color; 6] = [
    Color::bgr(0xFF, 0x00, 0x00),
    Color::bgr(0xFF, 0xFF, 0x00),
    Color::bgr(0x00, 0xFF, 0x00),
    Color::bgr(0x00, 0xFF, 0xFF),
    Color::bgr(0x00, 0x00, 0xFF),
    Color::bgr(0xFF, 0x00, 0xFF),
];

/// 9-color pastel scheme; the default.
pub const PARTY_PARROT: [Color; 9] = [
    Color::bgr(0xFF, 0x6B, 0x6B),
    Color::bgr(0xFF, 0x6B, 0xB5),
    Color::bgr(0xFF, 0x81, 0xFF),
    Color::bgr(0xD0, 0x81, 0xFF),
    Color::bgr(0x81, 0xAC, 0xFF),
    Color::bgr(0x81, 0xFF, 0xFF),
    Color::bgr(0x81, 0xFF, 0x81),
    Color::bgr(0xFF, 0xD0, 0x81),
    Color::bgr(0xFF, 0x81, 0x81),
];

/// Red, white and blue.
pub const PATRIOTIC: [Color; 3] = [
    Color::bgr(0x00, 0x00, 0xFF),
    Color::bgr(0xFF, 0xFF, 0xFF),
    Color::bgr(0xFF, 0x00, 0x00),
];

/// An ordered, non-empty list of colors.
///
/// Order is load-bearing: it defines which brightness band maps to which
/// color, and therefore the direction the animation appears to flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette(Vec<Color>);

impl Palette {
    /// Create a palette; empty input is a validation error.
    pub fn new(colors: impl Into<Vec<Color>>) -> RainbowResult<Self> {
        let colors = colors.into();
        if colors.is_empty() {
            return Err(RainbowError::validation("palette must not be empty"));
        }
        Ok(Self(colors))
    }

    /// The default 9-color pastel scheme.
    pub fn party_parrot() -> Self {
        Self(PARTY_PARROT.to_vec())
    }

    /// The 6-color spectrum scheme.
    pub fn six_color_rainbow() -> Self {
        Self(SIX_COLOR_RAINBOW.to_vec())
    }

    /// The red/white/blue scheme.
    pub fn patriotic() -> Self {
        Self(PATRIOTIC.to_vec())
    }

    /// Load a custom palette from a JSON file: an ordered array of
    /// `"#RRGGBB"` strings or `[b, g, r]` byte triples.
    pub fn from_json_file(path: &Path) -> RainbowResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read palette file '{}'", path.display()))?;
        Self::from_json_slice(&bytes)
    }

    /// Parse a palette from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> RainbowResult<Self> {
        let colors: Vec<Color> = serde_json::from_slice(bytes)
            .map_err(|e| RainbowError::validation(format!("invalid palette JSON: {e}")))?;
        Self::new(colors)
    }

    /// Number of colors (and brightness bands).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for clippy's `len` convention.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Borrow the ordered colors.
    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    /// Build the brightness-to-color band table.
    ///
    /// [0, 256) is split into `len()` contiguous bands; band `k` covers
    /// `floor(k * 256 / len) <= b < floor((k + 1) * 256 / len)`, so the last
    /// band always captures brightness 255. Built once per palette, then each
    /// pixel is a single lookup.
    pub fn band_table(&self) -> Vec<Color> {
        let p = self.0.len();
        let mut table = vec![self.0[0]; 256];
        for (k, &color) in self.0.iter().enumerate() {
            let lower = k * 256 / p;
            let upper = (k + 1) * 256 / p;
            for entry in &mut table[lower..upper] {
                *entry = color;
            }
        }
        table
    }
}
