use crate::core::FrameBgr;
use crate::palette::Color;

/// Per-pixel brightness (luma) grid derived once from the source image.
///
/// This is the sequential state machine at the heart of the effect: the
/// generation loop owns the field exclusively, reads it to colorize frame
/// `i`, then advances every value by `+1 mod 256` before frame `i + 1`. The
/// 8-bit wraparound is what re-bands pixels over time and produces the
/// animated flow, so it must stay bit-exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrightnessField {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BrightnessField {
    /// Derive a field from an RGB image using fixed BT.601 luma weights.
    pub fn from_image(img: &image::RgbImage) -> Self {
        let data = img.pixels().map(|px| luma601(px.0)).collect();
        Self {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    /// Build a field from raw luma values; panics if the length mismatches.
    pub fn from_luma(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(data.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            data,
        }
    }

    /// Field width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Field height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Advance the state machine by one frame: `+1 mod 256` per element.
    pub fn advance(&mut self) {
        for v in &mut self.data {
            *v = v.wrapping_add(1);
        }
    }

    /// Map every brightness value through a 256-entry band table into a BGR
    /// frame.
    pub fn colorize(&self, band_table: &[Color]) -> FrameBgr {
        debug_assert_eq!(band_table.len(), 256);
        let mut frame = FrameBgr::new(self.width, self.height);
        for (px, &b) in frame.data.chunks_exact_mut(3).zip(&self.data) {
            let color = band_table[b as usize];
            px[0] = color.b;
            px[1] = color.g;
            px[2] = color.r;
        }
        frame
    }
}

/// BT.601 luma: 0.299 R + 0.587 G + 0.114 B, rounded to nearest.
fn luma601([r, g, b]: [u8; 3]) -> u8 {
    ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b) + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    #[test]
    fn luma_of_primaries() {
        assert_eq!(luma601([255, 255, 255]), 255);
        assert_eq!(luma601([0, 0, 0]), 0);
        assert_eq!(luma601([255, 0, 0]), 76); // round(0.299 * 255)
        assert_eq!(luma601([0, 255, 0]), 150); // round(0.587 * 255)
        assert_eq!(luma601([0, 0, 255]), 29); // round(0.114 * 255)
    }

    #[test]
    fn advance_wraps_at_256() {
        let mut field = BrightnessField::from_luma(2, 1, vec![254, 255]);
        field.advance();
        assert_eq!(field, BrightnessField::from_luma(2, 1, vec![255, 0]));
    }

    #[test]
    fn field_cycle_length_is_exactly_256() {
        let original = BrightnessField::from_luma(2, 2, vec![0, 17, 128, 255]);
        let mut field = original.clone();
        for _ in 0..256 {
            field.advance();
        }
        assert_eq!(field, original);
    }

    #[test]
    fn colorize_is_a_single_band_lookup() {
        let palette = Palette::patriotic();
        let table = palette.band_table();
        let field = BrightnessField::from_luma(3, 1, vec![0, 100, 255]);
        let frame = field.colorize(&table);
        assert_eq!(frame.bgr_at(0, 0), [0x00, 0x00, 0xFF]);
        assert_eq!(frame.bgr_at(1, 0), [0xFF, 0xFF, 0xFF]);
        assert_eq!(frame.bgr_at(2, 0), [0xFF, 0x00, 0x00]);
    }
}
