use image::imageops::{self, FilterType};

use crate::core::{FrameBgr, OutputSize};
use crate::error::RainbowResult;
use crate::field::BrightnessField;
use crate::palette::Palette;

/// Generate the animated palette-cycling sequence for a single image.
///
/// The image is resized to `output_size` (bilinear), converted to a
/// [`BrightnessField`], and mapped through the palette's band table once per
/// frame; between frames the field advances by `+1 mod 256` per pixel.
/// Frame `i` is therefore a pure function of the source brightness and `i`.
///
/// `frame_count == 0` returns an empty sequence without error. A length-1
/// palette produces identical frames; that is still a valid sequence.
#[tracing::instrument(skip(image, palette), fields(frames = frame_count, colors = palette.len()))]
pub fn rainbowify(
    image: &image::RgbImage,
    frame_count: u32,
    output_size: OutputSize,
    palette: &Palette,
) -> RainbowResult<Vec<FrameBgr>> {
    let (width, height) = output_size.resolve(image.width(), image.height())?;
    let resized;
    let source = if (width, height) == image.dimensions() {
        image
    } else {
        resized = imageops::resize(image, width, height, FilterType::Triangle);
        &resized
    };

    let band_table = palette.band_table();
    let mut field = BrightnessField::from_image(source);

    let mut frames = Vec::with_capacity(frame_count as usize);
    for _ in 0..frame_count {
        frames.push(field.colorize(&band_table));
        field.advance();
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Color, PARTY_PARROT};

    fn flat_image(width: u32, height: u32, rgb: [u8; 3]) -> image::RgbImage {
        image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
    }

    #[test]
    fn zero_frames_yields_empty_sequence() {
        let img = flat_image(4, 4, [10, 20, 30]);
        let frames =
            rainbowify(&img, 0, OutputSize::Source, &Palette::party_parrot()).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn frame_count_and_dimensions_match_request() {
        let img = flat_image(8, 6, [100, 100, 100]);
        let frames =
            rainbowify(&img, 5, OutputSize::Source, &Palette::party_parrot()).unwrap();
        assert_eq!(frames.len(), 5);
        for frame in &frames {
            assert_eq!((frame.width, frame.height), (8, 6));
            assert_eq!(frame.data.len(), 8 * 6 * 3);
        }
    }

    #[test]
    fn explicit_output_size_overrides_source() {
        let img = flat_image(33, 17, [1, 2, 3]);
        let frames = rainbowify(
            &img,
            10,
            OutputSize::Exact {
                width: 10,
                height: 10,
            },
            &Palette::party_parrot(),
        )
        .unwrap();
        assert_eq!(frames.len(), 10);
        assert!(frames.iter().all(|f| (f.width, f.height) == (10, 10)));
    }

    #[test]
    fn scale_factor_truncates_dimensions() {
        let img = flat_image(5, 5, [1, 2, 3]);
        let frames =
            rainbowify(&img, 1, OutputSize::Scale(0.5), &Palette::party_parrot()).unwrap();
        assert_eq!((frames[0].width, frames[0].height), (2, 2));

        let img = flat_image(320, 240, [1, 2, 3]);
        let frames =
            rainbowify(&img, 1, OutputSize::Scale(0.5), &Palette::party_parrot()).unwrap();
        assert_eq!((frames[0].width, frames[0].height), (160, 120));
    }

    #[test]
    fn single_color_palette_is_static() {
        let gradient = image::RgbImage::from_fn(16, 4, |x, _| {
            image::Rgb([(x * 16) as u8, (x * 16) as u8, (x * 16) as u8])
        });
        let palette = Palette::new(vec![Color::bgr(9, 8, 7)]).unwrap();
        let frames = rainbowify(&gradient, 4, OutputSize::Source, &palette).unwrap();
        assert!(frames.iter().all(|f| f == &frames[0]));
        assert!(frames[0].data.chunks_exact(3).all(|px| px == [9, 8, 7]));
    }

    #[test]
    fn black_source_starts_in_the_lowest_band() {
        let img = flat_image(6, 4, [0, 0, 0]);
        let frames =
            rainbowify(&img, 1, OutputSize::Source, &Palette::party_parrot()).unwrap();
        let lowest = PARTY_PARROT[0];
        assert!(
            frames[0]
                .data
                .chunks_exact(3)
                .all(|px| px == [lowest.b, lowest.g, lowest.r])
        );
    }

    #[test]
    fn sequence_repeats_with_period_256() {
        let gradient = image::RgbImage::from_fn(8, 8, |x, y| {
            let v = (x * 31 + y * 7) as u8;
            image::Rgb([v, v, v])
        });
        let frames =
            rainbowify(&gradient, 257, OutputSize::Source, &Palette::six_color_rainbow())
                .unwrap();
        assert_eq!(frames[256], frames[0]);
        assert_ne!(frames[1], frames[0]);
    }
}
