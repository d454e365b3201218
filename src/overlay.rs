use image::imageops::{self, FilterType};

use crate::core::FrameBgr;
use crate::error::{RainbowError, RainbowResult};

/// Fraction of frame width the caption occupies.
pub const CAPTION_WIDTH_FRAC: f64 = 0.9;
/// Fraction of frame height the caption occupies.
pub const CAPTION_HEIGHT_FRAC: f64 = 0.15;

/// Glyph size used when rasterizing the caption; the bitmap is stretched to
/// the frame-relative fractions afterwards, so this only sets raster detail.
const CAPTION_FONT_PX: u32 = 64;

/// Cap on the intermediate raster canvas.
const MAX_CANVAS_DIM: u32 = 16_384;

/// Stamp `caption` onto every frame of a sequence.
///
/// An empty caption is the identity. The caption bitmap is rendered and
/// resized exactly once, then OR-composited onto each frame, horizontally
/// centered and offset from the top by half the caption height fraction.
pub fn overlay(frames: Vec<FrameBgr>, caption: &str) -> RainbowResult<Vec<FrameBgr>> {
    if caption.is_empty() || frames.is_empty() {
        return Ok(frames);
    }
    let bitmap = render_caption(caption)?;
    composite(frames, &bitmap)
}

/// Rasterize a caption as white text on black, cropped to the glyph extents.
///
/// The caption is laid out as an SVG `<text>` element in a generic sans-serif
/// family and rasterized with resvg; system fonts are resolved through usvg's
/// font database. A caption that produces no visible glyphs (for example on a
/// host with no usable fonts) is a font error, not an empty bitmap.
pub fn render_caption(caption: &str) -> RainbowResult<FrameBgr> {
    if caption.is_empty() {
        return Err(RainbowError::validation("caption must be non-empty"));
    }

    // One glyph cell per char plus slack for wide glyphs; the tight crop
    // below removes whatever is unused.
    let canvas_w = (caption.chars().count() as u32)
        .saturating_add(1)
        .saturating_mul(CAPTION_FONT_PX)
        .min(MAX_CANVAS_DIM);
    let canvas_h = CAPTION_FONT_PX * 2;

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{canvas_w}" height="{canvas_h}"><text x="0" y="{baseline}" font-family="sans-serif" font-size="{size}" fill="#ffffff">{text}</text></svg>"##,
        baseline = CAPTION_FONT_PX,
        size = CAPTION_FONT_PX,
        text = escape_xml(caption),
    );

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| RainbowError::font(format!("caption layout failed: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas_w, canvas_h)
        .ok_or_else(|| RainbowError::font("failed to allocate caption pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    crop_to_glyphs(&pixmap).ok_or_else(|| {
        RainbowError::font(format!(
            "caption \"{caption}\" produced no visible glyphs (no usable system fonts?)"
        ))
    })
}

/// Composite a pre-rendered caption bitmap onto every frame.
///
/// The bitmap is resized once to `CAPTION_WIDTH_FRAC` x `CAPTION_HEIGHT_FRAC`
/// of the frame and OR-ed byte-wise into each frame, so glyph pixels light up
/// and black bitmap pixels leave the frame untouched. A caption region that
/// does not fit inside the frame is a configuration error.
pub fn composite(mut frames: Vec<FrameBgr>, caption: &FrameBgr) -> RainbowResult<Vec<FrameBgr>> {
    let Some(first) = frames.first() else {
        return Ok(frames);
    };
    let (frame_w, frame_h) = (first.width, first.height);

    let text_w = (f64::from(frame_w) * CAPTION_WIDTH_FRAC) as u32;
    let text_h = (f64::from(frame_h) * CAPTION_HEIGHT_FRAC) as u32;
    if text_w == 0 || text_h == 0 {
        return Err(RainbowError::validation(format!(
            "frame {frame_w}x{frame_h} is too small to hold a caption"
        )));
    }

    let x0 = (frame_w - text_w) / 2;
    let y0 = (f64::from(frame_h) * CAPTION_HEIGHT_FRAC / 2.0) as u32;
    if x0 + text_w > frame_w || y0 + text_h > frame_h {
        return Err(RainbowError::validation(format!(
            "caption region {text_w}x{text_h} at ({x0}, {y0}) exceeds frame {frame_w}x{frame_h}"
        )));
    }

    let resized = FrameBgr::from_rgb_image(&imageops::resize(
        &caption.to_rgb_image(),
        text_w,
        text_h,
        FilterType::Triangle,
    ));

    for frame in &mut frames {
        if (frame.width, frame.height) != (frame_w, frame_h) {
            return Err(RainbowError::validation(
                "all frames in a sequence must share dimensions",
            ));
        }
        for row in 0..text_h {
            let src_start = (row as usize) * (text_w as usize) * 3;
            let src = &resized.data[src_start..src_start + (text_w as usize) * 3];
            let dst_start = frame.offset(x0, y0 + row);
            let dst = &mut frame.data[dst_start..dst_start + (text_w as usize) * 3];
            for (d, s) in dst.iter_mut().zip(src) {
                *d |= s;
            }
        }
    }
    Ok(frames)
}

/// Crop a premultiplied RGBA pixmap to the bounding box of non-transparent
/// pixels, returning it as BGR over black. `None` when fully transparent.
fn crop_to_glyphs(pixmap: &resvg::tiny_skia::Pixmap) -> Option<FrameBgr> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let data = pixmap.data();

    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for y in 0..h {
        for x in 0..w {
            let a = data[(((y * w) + x) as usize) * 4 + 3];
            if a > 0 {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    if min_x > max_x || min_y > max_y {
        return None;
    }

    let mut out = FrameBgr::new(max_x - min_x + 1, max_y - min_y + 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let src = (((y * w) + x) as usize) * 4;
            let dst = out.offset(x - min_x, y - min_y);
            // Premultiplied over a black background is just the RGB bytes.
            out.data[dst] = data[src + 2];
            out.data[dst + 1] = data[src + 1];
            out.data[dst + 2] = data[src];
        }
    }
    Some(out)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
