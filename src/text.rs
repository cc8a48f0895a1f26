use ab_glyph::{point, Font, FontVec, Glyph, GlyphId, Point, PxScale, ScaleFont};
use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};

#[derive(Clone, Debug)]
pub struct GlyphData {
    pub glyphs: Vec<Glyph>,
    pub width: u32,
    pub height: u32,
}

//把文本转换为字体，方便画图
pub fn text_to_glyphs(text: &str, font: &FontVec, scale: PxScale) -> GlyphData {
    let scaled_font = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = vec![];
    layout_paragraph(&scaled_font, point(0.0, 0.0), text, &mut glyphs);

    let glyphs_height = scaled_font.height().ceil() as u32;
    let glyphs_width = match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => {
            let max_x = last.position.x + scaled_font.h_advance(last.id);
            (max_x - first.position.x).ceil() as u32
        }
        _ => 0,
    };

    GlyphData {
        glyphs,
        width: glyphs_width,
        height: glyphs_height,
    }
}

/// Renders `text` to a coverage image, rotated 90° counter-clockwise when
/// `rotated` is set. Empty when the text has no extent at this size.
pub fn rasterize(text: &str, font: &FontVec, scale: PxScale, rotated: bool) -> GrayImage {
    let glyph_data = text_to_glyphs(text, font, scale);
    let mut buffer = GrayImage::new(glyph_data.width, glyph_data.height);
    if glyph_data.width == 0 || glyph_data.height == 0 {
        return buffer;
    }

    for glyph in glyph_data.glyphs {
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|x, y, v| {
                let final_x = bounds.min.x as i32 + x as i32;
                let final_y = bounds.min.y as i32 + y as i32;
                if final_x < 0
                    || final_y < 0
                    || final_x >= buffer.width() as i32
                    || final_y >= buffer.height() as i32
                {
                    return;
                }

                let px = buffer.get_pixel_mut(final_x as u32, final_y as u32);
                let coverage = (v.clamp(0.0, 1.0) * 255.0) as u8;
                px.0[0] = px.0[0].max(coverage);
            })
        }
    }

    if rotated {
        image::imageops::rotate270(&buffer)
    } else {
        buffer
    }
}

/// Marks every covered pixel as occupied (1) in the gray buffer.
pub fn draw_coverage_to_gray_buffer(buffer: &mut GrayImage, coverage: &GrayImage, x: u32, y: u32) {
    for (cx, cy, c) in coverage.enumerate_pixels() {
        if c.0[0] == 0 {
            continue;
        }
        let (final_x, final_y) = (x + cx, y + cy);
        if final_x < buffer.width() && final_y < buffer.height() {
            buffer.put_pixel(final_x, final_y, Luma([1]));
        }
    }
}

pub fn draw_coverage_to_rgba_buffer(
    buffer: &mut RgbaImage,
    coverage: &GrayImage,
    x: u32,
    y: u32,
    pixel: Rgba<u8>,
) {
    for (cx, cy, c) in coverage.enumerate_pixels() {
        if c.0[0] == 0 {
            continue;
        }
        let (final_x, final_y) = (x + cx, y + cy);
        if final_x >= buffer.width() || final_y >= buffer.height() {
            continue;
        }

        let v = c.0[0] as f32 / 255.0;
        let px = buffer.get_pixel_mut(final_x, final_y);
        px.apply2(&pixel, |old, new| {
            ((v * new as f32) + (1.0 - v) * old as f32) as u8
        });
        px.0[3] = 0xFF;
    }
}

pub fn layout_paragraph<F, SF>(font: &SF, position: Point, text: &str, target: &mut Vec<Glyph>)
where
    F: Font,
    SF: ScaleFont<F>,
{
    let v_advance = font.height() + font.line_gap();
    let mut caret = position + point(0.0, font.ascent());
    let mut last_glyph: Option<GlyphId> = None;
    for c in text.chars() {
        if c.is_control() {
            if c == '\n' {
                //进行换行
                caret = point(position.x, caret.y + v_advance);
            }
            continue;
        }

        let mut glyph = font.scaled_glyph(c);
        if let Some(previous) = last_glyph.take() {
            caret.x += font.kern(previous, glyph.id);
        }
        glyph.position = caret;
        last_glyph = Some(glyph.id);
        caret.x += font.h_advance(glyph.id);

        target.push(glyph);
    }
}
