use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use nanorand::{Rng, WyRand};

use crate::{
    mask::Mask,
    sat::{OccupancyMap, Point, Rect},
    text,
};

pub struct Word<'a> {
    pub text: &'a str,
    pub font_size: PxScale,
    pub rotated: bool,
    pub position: Point,
    pub frequency: f32,
    pub index: usize,
}

pub type ColorFunc = fn(&Word, &mut WyRand) -> Rgba<u8>;

/// Tuning of the layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub max_words: usize,
    pub background_color: Rgba<u8>,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub font_step: f32,
    pub word_margin: u32,
    /// Outline drawn along the mask border, 0 disables it.
    pub contour_width: u32,
    pub contour_color: Rgba<u8>,
    pub scale: f32,
    pub rng_seed: Option<u64>,
    /// Probability of placing a word horizontally.
    pub prefer_horizontal: f64,
    pub relative_font_scaling: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            max_words: 5000,
            background_color: Rgba([255, 255, 255, 255]),
            min_font_size: 10.0,
            max_font_size: 80.0,
            font_step: 1.0,
            word_margin: 2,
            contour_width: 0,
            contour_color: Rgba([0, 0, 0, 255]),
            scale: 3.0,
            rng_seed: Some(42),
            prefer_horizontal: 0.45,
            relative_font_scaling: 0.5,
        }
    }
}

impl RenderSettings {
    pub fn with_background_color(mut self, value: Rgba<u8>) -> Self {
        self.background_color = value;
        self
    }

    pub fn with_font_size_range(mut self, min: f32, max: f32) -> Self {
        self.min_font_size = min;
        self.max_font_size = max.max(min);
        self
    }

    pub fn with_scale(mut self, value: f32) -> Self {
        self.scale = value;
        self
    }

    pub fn with_rng_seed(mut self, value: Option<u64>) -> Self {
        self.rng_seed = value;
        self
    }

    pub fn with_contour(mut self, width: u32, color: Rgba<u8>) -> Self {
        self.contour_width = width;
        self.contour_color = color;
        self
    }
}

/// The built-in layout engine: greedy placement, biggest word first, each
/// word at a random free spot of the mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordCloud;

impl WordCloud {
    /// Lays out `words` (weight in `(0, 1]`, descending) and draws them.
    pub fn generate_from_frequencies(
        &self,
        words: &[(&str, f32)],
        mask: &Mask,
        font: &FontVec,
        settings: &RenderSettings,
        color_func: ColorFunc,
    ) -> RgbaImage {
        let mut rng = match settings.rng_seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        let placed = Self::place_words(&mut rng, words, mask, font, settings);
        log::debug!("Placed {} of {} words", placed.len(), words.len());

        let mut image = Self::generate_from_word_positions(
            &mut rng,
            mask.width(),
            mask.height(),
            placed,
            font,
            settings.scale,
            settings.background_color,
            color_func,
        );

        if settings.contour_width > 0 {
            draw_contour(
                &mut image,
                mask,
                settings.contour_width,
                settings.scale,
                settings.contour_color,
            );
        }

        image
    }

    fn place_words<'a>(
        rng: &mut WyRand,
        words: &[(&'a str, f32)],
        mask: &Mask,
        font: &FontVec,
        settings: &RenderSettings,
    ) -> Vec<Word<'a>> {
        let mut occupancy = OccupancyMap::from_mask(mask);
        let margin = settings.word_margin;
        let font_step = settings.font_step.max(1.0);
        let rs = settings.relative_font_scaling;

        let mut font_size = settings.max_font_size;
        let mut last_freq = 1.0;
        let mut final_words = Vec::with_capacity(words.len().min(settings.max_words));

        for (index, &(text, frequency)) in words.iter().take(settings.max_words).enumerate() {
            if frequency <= 0.0 {
                continue;
            }

            if rs != 0.0 {
                font_size = ((rs * (frequency / last_freq) + (1.0 - rs)) * font_size).round();
            }

            let mut rotated = rng.generate::<f64>() >= settings.prefer_horizontal;
            let mut tried_other_orientation = false;

            let found = loop {
                if font_size < settings.min_font_size {
                    break None;
                }

                let coverage = text::rasterize(text, font, PxScale::from(font_size), rotated);
                if coverage.width() > 0 && coverage.height() > 0 {
                    let rect = Rect {
                        width: coverage.width() + margin,
                        height: coverage.height() + margin,
                    };
                    if let Some(point) = occupancy.find_space_for_rect(&rect, rng) {
                        break Some((point, coverage));
                    }
                }

                if !tried_other_orientation && settings.prefer_horizontal < 1.0 {
                    rotated = !rotated;
                    tried_other_orientation = true;
                } else {
                    font_size -= font_step;
                    rotated = false;
                }
            };

            // 放不下了，后面的词更小也不再尝试
            let Some((point, coverage)) = found else {
                break;
            };

            let position = Point {
                x: point.x + margin / 2,
                y: point.y + margin / 2,
            };
            occupancy.occupy(&coverage, position.x, position.y);

            final_words.push(Word {
                text,
                font_size: PxScale::from(font_size),
                rotated,
                position,
                frequency,
                index,
            });
            last_freq = frequency;
        }

        final_words
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_from_word_positions(
        rng: &mut WyRand,
        width: u32,
        height: u32,
        word_positions: Vec<Word>,
        font: &FontVec,
        scale: f32,
        background_color: Rgba<u8>,
        color_func: ColorFunc,
    ) -> RgbaImage {
        let mut final_image_buffer = RgbaImage::from_pixel(
            (width as f32 * scale).round() as u32,
            (height as f32 * scale).round() as u32,
            background_color,
        );

        for word in word_positions {
            let col = color_func(&word, rng);
            let coverage = text::rasterize(
                word.text,
                font,
                PxScale::from(word.font_size.y * scale),
                word.rotated,
            );

            text::draw_coverage_to_rgba_buffer(
                &mut final_image_buffer,
                &coverage,
                (word.position.x as f32 * scale) as u32,
                (word.position.y as f32 * scale) as u32,
                col,
            );
        }

        final_image_buffer
    }
}

/// Paints the border between drawable and blocked mask pixels.
fn draw_contour(image: &mut RgbaImage, mask: &Mask, width: u32, scale: f32, color: Rgba<u8>) {
    let half = ((width as f32 * scale) / 2.0).ceil() as i64;
    let (w, h) = (mask.width(), mask.height());

    for y in 0..h {
        for x in 0..w {
            let inside = mask.is_drawable(x, y);
            let edge = (x + 1 < w && mask.is_drawable(x + 1, y) != inside)
                || (y + 1 < h && mask.is_drawable(x, y + 1) != inside);
            if !edge {
                continue;
            }

            let (cx, cy) = ((x as f32 * scale) as i64, (y as f32 * scale) as i64);
            for py in cy - half..=cy + half {
                for px in cx - half..=cx + half {
                    if px >= 0 && py >= 0 && px < image.width() as i64 && py < image.height() as i64
                    {
                        image.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ab_glyph::FontVec;
    use image::{DynamicImage, GrayImage, Luma, Rgba};
    use nanorand::WyRand;

    use super::{RenderSettings, Word, WordCloud};
    use crate::mask::{self, Mask};

    fn font() -> FontVec {
        let data = std::fs::read(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/DejaVuSans.ttf"
        ))
        .unwrap();
        FontVec::try_from_vec(data).unwrap()
    }

    fn square_mask(size: u32) -> Mask {
        // dark square in the middle of a light frame
        let img = GrayImage::from_fn(size, size, |x, y| {
            let border = size / 8;
            if (border..size - border).contains(&x) && (border..size - border).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        mask::binarize(&DynamicImage::ImageLuma8(img), size, size).unwrap()
    }

    fn black(_: &Word, _: &mut WyRand) -> Rgba<u8> {
        Rgba([0, 0, 0, 255])
    }

    const WORDS: [(&str, f32); 6] = [
        ("cloud", 1.0),
        ("rust", 0.8),
        ("mask", 0.6),
        ("word", 0.4),
        ("layout", 0.3),
        ("glyph", 0.2),
    ];

    #[test]
    fn output_is_canvas_times_scale() {
        let settings = RenderSettings::default()
            .with_scale(2.0)
            .with_font_size_range(6.0, 30.0);
        let image = WordCloud.generate_from_frequencies(
            &WORDS,
            &square_mask(120),
            &font(),
            &settings,
            black,
        );

        assert_eq!(image.dimensions(), (240, 240));
        assert!(image.pixels().any(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn nothing_is_drawn_outside_the_mask() {
        let settings = RenderSettings::default()
            .with_scale(1.0)
            .with_font_size_range(6.0, 30.0);
        let mask = square_mask(120);
        let image = WordCloud.generate_from_frequencies(&WORDS, &mask, &font(), &settings, black);

        for (x, y, p) in image.enumerate_pixels() {
            if !mask.is_drawable(x, y) {
                assert_eq!(*p, Rgba([255, 255, 255, 255]), "ink at ({x}, {y})");
            }
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let settings = RenderSettings::default()
            .with_scale(1.0)
            .with_font_size_range(6.0, 30.0);
        let mask = square_mask(100);
        let font = font();

        let first = WordCloud.generate_from_frequencies(&WORDS, &mask, &font, &settings, black);
        let second = WordCloud.generate_from_frequencies(&WORDS, &mask, &font, &settings, black);

        assert_eq!(first, second);
    }

    #[test]
    fn contour_outlines_the_mask() {
        let settings = RenderSettings::default()
            .with_scale(1.0)
            .with_contour(1, Rgba([0, 0, 255, 255]));
        let mask = square_mask(64);
        let image = WordCloud.generate_from_frequencies(&[], &mask, &font(), &settings, black);

        // the frame is 8 px wide, the border runs between x = 7 and x = 8
        assert_eq!(image.get_pixel(7, 32), &Rgba([0, 0, 255, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }
}
