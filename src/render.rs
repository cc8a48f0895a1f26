use std::{fs, io::Cursor, path::Path};

use ab_glyph::FontVec;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};

use crate::{
    cloud::{ColorFunc, RenderSettings, WordCloud},
    error::Result,
    mask::Mask,
    tokenizer::FrequencyTable,
};

/// Everything the layout engine needs for one image.
pub struct RenderRequest<'a> {
    pub frequencies: &'a FrequencyTable,
    pub mask: &'a Mask,
    pub color_func: ColorFunc,
    pub font_path: &'a Path,
    pub width: u32,
    pub height: u32,
    pub settings: RenderSettings,
}

/// Places words on a canvas and draws them.
pub trait LayoutEngine: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RgbaImage>;
}

/// Reads a font file. Collections (`.ttc`) use their first face.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let data = fs::read(path)?;
    Ok(FontVec::try_from_vec_and_index(data, 0)?)
}

impl LayoutEngine for WordCloud {
    fn render(&self, request: &RenderRequest) -> Result<RgbaImage> {
        if (request.mask.width(), request.mask.height()) != (request.width, request.height) {
            log::warn!(
                "Mask is {}x{}, canvas is {}x{}; laying out on the mask",
                request.mask.width(),
                request.mask.height(),
                request.width,
                request.height
            );
        }

        let font = load_font(request.font_path)?;
        let words = request.frequencies.normalized(request.settings.max_words);

        Ok(self.generate_from_frequencies(
            &words,
            request.mask,
            &font,
            &request.settings,
            request.color_func,
        ))
    }
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image).write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Packages one render request with the service's fixed tuning, runs it
/// through `engine` and returns the PNG bytes.
#[allow(clippy::too_many_arguments)]
pub fn assemble_and_render(
    engine: &dyn LayoutEngine,
    frequencies: &FrequencyTable,
    mask: &Mask,
    color_func: ColorFunc,
    font_path: &Path,
    width: u32,
    height: u32,
    settings: RenderSettings,
) -> Result<Vec<u8>> {
    let request = RenderRequest {
        frequencies,
        mask,
        color_func,
        font_path,
        width,
        height,
        settings,
    };

    let image = engine.render(&request)?;
    encode_png(image)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex};

    use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

    use super::{assemble_and_render, LayoutEngine, RenderRequest};
    use crate::{
        cloud::RenderSettings,
        color::palette_color,
        error::{Error, Result},
        mask,
        tokenizer::{Tokenizer, WhitespaceSegmenter},
    };

    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Option<(usize, RenderSettings)>>,
    }

    impl LayoutEngine for RecordingEngine {
        fn render(&self, request: &RenderRequest) -> Result<RgbaImage> {
            *self.seen.lock().unwrap() =
                Some((request.frequencies.len(), request.settings.clone()));
            Ok(RgbaImage::from_pixel(
                request.width,
                request.height,
                Rgba([255, 255, 255, 255]),
            ))
        }
    }

    fn mask(size: u32) -> mask::Mask {
        let img = GrayImage::from_fn(size, size, |x, _| {
            if x < size / 2 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        mask::binarize(&DynamicImage::ImageLuma8(img), size, size).unwrap()
    }

    #[test]
    fn default_tuning_is_handed_to_the_engine() {
        let table = Tokenizer::new(WhitespaceSegmenter)
            .aggregate("aa bb cc dd ee aa")
            .unwrap();
        let engine = RecordingEngine::default();

        let bytes = assemble_and_render(
            &engine,
            &table,
            &mask(16),
            palette_color,
            Path::new("unused.ttf"),
            16,
            16,
            RenderSettings::default(),
        )
        .unwrap();

        let (words, settings) = engine.seen.lock().unwrap().clone().unwrap();
        assert_eq!(words, 5);
        assert_eq!(settings.max_words, 5000);
        assert_eq!(settings.min_font_size, 10.0);
        assert_eq!(settings.max_font_size, 80.0);
        assert_eq!(settings.scale, 3.0);
        assert_eq!(settings.rng_seed, Some(42));
        assert_eq!(settings.prefer_horizontal, 0.45);
        assert_eq!(settings.contour_width, 0);
        assert_eq!(settings.background_color, Rgba([255, 255, 255, 255]));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn missing_font_surfaces_as_io_error() {
        let table = Tokenizer::new(WhitespaceSegmenter)
            .aggregate("aa bb cc dd ee")
            .unwrap();

        let err = assemble_and_render(
            &crate::cloud::WordCloud,
            &table,
            &mask(16),
            palette_color,
            Path::new("/nonexistent/font.ttf"),
            16,
            16,
            RenderSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
    }
}
