use std::{path::PathBuf, sync::Arc};

use nanorand::WyRand;
use serde::{Deserialize, Serialize};

use crate::{
    cloud::{RenderSettings, WordCloud},
    color::palette_color,
    config::Config,
    error::{Error, ResourceKind, Result, StatusClass},
    mask,
    normalize::TextNormalizer,
    render::{assemble_and_render, LayoutEngine},
    resource::{
        select_random, FsResourceProvider, ResourceProvider, FONT_EXTENSIONS, MASK_EXTENSIONS,
    },
    stopwords::StopWords,
    tokenizer::{Segmenter, Tokenizer},
};

pub const MIN_TEXT_LENGTH: usize = 10;

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    text: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// A finished HTTP-agnostic reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn png(body: Vec<u8>) -> Self {
        Response {
            status: 200,
            content_type: "image/png",
            body,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
        Response {
            status,
            content_type: "application/json",
            body,
        }
    }
}

/// Text in, PNG out. Shared by every worker; holds no per-request state.
pub struct Pipeline {
    normalizer: TextNormalizer,
    tokenizer: Tokenizer<Box<dyn Segmenter>>,
    provider: Box<dyn ResourceProvider>,
    engine: Box<dyn LayoutEngine>,
    fonts_dir: PathBuf,
    masks_dir: PathBuf,
    width: u32,
    height: u32,
    settings: RenderSettings,
    debug_mask: Option<PathBuf>,
}

impl Pipeline {
    /// Jieba segmentation, resources from the configured directories and the
    /// built-in layout engine.
    pub fn new(config: &Config, stopwords: Arc<StopWords>) -> Self {
        let segmenter: Box<dyn Segmenter> = Box::new(jieba_rs::Jieba::new());

        Pipeline {
            normalizer: TextNormalizer::default(),
            tokenizer: Tokenizer::new(segmenter).with_stopwords(stopwords),
            provider: Box::new(FsResourceProvider),
            engine: Box::new(WordCloud),
            fonts_dir: config.fonts_dir(),
            masks_dir: config.masks_dir(),
            width: config.width,
            height: config.height,
            settings: RenderSettings::default().with_background_color(config.background_color()),
            debug_mask: config.debug_mask.clone(),
        }
    }

    pub fn with_segmenter(mut self, segmenter: impl Segmenter + 'static) -> Self {
        let segmenter: Box<dyn Segmenter> = Box::new(segmenter);
        self.tokenizer = self.tokenizer.with_segmenter(segmenter);
        self
    }

    pub fn with_provider(mut self, provider: impl ResourceProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn with_engine(mut self, engine: impl LayoutEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the whole pipeline for one piece of text.
    pub fn generate(&self, text: &str) -> Result<Vec<u8>> {
        let length = text.chars().count();
        if length < MIN_TEXT_LENGTH {
            return Err(Error::TextTooShort { length });
        }

        let cleaned = self.normalizer.normalize(text);
        let frequencies = self.tokenizer.aggregate(&cleaned)?;
        log::debug!(
            "{} distinct words out of {} tokens",
            frequencies.len(),
            frequencies.total()
        );

        let mut rng = WyRand::new();
        let font_path = select_random(
            self.provider.as_ref(),
            ResourceKind::Font,
            &self.fonts_dir,
            FONT_EXTENSIONS,
            &mut rng,
        )?;
        let mask_path = select_random(
            self.provider.as_ref(),
            ResourceKind::Mask,
            &self.masks_dir,
            MASK_EXTENSIONS,
            &mut rng,
        )?;

        let mask = mask::load(&mask_path, self.width, self.height)?;
        if let Some(path) = &self.debug_mask {
            if let Err(e) = mask.save_debug(path) {
                log::warn!("Unable to write debug mask to {}: {e}", path.display());
            }
        }

        assemble_and_render(
            self.engine.as_ref(),
            &frequencies,
            &mask,
            palette_color,
            &font_path,
            self.width,
            self.height,
            self.settings.clone(),
        )
    }

    /// Parses a request body and turns any outcome into a [`Response`].
    pub fn handle(&self, content_type: Option<&str>, body: &[u8]) -> Response {
        let mut text_length = None;
        let result = parse_request(content_type, body).and_then(|text| {
            text_length = Some(text.chars().count());
            self.generate(&text)
        });

        match result {
            Ok(png) => Response::png(png),
            Err(e) => {
                match e.status() {
                    StatusClass::ClientError => {
                        log::warn!("Rejected request: {e} (text length {text_length:?})")
                    }
                    StatusClass::ServerError => {
                        log::error!("Request failed: {e} (text length {text_length:?})")
                    }
                }
                Response::error(e.status_code(), &e.client_message())
            }
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    let essence = match content_type {
        Some(value) => value.split(';').next().unwrap_or("").trim().to_ascii_lowercase(),
        None => return false,
    };

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Extracts `text` from a JSON body. A missing field reads as empty text.
pub fn parse_request(content_type: Option<&str>, body: &[u8]) -> Result<String> {
    if !is_json(content_type) {
        return Err(Error::MalformedRequest(
            "请求必须是 application/json 格式".to_string(),
        ));
    }

    let request: GenerateRequest = serde_json::from_slice(body).map_err(|e| {
        log::warn!("Invalid JSON body: {e}");
        Error::MalformedRequest("无效的 JSON 数据".to_string())
    })?;

    Ok(request.text.unwrap_or_default())
}
