//! Word cloud rendering service.
//!
//! Posted text is cleaned, segmented and counted; the counts are laid out on
//! a randomly chosen silhouette mask with a randomly chosen font and returned
//! as a PNG.

pub use cloud::{ColorFunc, RenderSettings, Word, WordCloud};
pub use color::{palette_color, select_color, PALETTE};
pub use config::Config;
pub use error::{Error, ResourceKind, Result, StatusClass};
pub use mask::Mask;
pub use normalize::TextNormalizer;
pub use pipeline::{parse_request, Pipeline, Response};
pub use render::{assemble_and_render, encode_png, load_font, LayoutEngine, RenderRequest};
pub use resource::{
    select_random, FsResourceProvider, ResourceProvider, StaticResourceProvider, FONT_EXTENSIONS,
    MASK_EXTENSIONS,
};
pub use stopwords::StopWords;
pub use tokenizer::{FrequencyTable, Segmenter, Tokenizer, WhitespaceSegmenter};

mod cloud;
mod color;
mod config;
mod error;
pub mod mask;
mod normalize;
mod pipeline;
mod render;
mod resource;
mod sat;
pub mod server;
mod stopwords;
mod text;
mod tokenizer;
