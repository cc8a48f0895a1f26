use std::path::PathBuf;

use clap::Parser;
use image::Rgba;

/// Runtime configuration of the word cloud service.
#[derive(Clone, Debug, Parser)]
#[clap(name = "wcloud-api", version, about = "Render word clouds from posted text")]
pub struct Config {
    /// Address the HTTP server listens on
    #[clap(long, env = "WCLOUD_BIND", default_value = "0.0.0.0:80")]
    pub bind: String,

    /// Directory served under /static, also the default home of fonts and masks
    #[clap(long, env = "WCLOUD_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Font directory, defaults to <static-dir>/fonts
    #[clap(long, env = "WCLOUD_FONTS_DIR")]
    pub fonts_dir: Option<PathBuf>,

    /// Mask directory, defaults to <static-dir>/masks
    #[clap(long, env = "WCLOUD_MASKS_DIR")]
    pub masks_dir: Option<PathBuf>,

    /// Newline separated stopword list, loaded once at startup
    #[clap(long, env = "WCLOUD_STOPWORDS", default_value = "stopwords.txt")]
    pub stopwords: PathBuf,

    #[clap(long, default_value_t = 1600)]
    pub width: u32,

    #[clap(long, default_value_t = 1600)]
    pub height: u32,

    /// Canvas background, any CSS color
    #[clap(long, default_value = "white")]
    pub background: String,

    /// Number of request worker threads
    #[clap(long, env = "WCLOUD_WORKERS")]
    pub workers: Option<usize>,

    /// Write the processed mask of every request to this path
    #[clap(long, env = "WCLOUD_DEBUG_MASK")]
    pub debug_mask: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "0.0.0.0:80".to_string(),
            static_dir: PathBuf::from("static"),
            fonts_dir: None,
            masks_dir: None,
            stopwords: PathBuf::from("stopwords.txt"),
            width: 1600,
            height: 1600,
            background: "white".to_string(),
            workers: None,
            debug_mask: None,
        }
    }
}

impl Config {
    pub fn fonts_dir(&self) -> PathBuf {
        self.fonts_dir
            .clone()
            .unwrap_or_else(|| self.static_dir.join("fonts"))
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.masks_dir
            .clone()
            .unwrap_or_else(|| self.static_dir.join("masks"))
    }

    pub fn workers(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
            .max(1)
    }

    /// Parsed background color. Unparseable values fall back to opaque white.
    pub fn background_color(&self) -> Rgba<u8> {
        match csscolorparser::parse(&self.background) {
            Ok(color) => Rgba(color.to_rgba8()),
            Err(e) => {
                log::warn!("Invalid background color {:?}: {e}", self.background);
                Rgba([255, 255, 255, 255])
            }
        }
    }
}
