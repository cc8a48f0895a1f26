use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Which of the two randomly drawn resources a failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Font,
    Mask,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Font => f.write_str("font"),
            ResourceKind::Mask => f.write_str("mask"),
        }
    }
}

/// How a rejection is reported to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    ServerError,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("text too short: {length} characters")]
    TextTooShort { length: usize },
    #[error("{kind} directory {dir:?} does not exist")]
    ResourceDirectoryMissing { kind: ResourceKind, dir: PathBuf },
    #[error("no usable {kind} file in {dir:?}")]
    ResourceNotFound { kind: ResourceKind, dir: PathBuf },
    #[error("mask is single-valued after correction")]
    MaskUnusable,
    #[error("only {found} qualifying tokens, at least 5 required")]
    InsufficientVocabulary { found: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("font error: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusClass {
        match self {
            Error::MalformedRequest(_)
            | Error::TextTooShort { .. }
            | Error::InsufficientVocabulary { .. } => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.status() {
            StatusClass::ClientError => 400,
            StatusClass::ServerError => 500,
        }
    }

    /// Short reason handed back to the client. Unclassified failures never
    /// leak their detail here.
    pub fn client_message(&self) -> String {
        match self {
            Error::MalformedRequest(reason) => reason.clone(),
            Error::TextTooShort { .. } => "文本内容过短（至少需要10个字符）".to_string(),
            Error::ResourceDirectoryMissing { kind, .. } | Error::ResourceNotFound { kind, .. } => {
                match kind {
                    ResourceKind::Font => "无法加载随机字体".to_string(),
                    ResourceKind::Mask => "无法加载随机遮罩".to_string(),
                }
            }
            Error::MaskUnusable => "遮罩处理失败，无法生成词云".to_string(),
            Error::InsufficientVocabulary { .. } => {
                "有效词太少（少于5个），请提供更多文本".to_string()
            }
            Error::Io(_) | Error::Image(_) | Error::Font(_) => {
                "内部服务器错误".to_string()
            }
        }
    }
}
