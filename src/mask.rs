//! Turns a silhouette image into a strict two-value placement mask.
//!
//! 255 marks the drawable region, 0 the background.

use std::{collections::BTreeSet, path::Path};

use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};

use crate::error::{Error, Result};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// A binarized mask, exactly canvas sized.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask(GrayImage);

impl Mask {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn is_drawable(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] == FOREGROUND
    }

    pub fn distinct_values(&self) -> BTreeSet<u8> {
        distinct_values(&self.0)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Writes the mask as PNG for inspection.
    pub fn save_debug(&self, path: &Path) -> Result<()> {
        self.0.save(path)?;
        log::debug!("Saved processed mask to {}", path.display());
        Ok(())
    }
}

pub fn distinct_values(img: &GrayImage) -> BTreeSet<u8> {
    img.as_raw().iter().copied().collect()
}

/// Dark source pixels (< 128) become drawable.
pub fn threshold_dark(img: &GrayImage) -> GrayImage {
    map_pixels(img, |v| if v < 128 { FOREGROUND } else { BACKGROUND })
}

/// Resamples to the canvas size and collapses the gray values Lanczos
/// introduces: anything above 128 becomes 0, the rest 255.
pub fn resize_and_rethreshold(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    let resized = image::imageops::resize(img, width, height, FilterType::Lanczos3);
    map_pixels(&resized, |v| if v > 128 { BACKGROUND } else { FOREGROUND })
}

pub fn is_degenerate(img: &GrayImage) -> bool {
    distinct_values(img).len() < 2
}

/// Swaps foreground and background.
pub fn invert(img: &GrayImage) -> GrayImage {
    map_pixels(img, |v| if v == BACKGROUND { FOREGROUND } else { BACKGROUND })
}

fn map_pixels(img: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        *px = Luma([f(px.0[0])]);
    }
    out
}

/// Binarizes `source` into a `width` x `height` mask.
///
/// A single-valued result gets one inversion pass; if that still leaves a
/// single value the mask is rejected with [`Error::MaskUnusable`].
pub fn binarize(source: &DynamicImage, width: u32, height: u32) -> Result<Mask> {
    let gray = source.to_luma8();
    log::info!("Source mask values: {:?}", distinct_values(&gray));

    let mut mask = threshold_dark(&gray);
    log::info!("Thresholded mask values: {:?}", distinct_values(&mask));

    if mask.dimensions() != (width, height) {
        mask = resize_and_rethreshold(&mask, width, height);
        log::info!("Resized mask values: {:?}", distinct_values(&mask));
    }

    if is_degenerate(&mask) {
        log::warn!("Mask collapsed to a single value, inverting to recover");
        mask = invert(&mask);
        log::info!("Inverted mask values: {:?}", distinct_values(&mask));

        if is_degenerate(&mask) {
            return Err(Error::MaskUnusable);
        }
    }

    Ok(Mask(mask))
}

/// Loads and binarizes the mask stored at `path`.
pub fn load(path: &Path, width: u32, height: u32) -> Result<Mask> {
    let source = image::open(path)?;
    binarize(&source, width, height)
}
