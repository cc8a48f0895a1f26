use image::{Rgb, Rgba};
use nanorand::{Rng, WyRand};

use crate::cloud::Word;

pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 0, 0]),   // red
    Rgb([0, 255, 0]),   // green
    Rgb([0, 0, 255]),   // blue
    Rgb([255, 255, 0]), // yellow
    Rgb([255, 0, 255]), // magenta
    Rgb([0, 255, 255]), // cyan
    Rgb([255, 165, 0]), // orange
    Rgb([128, 0, 128]), // deep purple
];

/// Picks a palette entry with `rng`, or with the thread local generator
/// when no seeded source is given.
pub fn select_color(rng: Option<&mut WyRand>) -> Rgb<u8> {
    let index = match rng {
        Some(rng) => rng.generate_range(0..PALETTE.len()),
        None => nanorand::tls_rng().generate_range(0..PALETTE.len()),
    };

    PALETTE[index]
}

/// Color callback handed to the layout engine, called once per placed word.
pub fn palette_color(_: &Word, rng: &mut WyRand) -> Rgba<u8> {
    let Rgb([r, g, b]) = select_color(Some(rng));
    Rgba([r, g, b, 255])
}
