#![allow(dead_code)]

use std::sync::OnceLock;

use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use stencille::PixelBuffer;

pub const SIZES: [(&str, u32, u32); 3] =
    [("qvga", 320, 240), ("vga", 640, 480), ("hd", 1280, 720)];

/// A smooth gradient with per-channel noise, which behaves like a photograph
/// under smoothing and quantization.
pub fn photo_like(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let base = [
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 255 / (width + height)) as u8,
            ];
            for channel in base {
                let jitter = rng.gen_range(-16i32..=16);
                data.push((i32::from(channel) + jitter).clamp(0, 255) as u8);
            }
            data.push(255);
        }
    }
    PixelBuffer::from_vec(width, height, data).expect("buffer length matches dimensions")
}

/// Blocky patches drawn from a handful of colors, which segments into
/// paintable regions of varying size.
pub fn poster_like(width: u32, height: u32, patch: u32, seed: u64) -> PixelBuffer {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let palette: Vec<Srgb<u8>> = (0..8)
        .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
        .collect();

    let across = width.div_ceil(patch);
    let down = height.div_ceil(patch);
    let choices: Vec<Srgb<u8>> = (0..across * down)
        .map(|_| palette[rng.gen_range(0..palette.len())])
        .collect();

    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let color = choices[((y / patch) * across + x / patch) as usize];
            data.extend_from_slice(&[color.red, color.green, color.blue, 255]);
        }
    }
    PixelBuffer::from_vec(width, height, data).expect("buffer length matches dimensions")
}

static PHOTO_IMAGES: OnceLock<Vec<(String, PixelBuffer)>> = OnceLock::new();

pub fn photo_images() -> &'static [(String, PixelBuffer)] {
    PHOTO_IMAGES.get_or_init(|| {
        SIZES
            .iter()
            .map(|&(name, width, height)| (name.to_owned(), photo_like(width, height, 0xBEEF)))
            .collect()
    })
}

static POSTER_IMAGES: OnceLock<Vec<(String, PixelBuffer)>> = OnceLock::new();

pub fn poster_images() -> &'static [(String, PixelBuffer)] {
    POSTER_IMAGES.get_or_init(|| {
        SIZES
            .iter()
            .map(|&(name, width, height)| (name.to_owned(), poster_like(width, height, 24, 0xBEEF)))
            .collect()
    })
}
