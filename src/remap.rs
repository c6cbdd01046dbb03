//! Remaps pixels onto a fixed palette.
//!
//! This is the second half of the flattening step: after the quantizer picks a
//! palette, every pixel is replaced by the palette color nearest to it. Alpha
//! bytes pass through untouched.

use crate::PixelBuffer;
use palette::Srgb;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Squared Euclidean distance between two RGB colors.
///
/// At most `3 * 255²`, so it always fits a `u32`. Squared distance orders
/// colors identically to true Euclidean distance and stays exact in integers.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn squared_distance(a: Srgb<u8>, b: Srgb<u8>) -> u32 {
    let dr = i32::from(a.red) - i32::from(b.red);
    let dg = i32::from(a.green) - i32::from(b.green);
    let db = i32::from(a.blue) - i32::from(b.blue);
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the palette color nearest to `color` by squared Euclidean RGB
/// distance. Ties go to the earliest palette entry.
///
/// `palette` must be non-empty and hold at most [`MAX_COLORS`](crate::MAX_COLORS)
/// entries.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn nearest_index(color: Srgb<u8>, palette: &[Srgb<u8>]) -> u8 {
    debug_assert!(!palette.is_empty());
    debug_assert!(palette.len() <= usize::from(crate::MAX_COLORS));
    let mut best = 0;
    let mut best_dist = squared_distance(color, palette[0]);
    for (i, &entry) in palette.iter().enumerate().skip(1) {
        let dist = squared_distance(color, entry);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best as u8
}

/// Replaces every pixel's RGB with its nearest palette color.
///
/// `palette` must be non-empty. Alpha bytes are copied verbatim, so the output
/// buffer differs from the input only in its RGB bytes.
#[must_use]
pub fn remap(buffer: &PixelBuffer, palette: &[Srgb<u8>]) -> PixelBuffer {
    let data = buffer
        .pixels()
        .iter()
        .flat_map(|pixel| remapped_bytes(pixel.color, pixel.alpha, palette))
        .collect();
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}

/// Parallel version of [`remap`].
#[cfg(feature = "threads")]
#[must_use]
pub fn remap_par(buffer: &PixelBuffer, palette: &[Srgb<u8>]) -> PixelBuffer {
    let data = buffer
        .pixels()
        .par_iter()
        .flat_map_iter(|pixel| remapped_bytes(pixel.color, pixel.alpha, palette))
        .collect();
    PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data)
}

/// The four output bytes for one remapped pixel.
fn remapped_bytes(color: Srgb<u8>, alpha: u8, palette: &[Srgb<u8>]) -> [u8; 4] {
    let nearest = palette[usize::from(nearest_index(color, palette))];
    [nearest.red, nearest.green, nearest.blue, alpha]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn nearest_finds_exact_matches() {
        let palette = [Srgb::new(0, 0, 0), Srgb::new(255, 0, 0), Srgb::new(0, 255, 0)];
        for (i, &color) in palette.iter().enumerate() {
            assert_eq!(usize::from(nearest_index(color, &palette)), i);
        }
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let palette = [Srgb::new(10, 0, 0), Srgb::new(30, 0, 0)];
        // (20, 0, 0) is exactly 10 away from both entries.
        assert_eq!(nearest_index(Srgb::new(20, 0, 0), &palette), 0);

        let palette = [Srgb::new(30, 0, 0), Srgb::new(10, 0, 0)];
        assert_eq!(nearest_index(Srgb::new(20, 0, 0), &palette), 0);
    }

    #[test]
    fn remap_output_only_contains_palette_colors() {
        let palette = vec![Srgb::new(0, 0, 0), Srgb::new(128, 128, 128), Srgb::new(255, 255, 255)];
        let buffer = noisy(16, 16, 3);
        let remapped = remap(&buffer, &palette);

        assert_eq!(remapped.width(), buffer.width());
        assert_eq!(remapped.height(), buffer.height());
        for (out, src) in remapped.pixels().iter().zip(buffer.pixels()) {
            assert!(palette.contains(&out.color));
            assert_eq!(out.alpha, src.alpha);
        }
    }

    #[test]
    fn remap_is_idempotent() {
        let palette = vec![Srgb::new(5, 5, 5), Srgb::new(200, 30, 90)];
        let buffer = noisy(8, 8, 11);
        let once = remap(&buffer, &palette);
        let twice = remap(&once, &palette);
        assert_eq!(once, twice);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_sequential() {
        let palette = vec![Srgb::new(0, 0, 0), Srgb::new(90, 10, 200), Srgb::new(255, 255, 255)];
        let buffer = noisy(23, 9, 21);
        assert_eq!(remap_par(&buffer, &palette), remap(&buffer, &palette));
    }
}
