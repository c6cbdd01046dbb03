//! A deterministic k-means palette generator.
//!
//! Unlike the usual k-means, nothing here is randomized: the initial centroids
//! are taken from evenly strided pixel positions, so the same buffer and
//! palette size always produce the same palette. Refinement runs Lloyd's
//! rounds with integer-rounded channel means and stops as soon as a round
//! leaves every centroid unchanged, or after [`MAX_ROUNDS`] rounds otherwise.

use crate::{remap::nearest_index, PaletteSize, PixelBuffer, QuantizeOutput};
use palette::{Srgb, Srgba};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Upper bound on refinement rounds before giving up on convergence.
pub const MAX_ROUNDS: u32 = 20;

/// Computes a color palette for the buffer.
///
/// The returned [`QuantizeOutput`] has exactly `k` palette entries and their
/// assignment counts; `indices` is left empty. See [`indexed_palette`] to get
/// the per-pixel palette indices as well.
#[must_use]
pub fn palette(buffer: &PixelBuffer, k: PaletteSize) -> QuantizeOutput {
    let pixels = buffer.pixels();
    let centroids = refine(pixels, k, step);
    let counts = count_assignments(pixels, &centroids);
    QuantizeOutput { palette: centroids, counts, indices: Vec::new() }
}

/// Computes a color palette along with an index into it for every pixel.
#[must_use]
pub fn indexed_palette(buffer: &PixelBuffer, k: PaletteSize) -> QuantizeOutput {
    let pixels = buffer.pixels();
    let centroids = refine(pixels, k, step);
    let indices: Vec<u8> = pixels
        .iter()
        .map(|pixel| nearest_index(pixel.color, &centroids))
        .collect();
    let counts = counts_from_indices(&indices, centroids.len());
    QuantizeOutput { palette: centroids, counts, indices }
}

/// Parallel version of [`palette`]. The result is identical to the sequential
/// version, since per-cluster sums are integers and order-insensitive.
#[cfg(feature = "threads")]
#[must_use]
pub fn palette_par(buffer: &PixelBuffer, k: PaletteSize) -> QuantizeOutput {
    let pixels = buffer.pixels();
    let centroids = refine(pixels, k, step_par);
    let counts = counts_par(pixels, &centroids);
    QuantizeOutput { palette: centroids, counts, indices: Vec::new() }
}

/// Parallel version of [`indexed_palette`].
#[cfg(feature = "threads")]
#[must_use]
pub fn indexed_palette_par(buffer: &PixelBuffer, k: PaletteSize) -> QuantizeOutput {
    let pixels = buffer.pixels();
    let centroids = refine(pixels, k, step_par);
    let indices: Vec<u8> = pixels
        .par_iter()
        .map(|pixel| nearest_index(pixel.color, &centroids))
        .collect();
    let counts = counts_from_indices(&indices, centroids.len());
    QuantizeOutput { palette: centroids, counts, indices }
}

/// Runs refinement rounds until the centroids settle or [`MAX_ROUNDS`] is hit.
fn refine<F>(pixels: &[Srgba<u8>], k: PaletteSize, step: F) -> Vec<Srgb<u8>>
where
    F: Fn(&[Srgba<u8>], &[Srgb<u8>]) -> Vec<Srgb<u8>>,
{
    let mut centroids = initial_centroids(pixels, usize::from(k.into_inner()));
    let mut converged = false;
    for _ in 0..MAX_ROUNDS {
        let next = step(pixels, &centroids);
        if next == centroids {
            converged = true;
            break;
        }
        centroids = next;
    }
    if !converged {
        log::warn!("palette did not stabilize within {MAX_ROUNDS} rounds, keeping the last iterate");
    }
    centroids
}

/// Evenly strided initial centroids: centroid `i` is the pixel at flat index
/// `floor(len / k) * i`.
///
/// For `k` greater than the pixel count the stride is zero and every centroid
/// starts at pixel zero; refinement then leaves the surplus centroids black.
fn initial_centroids(pixels: &[Srgba<u8>], k: usize) -> Vec<Srgb<u8>> {
    let stride = pixels.len() / k;
    (0..k).map(|i| pixels[stride * i].color).collect()
}

/// One assignment plus recompute round, returning the new centroids.
fn step(pixels: &[Srgba<u8>], centroids: &[Srgb<u8>]) -> Vec<Srgb<u8>> {
    let mut sums = vec![[0u64; 3]; centroids.len()];
    let mut counts = vec![0u32; centroids.len()];
    for pixel in pixels {
        accumulate(&mut sums, &mut counts, centroids, pixel.color);
    }
    means(&sums, &counts)
}

/// Parallel version of [`step`].
#[cfg(feature = "threads")]
fn step_par(pixels: &[Srgba<u8>], centroids: &[Srgb<u8>]) -> Vec<Srgb<u8>> {
    let k = centroids.len();
    let (sums, counts) = pixels
        .par_iter()
        .fold(
            || (vec![[0u64; 3]; k], vec![0u32; k]),
            |(mut sums, mut counts), pixel| {
                accumulate(&mut sums, &mut counts, centroids, pixel.color);
                (sums, counts)
            },
        )
        .reduce(
            || (vec![[0u64; 3]; k], vec![0u32; k]),
            |(mut sums, mut counts), (other_sums, other_counts)| {
                for (sum, other) in sums.iter_mut().zip(&other_sums) {
                    sum[0] += other[0];
                    sum[1] += other[1];
                    sum[2] += other[2];
                }
                for (count, other) in counts.iter_mut().zip(&other_counts) {
                    *count += other;
                }
                (sums, counts)
            },
        );
    means(&sums, &counts)
}

/// Adds one pixel to the sums and counts of its nearest centroid.
fn accumulate(sums: &mut [[u64; 3]], counts: &mut [u32], centroids: &[Srgb<u8>], color: Srgb<u8>) {
    let i = usize::from(nearest_index(color, centroids));
    let sum = &mut sums[i];
    sum[0] += u64::from(color.red);
    sum[1] += u64::from(color.green);
    sum[2] += u64::from(color.blue);
    counts[i] += 1;
}

/// Integer-rounded per-channel means; a centroid with no pixels resets to black.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn means(sums: &[[u64; 3]], counts: &[u32]) -> Vec<Srgb<u8>> {
    sums.iter()
        .zip(counts)
        .map(|(sum, &count)| {
            if count == 0 {
                Srgb::new(0, 0, 0)
            } else {
                let mean = |s: u64| (s as f64 / f64::from(count)).round() as u8;
                Srgb::new(mean(sum[0]), mean(sum[1]), mean(sum[2]))
            }
        })
        .collect()
}

/// Counts how many pixels map to each centroid.
fn count_assignments(pixels: &[Srgba<u8>], centroids: &[Srgb<u8>]) -> Vec<u32> {
    let mut counts = vec![0u32; centroids.len()];
    for pixel in pixels {
        counts[usize::from(nearest_index(pixel.color, centroids))] += 1;
    }
    counts
}

/// Parallel version of [`count_assignments`].
#[cfg(feature = "threads")]
fn counts_par(pixels: &[Srgba<u8>], centroids: &[Srgb<u8>]) -> Vec<u32> {
    pixels
        .par_iter()
        .fold(
            || vec![0u32; centroids.len()],
            |mut counts, pixel| {
                counts[usize::from(nearest_index(pixel.color, centroids))] += 1;
                counts
            },
        )
        .reduce(
            || vec![0u32; centroids.len()],
            |mut counts, other| {
                for (count, other) in counts.iter_mut().zip(&other) {
                    *count += other;
                }
                counts
            },
        )
}

/// Rebuilds per-centroid counts from precomputed indices.
fn counts_from_indices(indices: &[u8], k: usize) -> Vec<u32> {
    let mut counts = vec![0u32; k];
    for &i in indices {
        counts[usize::from(i)] += 1;
    }
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn assert_well_formed(output: &QuantizeOutput, buffer: &PixelBuffer, k: u16) {
        assert_eq!(output.palette.len(), usize::from(k));
        assert_eq!(output.counts.len(), usize::from(k));
        assert_eq!(output.counts.iter().sum::<u32>(), buffer.num_pixels());
        for &i in &output.indices {
            assert!(u16::from(i) < k);
        }
    }

    #[test]
    fn solid_image_single_color() {
        let color = Srgb::new(40, 90, 200);
        let buffer = solid(4, 4, color);
        let output = indexed_palette(&buffer, 1u16.try_into().unwrap());

        assert_well_formed(&output, &buffer, 1);
        assert_eq!(output.palette, vec![color]);
        assert_eq!(output.counts, vec![16]);
        assert_eq!(output.indices, vec![0; 16]);
    }

    #[test]
    fn two_pixels_two_colors() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let buffer = from_rgb(2, 1, &[black, white]);
        let output = indexed_palette(&buffer, 2u16.try_into().unwrap());

        // Initialization strides the buffer, so the order is black then white.
        assert_eq!(output.palette, vec![black, white]);
        assert_eq!(output.counts, vec![1, 1]);
        assert_eq!(output.indices, vec![0, 1]);
    }

    #[test]
    fn distinct_colors_are_reproduced_exactly() {
        let colors = [Srgb::new(255, 0, 0), Srgb::new(0, 255, 0), Srgb::new(0, 0, 255)];
        let buffer = from_rgb(3, 1, &colors);
        let output = palette(&buffer, 3u16.try_into().unwrap());

        assert_eq!(output.palette, colors.to_vec());
        assert_eq!(output.counts, vec![1, 1, 1]);
        assert!(output.indices.is_empty());
    }

    #[test]
    fn duplicate_init_leaves_empty_clusters_black() {
        let white = Srgb::new(255, 255, 255);
        let buffer = solid(2, 1, white);
        let output = palette(&buffer, 2u16.try_into().unwrap());

        // Both centroids start white; all pixels go to the first, the second
        // empties out and resets to black.
        assert_eq!(output.palette, vec![white, Srgb::new(0, 0, 0)]);
        assert_eq!(output.counts, vec![2, 0]);
    }

    #[test]
    fn more_colors_than_pixels() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let buffer = from_rgb(2, 1, &[black, white]);
        let output = indexed_palette(&buffer, 5u16.try_into().unwrap());

        // Zero stride starts every centroid at pixel zero; the pixels then
        // split off into the first two slots and the rest decay to black.
        assert_eq!(output.palette, vec![white, black, black, black, black]);
        assert_eq!(output.counts, vec![1, 1, 0, 0, 0]);
        assert_eq!(output.indices, vec![1, 0]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let buffer = noisy(32, 24, 5);
        let k = 6u16.try_into().unwrap();
        let first = indexed_palette(&buffer, k);
        let second = indexed_palette(&buffer, k);
        assert_eq!(first, second);
        assert_well_formed(&first, &buffer, 6);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_sequential() {
        let buffer = noisy(40, 30, 8);
        let k = 7u16.try_into().unwrap();

        let sequential = palette(&buffer, k);
        let parallel = palette_par(&buffer, k);
        assert_eq!(sequential, parallel);

        let sequential = indexed_palette(&buffer, k);
        let parallel = indexed_palette_par(&buffer, k);
        assert_eq!(sequential, parallel);
    }
}
