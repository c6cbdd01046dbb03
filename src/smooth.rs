//! Pre-quantization smoothing filters.
//!
//! Two filters are available: a separable gaussian blur and an edge-preserving
//! bilateral filter. Both run entirely on the stored RGB bytes, clamp their
//! sample coordinates to the image edges, and copy alpha through unchanged.
//! A radius of zero leaves the buffer untouched for either filter.

use crate::{remap::squared_distance, PixelBuffer};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Sigma for both the spatial and color terms of the bilateral weight.
const BILATERAL_SIGMA: f64 = 30.0;

/// Which smoothing filter to run before quantization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmoothingKind {
    /// Separable gaussian blur with `sigma = radius / 3`.
    #[default]
    Gaussian,
    /// Single-pass bilateral filter with fixed spatial and color sigmas of 30.
    ///
    /// Smooths gradients while bleeding less across strong color edges than
    /// the gaussian does.
    Bilateral,
}

impl SmoothingKind {
    /// Runs this filter over `src` with the given radius and returns the
    /// smoothed copy.
    #[must_use]
    pub fn apply(self, src: &PixelBuffer, radius: u32) -> PixelBuffer {
        match self {
            Self::Gaussian => gaussian(src, radius),
            Self::Bilateral => bilateral(src, radius),
        }
    }

    /// Parallel version of [`SmoothingKind::apply`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn apply_par(self, src: &PixelBuffer, radius: u32) -> PixelBuffer {
        match self {
            Self::Gaussian => gaussian_par(src, radius),
            Self::Bilateral => bilateral_par(src, radius),
        }
    }
}

/// Direction of one separable convolution pass.
#[derive(Debug, Clone, Copy)]
enum Axis {
    /// Taps run along a row.
    Horizontal,
    /// Taps run along a column.
    Vertical,
}

/// Blurs `src` with a gaussian kernel of the given radius.
///
/// The kernel has `2 * radius + 1` taps with `sigma = radius / 3`, normalized
/// to sum to one. The horizontal pass runs first and is rounded back to bytes
/// before the vertical pass samples it.
#[must_use]
pub fn gaussian(src: &PixelBuffer, radius: u32) -> PixelBuffer {
    let kernel = gaussian_kernel(radius);
    let horizontal = convolve_axis(src, &kernel, Axis::Horizontal);
    convolve_axis(&horizontal, &kernel, Axis::Vertical)
}

/// Parallel version of [`gaussian`].
#[cfg(feature = "threads")]
#[must_use]
pub fn gaussian_par(src: &PixelBuffer, radius: u32) -> PixelBuffer {
    let kernel = gaussian_kernel(radius);
    let horizontal = convolve_axis_par(src, &kernel, Axis::Horizontal);
    convolve_axis_par(&horizontal, &kernel, Axis::Vertical)
}

/// Smooths `src` with a bilateral filter over a `(2 * radius + 1)²` window.
///
/// Each window sample is weighted by `exp(-d_spatial / (2σ²)) *
/// exp(-d_color / (2σ²))` where both distances are plain (not squared)
/// Euclidean distances and the color distance is measured against the
/// unfiltered center pixel.
#[must_use]
pub fn bilateral(src: &PixelBuffer, radius: u32) -> PixelBuffer {
    let spatial = spatial_weights(radius);
    let data = (0..src.height())
        .flat_map(|y| bilateral_row(src, &spatial, radius, y))
        .collect();
    PixelBuffer::new_unchecked(src.width(), src.height(), data)
}

/// Parallel version of [`bilateral`].
#[cfg(feature = "threads")]
#[must_use]
pub fn bilateral_par(src: &PixelBuffer, radius: u32) -> PixelBuffer {
    let spatial = spatial_weights(radius);
    let data = (0..src.height())
        .into_par_iter()
        .flat_map_iter(|y| bilateral_row(src, &spatial, radius, y))
        .collect();
    PixelBuffer::new_unchecked(src.width(), src.height(), data)
}

/// Runs one separable convolution pass over the whole buffer.
fn convolve_axis(src: &PixelBuffer, kernel: &[f64], axis: Axis) -> PixelBuffer {
    let data = (0..src.height())
        .flat_map(|y| convolve_row(src, kernel, axis, y))
        .collect();
    PixelBuffer::new_unchecked(src.width(), src.height(), data)
}

/// Parallel version of [`convolve_axis`]; rows are independent.
#[cfg(feature = "threads")]
fn convolve_axis_par(src: &PixelBuffer, kernel: &[f64], axis: Axis) -> PixelBuffer {
    let data = (0..src.height())
        .into_par_iter()
        .flat_map_iter(|y| convolve_row(src, kernel, axis, y))
        .collect();
    PixelBuffer::new_unchecked(src.width(), src.height(), data)
}

/// Convolves row `y` of `src` along `axis`, returning its RGBA bytes.
#[allow(clippy::cast_possible_wrap)]
fn convolve_row(src: &PixelBuffer, kernel: &[f64], axis: Axis, y: u32) -> Vec<u8> {
    let radius = (kernel.len() / 2) as i64;
    let mut row = Vec::with_capacity(src.width() as usize * 4);
    for x in 0..src.width() {
        let (mut r, mut g, mut b) = (0.0, 0.0, 0.0);
        let mut weight_sum = 0.0;
        for (tap, &weight) in kernel.iter().enumerate() {
            let offset = tap as i64 - radius;
            let (sx, sy) = match axis {
                Axis::Horizontal => (clamp_coord(i64::from(x) + offset, src.width()), y),
                Axis::Vertical => (x, clamp_coord(i64::from(y) + offset, src.height())),
            };
            let sample = src.rgb(sx, sy);
            r += f64::from(sample.red) * weight;
            g += f64::from(sample.green) * weight;
            b += f64::from(sample.blue) * weight;
            weight_sum += weight;
        }
        row.push(round_channel(r / weight_sum));
        row.push(round_channel(g / weight_sum));
        row.push(round_channel(b / weight_sum));
        row.push(src.rgba(x, y).alpha);
    }
    row
}

/// Filters row `y` of `src` bilaterally, returning its RGBA bytes.
fn bilateral_row(src: &PixelBuffer, spatial: &[f64], radius: u32, y: u32) -> Vec<u8> {
    let r = i64::from(radius);
    let denom = 2.0 * BILATERAL_SIGMA * BILATERAL_SIGMA;
    let mut row = Vec::with_capacity(src.width() as usize * 4);
    for x in 0..src.width() {
        let center = src.rgb(x, y);
        let (mut red, mut green, mut blue) = (0.0, 0.0, 0.0);
        let mut weight_sum = 0.0;
        let mut tap = 0;
        for ky in -r..=r {
            for kx in -r..=r {
                let sx = clamp_coord(i64::from(x) + kx, src.width());
                let sy = clamp_coord(i64::from(y) + ky, src.height());
                let sample = src.rgb(sx, sy);
                let color_dist = f64::from(squared_distance(center, sample)).sqrt();
                let weight = spatial[tap] * (-color_dist / denom).exp();
                red += f64::from(sample.red) * weight;
                green += f64::from(sample.green) * weight;
                blue += f64::from(sample.blue) * weight;
                weight_sum += weight;
                tap += 1;
            }
        }
        row.push(round_channel(red / weight_sum));
        row.push(round_channel(green / weight_sum));
        row.push(round_channel(blue / weight_sum));
        row.push(src.rgba(x, y).alpha);
    }
    row
}

/// Normalized 1D gaussian kernel with `2 * radius + 1` taps and `sigma = radius / 3`.
///
/// A radius of zero yields the single-tap identity kernel.
fn gaussian_kernel(radius: u32) -> Vec<f64> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = f64::from(radius) / 3.0;
    let denom = 2.0 * sigma * sigma;
    let r = i64::from(radius);
    #[allow(clippy::cast_precision_loss)]
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|i| {
            let fi = i as f64;
            (-(fi * fi) / denom).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Spatial bilateral weight for every window offset, in `(ky, kx)` scan order.
fn spatial_weights(radius: u32) -> Vec<f64> {
    let r = i64::from(radius);
    let denom = 2.0 * BILATERAL_SIGMA * BILATERAL_SIGMA;
    let side = 2 * radius as usize + 1;
    let mut weights = Vec::with_capacity(side * side);
    #[allow(clippy::cast_precision_loss)]
    for ky in -r..=r {
        for kx in -r..=r {
            let dist = ((kx * kx + ky * ky) as f64).sqrt();
            weights.push((-dist / denom).exp());
        }
    }
    weights
}

/// Clamps a signed sample coordinate into `0..len`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_coord(value: i64, len: u32) -> u32 {
    value.clamp(0, i64::from(len) - 1) as u32
}

/// Rounds an accumulated channel value back to a byte, saturating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_channel(value: f64) -> u8 {
    value.round() as u8
}
