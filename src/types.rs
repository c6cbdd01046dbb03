//! Contains various types needed across the crate.

use crate::{MAX_COLORS, MAX_PIXELS};
use palette::{cast::ComponentsAs, Srgb, Srgba};
use std::{fmt::Display, num::NonZeroU8};
use thiserror::Error;
#[cfg(feature = "image")]
use image::RgbaImage;

/// An error returned when an RGBA buffer and its stated dimensions disagree,
/// or when the dimensions themselves are unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PixelBufferError {
    /// One or both dimensions are zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions {
        /// The offending width.
        width: u32,
        /// The offending height.
        height: u32,
    },
    /// The pixel count exceeds [`MAX_PIXELS`].
    #[error("{width}x{height} image is above the maximum of {max} pixels", max = MAX_PIXELS)]
    AboveMaxPixels {
        /// The offending width.
        width: u32,
        /// The offending height.
        height: u32,
    },
    /// The byte length is not `4 * width * height`.
    #[error("buffer length {actual} does not match dimensions (expected {expected} bytes)")]
    LengthMismatch {
        /// The byte length the dimensions require.
        expected: usize,
        /// The byte length that was provided.
        actual: usize,
    },
}

/// An owned RGBA8 raster with row-major layout.
///
/// The pixel at `(x, y)` occupies the four bytes starting at `4 * (y * width + x)`,
/// in `[r, g, b, a]` order. Construction validates that both dimensions are
/// non-zero, that the pixel count is at most [`MAX_PIXELS`], and that the byte
/// length matches the dimensions exactly, so every [`PixelBuffer`] the rest of
/// the crate sees is internally consistent.
///
/// The pipeline stages only ever read and write the RGB bytes; alpha is carried
/// through untouched.
///
/// # Examples
/// From raw bytes:
/// ```
/// # use stencille::{PixelBuffer, PixelBufferError};
/// # fn main() -> Result<(), PixelBufferError> {
/// let buffer = PixelBuffer::from_vec(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255])?;
/// assert_eq!(buffer.num_pixels(), 2);
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use stencille::PixelBuffer;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let buffer = PixelBuffer::try_from(img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// `4 * width * height` bytes of row-major RGBA data.
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a [`PixelBuffer`] from row-major RGBA bytes.
    ///
    /// # Errors
    /// Returns a [`PixelBufferError`] if either dimension is zero, the pixel
    /// count exceeds [`MAX_PIXELS`], or `data.len() != 4 * width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixelBufferError> {
        if width == 0 || height == 0 {
            return Err(PixelBufferError::EmptyDimensions { width, height });
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > u64::from(MAX_PIXELS) {
            return Err(PixelBufferError::AboveMaxPixels { width, height });
        }
        #[allow(clippy::cast_possible_truncation)]
        let expected = pixels as usize * 4;
        if data.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Creates a [`PixelBuffer`] without validating the dimension invariants.
    pub(crate) fn new_unchecked(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self { width, height, data }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of pixels (`width * height`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_pixels(&self) -> u32 {
        (self.data.len() / 4) as u32
    }

    /// The raw RGBA bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns the raw RGBA bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// The pixels viewed as a color slice, in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Srgba<u8>] {
        self.data.as_slice().components_as()
    }

    /// Byte offset of the pixel at `(x, y)`.
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        4 * (y as usize * self.width as usize + x as usize)
    }

    /// The RGB value of the pixel at `(x, y)`.
    #[must_use]
    pub fn rgb(&self, x: u32, y: u32) -> Srgb<u8> {
        let i = self.index(x, y);
        Srgb::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// The RGBA value of the pixel at `(x, y)`.
    #[must_use]
    pub fn rgba(&self, x: u32, y: u32) -> Srgba<u8> {
        let i = self.index(x, y);
        Srgba::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    /// Overwrites the RGB bytes of the pixel at `(x, y)`, leaving alpha as is.
    pub fn set_rgb(&mut self, x: u32, y: u32, color: Srgb<u8>) {
        let i = self.index(x, y);
        self.data[i] = color.red;
        self.data[i + 1] = color.green;
        self.data[i + 2] = color.blue;
    }
}

#[cfg(feature = "image")]
impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = PixelBufferError;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_vec(width, height, image.into_raw())
    }
}

#[cfg(feature = "image")]
impl TryFrom<&RgbaImage> for PixelBuffer {
    type Error = PixelBufferError;

    fn try_from(image: &RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_vec(width, height, image.as_raw().clone())
    }
}

#[cfg(feature = "image")]
impl PixelBuffer {
    /// Copies the buffer into an [`RgbaImage`].
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        self.clone().into_rgba_image()
    }

    /// Consumes the buffer and converts it into an [`RgbaImage`] without copying.
    #[must_use]
    pub fn into_rgba_image(self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data)
            .unwrap_or_else(|| unreachable!("buffer length matches dimensions"))
    }
}

/// An error returned for palette sizes outside of `1..=`[`MAX_COLORS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaletteSizeError {
    /// A palette must contain at least one color.
    #[error("palette size must be at least 1")]
    Zero,
    /// The requested size exceeds [`MAX_COLORS`].
    #[error("palette size is above the maximum of {max} colors", max = MAX_COLORS)]
    AboveMax,
}

/// This type is used to specify the number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must
/// be between `1` and [`MAX_COLORS`] inclusive, so quantization always has at
/// least one centroid to work with.
///
/// # Examples
/// Use `into` to create [`PaletteSize`]s from [`NonZeroU8`]s.
/// For `u16`s, use `try_into` or [`PaletteSize::from_clamped`].
/// You can also use the [`PaletteSize::MAX`] constant.
///
/// ```
/// # use stencille::{PaletteSize, PaletteSizeError};
/// # fn main() -> Result<(), PaletteSizeError> {
/// let size = PaletteSize::try_from(16u16)?;
/// let size: PaletteSize = 16u16.try_into()?;
/// let size = PaletteSize::from_clamped(1024); // PaletteSize::MAX
/// assert!(PaletteSize::try_from(0u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The maximum supported palette size (given by [`MAX_COLORS`]).
    pub const MAX: Self = Self(MAX_COLORS);

    /// The default palette size used by the pipeline.
    pub const DEFAULT: Self = Self(5);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates a [`PaletteSize`] directly from the given `u16`
    /// without ensuring that it lies in `1..=`[`MAX_COLORS`].
    #[allow(unused)]
    pub(crate) const fn new_unchecked(value: u16) -> Self {
        Self(value)
    }

    /// Creates a [`PaletteSize`] by clamping the given `u16` into `1..=`[`MAX_COLORS`].
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value == 0 {
            Self(1)
        } else if value <= MAX_COLORS {
            Self(value)
        } else {
            Self(MAX_COLORS)
        }
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl From<NonZeroU8> for PaletteSize {
    fn from(value: NonZeroU8) -> Self {
        Self(value.get().into())
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = PaletteSizeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Err(PaletteSizeError::Zero),
            v if v <= MAX_COLORS => Ok(PaletteSize(v)),
            _ => Err(PaletteSizeError::AboveMax),
        }
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The output struct returned by the quantization functions.
///
/// It contains the color `palette` for the image, alongside `counts` which has
/// the number of pixels assigned to each palette color.
/// Additionally, `indices` will contain an index into `palette` for each pixel,
/// but only if the quantization function computes an indexed palette
/// (e.g., [`kmeans::indexed_palette`](crate::kmeans::indexed_palette)).
/// Otherwise, `indices` will be empty (e.g., [`kmeans::palette`](crate::kmeans::palette)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizeOutput {
    /// The computed color palette that is representative of the colors in the image.
    ///
    /// Always exactly as many entries as the requested [`PaletteSize`];
    /// the colors are not guaranteed to be unique.
    pub palette: Vec<Srgb<u8>>,
    /// The number of pixels that were assigned to each color in `palette`.
    ///
    /// Each count is not guaranteed to be non-zero.
    pub counts: Vec<u32>,
    /// The remapped image, where each pixel is replaced with an index into `palette`.
    ///
    /// This will be empty if the quantization function does not compute an indexed palette.
    pub indices: Vec<u8>,
}

/// A single region label for the outline diagram: where to draw the number and
/// which palette entry it refers to.
///
/// The position is the region's rounded centroid, which for concave regions can
/// fall on a pixel outside the region itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLabel {
    /// Label x position in pixels.
    pub x: u32,
    /// Label y position in pixels.
    pub y: u32,
    /// Index into the palette of the color this region is painted with.
    pub palette_index: u8,
}
