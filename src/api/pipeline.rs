//! Contains the [`StencilPipeline`] builder struct for the high level API.

use crate::{
    kmeans,
    merge::{self, MergeReport},
    outline, remap, PaletteSize, PixelBuffer, RegionLabel, SmoothingKind,
};
use palette::Srgb;

/// A builder struct to specify options to create a paint-by-numbers template from an image.
///
/// # Examples
/// To start, create a [`StencilPipeline`] from a [`PixelBuffer`]
/// (here decoded via the `image` integration):
/// ```no_run
/// # use stencille::{StencilPipeline, PixelBuffer};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let buffer = PixelBuffer::try_from(img)?;
/// let mut pipeline = StencilPipeline::new(&buffer);
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change different options like the number of palette colors
/// or the smoothing filter:
/// ```
/// # use stencille::{StencilPipeline, PixelBuffer, SmoothingKind};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let buffer = PixelBuffer::from_vec(1, 1, vec![0, 0, 0, 255])?;
/// # let mut pipeline = StencilPipeline::new(&buffer);
/// let pipeline = pipeline
///     .palette_size(12u16.try_into()?)
///     .smoothing(SmoothingKind::Bilateral)
///     .smoothing_radius(4)
///     .min_region_area(80);
/// # Ok(())
/// # }
/// ```
///
/// Finally, run the pipeline:
/// ```no_run
/// # use stencille::{StencilPipeline, PixelBuffer};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let buffer = PixelBuffer::from_vec(1, 1, vec![0, 0, 0, 255])?;
/// # let pipeline = StencilPipeline::new(&buffer);
/// let output = pipeline.process();
/// output.recolored.to_rgba_image().save("recolored.png")?;
/// output.outline.to_rgba_image().save("outline.png")?;
/// # Ok(())
/// # }
/// ```
///
/// Or, in parallel across multiple threads (needs the `threads` feature):
/// ```no_run
/// # use stencille::{StencilPipeline, PixelBuffer};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let buffer = PixelBuffer::from_vec(1, 1, vec![0, 0, 0, 255])?;
/// # let pipeline = StencilPipeline::new(&buffer);
/// let output = pipeline.process_par();
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct StencilPipeline<'a> {
    /// The input image.
    buffer: &'a PixelBuffer,
    /// The number of colors to put in the palette.
    k: PaletteSize,
    /// The smoothing filter to run before quantization.
    smoothing: SmoothingKind,
    /// The radius of the smoothing filter in pixels.
    smoothing_radius: u32,
    /// Regions with fewer pixels than this are merged into their surroundings.
    min_region_area: u32,
    /// Regions thinner than this are merged while any region is undersized.
    min_region_thickness: f64,
}

impl<'a> StencilPipeline<'a> {
    /// Creates a new [`StencilPipeline`] with default options.
    pub const fn new(buffer: &'a PixelBuffer) -> Self {
        Self {
            buffer,
            k: PaletteSize::DEFAULT,
            smoothing: SmoothingKind::Gaussian,
            smoothing_radius: 2,
            min_region_area: 100,
            min_region_thickness: 3.0,
        }
    }

    /// Sets the palette size which determines the number of colors to paint with.
    ///
    /// The default palette size is [`PaletteSize::DEFAULT`].
    pub fn palette_size(&mut self, size: PaletteSize) -> &mut Self {
        self.k = size;
        self
    }

    /// Sets the smoothing filter to run before color quantization.
    ///
    /// See [`SmoothingKind`] for more details.
    ///
    /// The default filter is [`SmoothingKind::Gaussian`].
    pub fn smoothing(&mut self, smoothing: SmoothingKind) -> &mut Self {
        self.smoothing = smoothing;
        self
    }

    /// Sets the radius of the smoothing filter in pixels.
    ///
    /// A radius of `0` leaves the image unsmoothed.
    ///
    /// The default radius is `2`.
    pub fn smoothing_radius(&mut self, radius: u32) -> &mut Self {
        self.smoothing_radius = radius;
        self
    }

    /// Sets the minimum region area in pixels.
    ///
    /// Regions with fewer pixels are repainted with their most common
    /// surrounding color until every region is at least this large.
    /// A value of `0` disables merging.
    ///
    /// The default minimum area is `100`.
    pub fn min_region_area(&mut self, area: u32) -> &mut Self {
        self.min_region_area = area;
        self
    }

    /// Sets the minimum region thickness.
    ///
    /// Thickness is a region's area divided by the longer side of its bounding
    /// box. Thin regions are repainted along with undersized ones, but do not
    /// keep the merge going on their own; see
    /// [`merge_small_regions`](crate::merge::merge_small_regions).
    ///
    /// The default minimum thickness is `3.0`.
    pub fn min_region_thickness(&mut self, thickness: f64) -> &mut Self {
        self.min_region_thickness = thickness;
        self
    }
}

impl StencilPipeline<'_> {
    /// Runs the pipeline and returns the computed template.
    ///
    /// The input is smoothed, quantized down to the requested palette, remapped
    /// onto that palette, and cleaned of regions too small or thin to paint.
    /// The outline and its labels are rendered from the cleaned image.
    #[must_use]
    pub fn process(&self) -> StencilOutput {
        let smoothed = self.smoothing.apply(self.buffer, self.smoothing_radius);
        let palette = kmeans::palette(&smoothed, self.k).palette;
        let mut recolored = remap::remap(&smoothed, &palette);
        let merge = merge::merge_small_regions(
            &mut recolored,
            self.min_region_area,
            self.min_region_thickness,
        );
        let (outline, labels) = outline::render_outline(&recolored, &palette);
        StencilOutput { recolored, outline, palette, labels, merge }
    }

    /// Runs the pipeline in parallel across multiple threads.
    ///
    /// The per-pixel stages are parallelized; region merging is sequential
    /// either way. The output is identical to [`StencilPipeline::process`].
    #[cfg(feature = "threads")]
    #[must_use]
    pub fn process_par(&self) -> StencilOutput {
        let smoothed = self.smoothing.apply_par(self.buffer, self.smoothing_radius);
        let palette = kmeans::palette_par(&smoothed, self.k).palette;
        let mut recolored = remap::remap_par(&smoothed, &palette);
        let merge = merge::merge_small_regions(
            &mut recolored,
            self.min_region_area,
            self.min_region_thickness,
        );
        let (outline, labels) = outline::render_outline_par(&recolored, &palette);
        StencilOutput { recolored, outline, palette, labels, merge }
    }
}

/// The result of running a [`StencilPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StencilOutput {
    /// The recolored image: smoothed, reduced to the palette, and cleaned of
    /// regions too small or thin to paint.
    pub recolored: PixelBuffer,
    /// The outline diagram: black region borders on a white background.
    pub outline: PixelBuffer,
    /// The color palette of the recolored image.
    pub palette: Vec<Srgb<u8>>,
    /// One label per region of the recolored image, giving the position and
    /// palette index to print there.
    pub labels: Vec<RegionLabel>,
    /// How many merge passes ran and whether they converged.
    pub merge: MergeReport,
}
