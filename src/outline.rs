//! Renders the printable outline diagram: black region borders on white,
//! plus one numbered label per region.

use crate::{remap::nearest_index, segment::segment, PixelBuffer, RegionLabel};
use palette::Srgb;
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Renders the outline diagram for a flattened buffer.
///
/// The returned buffer has the same dimensions as the input and is opaque
/// white, except for an opaque black pixel wherever any of the up-to-eight
/// in-bounds neighbors has a different RGB value. This traces a border
/// between every pair of adjacent regions; border pixels of the image itself
/// are only compared against neighbors that exist.
///
/// The labels come one per region, in segmentation discovery order, carrying
/// the region's rounded centroid and the palette index of its color. Indices
/// resolve via nearest color, which is an exact lookup whenever the buffer
/// was produced by remapping onto `palette`. An empty palette yields no
/// labels.
#[must_use]
pub fn render_outline(
    buffer: &PixelBuffer,
    palette: &[Srgb<u8>],
) -> (PixelBuffer, Vec<RegionLabel>) {
    let data = (0..buffer.height()).flat_map(|y| edge_row(buffer, y)).collect();
    let outline = PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data);
    (outline, labels(buffer, palette))
}

/// Parallel version of [`render_outline`]. Edge marking is data parallel;
/// label extraction segments sequentially either way, so the output is
/// identical to the sequential version.
#[cfg(feature = "threads")]
#[must_use]
pub fn render_outline_par(
    buffer: &PixelBuffer,
    palette: &[Srgb<u8>],
) -> (PixelBuffer, Vec<RegionLabel>) {
    let data = (0..buffer.height())
        .into_par_iter()
        .flat_map_iter(|y| edge_row(buffer, y))
        .collect();
    let outline = PixelBuffer::new_unchecked(buffer.width(), buffer.height(), data);
    (outline, labels(buffer, palette))
}

/// One row of the outline canvas: black for edge pixels, white otherwise.
fn edge_row(buffer: &PixelBuffer, y: u32) -> Vec<u8> {
    let mut row = Vec::with_capacity(buffer.width() as usize * 4);
    for x in 0..buffer.width() {
        let shade = if is_edge(buffer, x, y) { 0 } else { 255 };
        row.extend_from_slice(&[shade, shade, shade, 255]);
    }
    row
}

/// Whether any in-bounds 8-neighbor differs in RGB from the pixel at `(x, y)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn is_edge(buffer: &PixelBuffer, x: u32, y: u32) -> bool {
    let color = buffer.rgb(x, y);
    let width = i64::from(buffer.width());
    let height = i64::from(buffer.height());
    for dy in -1..=1_i64 {
        for dx in -1..=1_i64 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                continue;
            }
            if buffer.rgb(nx as u32, ny as u32) != color {
                return true;
            }
        }
    }
    false
}

/// One label per region at its centroid, in discovery order.
fn labels(buffer: &PixelBuffer, palette: &[Srgb<u8>]) -> Vec<RegionLabel> {
    if palette.is_empty() {
        return Vec::new();
    }
    segment(buffer)
        .iter()
        .map(|region| {
            let (x, y) = region.centroid();
            RegionLabel { x, y, palette_index: nearest_index(region.color(), palette) }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn shades(buffer: &PixelBuffer) -> Vec<u8> {
        buffer.pixels().iter().map(|p| p.color.red).collect()
    }

    #[test]
    fn uniform_buffer_is_all_white_with_one_label() {
        let color = Srgb::new(120, 40, 220);
        let buffer = solid(4, 4, color);
        let (outline, labels) = render_outline(&buffer, &[color]);

        assert!(shades(&outline).iter().all(|&shade| shade == 255));
        assert_eq!(labels, vec![RegionLabel { x: 2, y: 2, palette_index: 0 }]);
    }

    #[test]
    fn two_pixels_are_both_edges() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let buffer = from_rgb(2, 1, &[black, white]);
        let (outline, labels) = render_outline(&buffer, &[black, white]);

        assert_eq!(shades(&outline), vec![0, 0]);
        assert_eq!(
            labels,
            vec![
                RegionLabel { x: 0, y: 0, palette_index: 0 },
                RegionLabel { x: 1, y: 0, palette_index: 1 },
            ]
        );
    }

    #[test]
    fn diagonal_differences_count_as_edges() {
        let white = Srgb::new(255, 255, 255);
        let red = Srgb::new(255, 0, 0);
        let mut buffer = solid(3, 3, white);
        buffer.set_rgb(1, 1, red);

        // Every pixel touches the center at least diagonally.
        let (outline, _) = render_outline(&buffer, &[white, red]);
        assert!(shades(&outline).iter().all(|&shade| shade == 0));
    }

    #[test]
    fn edges_trace_only_the_boundary() {
        let a = Srgb::new(10, 10, 10);
        let b = Srgb::new(240, 240, 240);
        let colors: Vec<Srgb<u8>> = (0..5)
            .flat_map(|_| (0..5).map(move |x| if x < 2 { a } else { b }))
            .collect();
        let buffer = from_rgb(5, 5, &colors);
        let (outline, _) = render_outline(&buffer, &[a, b]);

        // Columns 1 and 2 straddle the boundary, the rest are interior.
        assert_eq!(shades(&outline)[10..15], [255, 0, 0, 255, 255]);
    }

    #[test]
    fn outline_is_opaque_even_for_transparent_input() {
        let mut data = vec![0u8; 6 * 4 * 4];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = if i % 4 == 3 { 0 } else { 128 };
        }
        let buffer = PixelBuffer::from_vec(6, 4, data).unwrap();
        let (outline, _) = render_outline(&buffer, &[Srgb::new(128, 128, 128)]);

        assert!(outline.pixels().iter().all(|p| p.alpha == 255));
    }

    #[test]
    fn empty_palette_yields_no_labels() {
        let buffer = solid(3, 2, Srgb::new(1, 2, 3));
        let (outline, labels) = render_outline(&buffer, &[]);

        assert_eq!(outline.num_pixels(), 6);
        assert!(labels.is_empty());
    }

    #[test]
    fn labels_resolve_to_nearest_palette_entry() {
        let buffer = solid(2, 2, Srgb::new(100, 100, 100));
        let palette = [Srgb::new(90, 90, 90), Srgb::new(255, 255, 255)];
        let (_, labels) = render_outline(&buffer, &palette);

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].palette_index, 0);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_sequential() {
        let buffer = patches(27, 18, 4, 55);
        let palette = [Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)];

        let sequential = render_outline(&buffer, &palette);
        let parallel = render_outline_par(&buffer, &palette);
        assert_eq!(sequential, parallel);
    }
}
