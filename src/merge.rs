//! Merges undersized and too-thin regions into their surroundings.
//!
//! Repainting one region can fuse it with a same-colored neighbor, and can
//! also push a previously acceptable region below the thresholds, so the loop
//! re-segments and repaints until a pass finds nothing left to do or the pass
//! cap is reached. Only the area criterion decides whether another pass runs;
//! thinness disqualifies individual regions but never keeps the loop going on
//! its own.

use crate::{
    segment::{segment, Region},
    PixelBuffer,
};
use palette::Srgb;

/// Upper bound on segment-and-repaint passes.
pub const MAX_PASSES: u32 = 15;

/// What the merge loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of repaint passes that were executed.
    pub passes: u32,
    /// True when a segmentation pass found no region below the area
    /// threshold; false when [`MAX_PASSES`] ran without reaching that state.
    pub converged: bool,
}

/// Repaints regions smaller than `min_area` or thinner than `min_thickness`
/// with the dominant color among their outside neighbors, re-segmenting
/// between passes, until no region is below `min_area` or [`MAX_PASSES`]
/// passes have run.
///
/// Within a pass, regions are processed in discovery order against the live
/// buffer, so a region repainted early in the pass counts under its new color
/// in the census of a later one. A region with no outside neighbors (it spans
/// the whole buffer) is left as is.
///
/// Hitting the pass cap is not an error: the surviving regions are kept, a
/// warning is logged, and the report comes back with `converged: false`.
pub fn merge_small_regions(
    buffer: &mut PixelBuffer,
    min_area: u32,
    min_thickness: f64,
) -> MergeReport {
    for pass in 0..MAX_PASSES {
        let regions = segment(buffer);
        if regions.iter().all(|region| region.area() >= min_area) {
            return MergeReport { passes: pass, converged: true };
        }

        let region_of = region_index(&regions, buffer.width());
        #[allow(clippy::cast_possible_truncation)]
        for (id, region) in regions.iter().enumerate() {
            if region.area() < min_area || region.thickness() < min_thickness {
                if let Some(color) = dominant_neighbor_color(buffer, region, id as u32, &region_of)
                {
                    repaint(buffer, region, color);
                }
            }
        }
    }

    log::warn!("region merging did not stabilize within {MAX_PASSES} passes");
    MergeReport { passes: MAX_PASSES, converged: false }
}

/// Maps every pixel to the index of its region in the pass-start segmentation.
///
/// The census needs real region membership rather than a color comparison:
/// an earlier repaint in the same pass can turn an outside neighbor into the
/// region's own color, and such a neighbor still belongs to the census.
#[allow(clippy::cast_possible_truncation)]
fn region_index(regions: &[Region], width: u32) -> Vec<u32> {
    let len: usize = regions.iter().map(|region| region.pixels().len()).sum();
    let mut map = vec![0u32; len];
    for (id, region) in regions.iter().enumerate() {
        for &(x, y) in region.pixels() {
            map[y as usize * width as usize + x as usize] = id as u32;
        }
    }
    map
}

/// Tallies the current colors of in-bounds 4-neighbors outside the region and
/// returns the first color to reach the highest count, or `None` when the
/// region has no outside neighbors at all.
///
/// The tally is insertion ordered, so ties resolve to the color seen first.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dominant_neighbor_color(
    buffer: &PixelBuffer,
    region: &Region,
    id: u32,
    region_of: &[u32],
) -> Option<Srgb<u8>> {
    let width = i64::from(buffer.width());
    let height = i64::from(buffer.height());
    let mut tally: Vec<(Srgb<u8>, u32)> = Vec::new();

    for &(x, y) in region.pixels() {
        // Left, right, up, down.
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || nx >= width || ny < 0 || ny >= height {
                continue;
            }
            let neighbor = ny as usize * width as usize + nx as usize;
            if region_of[neighbor] == id {
                continue;
            }
            let color = buffer.rgb(nx as u32, ny as u32);
            match tally.iter_mut().find(|(seen, _)| *seen == color) {
                Some((_, count)) => *count += 1,
                None => tally.push((color, 1)),
            }
        }
    }

    let mut dominant = None;
    let mut max_count = 0;
    for &(color, count) in &tally {
        if count > max_count {
            max_count = count;
            dominant = Some(color);
        }
    }
    dominant
}

/// Repaints every member pixel of the region.
fn repaint(buffer: &mut PixelBuffer, region: &Region, color: Srgb<u8>) {
    for &(x, y) in region.pixels() {
        buffer.set_rgb(x, y, color);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn lone_pixel_is_absorbed() {
        let white = Srgb::new(255, 255, 255);
        let black = Srgb::new(0, 0, 0);
        let mut buffer = solid(5, 5, white);
        buffer.set_rgb(2, 2, black);

        let report = merge_small_regions(&mut buffer, 2, 0.0);

        assert_eq!(report, MergeReport { passes: 1, converged: true });
        assert_eq!(buffer, solid(5, 5, white));
    }

    #[test]
    fn all_regions_large_enough_is_untouched() {
        let black = Srgb::new(0, 0, 0);
        let white = Srgb::new(255, 255, 255);
        let mut buffer = from_rgb(2, 1, &[black, white]);
        let before = buffer.clone();

        let report = merge_small_regions(&mut buffer, 1, 0.0);

        assert_eq!(report, MergeReport { passes: 0, converged: true });
        assert_eq!(buffer, before);
    }

    #[test]
    fn thin_region_alone_never_triggers_a_pass() {
        let white = Srgb::new(255, 255, 255);
        let red = Srgb::new(255, 0, 0);
        let mut buffer = solid(5, 5, white);
        for y in 0..5 {
            buffer.set_rgb(2, y, red);
        }
        let before = buffer.clone();

        // The line's thickness is 1.0, well below the threshold, but no
        // region is below the area threshold, so the loop stops immediately.
        let report = merge_small_regions(&mut buffer, 1, 3.0);

        assert_eq!(report, MergeReport { passes: 0, converged: true });
        assert_eq!(buffer, before);
    }

    #[test]
    fn thin_region_is_repainted_once_any_region_is_small() {
        let white = Srgb::new(255, 255, 255);
        let red = Srgb::new(255, 0, 0);
        let blue = Srgb::new(0, 0, 255);
        let mut buffer = solid(5, 5, white);
        for y in 0..5 {
            buffer.set_rgb(2, y, red);
        }
        buffer.set_rgb(0, 0, blue);

        // The blue dot fails the area check and opens the pass; the red line
        // then fails the thickness check and is merged away with it.
        let report = merge_small_regions(&mut buffer, 2, 1.5);

        assert_eq!(report, MergeReport { passes: 1, converged: true });
        assert_eq!(buffer, solid(5, 5, white));
    }

    #[test]
    fn census_picks_the_most_common_neighbor() {
        let a = Srgb::new(200, 0, 0);
        let b = Srgb::new(0, 0, 200);
        let x = Srgb::new(0, 255, 0);
        #[rustfmt::skip]
        let mut buffer = from_rgb(4, 3, &[
            a, a, b, b,
            a, x, b, b,
            a, a, b, b,
        ]);

        let report = merge_small_regions(&mut buffer, 2, 0.0);

        // Three of the dot's four neighbors are `a`.
        assert!(report.converged);
        assert_eq!(buffer.rgb(1, 1), a);
    }

    #[test]
    fn census_tie_resolves_to_first_seen_color() {
        let a = Srgb::new(200, 0, 0);
        let b = Srgb::new(0, 0, 200);
        let x = Srgb::new(0, 255, 0);
        #[rustfmt::skip]
        let mut buffer = from_rgb(4, 3, &[
            a, a, b, b,
            a, x, b, b,
            a, b, b, b,
        ]);

        let report = merge_small_regions(&mut buffer, 2, 0.0);

        // Two `a` and two `b` neighbors; the left neighbor is censused first.
        assert!(report.converged);
        assert_eq!(buffer.rgb(1, 1), a);
    }

    #[test]
    fn whole_buffer_region_survives_with_empty_census() {
        let gray = Srgb::new(128, 128, 128);
        let mut buffer = solid(3, 3, gray);

        // There is nothing to repaint a buffer-spanning region with, so the
        // loop runs out of passes without converging.
        let report = merge_small_regions(&mut buffer, 100, 0.0);

        assert_eq!(report, MergeReport { passes: MAX_PASSES, converged: false });
        assert_eq!(buffer, solid(3, 3, gray));
    }

    #[test]
    fn zero_min_area_is_a_no_op() {
        let mut buffer = noisy(12, 12, 31);
        let before = buffer.clone();

        let report = merge_small_regions(&mut buffer, 0, 100.0);

        assert_eq!(report, MergeReport { passes: 0, converged: true });
        assert_eq!(buffer, before);
    }

    #[test]
    fn merging_only_uses_existing_colors() {
        let mut buffer = patches(24, 24, 3, 41);
        let original: Vec<_> = buffer.pixels().to_vec();

        merge_small_regions(&mut buffer, 12, 0.0);

        for pixel in buffer.pixels() {
            assert!(original.iter().any(|p| p.color == pixel.color));
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut first = patches(30, 20, 4, 99);
        let mut second = first.clone();

        let report_first = merge_small_regions(&mut first, 20, 2.0);
        let report_second = merge_small_regions(&mut second, 20, 2.0);

        assert_eq!(report_first, report_second);
        assert_eq!(first, second);
    }
}
