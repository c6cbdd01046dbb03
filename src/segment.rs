//! Splits a buffer into maximal 4-connected regions of identical color.
//!
//! Segmentation scans pixels in row-major order and grows a region from every
//! pixel not yet claimed by one, using an explicit-stack flood fill (the
//! recursion depth of large regions would overflow the call stack otherwise).
//! Equality is exact RGB equality; alpha plays no part. Every pixel ends up in
//! exactly one region, and regions are returned in seed discovery order.

use crate::PixelBuffer;
use bitvec::vec::BitVec;
use palette::Srgb;

/// Axis-aligned bounding box of a region, inclusive on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    /// Leftmost member column.
    pub min_x: u32,
    /// Topmost member row.
    pub min_y: u32,
    /// Rightmost member column.
    pub max_x: u32,
    /// Bottommost member row.
    pub max_y: u32,
}

impl RegionBounds {
    /// Width of the box in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Height of the box in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// One maximal 4-connected set of identically colored pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// The color every member pixel shares.
    color: Srgb<u8>,
    /// Member coordinates in flood-fill visit order.
    pixels: Vec<(u32, u32)>,
    /// Bounding box over the members.
    bounds: RegionBounds,
}

impl Region {
    /// The color every member pixel shares.
    #[must_use]
    pub const fn color(&self) -> Srgb<u8> {
        self.color
    }

    /// Member coordinates in flood-fill visit order.
    #[must_use]
    pub fn pixels(&self) -> &[(u32, u32)] {
        &self.pixels
    }

    /// The bounding box over the members.
    #[must_use]
    pub const fn bounds(&self) -> RegionBounds {
        self.bounds
    }

    /// Number of member pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn area(&self) -> u32 {
        self.pixels.len() as u32
    }

    /// Ratio of the longer bounding box side to the shorter, at least 1.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = (self.bounds.width(), self.bounds.height());
        f64::from(w.max(h)) / f64::from(w.min(h))
    }

    /// Mean pixels per row or column along the longer bounding box side.
    ///
    /// A 1-pixel-wide line scores 1.0 regardless of its length, a filled
    /// square scores its side length.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        let longer = self.bounds.width().max(self.bounds.height());
        f64::from(self.area()) / f64::from(longer)
    }

    /// The rounded arithmetic mean of the member coordinates.
    ///
    /// For concave regions this can land on a pixel outside the region.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn centroid(&self) -> (u32, u32) {
        let mut sum_x = 0u64;
        let mut sum_y = 0u64;
        for &(x, y) in &self.pixels {
            sum_x += u64::from(x);
            sum_y += u64::from(y);
        }
        let len = self.pixels.len() as f64;
        (
            (sum_x as f64 / len).round() as u32,
            (sum_y as f64 / len).round() as u32,
        )
    }
}

/// Splits the buffer into its maximal 4-connected same-color regions, in
/// row-major seed discovery order.
#[must_use]
pub fn segment(buffer: &PixelBuffer) -> Vec<Region> {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let mut visited: BitVec = BitVec::repeat(false, width * height);
    let mut regions = Vec::new();
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            if !visited[y as usize * width + x as usize] {
                regions.push(flood_fill(buffer, x, y, &mut visited));
            }
        }
    }
    regions
}

/// Collects the maximal region containing `(x, y)`, marking every member in
/// `visited`.
///
/// Neighbors are pushed in right, left, down, up order and filtered on pop;
/// the member list records pixels in the resulting visit order.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flood_fill(buffer: &PixelBuffer, x: u32, y: u32, visited: &mut BitVec) -> Region {
    let width = i64::from(buffer.width());
    let height = i64::from(buffer.height());
    let color = buffer.rgb(x, y);
    let mut pixels = Vec::new();
    let mut bounds = RegionBounds { min_x: x, min_y: y, max_x: x, max_y: y };
    let mut stack = vec![(i64::from(x), i64::from(y))];

    while let Some((cx, cy)) = stack.pop() {
        if cx < 0 || cx >= width || cy < 0 || cy >= height {
            continue;
        }
        let (px, py) = (cx as u32, cy as u32);
        let index = cy as usize * width as usize + cx as usize;
        if visited[index] || buffer.rgb(px, py) != color {
            continue;
        }
        visited.set(index, true);
        pixels.push((px, py));
        bounds.min_x = bounds.min_x.min(px);
        bounds.max_x = bounds.max_x.max(px);
        bounds.min_y = bounds.min_y.min(py);
        bounds.max_y = bounds.max_y.max(py);

        stack.push((cx + 1, cy));
        stack.push((cx - 1, cy));
        stack.push((cx, cy + 1));
        stack.push((cx, cy - 1));
    }

    Region { color, pixels, bounds }
}
