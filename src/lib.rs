//! A library for turning raster images into paint-by-numbers style templates.
//!
//! `stencille` takes a decoded RGBA image and produces two buffers: a *recolored*
//! image (smoothed, quantized to a small palette, with small or thin color regions
//! merged into their surroundings) and an *outline* diagram (black region borders
//! on white, plus one numbered label per region giving the palette color to paint
//! it with). The whole pipeline is deterministic: the same input and parameters
//! produce byte-identical outputs on every run.
//!
//! # Features
//! To reduce dependencies and compile times, `stencille` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`StencilPipeline`] builder that serves as the high-level API.
//! - `threads`: exposes parallel versions of the per-pixel stages via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//!
//! # High-Level API
//! To get started, see [`StencilPipeline`]. It has examples in its documentation,
//! but here is an additional one:
//! ```no_run
//! # use stencille::{StencilPipeline, PixelBuffer, SmoothingKind};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//! let buffer = PixelBuffer::try_from(img)?;
//!
//! let output = StencilPipeline::new(&buffer)
//!     .palette_size(8u16.try_into()?) // how many paint colors to boil the image down to
//!     .smoothing(SmoothingKind::Bilateral) // edge-preserving smoothing
//!     .smoothing_radius(3)
//!     .min_region_area(64) // merge away regions smaller than 64 pixels
//!     .process_par();
//!
//! // Palette entries format as hex for display.
//! for (i, color) in output.palette.iter().enumerate() {
//!     println!("{}: #{color:x}", i + 1);
//! }
//!
//! output.recolored.to_rgba_image().save("recolored.png")?;
//! output.outline.to_rgba_image().save("outline.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! The low-level stages (smoothing, quantization, remapping, segmentation, merging,
//! outline rendering) are exposed as standalone modules for callers that only need
//! part of the pipeline.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

pub mod kmeans;
pub mod merge;
pub mod outline;
pub mod remap;
pub mod segment;
pub mod smooth;

mod types;

#[cfg(feature = "pipelines")]
mod api;

pub use types::*;

pub use merge::MergeReport;
pub use segment::{Region, RegionBounds};
pub use smooth::SmoothingKind;

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;
