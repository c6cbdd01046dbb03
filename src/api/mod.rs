//! Contains the types and functions for the high level pipeline builder API.

mod pipeline;

pub use pipeline::{StencilOutput, StencilPipeline};
