//! Republishes vector plots exported from plotting tools as print-ready
//! figures: noise is removed, the frame, grid and curves are recognized and
//! restyled, and tick labels, axis labels and an optional legend are
//! regenerated at a fixed target size.

pub mod classify;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod preset;
pub mod query;
pub mod restyle;
pub mod style;
pub mod synth;
pub mod transform;
pub mod xml;

pub use error::{Error, Result};
