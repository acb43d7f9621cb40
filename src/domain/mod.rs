//! Domain types mirrored from the document store's projections.

pub mod entities;
pub mod stats;
