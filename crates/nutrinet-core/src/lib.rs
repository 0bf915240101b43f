//! Nutrinet Core: nutrient co-occurrence networks from USDA nutrient data.
//!
//! This crate contains the whole batch pipeline: flat-file loading, presence
//! reduction, nutrient correlation, graph construction and GraphML export,
//! Louvain community detection, and representative-food reporting.

pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod phases;
pub mod pipeline;

pub use error::{Error, Result};
