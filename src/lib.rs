#![warn(clippy::all)]

//! LCZ Workbench core - data processing for Local Climate Zone (LCZ) and
//! urban heat island (ICU) layers.
//!
//! The library holds everything the viewer needs that is not presentation:
//! - `geo`: feature model and approximate polygon area
//! - `stats`: class aggregation (discrete codes and numeric ranges)
//! - `storage`: persistent key-value store and the dataset cache
//! - `dataset`: compressed dataset loading, catalog and background channel
//! - `lcz`: LCZ labels, names and display colours

pub mod config;
pub mod dataset;
pub mod geo;
pub mod lcz;
pub mod stats;
pub mod storage;
