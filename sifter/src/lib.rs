//! Multi-beam sifting of single-pulse detection candidates.
//!
//! A genuine astrophysical pulse is usually detected in several beams of a
//! multi-beam receiver at (almost) the same time and dispersion measure.
//! This crate groups such duplicate detections into clusters and elects a
//! representative "head" per cluster, so that downstream processing only
//! deals with unique events.

pub mod candidate;
pub mod clusterer;
pub mod error;
pub mod stats;

pub use crate::candidate::{CandidateRecord, SiftResult};
pub use crate::clusterer::{Clusterer, SifterConfig};
pub use crate::error::SiftError;
pub use crate::stats::{SiftStats, Summary};
