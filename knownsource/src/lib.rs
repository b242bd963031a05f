//! Known-source matching for single-pulse detections.
//!
//! Cluster heads coming out of the multi-beam sifter are checked against
//! catalogues of known pulsars. A match requires both a small angular
//! separation on the sky and an agreeing dispersion measure, so that new
//! detections of already-catalogued sources can be filtered out.

pub mod catalogue;
pub mod coords;
pub mod error;
pub mod matcher;

pub use crate::catalogue::{CatalogueEntry, CatalogueSource, PsrcatFile, StaticCatalogue};
pub use crate::error::MatchError;
pub use crate::matcher::{KnownSourceMatch, Matcher, MatcherConfig};
