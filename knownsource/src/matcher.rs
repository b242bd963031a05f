//! Spatial/DM matching of cluster heads against known-source catalogues.

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use serde::{Deserialize, Serialize};

use crate::catalogue::{CatalogueEntry, CatalogueSource};
use crate::coords::{chord_to_separation_deg, unit_vector};
use crate::error::MatchError;

/// Number of nearest neighbors to pull from the search tree per query.
///
/// A pragmatic bound: for a catalogue as sparse as psrcat a true match
/// will not be the 26th-nearest source. Dense clusters of pulsars
/// (globular clusters) are the known violation case and an accepted
/// limitation.
const NEIGHBOURS: usize = 25;

/// Catalogues the matcher knows how to load.
const SUPPORTED_CATALOGUES: &[&str] = &["psrcat"];

/// Matching thresholds for the known-source matcher.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Angular distance threshold in degrees.
    pub dist_thresh_deg: f64,
    /// DM threshold in per cent.
    pub dm_thresh_percent: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            dist_thresh_deg: 1.5,
            dm_thresh_percent: 5.0,
        }
    }
}

impl MatcherConfig {
    /// Check that both thresholds are positive and finite.
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(self.dist_thresh_deg > 0.0 && self.dist_thresh_deg.is_finite()) {
            return Err(MatchError::InvalidParameter {
                name: "dist_thresh_deg",
                value: self.dist_thresh_deg,
            });
        }

        if !(self.dm_thresh_percent > 0.0 && self.dm_thresh_percent.is_finite()) {
            return Err(MatchError::InvalidParameter {
                name: "dm_thresh_percent",
                value: self.dm_thresh_percent,
            });
        }

        Ok(())
    }
}

/// A cluster head identified with a catalogued source.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownSourceMatch {
    /// Candidate index of the cluster head.
    pub head_index: u64,
    /// Name of the matched source.
    pub source_name: String,
    /// Catalogue the source came from.
    pub catalogue_name: String,
    /// Catalogued dispersion measure.
    pub catalogue_dm: f64,
    /// Catalogued source type.
    pub source_type: String,
}

impl KnownSourceMatch {
    /// Build a match record for a cluster head from a catalogue entry.
    pub fn new(head_index: u64, entry: &CatalogueEntry) -> Self {
        Self {
            head_index,
            source_name: entry.name.clone(),
            catalogue_name: entry.catalogue.clone(),
            catalogue_dm: entry.dm,
            source_type: entry.source_type.clone(),
        }
    }
}

/// Matches source positions against catalogues of known sources.
///
/// Lifecycle: load one or more catalogues, build the search tree, then
/// query. Queries are read-only; the tree and the catalogue are never
/// mutated by matching, so repeated queries with the same input return
/// the same result.
pub struct Matcher {
    dist_thresh_deg: f64,
    dm_fraction: f64,
    catalogue: Vec<CatalogueEntry>,
    loaded: Vec<String>,
    tree: Option<KdTree<f64, usize, [f64; 3]>>,
}

impl Matcher {
    /// Create a matcher with validated thresholds. The DM threshold is
    /// given in per cent and stored as a fraction.
    pub fn new(config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;

        Ok(Self {
            dist_thresh_deg: config.dist_thresh_deg,
            dm_fraction: config.dm_thresh_percent / 100.0,
            catalogue: Vec::new(),
            loaded: Vec::new(),
            tree: None,
        })
    }

    /// The angular distance threshold in degrees.
    pub fn dist_thresh_deg(&self) -> f64 {
        self.dist_thresh_deg
    }

    /// The DM tolerance as a fraction.
    pub fn dm_fraction(&self) -> f64 {
        self.dm_fraction
    }

    /// Names of the catalogues currently loaded.
    pub fn loaded_catalogues(&self) -> &[String] {
        &self.loaded
    }

    /// Number of catalogue entries currently held.
    pub fn len(&self) -> usize {
        self.catalogue.len()
    }

    /// Whether no catalogue data is loaded.
    pub fn is_empty(&self) -> bool {
        self.catalogue.is_empty()
    }

    /// Load a supported catalogue from the given source.
    ///
    /// # Errors
    /// [`MatchError::UnsupportedCatalogue`] for unknown names,
    /// [`MatchError::AlreadyLoaded`] if the catalogue was loaded before
    /// without an intervening [`unload_catalogues`](Self::unload_catalogues),
    /// and [`MatchError::EmptyCatalogue`] if the source yields nothing.
    pub fn load_catalogue(
        &mut self,
        name: &str,
        source: &dyn CatalogueSource,
    ) -> Result<(), MatchError> {
        if !SUPPORTED_CATALOGUES.contains(&name) {
            return Err(MatchError::UnsupportedCatalogue(name.to_string()));
        }

        if self.loaded.iter().any(|loaded| loaded == name) {
            return Err(MatchError::AlreadyLoaded(name.to_string()));
        }

        let entries = source.load(name)?;
        if entries.is_empty() {
            return Err(MatchError::EmptyCatalogue);
        }

        log::info!("Loaded {} entries from catalogue '{}'", entries.len(), name);

        self.catalogue.extend(entries);
        self.loaded.push(name.to_string());

        // the spatial index must be rebuilt after any (re)load
        self.tree = None;

        Ok(())
    }

    /// Drop all catalogue data and the search tree.
    pub fn unload_catalogues(&mut self) {
        self.catalogue.clear();
        self.loaded.clear();
        self.tree = None;
    }

    /// Build the spatial index over the loaded catalogue positions.
    ///
    /// Positions are embedded as 3-D unit vectors so that Euclidean
    /// nearest-neighbor search corresponds monotonically to angular
    /// separation.
    pub fn create_search_tree(&mut self) -> Result<(), MatchError> {
        if self.catalogue.is_empty() {
            return Err(MatchError::NotReady("no catalogue loaded"));
        }

        let mut tree = KdTree::new(3);
        for (i, entry) in self.catalogue.iter().enumerate() {
            let point: [f64; 3] = unit_vector(entry.ra_deg, entry.dec_deg).into();
            tree.add(point, i)
                .map_err(|e| MatchError::SearchTree(format!("{e:?}")))?;
        }

        log::info!("Built search tree over {} sources", self.catalogue.len());
        self.tree = Some(tree);

        Ok(())
    }

    /// Find the closest catalogue entry matching a position and DM.
    ///
    /// Queries the nearest neighbors in increasing angular distance and
    /// returns the first one within both the distance threshold and the
    /// fractional DM tolerance. Nearest-neighbor order matters: the match
    /// must be the closest satisfying entry, not merely any satisfying
    /// one. `Ok(None)` is the normal no-match outcome.
    ///
    /// # Errors
    /// [`MatchError::NotReady`] if no search tree has been built.
    pub fn find_matches(
        &self,
        ra_deg: f64,
        dec_deg: f64,
        dm: f64,
    ) -> Result<Option<&CatalogueEntry>, MatchError> {
        let tree = self
            .tree
            .as_ref()
            .ok_or(MatchError::NotReady("search tree not built"))?;

        let query: [f64; 3] = unit_vector(ra_deg, dec_deg).into();
        let k = NEIGHBOURS.min(self.catalogue.len());

        let neighbours = tree
            .nearest(&query, k, &squared_euclidean)
            .map_err(|e| MatchError::SearchTree(format!("{e:?}")))?;

        log::debug!("Using distance threshold: {} deg", self.dist_thresh_deg);
        log::debug!("Using DM threshold: {}", self.dm_fraction);

        for (sq_chord, &idx) in neighbours {
            let entry = &self.catalogue[idx];
            let separation = chord_to_separation_deg(sq_chord.sqrt());

            log::debug!(
                "Neighbor at {:.3} deg: {} (DM {:.3})",
                separation,
                entry.name,
                entry.dm
            );

            if separation <= self.dist_thresh_deg
                && (dm - entry.dm).abs() / dm <= self.dm_fraction
            {
                log::info!(
                    "Match found with distance {:.3} deg: {}",
                    separation,
                    entry.name
                );
                return Ok(Some(entry));
            }
        }

        log::debug!("No match found at ({ra_deg:.4}, {dec_deg:.4}) with DM {dm:.3}");

        Ok(None)
    }
}
