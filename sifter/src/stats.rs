//! Summary statistics over a sifting run.

use crate::candidate::SiftResult;

/// Min/mean/median/max summary of a sequence of counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize a non-empty slice of counts. Returns `None` for empty input.
    pub fn from_counts(counts: &[usize]) -> Option<Self> {
        if counts.is_empty() {
            return None;
        }

        let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        Some(Self {
            min: sorted[0],
            mean: values.iter().sum::<f64>() / n as f64,
            median,
            max: sorted[n - 1],
        })
    }
}

/// Observability summary of one sifting run.
///
/// Computed from the sift output after the invariant checks have passed;
/// never feeds back into the clustering itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiftStats {
    /// Total candidates in the batch.
    pub candidates: usize,
    /// Number of clusters found.
    pub clusters: u64,
    /// Number of cluster heads (equals `clusters`).
    pub heads: usize,
    /// Summary of per-record cluster member counts.
    pub members: Summary,
    /// Summary of per-record distinct beam counts.
    pub beams: Summary,
}

impl SiftStats {
    /// Compute statistics over a batch of sift results.
    ///
    /// Returns `None` for an empty batch.
    pub fn from_results(results: &[SiftResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let heads = results.iter().filter(|r| r.is_head).count();
        let clusters = results.iter().map(|r| r.cluster_id).max().unwrap_or(0) + 1;

        let member_counts: Vec<usize> = results.iter().map(|r| r.members).collect();
        let beam_counts: Vec<usize> = results.iter().map(|r| r.beams).collect();

        Some(Self {
            candidates: results.len(),
            clusters,
            heads,
            members: Summary::from_counts(&member_counts)?,
            beams: Summary::from_counts(&beam_counts)?,
        })
    }

    /// Emit the statistics to the log at info level.
    pub fn log(&self) {
        log::info!("Total candidates: {}", self.candidates);
        log::info!(
            "Cluster heads: {} ({:.2} %)",
            self.heads,
            100.0 * self.heads as f64 / self.candidates as f64
        );
        log::info!("Clusters: {}", self.clusters);

        for (name, summary) in [("Members", &self.members), ("Beams", &self.beams)] {
            log::info!(
                "{} (min, mean, median, max): {}, {:.2}, {}, {}",
                name,
                summary.min,
                summary.mean,
                summary.median,
                summary.max
            );
        }
    }
}
