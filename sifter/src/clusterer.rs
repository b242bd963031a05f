//! Multi-beam candidate clustering.
//!
//! Candidates are sorted by `(mjd, dm, snr)` and swept in order. Each
//! unprocessed candidate opens a matching box of `time_thresh` milliseconds
//! in time and a fractional `dm_fraction` in dispersion measure; every
//! not-yet-processed candidate inside the box joins the cluster, and the
//! member with the highest SNR becomes the cluster head.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateRecord, SiftResult};
use crate::error::SiftError;
use crate::stats::SiftStats;

/// Seconds per day, for converting the time tolerance to MJD days.
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Matching thresholds for the clustering engine.
///
/// Validated once at [`Clusterer`] construction; thresholds are never
/// mutated over the lifetime of a clusterer instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SifterConfig {
    /// Width of the matching box in time, in milliseconds.
    pub time_thresh_ms: f64,
    /// Fractional DM tolerance for matching.
    pub dm_fraction: f64,
}

impl Default for SifterConfig {
    fn default() -> Self {
        Self {
            time_thresh_ms: 10.0,
            dm_fraction: 0.02,
        }
    }
}

impl SifterConfig {
    /// Check that both thresholds are positive and finite.
    pub fn validate(&self) -> Result<(), SiftError> {
        if !(self.time_thresh_ms > 0.0 && self.time_thresh_ms.is_finite()) {
            return Err(SiftError::InvalidParameter {
                name: "time_thresh_ms",
                value: self.time_thresh_ms,
            });
        }

        if !(self.dm_fraction > 0.0 && self.dm_fraction.is_finite()) {
            return Err(SiftError::InvalidParameter {
                name: "dm_fraction",
                value: self.dm_fraction,
            });
        }

        Ok(())
    }
}

/// The multi-beam sifting engine.
///
/// `sift` is a pure function of the input batch and the configured
/// thresholds: the output does not depend on the order candidates arrive
/// in, because an internal sort normalizes the scan order.
#[derive(Debug, Clone)]
pub struct Clusterer {
    config: SifterConfig,
}

impl Clusterer {
    /// Create a clusterer with validated thresholds.
    pub fn new(config: SifterConfig) -> Result<Self, SiftError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configured time tolerance in milliseconds.
    pub fn time_thresh_ms(&self) -> f64 {
        self.config.time_thresh_ms
    }

    /// The configured fractional DM tolerance.
    pub fn dm_fraction(&self) -> f64 {
        self.config.dm_fraction
    }

    /// The time tolerance converted to MJD days.
    pub fn mjd_tolerance(&self) -> f64 {
        self.config.time_thresh_ms * 1e-3 / SECONDS_PER_DAY
    }

    /// Group duplicate detections of the same pulse into clusters.
    ///
    /// Returns one [`SiftResult`] per input candidate, sorted by candidate
    /// index. An empty batch yields an empty result.
    ///
    /// # Errors
    /// * [`SiftError::DuplicateIndex`] if two candidates share an index.
    /// * [`SiftError::NonFiniteComparison`] if a candidate has a zero or
    ///   non-finite DM. The fractional DM test divides by the DM of the
    ///   candidate under test, so such rows would silently fall out of
    ///   every matching box; they are rejected up front instead.
    /// * [`SiftError::InvariantViolation`] if a post-scan correctness
    ///   check fails, which indicates an algorithm bug.
    pub fn sift(&self, candidates: &[CandidateRecord]) -> Result<Vec<SiftResult>, SiftError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        for cand in candidates {
            if !seen.insert(cand.index) {
                return Err(SiftError::DuplicateIndex { index: cand.index });
            }

            if cand.dm == 0.0 || !cand.dm.is_finite() {
                return Err(SiftError::NonFiniteComparison {
                    index: cand.index,
                    dm: cand.dm,
                });
            }
        }

        let mjd_tol = self.mjd_tolerance();
        log::info!("Time tolerance: {:.2} ms", self.config.time_thresh_ms);
        log::info!("MJD tolerance: {:.10}", mjd_tol);
        log::info!("DM tolerance: {:.2} %", 100.0 * self.config.dm_fraction);

        // Deterministic scan order, independent of input order. Sorting by
        // MJD first also makes every matching box a contiguous slice.
        let mut sorted: Vec<&CandidateRecord> = candidates.iter().collect();
        sorted.sort_by(|a, b| {
            a.mjd
                .total_cmp(&b.mjd)
                .then_with(|| a.dm.total_cmp(&b.dm))
                .then_with(|| a.snr.total_cmp(&b.snr))
        });

        let n = sorted.len();
        let mut results: Vec<Option<SiftResult>> = vec![None; n];
        let mut processed = vec![false; n];
        let mut cluster_id: u64 = 0;

        for i in 0..n {
            if processed[i] {
                log::debug!(
                    "Candidate was already assigned a cluster, skipping it: {}",
                    sorted[i].index
                );
                continue;
            }

            let cand = sorted[i];

            // Only candidates within the time tolerance can pass the box
            // test, and those form a contiguous range of the MJD-sorted
            // working set.
            let lo = sorted.partition_point(|x| x.mjd < cand.mjd - mjd_tol);
            let hi = sorted.partition_point(|x| x.mjd <= cand.mjd + mjd_tol);

            let mut members = Vec::new();
            for (j, other) in sorted.iter().enumerate().take(hi).skip(lo) {
                if processed[j] {
                    continue;
                }

                // The DM test is asymmetric on purpose: the denominator is
                // always the candidate under test, matching the historical
                // behavior the downstream results depend on.
                if (other.mjd - cand.mjd).abs() <= mjd_tol
                    && (other.dm - cand.dm).abs() / cand.dm <= self.config.dm_fraction
                {
                    members.push(j);
                }
            }

            // The reference implementation does not assume the box test is
            // reflexive, so an empty member set is skipped rather than
            // treated as an error.
            if members.is_empty() {
                log::debug!("No members found for candidate {}", cand.index);
                continue;
            }

            // Head is the member with the highest SNR; ties go to the
            // later entry in (mjd, dm, snr) order, i.e. stable-sort
            // semantics with the last snr-sorted element winning.
            let mut head = members[0];
            for &j in &members[1..] {
                if sorted[j].snr.total_cmp(&sorted[head].snr) != Ordering::Less {
                    head = j;
                }
            }
            let head_index = sorted[head].index;

            let beams = members
                .iter()
                .map(|&j| sorted[j].beam)
                .collect::<HashSet<_>>()
                .len();

            for &j in &members {
                results[j] = Some(SiftResult {
                    index: sorted[j].index,
                    cluster_id,
                    head_index,
                    is_head: sorted[j].index == head_index,
                    members: members.len(),
                    beams,
                });
                processed[j] = true;
            }

            cluster_id += 1;
        }

        let mut output = Vec::with_capacity(n);
        for slot in results {
            match slot {
                Some(res) => output.push(res),
                None => {
                    return Err(SiftError::InvariantViolation(
                        "not all candidates have been processed".into(),
                    ))
                }
            }
        }

        self.check_invariants(candidates, &output)?;

        output.sort_by_key(|r| r.index);

        if let Some(stats) = SiftStats::from_results(&output) {
            stats.log();
        }

        Ok(output)
    }

    /// Post-scan correctness assertions. A failure here is a bug in the
    /// clustering algorithm, not a data problem, and aborts the batch.
    fn check_invariants(
        &self,
        candidates: &[CandidateRecord],
        output: &[SiftResult],
    ) -> Result<(), SiftError> {
        let input_indices: HashSet<u64> = candidates.iter().map(|c| c.index).collect();
        let output_indices: HashSet<u64> = output.iter().map(|r| r.index).collect();

        if output.len() != output_indices.len() || input_indices != output_indices {
            return Err(SiftError::InvariantViolation(
                "output indices do not match the input index set".into(),
            ));
        }

        let heads = output.iter().filter(|r| r.is_head).count();
        let distinct_heads: HashSet<u64> = output.iter().map(|r| r.head_index).collect();

        if heads != distinct_heads.len() {
            return Err(SiftError::InvariantViolation(format!(
                "head count mismatch: {} marked heads, {} distinct head indices",
                heads,
                distinct_heads.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, HashSet};

    fn candidate(index: u64, mjd: f64, dm: f64, snr: f64, beam: u32) -> CandidateRecord {
        CandidateRecord {
            index,
            mjd,
            dm,
            snr,
            beam,
            coherent: true,
        }
    }

    fn default_clusterer() -> Clusterer {
        Clusterer::new(SifterConfig::default()).unwrap()
    }

    /// Random batch with a handful of dense pulse groups plus scattered
    /// single-beam detections.
    fn random_batch(seed: u64, n: usize) -> Vec<CandidateRecord> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut candidates = Vec::with_capacity(n);

        for i in 0..n {
            let (mjd, dm) = if rng.gen_bool(0.6) {
                // member of one of ten pulse groups
                let group = rng.gen_range(0..10) as f64;
                let mjd = 58000.0 + group * 0.01 + rng.gen_range(-2e-8..2e-8);
                let dm = 100.0 * (1.0 + group * 0.1) * (1.0 + rng.gen_range(-0.005..0.005));
                (mjd, dm)
            } else {
                (
                    58000.0 + rng.gen_range(0.0..1.0),
                    rng.gen_range(3.0..1000.0),
                )
            };

            candidates.push(candidate(
                i as u64,
                mjd,
                dm,
                rng.gen_range(8.0..50.0),
                rng.gen_range(0..400),
            ));
        }

        candidates
    }

    #[test]
    fn test_invalid_parameters() {
        for (time, dm) in [(0.0, 0.02), (-1.0, 0.02), (10.0, 0.0), (10.0, -0.5)] {
            let result = Clusterer::new(SifterConfig {
                time_thresh_ms: time,
                dm_fraction: dm,
            });
            assert!(matches!(result, Err(SiftError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn test_empty_batch() {
        let results = default_clusterer().sift(&[]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_single_candidate() {
        let results = default_clusterer()
            .sift(&[candidate(7, 58000.0, 100.0, 12.0, 3)])
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 7);
        assert_eq!(results[0].cluster_id, 0);
        assert_eq!(results[0].head_index, 7);
        assert!(results[0].is_head);
        assert_eq!(results[0].members, 1);
        assert_eq!(results[0].beams, 1);
    }

    #[test]
    fn test_two_beams_one_pulse() {
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.0, 100.0, 20.0, 1),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.cluster_id == 0));
        assert!(results.iter().all(|r| r.members == 2));
        assert!(results.iter().all(|r| r.beams == 2));
        assert!(results.iter().all(|r| r.head_index == 1));
        assert!(!results[0].is_head);
        assert!(results[1].is_head);
    }

    #[test]
    fn test_time_separated_pulses() {
        // 10 ms tolerance; 1 s apart in time
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.0 + 1.0 / 86_400.0, 100.0, 10.0, 0),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();

        assert_eq!(results[0].cluster_id, 0);
        assert_eq!(results[1].cluster_id, 1);
        assert!(results.iter().all(|r| r.members == 1 && r.is_head));
    }

    #[test]
    fn test_dm_separated_pulses() {
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.0, 150.0, 10.0, 1),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();

        assert_eq!(results[0].cluster_id, 0);
        assert_eq!(results[1].cluster_id, 1);
    }

    #[test]
    fn test_snr_tie_break_is_last_in_sort_order() {
        // Same MJD and SNR; the head must be the later entry in
        // (mjd, dm, snr) order, i.e. the higher-DM candidate.
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.0, 101.0, 10.0, 1),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();

        assert!(results.iter().all(|r| r.cluster_id == 0));
        assert!(results.iter().all(|r| r.head_index == 1));
    }

    #[test]
    fn test_asymmetric_dm_test() {
        // |102.04 - 100| / 100 > 0.02 but |102.04 - 100| / 102.04 < 0.02,
        // so whether the pair clusters depends on which candidate opens
        // the box, which in turn depends on the scan order.
        let mjd_offset = 1e-8; // well inside the time tolerance

        // Lower-DM candidate scanned first: pair stays separate.
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.0 + mjd_offset, 102.04, 10.0, 1),
        ];
        let results = default_clusterer().sift(&candidates).unwrap();
        assert_eq!(results[0].cluster_id, 0);
        assert_eq!(results[1].cluster_id, 1);

        // Higher-DM candidate scanned first: its box covers the other.
        let candidates = vec![
            candidate(0, 58000.0 + mjd_offset, 100.0, 10.0, 0),
            candidate(1, 58000.0, 102.04, 10.0, 1),
        ];
        let results = default_clusterer().sift(&candidates).unwrap();
        assert!(results.iter().all(|r| r.cluster_id == 0));
        assert!(results.iter().all(|r| r.members == 2));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let candidates = vec![
            candidate(3, 58000.0, 100.0, 10.0, 0),
            candidate(3, 58000.5, 200.0, 12.0, 1),
        ];

        let result = default_clusterer().sift(&candidates);
        assert!(matches!(
            result,
            Err(SiftError::DuplicateIndex { index: 3 })
        ));
    }

    #[test]
    fn test_zero_dm_rejected() {
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 0),
            candidate(1, 58000.5, 0.0, 12.0, 1),
        ];

        let result = default_clusterer().sift(&candidates);
        assert!(matches!(
            result,
            Err(SiftError::NonFiniteComparison { index: 1, .. })
        ));
    }

    #[test]
    fn test_output_sorted_by_index() {
        let candidates = vec![
            candidate(5, 58000.9, 300.0, 10.0, 0),
            candidate(2, 58000.1, 100.0, 10.0, 1),
            candidate(9, 58000.5, 200.0, 10.0, 2),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();
        let indices: Vec<u64> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 5, 9]);
    }

    #[test]
    fn test_determinism_under_shuffling() {
        let mut rng = ChaCha8Rng::seed_from_u64(1337);
        let mut candidates = random_batch(42, 500);

        let reference = default_clusterer().sift(&candidates).unwrap();

        for _ in 0..5 {
            candidates.shuffle(&mut rng);
            let shuffled = default_clusterer().sift(&candidates).unwrap();
            assert_eq!(shuffled, reference);
        }
    }

    #[test]
    fn test_completeness_and_head_uniqueness() {
        let candidates = random_batch(7, 2000);
        let clusterer = default_clusterer();
        let results = clusterer.sift(&candidates).unwrap();

        // one result per input index
        assert_eq!(results.len(), candidates.len());
        let input: HashSet<u64> = candidates.iter().map(|c| c.index).collect();
        let output: HashSet<u64> = results.iter().map(|r| r.index).collect();
        assert_eq!(input, output);

        // one head per cluster, no orphaned heads
        let heads: HashSet<u64> = results
            .iter()
            .filter(|r| r.is_head)
            .map(|r| r.index)
            .collect();
        let head_refs: HashSet<u64> = results.iter().map(|r| r.head_index).collect();
        let clusters: HashSet<u64> = results.iter().map(|r| r.cluster_id).collect();
        assert_eq!(heads, head_refs);
        assert_eq!(heads.len(), clusters.len());
    }

    #[test]
    fn test_cluster_geometry_and_head_snr() {
        let candidates = random_batch(11, 1000);
        let clusterer = default_clusterer();
        let mjd_tol = clusterer.mjd_tolerance();
        let results = clusterer.sift(&candidates).unwrap();

        let by_index: HashMap<u64, &CandidateRecord> =
            candidates.iter().map(|c| (c.index, c)).collect();

        let mut clusters: HashMap<u64, Vec<&SiftResult>> = HashMap::new();
        for res in &results {
            clusters.entry(res.cluster_id).or_default().push(res);
        }

        for members in clusters.values() {
            let head = by_index[&members[0].head_index];

            for res in members {
                let cand = by_index[&res.index];
                assert_eq!(res.members, members.len());

                // all members share the head reference
                assert_eq!(res.head_index, head.index);

                // the head has the maximum SNR in the cluster
                assert!(head.snr >= cand.snr);

                // members were gathered from a single matching box, so the
                // pairwise time spread is bounded by twice the tolerance
                assert!((cand.mjd - head.mjd).abs() <= 2.0 * mjd_tol);
            }
        }
    }

    #[test]
    fn test_beam_count_is_distinct_beams() {
        let candidates = vec![
            candidate(0, 58000.0, 100.0, 10.0, 4),
            candidate(1, 58000.0, 100.0, 11.0, 4),
            candidate(2, 58000.0, 100.0, 12.0, 5),
        ];

        let results = default_clusterer().sift(&candidates).unwrap();
        assert!(results.iter().all(|r| r.members == 3));
        assert!(results.iter().all(|r| r.beams == 2));
    }
}
