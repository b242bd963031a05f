//! The per-schedule-block batch driver.

use knownsource::{KnownSourceMatch, Matcher};
use sifter::{CandidateRecord, Clusterer, SiftResult};
use thiserror::Error;

/// Sky position and DM of a cluster head, resolved by the candidate
/// store (the original system reads these off the beam that detected the
/// head).
#[derive(Debug, Clone, PartialEq)]
pub struct HeadPosition {
    /// Candidate index of the cluster head.
    pub index: u64,
    /// Beam right ascension in degrees (ICRS).
    pub ra_deg: f64,
    /// Beam declination in degrees (ICRS).
    pub dec_deg: f64,
    /// Dispersion measure of the head candidate.
    pub dm: f64,
}

/// Where candidates come from. Implemented by the external persistence
/// collaborator; candidates may arrive in any order, the clusterer
/// imposes its own.
pub trait CandidateSource {
    /// All raw candidates of one schedule block.
    fn fetch_candidates(&self, schedule_block: u64) -> anyhow::Result<Vec<CandidateRecord>>;

    /// Sky positions and DMs for the given cluster head indices.
    fn fetch_head_positions(
        &self,
        schedule_block: u64,
        heads: &[u64],
    ) -> anyhow::Result<Vec<HeadPosition>>;
}

/// Where results go. Deletions exist so that re-running a schedule block
/// replaces its previous results instead of accumulating duplicates.
pub trait ResultSink {
    /// Remove all sift results previously stored for the block.
    fn delete_sift_results(&mut self, schedule_block: u64) -> anyhow::Result<()>;

    /// Store the sift results of one full batch.
    fn write_sift_results(
        &mut self,
        schedule_block: u64,
        results: &[SiftResult],
    ) -> anyhow::Result<()>;

    /// Remove all known-source matches previously stored for the block.
    fn delete_known_source_matches(&mut self, schedule_block: u64) -> anyhow::Result<()>;

    /// Store the known-source matches of the block's cluster heads.
    fn write_known_source_matches(
        &mut self,
        schedule_block: u64,
        matches: &[KnownSourceMatch],
    ) -> anyhow::Result<()>;
}

/// Errors that abort the processing of one schedule block.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The schedule block has no candidates to process.
    #[error("no single-pulse candidates found for schedule block {0}")]
    NoCandidatesFound(u64),

    /// The clustering engine rejected the batch.
    #[error(transparent)]
    Sift(#[from] sifter::SiftError),

    /// The known-source matcher failed.
    #[error(transparent)]
    Match(#[from] knownsource::MatchError),

    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Counts reported after a successful block run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReport {
    /// Candidates processed.
    pub candidates: usize,
    /// Cluster heads found.
    pub heads: usize,
    /// Heads with a known-source match.
    pub matched: usize,
}

/// Process one schedule block end to end.
///
/// Deletes any previous results for the block, sifts its candidates,
/// stores the sift results, matches the cluster heads against the
/// loaded catalogues and stores the matches. The matcher must be ready
/// (catalogue loaded, search tree built).
///
/// Any error aborts the block; no retry is attempted here. Partial
/// output may have been written before the failure, but the
/// delete-then-insert sequence makes a re-run converge regardless.
pub fn run_schedule_block<S>(
    schedule_block: u64,
    clusterer: &Clusterer,
    matcher: &Matcher,
    store: &mut S,
) -> Result<BlockReport, PipelineError>
where
    S: CandidateSource + ResultSink,
{
    log::info!("Deleting previous results for schedule block {schedule_block}");
    store.delete_sift_results(schedule_block)?;
    store.delete_known_source_matches(schedule_block)?;

    log::info!("Loading candidates for schedule block {schedule_block}");
    let candidates = store.fetch_candidates(schedule_block)?;
    if candidates.is_empty() {
        return Err(PipelineError::NoCandidatesFound(schedule_block));
    }
    log::info!("Candidates loaded: {}", candidates.len());

    let results = clusterer.sift(&candidates)?;
    store.write_sift_results(schedule_block, &results)?;

    let heads: Vec<u64> = results
        .iter()
        .filter(|r| r.is_head)
        .map(|r| r.index)
        .collect();
    log::info!("Cluster heads: {}", heads.len());

    let positions = store.fetch_head_positions(schedule_block, &heads)?;

    let mut matches = Vec::new();
    for head in &positions {
        if let Some(entry) = matcher.find_matches(head.ra_deg, head.dec_deg, head.dm)? {
            matches.push(KnownSourceMatch::new(head.index, entry));
        }
    }

    log::info!("Heads with a known-source match: {}", matches.len());
    store.write_known_source_matches(schedule_block, &matches)?;

    Ok(BlockReport {
        candidates: candidates.len(),
        heads: heads.len(),
        matched: matches.len(),
    })
}
