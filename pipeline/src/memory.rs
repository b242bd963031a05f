//! In-memory candidate store, for tests and demos.

use std::collections::HashMap;

use anyhow::bail;
use knownsource::KnownSourceMatch;
use sifter::{CandidateRecord, SiftResult};

use crate::driver::{CandidateSource, HeadPosition, ResultSink};

/// A candidate store holding everything in process memory.
///
/// Stands in for the relational store of the production system; per
/// schedule block it keeps the raw candidates, the beam sky positions,
/// and whatever results the driver writes back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    candidates: HashMap<u64, Vec<CandidateRecord>>,
    /// candidate index -> (ra_deg, dec_deg), per schedule block
    positions: HashMap<u64, HashMap<u64, (f64, f64)>>,
    /// sift results written by the driver, per schedule block
    pub sift_results: HashMap<u64, Vec<SiftResult>>,
    /// known-source matches written by the driver, per schedule block
    pub matches: HashMap<u64, Vec<KnownSourceMatch>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the candidates of one schedule block.
    pub fn insert_candidates(&mut self, schedule_block: u64, candidates: Vec<CandidateRecord>) {
        self.candidates
            .entry(schedule_block)
            .or_default()
            .extend(candidates);
    }

    /// Record the beam sky position of a candidate.
    pub fn set_position(&mut self, schedule_block: u64, index: u64, ra_deg: f64, dec_deg: f64) {
        self.positions
            .entry(schedule_block)
            .or_default()
            .insert(index, (ra_deg, dec_deg));
    }
}

impl CandidateSource for MemoryStore {
    fn fetch_candidates(&self, schedule_block: u64) -> anyhow::Result<Vec<CandidateRecord>> {
        Ok(self
            .candidates
            .get(&schedule_block)
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_head_positions(
        &self,
        schedule_block: u64,
        heads: &[u64],
    ) -> anyhow::Result<Vec<HeadPosition>> {
        let candidates = self.candidates.get(&schedule_block);
        let positions = self.positions.get(&schedule_block);

        let mut out = Vec::with_capacity(heads.len());
        for &index in heads {
            let Some(cand) = candidates.and_then(|c| c.iter().find(|c| c.index == index)) else {
                bail!("unknown candidate index {index} in schedule block {schedule_block}");
            };

            let Some(&(ra_deg, dec_deg)) = positions.and_then(|p| p.get(&index)) else {
                bail!("no beam position for candidate {index} in schedule block {schedule_block}");
            };

            out.push(HeadPosition {
                index,
                ra_deg,
                dec_deg,
                dm: cand.dm,
            });
        }

        Ok(out)
    }
}

impl ResultSink for MemoryStore {
    fn delete_sift_results(&mut self, schedule_block: u64) -> anyhow::Result<()> {
        self.sift_results.remove(&schedule_block);
        Ok(())
    }

    fn write_sift_results(
        &mut self,
        schedule_block: u64,
        results: &[SiftResult],
    ) -> anyhow::Result<()> {
        self.sift_results
            .entry(schedule_block)
            .or_default()
            .extend_from_slice(results);
        Ok(())
    }

    fn delete_known_source_matches(&mut self, schedule_block: u64) -> anyhow::Result<()> {
        self.matches.remove(&schedule_block);
        Ok(())
    }

    fn write_known_source_matches(
        &mut self,
        schedule_block: u64,
        matches: &[KnownSourceMatch],
    ) -> anyhow::Result<()> {
        self.matches
            .entry(schedule_block)
            .or_default()
            .extend_from_slice(matches);
        Ok(())
    }
}
