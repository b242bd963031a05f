//! Value types flowing through the sifting pipeline.

/// A single-pulse detection candidate from one beam.
///
/// Constructed by the candidate source (database query or file parser) and
/// consumed read-only by the [`Clusterer`](crate::Clusterer).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Unique identifier within a batch, assigned by the caller.
    pub index: u64,
    /// Detection time as Modified Julian Date (days).
    pub mjd: f64,
    /// Dispersion measure in pc cm^-3.
    pub dm: f64,
    /// Signal-to-noise ratio of the detection.
    pub snr: f64,
    /// Beam the candidate was detected on.
    pub beam: u32,
    /// Whether the detection came from a coherent beam.
    pub coherent: bool,
}

/// Per-candidate output of a sifting run.
///
/// Written once for an entire batch and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiftResult {
    /// Back-reference to the [`CandidateRecord`] index.
    pub index: u64,
    /// Cluster identifier, assigned in discovery order starting at 0.
    pub cluster_id: u64,
    /// Index of the member elected as the cluster representative.
    pub head_index: u64,
    /// True iff this record is the cluster head.
    pub is_head: bool,
    /// Number of candidates in the cluster.
    pub members: usize,
    /// Number of distinct beams among the cluster members.
    pub beams: usize,
}
