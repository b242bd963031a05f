//! Batch orchestration of the single-pulse processing pipeline.
//!
//! One schedule block (a bounded observing session) is processed at a
//! time: its candidates are sifted into clusters, the cluster heads are
//! matched against known-source catalogues, and both result sets are
//! handed to the storage collaborator. Re-running a block first deletes
//! its previous results, so repeated runs converge to the same end state.

pub mod config;
pub mod driver;
pub mod memory;

pub use crate::config::PipelineConfig;
pub use crate::driver::{
    run_schedule_block, BlockReport, CandidateSource, HeadPosition, PipelineError, ResultSink,
};
pub use crate::memory::MemoryStore;
