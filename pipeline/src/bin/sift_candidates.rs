//! Perform multi-beam clustering of single-pulse candidates from a file.
//!
//! Input is a plain text file with one candidate per line, whitespace
//! separated: index, MJD, DM, SNR, beam. Lines starting with `#` are
//! skipped. Cluster heads are printed to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sifter::{CandidateRecord, Clusterer, SifterConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Perform multi-beam candidate clustering")]
struct Args {
    /// Candidate file with columns: index mjd dm snr beam
    filename: PathBuf,

    /// Time tolerance for matching in milliseconds
    #[arg(long, default_value_t = 10.0)]
    time_thresh: f64,

    /// Fractional DM tolerance
    #[arg(long, default_value_t = 0.02)]
    dm_thresh: f64,
}

fn parse_candidate_line(line: &str) -> Result<CandidateRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        anyhow::bail!("expected 5 columns (index mjd dm snr beam), got {}", fields.len());
    }

    Ok(CandidateRecord {
        index: fields[0].parse().context("invalid index")?,
        mjd: fields[1].parse().context("invalid mjd")?,
        dm: fields[2].parse().context("invalid dm")?,
        snr: fields[3].parse().context("invalid snr")?,
        beam: fields[4].parse().context("invalid beam")?,
        coherent: true,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.filename)
        .with_context(|| format!("cannot read {}", args.filename.display()))?;

    let mut candidates = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let candidate = parse_candidate_line(line)
            .with_context(|| format!("{}:{}", args.filename.display(), lineno + 1))?;
        candidates.push(candidate);
    }

    let clusterer = Clusterer::new(SifterConfig {
        time_thresh_ms: args.time_thresh,
        dm_fraction: args.dm_thresh,
    })?;

    let results = clusterer.sift(&candidates)?;

    println!("# index mjd dm snr beam members beams");
    for res in results.iter().filter(|r| r.is_head) {
        // sift output is index-sorted but not index-dense, look the head up
        if let Some(cand) = candidates.iter().find(|c| c.index == res.index) {
            println!(
                "{} {:.10} {:.3} {:.1} {} {} {}",
                cand.index, cand.mjd, cand.dm, cand.snr, cand.beam, res.members, res.beams
            );
        }
    }

    Ok(())
}
