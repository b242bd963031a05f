//! Match a source position and DM against the pulsar catalogue.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use knownsource::coords::{parse_declination, parse_hour_angle};
use knownsource::{Matcher, MatcherConfig, PsrcatFile};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find matching known sources")]
struct Args {
    /// Right ascension in ICRS frame, hh:mm:ss notation
    ra: String,

    /// Declination in ICRS frame, dd:mm:ss notation
    dec: String,

    /// Dispersion measure in pc cm^-3
    dm: f64,

    /// Path to the psrcat dump file
    #[arg(long)]
    catalogue: PathBuf,

    /// Distance threshold in degrees
    #[arg(long, default_value_t = 1.5)]
    dist_thresh: f64,

    /// DM threshold in per cent
    #[arg(long, default_value_t = 5.0)]
    dm_thresh: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let ra_deg = parse_hour_angle(&args.ra).map_err(anyhow::Error::msg)?;
    let dec_deg = parse_declination(&args.dec).map_err(anyhow::Error::msg)?;

    println!("Source: {:.5} deg, {:.5} deg", ra_deg, dec_deg);
    println!("DM: {}", args.dm);

    let mut matcher = Matcher::new(MatcherConfig {
        dist_thresh_deg: args.dist_thresh,
        dm_thresh_percent: args.dm_thresh,
    })?;

    matcher.load_catalogue("psrcat", &PsrcatFile::new(&args.catalogue))?;
    matcher.create_search_tree()?;

    match matcher.find_matches(ra_deg, dec_deg, args.dm)? {
        Some(entry) => {
            println!(
                "Found match: {}, {:.5}, {:.5}, {}",
                entry.name, entry.ra_deg, entry.dec_deg, entry.dm
            );
        }
        None => println!("No match found."),
    }

    Ok(())
}
