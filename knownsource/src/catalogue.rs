//! Known-source catalogue loading.
//!
//! The reference data comes from a `psrcat` dump: one source per line,
//! semicolon-delimited, with each value followed by its error and
//! reference columns. Catalogue entries are read-only once loaded.

use std::fs;
use std::path::{Path, PathBuf};

use crate::coords::{parse_declination, parse_hour_angle};
use crate::error::MatchError;

/// Number of semicolon-separated fields in a psrcat dump row.
const PSRCAT_FIELDS: usize = 17;

/// One known source from a catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    /// Source name (J2000 name for pulsars).
    pub name: String,
    /// Name of the catalogue the entry came from.
    pub catalogue: String,
    /// Right ascension in degrees (ICRS).
    pub ra_deg: f64,
    /// Declination in degrees (ICRS).
    pub dec_deg: f64,
    /// Dispersion measure in pc cm^-3.
    pub dm: f64,
    /// Source type, e.g. "pulsar" or "HE".
    pub source_type: String,
}

/// Provider of catalogue reference data.
///
/// The matcher only depends on this seam; where the data comes from (a
/// psrcat dump on disk, a database, a test fixture) is up to the caller.
pub trait CatalogueSource {
    /// Load all entries of the named catalogue.
    fn load(&self, name: &str) -> Result<Vec<CatalogueEntry>, MatchError>;
}

/// Catalogue source backed by a psrcat dump file on disk.
#[derive(Debug, Clone)]
pub struct PsrcatFile {
    path: PathBuf,
}

impl PsrcatFile {
    /// Create a source reading from the given psrcat dump.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogueSource for PsrcatFile {
    fn load(&self, name: &str) -> Result<Vec<CatalogueEntry>, MatchError> {
        if name != "psrcat" {
            return Err(MatchError::UnsupportedCatalogue(name.to_string()));
        }

        parse_psrcat(&self.path)
    }
}

/// Fixed in-memory catalogue source, mainly for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue {
    entries: Vec<CatalogueEntry>,
}

impl StaticCatalogue {
    /// Wrap a fixed set of entries.
    pub fn new(entries: Vec<CatalogueEntry>) -> Self {
        Self { entries }
    }
}

impl CatalogueSource for StaticCatalogue {
    fn load(&self, _name: &str) -> Result<Vec<CatalogueEntry>, MatchError> {
        Ok(self.entries.clone())
    }
}

/// Parse a psrcat dump file.
///
/// Expected per-row fields: number, J2000 name, RA (hour angle), Dec
/// (degrees), period, DM and source type, each value followed by its
/// error and reference columns. Rows without a numeric DM are dropped,
/// which removes the non-radio pulsars. A `*` source type maps to
/// `"pulsar"`.
///
/// # Errors
/// [`MatchError::CatalogueLoadFailed`] if the file cannot be read or a
/// row is malformed; [`MatchError::EmptyCatalogue`] if no usable entries
/// remain.
pub fn parse_psrcat(path: &Path) -> Result<Vec<CatalogueEntry>, MatchError> {
    let text = fs::read_to_string(path).map_err(|e| {
        MatchError::CatalogueLoadFailed(format!("cannot read {}: {e}", path.display()))
    })?;

    let mut entries = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        if fields.len() < PSRCAT_FIELDS {
            return Err(MatchError::CatalogueLoadFailed(format!(
                "{}:{}: expected {} fields, got {}",
                path.display(),
                lineno + 1,
                PSRCAT_FIELDS,
                fields.len()
            )));
        }

        // non-radio pulsars have no DM; drop them
        let Ok(dm) = fields[12].parse::<f64>() else {
            continue;
        };
        if !dm.is_finite() {
            continue;
        }

        let ra_deg = parse_hour_angle(fields[3]).map_err(|e| {
            MatchError::CatalogueLoadFailed(format!("{}:{}: {e}", path.display(), lineno + 1))
        })?;
        let dec_deg = parse_declination(fields[6]).map_err(|e| {
            MatchError::CatalogueLoadFailed(format!("{}:{}: {e}", path.display(), lineno + 1))
        })?;

        let source_type = match fields[15] {
            "*" => "pulsar".to_string(),
            other => other.to_string(),
        };

        entries.push(CatalogueEntry {
            name: fields[1].to_string(),
            catalogue: "psrcat".to_string(),
            ra_deg,
            dec_deg,
            dm,
            source_type,
        });
    }

    if entries.is_empty() {
        return Err(MatchError::EmptyCatalogue);
    }

    log::info!(
        "Parsed {} catalogue entries from {}",
        entries.len(),
        path.display()
    );

    Ok(entries)
}
