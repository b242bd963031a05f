//! Sky coordinate parsing and spherical geometry helpers.

use nalgebra::Vector3;

/// Parse a sexagesimal string like `"12:34:56.7"` into its components.
///
/// One to three colon-separated components are accepted; missing minutes
/// or seconds default to zero. Returns the sign and the absolute
/// (hours-or-degrees, minutes, seconds) triple.
fn parse_sexagesimal(text: &str) -> Result<(f64, f64, f64, f64), String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty coordinate string".to_string());
    }

    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("too many components in coordinate '{trimmed}'"));
    }

    let mut values = [0.0; 3];
    for (i, part) in parts.iter().enumerate() {
        values[i] = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid component '{part}' in coordinate '{trimmed}'"))?;
    }

    Ok((sign, values[0], values[1], values[2]))
}

/// Parse a right ascension in `hh:mm:ss.s` hour-angle notation to degrees.
pub fn parse_hour_angle(text: &str) -> Result<f64, String> {
    let (sign, hours, minutes, seconds) = parse_sexagesimal(text)?;
    Ok(sign * (hours + minutes / 60.0 + seconds / 3600.0) * 15.0)
}

/// Parse a declination in `±dd:mm:ss.s` notation to degrees.
pub fn parse_declination(text: &str) -> Result<f64, String> {
    let (sign, degrees, minutes, seconds) = parse_sexagesimal(text)?;
    Ok(sign * (degrees + minutes / 60.0 + seconds / 3600.0))
}

/// Embed an RA/Dec position (degrees) on the unit sphere.
///
/// Euclidean nearest-neighbor search in this embedding is monotonic in
/// angular separation, which sidesteps the RA wraparound and pole
/// singularities of searching in RA/Dec space directly.
pub fn unit_vector(ra_deg: f64, dec_deg: f64) -> Vector3<f64> {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();

    Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
}

/// Convert a chord length between two unit vectors into the angular
/// separation in degrees.
pub fn chord_to_separation_deg(chord: f64) -> f64 {
    // guard against chord lengths a hair beyond the sphere diameter
    2.0 * (chord / 2.0).clamp(-1.0, 1.0).asin().to_degrees()
}

/// Great-circle separation between two RA/Dec positions in degrees.
pub fn angular_separation_deg(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let chord = (unit_vector(ra1, dec1) - unit_vector(ra2, dec2)).norm();
    chord_to_separation_deg(chord)
}
