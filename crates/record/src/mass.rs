//! Unit normalization for the `mass` field.
//!
//! Stored masses come from several generations of fixtures: most are
//! kilograms, some were entered in quintals (centners) and some in ounces. The
//! unit is not recorded, so it is guessed from the magnitude.

/// Kilograms per avoirdupois ounce.
pub const KG_PER_OZ: f64 = 0.0283495;

/// Kilograms per quintal (centner).
pub const KG_PER_QUINTAL: f64 = 100.0;

const QUINTAL_LOWER: f64 = 0.0009;
const QUINTAL_UPPER: f64 = 1.0;
const OUNCE_LOWER: f64 = 620.0;

/// Converts a raw mass value into kilograms.
///
/// - `0.0009 < m < 1` is read as quintals.
/// - `m > 620` is read as ounces.
/// - anything else is already kilograms.
///
/// All bounds are exclusive.
pub fn normalize_mass(m: f64) -> f64 {
    if m > QUINTAL_LOWER && m < QUINTAL_UPPER {
        m * KG_PER_QUINTAL
    } else if m > OUNCE_LOWER {
        m * KG_PER_OZ
    } else {
        m
    }
}
