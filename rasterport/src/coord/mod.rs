//! DSF tile coordinates and geographic filtering.
//!
//! X-Plane stores scenery in 1° × 1° DSF tiles named after their southwest
//! corner, e.g. `+50+008.dsf`: a signed two-digit latitude followed by a
//! signed three-digit longitude. This module parses those names and provides
//! the optional rectangle used to restrict a conversion run to a region.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors raised while parsing coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// The rectangle argument does not follow `+50+008,+51+009`.
    #[error("invalid rectangle '{0}', should be like +50+008,+51+009")]
    InvalidRect(String),

    /// A filename is not a DSF tile name.
    #[error("'{0}' is not a DSF tile name like +50+008.dsf")]
    InvalidTileName(String),
}

/// Pattern for a DSF tile filename.
///
/// Group 1 is the signed latitude, group 2 the signed longitude.
fn dsf_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([+-]\d{2})([+-]\d{3})\.dsf$").unwrap())
}

/// Pattern for a rectangle given as two corners.
fn rect_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]\d{2})([+-]\d{3}),([+-]\d{2})([+-]\d{3})$").unwrap()
    })
}

/// DSF tile coordinate (1°×1° tile).
///
/// Coordinates are the southwest corner of the tile in integer degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DsfTileCoord {
    /// Latitude of southwest corner (integer degrees).
    pub lat: i16,
    /// Longitude of southwest corner (integer degrees).
    pub lon: i16,
}

impl DsfTileCoord {
    /// Create a new DSF tile coordinate.
    pub fn new(lat: i16, lon: i16) -> Self {
        Self { lat, lon }
    }

    /// Parse a DSF filename such as `+50+008.dsf` or `-33-070.dsf`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rasterport::coord::DsfTileCoord;
    ///
    /// let coord = DsfTileCoord::from_dsf_filename("+50+008.dsf").unwrap();
    /// assert_eq!(coord, DsfTileCoord::new(50, 8));
    /// assert!(DsfTileCoord::from_dsf_filename("readme.txt").is_none());
    /// ```
    pub fn from_dsf_filename(filename: &str) -> Option<Self> {
        let captures = dsf_name_pattern().captures(filename)?;
        let lat = captures[1].parse().ok()?;
        let lon = captures[2].parse().ok()?;
        Some(Self { lat, lon })
    }

    /// Get the X-Plane DSF tile name (e.g., "+53+009").
    pub fn to_name(&self) -> String {
        let lat_sign = if self.lat >= 0 { '+' } else { '-' };
        let lon_sign = if self.lon >= 0 { '+' } else { '-' };
        format!(
            "{}{:02}{}{:03}",
            lat_sign,
            self.lat.abs(),
            lon_sign,
            self.lon.abs()
        )
    }
}

impl fmt::Display for DsfTileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name())
    }
}

/// Inclusive rectangle of DSF tiles.
///
/// Built from two corners; the corners may be given in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    min: DsfTileCoord,
    max: DsfTileCoord,
}

impl TileRect {
    /// Create a rectangle spanning two corner tiles (inclusive).
    pub fn new(a: DsfTileCoord, b: DsfTileCoord) -> Self {
        Self {
            min: DsfTileCoord::new(a.lat.min(b.lat), a.lon.min(b.lon)),
            max: DsfTileCoord::new(a.lat.max(b.lat), a.lon.max(b.lon)),
        }
    }

    /// Southwest corner.
    pub fn min(&self) -> DsfTileCoord {
        self.min
    }

    /// Northeast corner.
    pub fn max(&self) -> DsfTileCoord {
        self.max
    }

    /// Whether a tile lies inside the rectangle, bounds included.
    pub fn contains(&self, tile: DsfTileCoord) -> bool {
        (self.min.lat..=self.max.lat).contains(&tile.lat)
            && (self.min.lon..=self.max.lon).contains(&tile.lon)
    }
}

impl FromStr for TileRect {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidRect(s.to_string());
        let captures = rect_pattern().captures(s.trim()).ok_or_else(invalid)?;

        let mut values = [0i16; 4];
        for (slot, value) in values.iter_mut().enumerate() {
            *value = captures[slot + 1].parse().map_err(|_| invalid())?;
        }

        Ok(Self::new(
            DsfTileCoord::new(values[0], values[1]),
            DsfTileCoord::new(values[2], values[3]),
        ))
    }
}

impl fmt::Display for TileRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_dsf_filename() {
        assert_eq!(
            DsfTileCoord::from_dsf_filename("+50+008.dsf"),
            Some(DsfTileCoord::new(50, 8))
        );
        assert_eq!(
            DsfTileCoord::from_dsf_filename("-33-070.dsf"),
            Some(DsfTileCoord::new(-33, -70))
        );
    }

    #[test]
    fn test_parse_dsf_filename_rejects_other_names() {
        assert!(DsfTileCoord::from_dsf_filename("+50+08.dsf").is_none());
        assert!(DsfTileCoord::from_dsf_filename("50+008.dsf").is_none());
        assert!(DsfTileCoord::from_dsf_filename("+50+008.dsf-new").is_none());
        assert!(DsfTileCoord::from_dsf_filename("+50+008xdsf").is_none());
    }

    #[test]
    fn test_to_name() {
        assert_eq!(DsfTileCoord::new(53, 9).to_name(), "+53+009");
        assert_eq!(DsfTileCoord::new(-1, -120).to_name(), "-01-120");
        assert_eq!(DsfTileCoord::new(0, 0).to_string(), "+00+000");
    }

    #[test]
    fn test_rect_from_str() {
        let rect: TileRect = "+50+008,+51+009".parse().unwrap();
        assert_eq!(rect.min(), DsfTileCoord::new(50, 8));
        assert_eq!(rect.max(), DsfTileCoord::new(51, 9));
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect: TileRect = "+51+009,+50+008".parse().unwrap();
        assert_eq!(rect.min(), DsfTileCoord::new(50, 8));
        assert_eq!(rect.max(), DsfTileCoord::new(51, 9));
    }

    #[test]
    fn test_rect_invalid_syntax() {
        for bad in ["", "+50+008", "+50+008;+51+009", "50008,51009", "+5+008,+51+009"] {
            let err = bad.parse::<TileRect>().unwrap_err();
            assert!(matches!(err, CoordError::InvalidRect(_)), "{bad}");
        }
    }

    #[test]
    fn test_rect_contains_is_inclusive() {
        let rect: TileRect = "+50+008,+51+009".parse().unwrap();
        assert!(rect.contains(DsfTileCoord::new(50, 8)));
        assert!(rect.contains(DsfTileCoord::new(51, 9)));
        assert!(rect.contains(DsfTileCoord::new(50, 9)));
        assert!(!rect.contains(DsfTileCoord::new(52, 10)));
        assert!(!rect.contains(DsfTileCoord::new(49, 8)));
        assert!(!rect.contains(DsfTileCoord::new(50, 7)));
    }

    proptest! {
        #[test]
        fn prop_filename_roundtrips_through_name(lat in -90i16..90, lon in -180i16..180) {
            let coord = DsfTileCoord::new(lat, lon);
            let parsed = DsfTileCoord::from_dsf_filename(&format!("{}.dsf", coord.to_name()));
            prop_assert_eq!(parsed, Some(coord));
        }

        #[test]
        fn prop_contains_matches_bounds(
            lat1 in -90i16..90, lon1 in -180i16..180,
            lat2 in -90i16..90, lon2 in -180i16..180,
            lat in -90i16..90, lon in -180i16..180,
        ) {
            let rect = TileRect::new(DsfTileCoord::new(lat1, lon1), DsfTileCoord::new(lat2, lon2));
            let inside = lat >= lat1.min(lat2) && lat <= lat1.max(lat2)
                && lon >= lon1.min(lon2) && lon <= lon1.max(lon2);
            prop_assert_eq!(rect.contains(DsfTileCoord::new(lat, lon)), inside);
        }
    }
}
