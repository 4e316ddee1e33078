//! Fixed-point planar coordinates.
//!
//! OSM coordinates are stored as integers in units of 1e-7 degrees so that
//! equality and orderings are exact. [`Location`] is the currency of the
//! whole assembly pipeline; floating point only appears at the rim, when
//! converting to and from [`geo::Coord`] degrees.

use geo::Coord;
use std::fmt;

/// Number of fixed-point units per degree.
pub const COORDINATE_PRECISION: f64 = 10_000_000.0;

/// A coordinate pair in fixed-point nano-degree units.
///
/// `x` is longitude, `y` is latitude, both scaled by 1e7. The derived
/// ordering is lexicographic on `(x, y)`, which is the order used for
/// segment normalisation and sorting during ring assembly.
///
/// # Examples
/// ```
/// use landform_core::Location;
///
/// let a = Location::new(0, 10);
/// let b = Location::new(10, 0);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Longitude in 1e-7 degree units.
    pub x: i32,
    /// Latitude in 1e-7 degree units.
    pub y: i32,
}

impl Location {
    /// Construct a location from raw fixed-point units.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert degree coordinates into a fixed-point location.
    ///
    /// Returns `None` when either coordinate is non-finite or outside the
    /// WGS84 range.
    pub fn from_degrees(lon: f64, lat: f64) -> Option<Self> {
        (lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat))
        .then(|| Self {
            x: (lon * COORDINATE_PRECISION).round() as i32,
            y: (lat * COORDINATE_PRECISION).round() as i32,
        })
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        f64::from(self.x) / COORDINATE_PRECISION
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        f64::from(self.y) / COORDINATE_PRECISION
    }

    /// The location as a degree coordinate with `x = longitude`.
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon(),
            y: self.lat(),
        }
    }
}

impl From<Location> for Coord<f64> {
    fn from(location: Location) -> Self {
        location.to_coord()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn orders_by_x_then_y() {
        let mut locations = vec![
            Location::new(5, 0),
            Location::new(0, 7),
            Location::new(0, 3),
            Location::new(-2, 9),
        ];
        locations.sort();
        assert_eq!(
            locations,
            vec![
                Location::new(-2, 9),
                Location::new(0, 3),
                Location::new(0, 7),
                Location::new(5, 0),
            ]
        );
    }

    #[rstest]
    #[case(13.377_777_5, 52.516_388_9)]
    #[case(-180.0, -90.0)]
    #[case(180.0, 90.0)]
    fn degree_round_trip_is_exact_to_precision(#[case] lon: f64, #[case] lat: f64) {
        let location = Location::from_degrees(lon, lat).expect("valid coordinates");
        assert!((location.lon() - lon).abs() < 1.0e-7);
        assert!((location.lat() - lat).abs() < 1.0e-7);
    }

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    #[case(180.1, 0.0)]
    #[case(0.0, -90.1)]
    fn rejects_out_of_range_degrees(#[case] lon: f64, #[case] lat: f64) {
        assert_eq!(Location::from_degrees(lon, lat), None);
    }
}
