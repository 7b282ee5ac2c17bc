//! Geographic coordinate types shared by incidents and stations.

use serde::{Deserialize, Serialize};

/// Represents a fully resolved geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use strike_weather::LatLon;
///
/// let philadelphia = LatLon(39.87, -75.24);
/// assert_eq!(philadelphia.0, 39.87); // Latitude
/// assert_eq!(philadelphia.1, -75.24); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

/// A coordinate as read from a source record, where either component may be missing.
///
/// Source tables (strike reports, the station registry) contain rows with blank or
/// unparseable coordinates. Those rows are kept; they simply have no distance to anything.
/// A `NaN` component is treated the same as a missing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees, if known.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if known.
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns the coordinate as a [`LatLon`] when both components are defined.
    pub fn resolve(&self) -> Option<LatLon> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => Some(LatLon(lat, lon)),
            _ => None,
        }
    }
}

impl From<LatLon> for Coordinates {
    fn from(value: LatLon) -> Self {
        Self::new(Some(value.0), Some(value.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_both_components() {
        assert_eq!(
            Coordinates::new(Some(40.0), Some(-75.0)).resolve(),
            Some(LatLon(40.0, -75.0))
        );
        assert_eq!(Coordinates::new(None, Some(-75.0)).resolve(), None);
        assert_eq!(Coordinates::new(Some(40.0), None).resolve(), None);
        assert_eq!(Coordinates::new(Some(f64::NAN), Some(-75.0)).resolve(), None);
    }

    #[test]
    fn from_lat_lon_is_fully_resolved() {
        let coordinates = Coordinates::from(LatLon(39.87, -75.24));
        assert_eq!(coordinates, Coordinates::new(Some(39.87), Some(-75.24)));
        assert_eq!(coordinates.resolve(), Some(LatLon(39.87, -75.24)));
    }
}
