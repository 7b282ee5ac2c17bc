//! Great-circle distance between two coordinates.

use crate::types::location::Coordinates;
use haversine::{distance, Location as HaversineLocation, Units};

/// Returns the great-circle distance in kilometers between `from` and `to`, rounded to
/// two decimals.
///
/// Returns `None` when either side has a missing (or `NaN`) component. Callers must treat
/// `None` as "no distance available" and leave the pair out of any ranking.
///
/// # Examples
///
/// ```
/// use strike_weather::{distance_km, Coordinates};
///
/// let a = Coordinates::new(Some(40.0), Some(-75.0));
/// let b = Coordinates::new(Some(40.0), None);
/// assert!(distance_km(&a, &a).is_some_and(|d| d == 0.0));
/// assert_eq!(distance_km(&a, &b), None);
/// ```
pub fn distance_km(from: &Coordinates, to: &Coordinates) -> Option<f64> {
    let from = from.resolve()?;
    let to = to.resolve()?;
    let km = distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    );
    Some(round_2(km))
}

fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(Some(lat), Some(lon))
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (point(40.0, -75.0), point(40.0089932, -75.0)),
            (point(51.47, -0.45), point(40.64, -73.78)),
            (point(0.0, 179.9), point(0.0, -179.9)),
            (point(64.8, -147.9), point(21.3, -157.9)),
        ];
        for (a, b) in pairs {
            let ab = distance_km(&a, &b).unwrap();
            let ba = distance_km(&b, &a).unwrap();
            assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
        }
    }

    #[test]
    fn test_distance_rounded_to_two_decimals() {
        let d = distance_km(&point(40.0, -75.0), &point(40.5, -75.3)).unwrap();
        assert!(((d * 100.0).round() - d * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_latitude() {
        // 1 degree of latitude on a 6371 km sphere.
        let d = distance_km(&point(40.0, -75.0), &point(41.0, -75.0)).unwrap();
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_undefined_coordinates() {
        let defined = point(40.0, -75.0);
        let missing_lat = Coordinates::new(None, Some(-75.0));
        let missing_lon = Coordinates::new(Some(40.0), None);
        let nan = Coordinates::new(Some(f64::NAN), Some(-75.0));

        assert_eq!(distance_km(&defined, &missing_lat), None);
        assert_eq!(distance_km(&missing_lon, &defined), None);
        assert_eq!(distance_km(&nan, &defined), None);
        assert_eq!(distance_km(&Coordinates::default(), &Coordinates::default()), None);
    }
}
