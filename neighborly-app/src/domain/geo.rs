use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
/// Roughly one kilometre of latitude.
const NEIGHBORHOOD_CELL_DEGREES: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Haversine distance in metres.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }

    /// Grid cell these coordinates fall in, as integer cell indices.
    pub fn neighborhood_cell(&self) -> (i64, i64) {
        (
            (self.lat / NEIGHBORHOOD_CELL_DEGREES).round() as i64,
            (self.lng / NEIGHBORHOOD_CELL_DEGREES).round() as i64,
        )
    }

    /// Centre of the neighborhood cell, used as the public position of a cluster.
    pub fn neighborhood_center(&self) -> Coordinates {
        let (lat, lng) = self.neighborhood_cell();
        Coordinates {
            lat: lat as f64 * NEIGHBORHOOD_CELL_DEGREES,
            lng: lng as f64 * NEIGHBORHOOD_CELL_DEGREES,
        }
    }
}
