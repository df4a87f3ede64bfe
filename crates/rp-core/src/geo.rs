//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` stores WGS-84 longitude/latitude as `f64`.  Projection onto a
//! map surface belongs to the renderer; interpolation here is linear in
//! degrees, which is indistinguishable from projected interpolation over
//! the few hundred metres between two recorded samples.

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// The point `t` of the way from `self` to `target` (`t` in `[0, 1]`).
    #[inline]
    pub fn lerp(self, target: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lng: self.lng + t * (target.lng - self.lng),
            lat: self.lat + t * (target.lat - self.lat),
        }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}
