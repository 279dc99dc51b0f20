//! Rayon de recherche dérivé du viewport
//!
//! Distance orthodromique entre le centre du viewport et son coin nord-est,
//! par la loi sphérique des cosinus :
//!
//! ```text
//! d = R · acos( sin(φ1)·sin(φ2) + cos(φ1)·cos(φ2)·cos(Δλ) )
//! ```
//!
//! Les constantes reproduisent au bit près les rayons calculés par le client
//! web historique : R = 6 378 000,41 m et conversion degrés → radians par
//! division par 57,2958 (et non π/180).

use crate::types::{Bounds, GeoPoint};
use crate::MapError;

/// Rayon terrestre en mètres
pub const EARTH_RADIUS_METERS: f64 = 6_378_000.41;

/// Diviseur degrés → radians
pub const DEGREES_PER_RADIAN: f64 = 57.2958;

/// Convertit des degrés en radians avec le diviseur historique
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    degrees / DEGREES_PER_RADIAN
}

/// Distance en mètres entre deux points
///
/// # Errors
///
/// Retourne `MapError::InvalidCoordinates` si un point n'est pas fini ou hors
/// bornes, et `MapError::DegenerateGeometry` si le résultat n'est pas fini.
pub fn distance_meters(from: GeoPoint, to: GeoPoint) -> Result<f64, MapError> {
    let from = from.validate()?;
    let to = to.validate()?;

    let lat1 = to_radians(from.latitude);
    let lng1 = to_radians(from.longitude);
    let lat2 = to_radians(to.latitude);
    let lng2 = to_radians(to.longitude);

    let cosine = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lng2 - lng1).cos();

    // L'arrondi peut pousser le cosinus juste au-delà de 1 pour deux points
    // confondus, acos rendrait alors NaN
    let cosine = cosine.clamp(-1.0, 1.0);

    let distance = EARTH_RADIUS_METERS * cosine.acos();
    if !distance.is_finite() {
        return Err(MapError::DegenerateGeometry(format!(
            "distance between {} and {} is not finite",
            from, to
        )));
    }
    Ok(distance)
}

/// Rayon de recherche pour un viewport : centre → coin nord-est
pub fn viewport_radius(bounds: &Bounds) -> Result<f64, MapError> {
    distance_meters(bounds.center(), bounds.north_east())
}
