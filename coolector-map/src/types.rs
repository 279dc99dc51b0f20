//! Types de données pour le crate coolector-map

use std::fmt;

use geo::{Coord, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::MapError;

/// Point géographique en degrés décimaux (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Valeur sentinelle "non défini" du centre des filtres
    pub const UNSET: GeoPoint = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Vrai si les deux coordonnées valent zéro
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Vérifie que le point est fini et dans les bornes WGS84
    pub fn validate(self) -> Result<Self, MapError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(self)
        } else {
            Err(MapError::invalid_coordinates(self.latitude, self.longitude))
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(c: Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

/// Rectangle visible de la carte (viewport)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    pub fn new(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Centre du rectangle
    ///
    /// Les viewports traversant l'antiméridien ne sont pas gérés.
    pub fn center(&self) -> GeoPoint {
        Rect::new(Coord::from(self.south_west), Coord::from(self.north_east))
            .center()
            .into()
    }

    pub fn north_east(&self) -> GeoPoint {
        self.north_east
    }
}

/// État des filtres de recherche
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Centre de recherche ((0,0) = non défini)
    pub center: GeoPoint,

    /// Niveau de zoom mémorisé
    pub zoom_level: u8,

    /// Rayon de recherche, toujours dérivé du viewport
    pub radius_meters: f64,

    /// Agrandir les remarques les mieux notées
    pub distinguish_liked: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            center: GeoPoint::UNSET,
            zoom_level: 15,
            radius_meters: 1000.0,
            distinguish_liked: false,
        }
    }
}

/// Catégorie d'une remarque
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemarkCategory {
    Accidents,
    Damages,
    Litter,
    Other(String),
}

impl RemarkCategory {
    /// Nom de la catégorie tel qu'utilisé par l'API et les traductions
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accidents => "accidents",
            Self::Damages => "damages",
            Self::Litter => "litter",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for RemarkCategory {
    fn from(name: String) -> Self {
        match name.as_str() {
            "accidents" => Self::Accidents,
            "damages" => Self::Damages,
            "litter" => Self::Litter,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for RemarkCategory {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<RemarkCategory> for String {
    fn from(category: RemarkCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for RemarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Une remarque signalée par un utilisateur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remark {
    pub id: String,
    pub location: GeoPoint,
    pub category: RemarkCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub resolved: bool,
}

/// Coordonnées transportées par l'événement `location:loaded`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub latitude: f64,
    pub longitude: f64,
}

/// Charge utile de l'événement `location:loaded`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub coords: Coords,
}

impl LocationUpdate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coords: Coords {
                latitude,
                longitude,
            },
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.coords.latitude, self.coords.longitude)
    }
}

/// Notification émise après chaque recalcul du rayon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusChange {
    pub radius_meters: f64,
    pub center: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_sentinel() {
        assert!(GeoPoint::UNSET.is_unset());
        assert!(!GeoPoint::new(0.0, 1e-9).is_unset());
    }

    #[test]
    fn test_validate() {
        assert!(GeoPoint::new(52.23, 21.01).validate().is_ok());
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_bounds_center() {
        let bounds = Bounds::new(GeoPoint::new(50.0, 18.0), GeoPoint::new(52.0, 22.0));
        assert_eq!(bounds.center(), GeoPoint::new(51.0, 20.0));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(RemarkCategory::from("accidents"), RemarkCategory::Accidents);
        assert_eq!(
            RemarkCategory::from("graffiti"),
            RemarkCategory::Other("graffiti".to_string())
        );
        assert_eq!(RemarkCategory::from("graffiti").as_str(), "graffiti");
    }
}
