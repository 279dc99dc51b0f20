//! Types d'erreurs pour le crate coolector-map

use thiserror::Error;

/// Erreurs pouvant survenir lors de la synchronisation de la carte
///
/// Aucune de ces erreurs ne remonte jusqu'au conteneur : elles sont toutes
/// interceptées par [`crate::guard::isolate`] et transmises au logger.
#[derive(Debug, Error)]
pub enum MapError {
    /// La surface n'a pas pu être construite ou a déjà été libérée
    #[error("Map surface is not available")]
    SurfaceUnavailable,

    /// Erreur remontée par le widget cartographique
    #[error("Map surface error during {operation}: {reason}")]
    Surface { operation: String, reason: String },

    /// Coordonnées non finies ou hors limites
    #[error("Invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Calcul géométrique dégénéré (argument d'arccos non fini)
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Position de l'utilisateur inconnue
    #[error("Device position is not known yet")]
    MissingPosition,

    /// Marqueur inconnu de la surface
    #[error("Unknown marker #{0}")]
    UnknownMarker(u64),

    /// Erreur de canal d'événements
    #[error("Event channel error: {0}")]
    Channel(String),
}

impl MapError {
    /// Crée une erreur de surface avec contexte
    pub fn surface(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Surface {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de coordonnées invalides
    pub fn invalid_coordinates(latitude: f64, longitude: f64) -> Self {
        Self::InvalidCoordinates {
            latitude,
            longitude,
        }
    }
}
