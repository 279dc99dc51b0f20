//! Abstraction de la surface cartographique
//!
//! Le contrôleur ne connaît le widget tiers (Google Maps, Leaflet...) qu'à
//! travers [`MapSurface`]. [`memory::MemorySurface`] fournit une surface en
//! mémoire pour les tests et le pilote headless.

pub mod memory;

use std::fmt;

use crate::marker::style::{MarkerColor, MarkerSize};
use crate::types::{Bounds, GeoPoint};
use crate::MapError;

pub use memory::{MemorySurface, MemorySurfaceFactory, MemorySurfaceHandle, SurfaceOp};

macro_rules! surface_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

surface_id!(
    /// Identifiant d'un marqueur posé sur la surface
    MarkerId
);
surface_id!(
    /// Identifiant d'une info-bulle
    InfoWindowId
);
surface_id!(
    /// Identifiant d'un cercle
    CircleId
);
surface_id!(
    /// Identifiant d'un listener enregistré
    ListenerId
);

/// Événement émis par la surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    ZoomChanged,
    DragEnd,
    CenterChanged,
    MarkerClick(MarkerId),
}

/// Type d'événement, clé d'enregistrement des listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEventKind {
    ZoomChanged,
    DragEnd,
    CenterChanged,
    MarkerClick,
}

impl SurfaceEvent {
    pub fn kind(&self) -> SurfaceEventKind {
        match self {
            Self::ZoomChanged => SurfaceEventKind::ZoomChanged,
            Self::DragEnd => SurfaceEventKind::DragEnd,
            Self::CenterChanged => SurfaceEventKind::CenterChanged,
            Self::MarkerClick(_) => SurfaceEventKind::MarkerClick,
        }
    }
}

impl SurfaceEventKind {
    /// Nom de l'événement côté widget
    pub fn name(&self) -> &'static str {
        match self {
            Self::ZoomChanged => "zoom_changed",
            Self::DragEnd => "dragend",
            Self::CenterChanged => "center_changed",
            Self::MarkerClick => "click",
        }
    }
}

/// Callback appelé de manière synchrone par la boucle d'événements du widget
pub type Listener = Box<dyn FnMut(&SurfaceEvent)>;

/// Options de construction de la surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub center: GeoPoint,
    pub zoom: u8,
    pub min_zoom: u8,
}

/// Icône d'un marqueur : épingle colorée
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub url: String,
    pub color: MarkerColor,
    pub size: MarkerSize,
}

impl Icon {
    /// Épingle "lettre" du service de graphiques, teintée par `color`
    pub fn pin(color: MarkerColor, size: MarkerSize) -> Self {
        Self {
            url: format!(
                "https://chart.googleapis.com/chart?chst=d_map_pin_letter&chld=%E2%80%A2|{}",
                color.hex()
            ),
            color,
            size,
        }
    }
}

/// Options de création d'un marqueur
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: GeoPoint,
    pub title: String,
    pub icon: Icon,
}

/// Options d'un cercle (rayon de recherche)
#[derive(Debug, Clone, PartialEq)]
pub struct CircleOptions {
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub stroke_color: String,
    pub stroke_opacity: f32,
    pub stroke_weight: u8,
    pub fill_color: String,
    pub fill_opacity: f32,
}

impl CircleOptions {
    /// Style du cercle de rayon de recherche
    pub fn search_radius(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
            stroke_color: "#308AF1".to_string(),
            stroke_opacity: 0.8,
            stroke_weight: 2,
            fill_color: "#308AF1".to_string(),
            fill_opacity: 0.3,
        }
    }
}

/// Instance de carte vivante
///
/// Toutes les opérations peuvent échouer : le widget tiers est considéré
/// comme non fiable et chaque erreur est remontée en `MapError`.
pub trait MapSurface {
    fn center(&self) -> Result<GeoPoint, MapError>;
    fn set_center(&mut self, center: GeoPoint) -> Result<(), MapError>;
    fn zoom(&self) -> Result<u8, MapError>;
    fn bounds(&self) -> Result<Bounds, MapError>;

    fn add_listener(
        &mut self,
        kind: SurfaceEventKind,
        listener: Listener,
    ) -> Result<ListenerId, MapError>;
    fn remove_listener(&mut self, id: ListenerId);

    fn add_marker(&mut self, options: MarkerOptions) -> Result<MarkerId, MapError>;
    fn set_marker_position(&mut self, marker: MarkerId, position: GeoPoint)
        -> Result<(), MapError>;
    /// Détache le marqueur de la surface
    fn remove_marker(&mut self, marker: MarkerId);

    fn add_info_window(&mut self, content: String) -> Result<InfoWindowId, MapError>;
    /// Ouvre l'info-bulle ancrée sur le marqueur
    fn open_info_window(&mut self, window: InfoWindowId, anchor: MarkerId)
        -> Result<(), MapError>;
    fn remove_info_window(&mut self, window: InfoWindowId);

    fn add_circle(&mut self, options: CircleOptions) -> Result<CircleId, MapError>;
    fn remove_circle(&mut self, circle: CircleId);
}

/// Fabrique de surfaces, appelée une fois par activation
pub trait SurfaceFactory {
    fn create(&self, options: SurfaceOptions) -> Result<Box<dyn MapSurface>, MapError>;
}
