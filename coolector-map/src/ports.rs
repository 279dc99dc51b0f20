//! Collaborateurs externes consommés par la carte
//!
//! Tous sont partagés (`Rc`) entre plusieurs écrans d'une même boucle
//! d'événements ; les mutateurs prennent donc `&self` et les implémentations
//! gèrent leur mutabilité intérieure.

use std::rc::Rc;

use crate::channel::EventChannel;
use crate::logging::Logger;
use crate::types::{FilterState, GeoPoint};

/// Fournisseur de position de l'appareil
pub trait LocationProvider {
    /// Dernière position connue
    fn current(&self) -> Option<GeoPoint>;
}

/// Magasin des filtres de recherche ; chaque mutateur persiste immédiatement
pub trait FilterStore {
    fn filters(&self) -> FilterState;
    fn set_center(&self, center: GeoPoint);
    fn set_default_center(&self, center: GeoPoint);
    fn set_zoom_level(&self, zoom_level: u8);
    fn set_radius(&self, radius_meters: f64);
}

/// Traduction d'une clé
pub trait Translator {
    fn tr(&self, key: &str) -> String;
}

/// Génération d'URL à partir d'une route nommée
pub trait RouteGenerator {
    fn generate(&self, route: &str, params: &[(&str, &str)]) -> String;
}

/// Ensemble des collaborateurs passés au contrôleur
#[derive(Clone)]
pub struct Collaborators {
    pub location: Rc<dyn LocationProvider>,
    pub filters: Rc<dyn FilterStore>,
    pub channel: Rc<dyn EventChannel>,
    pub translator: Rc<dyn Translator>,
    pub router: Rc<dyn RouteGenerator>,
    pub logger: Rc<dyn Logger>,
}
