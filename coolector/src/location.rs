//! Service de localisation de l'appareil

use std::cell::Cell;
use std::rc::Rc;

use coolector_map::{ChannelEvent, EventChannel, GeoPoint, LocationProvider, LocationUpdate};
use tracing::{debug, info};

/// Dernière position connue, diffusée sur le canal à chaque mise à jour
pub struct LocationService {
    channel: Rc<dyn EventChannel>,
    current: Cell<Option<GeoPoint>>,
}

impl LocationService {
    pub fn new(channel: Rc<dyn EventChannel>) -> Self {
        Self {
            channel,
            current: Cell::new(None),
        }
    }

    /// Enregistre une nouvelle position et publie `location:loaded`
    pub fn update(&self, position: GeoPoint) {
        let first = self.current.replace(Some(position)).is_none();
        if first {
            info!(position = %position, "location acquired");
        } else {
            debug!(position = %position, "location updated");
        }
        self.channel.publish(&ChannelEvent::LocationLoaded(LocationUpdate::new(
            position.latitude,
            position.longitude,
        )));
    }

    /// Demande à la carte de se recentrer, publie `location:reset-center`
    pub fn reset_center(&self, center: GeoPoint) {
        debug!(center = %center, "reset center requested");
        self.channel.publish(&ChannelEvent::ResetCenter(center));
    }
}

impl LocationProvider for LocationService {
    fn current(&self) -> Option<GeoPoint> {
        self.current.get()
    }
}

impl std::fmt::Debug for LocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationService")
            .field("current", &self.current.get())
            .finish()
    }
}
