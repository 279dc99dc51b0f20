//! # coolector-map
//!
//! Synchronisation du viewport et rendu des marqueurs de la carte Coolector.
//!
//! ## Features
//!
//! - Centre initial choisi entre le centre mémorisé et la position de l'appareil
//! - Rayon de recherche dérivé des bornes visibles (loi des cosinus sphérique)
//! - Marqueur utilisateur unique, marqueurs de remarques colorés par état/catégorie
//! - Surface cartographique abstraite, avec une implémentation en mémoire
//! - Aucune erreur ne remonte au conteneur : tout est journalisé sous une étiquette stable
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coolector_map::{MemorySurfaceFactory, ViewportController, ViewportSettings};
//!
//! let factory = MemorySurfaceFactory::new();
//! let controller = ViewportController::new(collaborators, Box::new(factory), ViewportSettings::default());
//! controller.on_radius_changed(|change| println!("rayon: {} m", change.radius_meters));
//! controller.attach();
//! controller.set_remarks(remarks);
//! ```

pub mod channel;
pub mod error;
pub mod geometry;
pub mod guard;
pub mod logging;
pub mod marker;
pub mod ports;
pub mod surface;
pub mod types;
pub mod viewport;

pub use channel::{ChannelEvent, EventChannel, LocalChannel, SubscriptionToken, Topic};
pub use error::MapError;
pub use geometry::{distance_meters, viewport_radius};
pub use guard::FailureTag;
pub use logging::{Logger, RecordingLogger, TracingLogger};
pub use marker::MarkerRenderer;
pub use ports::{Collaborators, FilterStore, LocationProvider, RouteGenerator, Translator};
pub use surface::{MapSurface, MemorySurfaceFactory, MemorySurfaceHandle, SurfaceFactory};
pub use types::{Bounds, FilterState, GeoPoint, LocationUpdate, RadiusChange, Remark, RemarkCategory};
pub use viewport::{ViewportController, ViewportSettings, ViewportSnapshot};
