//! # coolector
//!
//! Coquille applicative de Coolector autour de la carte des remarques.
//!
//! ## Features
//!
//! - Configuration par presets embarqués (local, development, production)
//! - Filtres de recherche persistés en JSON
//! - Service de localisation et écran d'accueil
//! - Traductions et routes nommées
//! - Pilote headless sur surface en mémoire
//!
//! ## Usage CLI
//!
//! ```bash
//! # Rayon de recherche d'un viewport
//! coolector radius --center 52.2297,21.0122 --north-east 52.2399,21.0342
//!
//! # Simulation headless
//! coolector simulate --lat 52.2297 --lng 21.0122 --remarks remarks.geojson --zoom 13
//! ```

pub mod config;
pub mod headless;
pub mod home;
pub mod i18n;
pub mod location;
pub mod remarks;
pub mod routes;
pub mod store;

pub use config::AppConfig;
pub use headless::{Simulation, SimulationSummary};
pub use home::HomeScreen;
pub use i18n::Catalog;
pub use location::LocationService;
pub use routes::Routes;
pub use store::JsonFilterStore;
