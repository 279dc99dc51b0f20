//! Magasin des filtres persisté en JSON
//!
//! Chaque mutation réécrit le fichier `<data_dir>/<filters_storage_key>.json`.
//! Une erreur d'écriture est journalisée et n'interrompt jamais la carte.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coolector_map::{FilterState, FilterStore, GeoPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::MapConfig;

/// Réglages de carte mémorisés
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFilters {
    pub zoom_level: u8,
}

/// Filtres tels que stockés sur disque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Centre de recherche ((0,0) = non défini)
    pub center: GeoPoint,

    /// Dernière position connue de l'appareil
    #[serde(default)]
    pub default_center: GeoPoint,

    pub map: MapFilters,

    /// Rayon de recherche en mètres
    pub radius: f64,

    #[serde(default)]
    pub distinguish_liked: bool,

    /// Catégories affichées (vide = toutes)
    #[serde(default)]
    pub categories: Vec<String>,

    /// États affichés (vide = tous)
    #[serde(default)]
    pub states: Vec<String>,
}

impl Filters {
    pub fn defaults(config: &MapConfig) -> Self {
        Self {
            center: GeoPoint::UNSET,
            default_center: GeoPoint::UNSET,
            map: MapFilters {
                zoom_level: config.default_zoom,
            },
            radius: config.default_radius,
            distinguish_liked: false,
            categories: Vec::new(),
            states: Vec::new(),
        }
    }
}

impl From<&Filters> for FilterState {
    fn from(filters: &Filters) -> Self {
        Self {
            center: filters.center,
            zoom_level: filters.map.zoom_level,
            radius_meters: filters.radius,
            distinguish_liked: filters.distinguish_liked,
        }
    }
}

/// Magasin des filtres ; sans chemin, il reste en mémoire
#[derive(Debug)]
pub struct JsonFilterStore {
    path: Option<PathBuf>,
    filters: RefCell<Filters>,
}

impl JsonFilterStore {
    /// Ouvre le fichier des filtres, ou part des valeurs par défaut s'il n'existe pas
    pub fn open(path: &Path, config: &MapConfig) -> Result<Self> {
        let filters = if path.exists() {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to read filters file: {}", path.display()))?;
            let filters: Filters = serde_json::from_str(&content)
                .context(format!("Failed to parse filters file: {}", path.display()))?;
            info!(path = %path.display(), center = %filters.center, "filters loaded");
            filters
        } else {
            debug!(path = %path.display(), "no filters file, using defaults");
            Filters::defaults(config)
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            filters: RefCell::new(filters),
        })
    }

    pub fn in_memory(config: &MapConfig) -> Self {
        Self {
            path: None,
            filters: RefCell::new(Filters::defaults(config)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copie des filtres complets
    pub fn snapshot(&self) -> Filters {
        self.filters.borrow().clone()
    }

    pub fn set_distinguish_liked(&self, distinguish_liked: bool) {
        self.update(|filters| filters.distinguish_liked = distinguish_liked);
    }

    fn update(&self, mutate: impl FnOnce(&mut Filters)) {
        mutate(&mut *self.filters.borrow_mut());
        if let Err(e) = self.persist() {
            error!(error = %e, "failed to persist filters");
        }
    }

    /// Réécrit le fichier des filtres
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&*self.filters.borrow())
            .context("Failed to serialize filters")?;
        std::fs::write(path, json)
            .context(format!("Failed to write filters file: {}", path.display()))?;
        Ok(())
    }
}

impl FilterStore for JsonFilterStore {
    fn filters(&self) -> FilterState {
        FilterState::from(&*self.filters.borrow())
    }

    fn set_center(&self, center: GeoPoint) {
        self.update(|filters| filters.center = center);
    }

    /// Mémorise la position de l'appareil ; elle devient aussi le centre de
    /// recherche tant qu'aucun centre n'a été choisi
    fn set_default_center(&self, center: GeoPoint) {
        self.update(|filters| {
            filters.default_center = center;
            if filters.center.is_unset() {
                filters.center = center;
            }
        });
    }

    fn set_zoom_level(&self, zoom_level: u8) {
        self.update(|filters| filters.map.zoom_level = zoom_level);
    }

    fn set_radius(&self, radius_meters: f64) {
        self.update(|filters| filters.radius = radius_meters);
    }
}
