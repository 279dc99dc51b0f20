//! Configuration de l'application

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coolector_map::ViewportSettings;

/// Variable d'environnement choisissant le preset
pub const ENV_PRESET: &str = "COOLECTOR_ENV";

/// Variable d'environnement du répertoire de données (fichier des filtres)
pub const ENV_DATA_DIR: &str = "COOLECTOR_DATA_DIR";

const PRESETS: &[&str] = &["local", "development", "production"];

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub testing: bool,

    pub title: String,

    /// URL de base de l'API des remarques
    pub api_url: String,

    pub session_storage_key: String,

    /// Nom du fichier de persistance des filtres (sans extension)
    pub filters_storage_key: String,

    pub location_storage_key: String,

    #[serde(default)]
    pub feature: FeatureFlags,

    #[serde(default)]
    pub map: MapConfig,
}

/// Options fonctionnelles
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    #[serde(default)]
    pub resolve_remark_photo_required: bool,

    #[serde(default)]
    pub resolve_remark_location_required: bool,
}

/// Réglages de la carte
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /// Zoom minimal de la surface
    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,

    /// Zoom initial quand aucun filtre n'est mémorisé
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,

    /// Rayon initial en mètres
    #[serde(default = "default_radius")]
    pub default_radius: f64,

    /// Afficher le cercle du rayon de recherche
    #[serde(default)]
    pub draw_radius: bool,
}

fn default_min_zoom() -> u8 {
    8
}

fn default_zoom() -> u8 {
    15
}

fn default_radius() -> f64 {
    1000.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            default_zoom: default_zoom(),
            default_radius: default_radius(),
            draw_radius: false,
        }
    }
}

impl MapConfig {
    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings {
            min_zoom: self.min_zoom,
            draw_radius: self.draw_radius,
        }
    }
}

impl AppConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "local" => Self::load_embedded(include_str!("presets/local.json")),
            "development" => Self::load_embedded(include_str!("presets/development.json")),
            "production" => Self::load_embedded(include_str!("presets/production.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Preset ou chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        if PRESETS.contains(&spec) {
            return Self::from_preset(spec);
        }
        let path = Path::new(spec);
        if path.extension().map_or(false, |ext| ext == "json") {
            return Self::load(path);
        }
        Self::from_preset(spec)
    }

    /// Preset désigné par `COOLECTOR_ENV`, `local` par défaut
    pub fn from_env() -> Result<Self> {
        let preset = std::env::var(ENV_PRESET).unwrap_or_else(|_| "local".to_string());
        Self::resolve(&preset)
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Fichier de persistance des filtres dans `data_dir`
    pub fn filters_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.json", self.filters_storage_key))
    }
}

/// Répertoire de données désigné par `COOLECTOR_DATA_DIR`
pub fn data_dir() -> Option<PathBuf> {
    std::env::var_os(ENV_DATA_DIR).map(PathBuf::from)
}
