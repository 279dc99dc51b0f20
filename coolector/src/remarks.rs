//! Lecture des listes de remarques
//!
//! Deux formats acceptés : un tableau JSON de remarques, ou une
//! FeatureCollection GeoJSON de points dont les propriétés portent les champs
//! de la remarque.
//!
//! Dans un tableau, `location` est soit un point GeoJSON (forme renvoyée par
//! l'API, `coordinates: [lng, lat]`), soit `{latitude, longitude}`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use coolector_map::{GeoPoint, Remark};
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry};
use serde_json::Value;
use tracing::debug;

/// Charge un fichier de remarques
pub fn load_remarks(path: &Path) -> Result<Vec<Remark>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read remarks file: {}", path.display()))?;
    let remarks = parse_remarks(&content)
        .context(format!("Failed to parse remarks file: {}", path.display()))?;
    debug!(path = %path.display(), count = remarks.len(), "remarks loaded");
    Ok(remarks)
}

pub fn parse_remarks(json: &str) -> Result<Vec<Remark>> {
    let value: Value = serde_json::from_str(json).context("Invalid JSON")?;
    if let Value::Array(items) = value {
        return items
            .into_iter()
            .enumerate()
            .map(|(i, item)| remark_from_item(item).context(format!("Invalid remark #{}", i)))
            .collect::<Result<_>>()
            .context("Invalid remark list");
    }

    match GeoJson::from_json_value(value).context("Invalid GeoJSON")? {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                remark_from_feature(feature).context(format!("Invalid feature #{}", i))
            })
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![remark_from_feature(&feature)?]),
        GeoJson::Geometry(_) => bail!("Expected a Feature or a FeatureCollection"),
    }
}

fn remark_from_item(mut item: Value) -> Result<Remark> {
    if let Some(object) = item.as_object_mut() {
        let is_geojson = object
            .get("location")
            .map_or(false, |location| location.get("coordinates").is_some());
        if is_geojson {
            if let Some(location) = object.remove("location") {
                let geometry: Geometry =
                    serde_json::from_value(location).context("Invalid location geometry")?;
                let location = point_location(&geometry)?;
                object.insert("location".to_string(), serde_json::to_value(location)?);
            }
        }
    }
    serde_json::from_value(item).context("Invalid remark")
}

fn point_location(geometry: &Geometry) -> Result<GeoPoint> {
    // GeoJSON : [longitude, latitude]
    match &geometry.value {
        geojson::Value::Point(position) if position.len() >= 2 => {
            Ok(GeoPoint::new(position[1], position[0]))
        }
        _ => bail!("Remark geometry must be a Point"),
    }
}

fn remark_from_feature(feature: &Feature) -> Result<Remark> {
    let geometry = feature
        .geometry
        .as_ref()
        .context("Feature has no geometry")?;
    let location = point_location(geometry)?;

    let mut properties = feature.properties.clone().unwrap_or_default();
    properties.insert("location".to_string(), serde_json::to_value(location)?);
    match &feature.id {
        Some(Id::String(id)) => {
            properties.insert("id".to_string(), Value::String(id.clone()));
        }
        Some(Id::Number(id)) => {
            properties.insert("id".to_string(), Value::String(id.to_string()));
        }
        None => {}
    }

    serde_json::from_value(Value::Object(properties)).context("Invalid remark properties")
}
