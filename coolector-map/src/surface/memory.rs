//! Surface cartographique en mémoire
//!
//! Reproduit le comportement observable d'un widget de carte (centre, zoom,
//! viewport, marqueurs, info-bulles, cercles, listeners synchrones) sans
//! rendu. Le [`MemorySurfaceHandle`] permet d'inspecter l'état et de simuler
//! les interactions de l'utilisateur (pan, zoom, clic).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use serde::Serialize;

use super::{
    CircleId, CircleOptions, InfoWindowId, Listener, ListenerId, MapSurface, MarkerId,
    MarkerOptions, SurfaceEvent, SurfaceEventKind, SurfaceFactory, SurfaceOptions,
};
use crate::marker::style::{MarkerColor, MarkerSize};
use crate::types::{Bounds, GeoPoint};
use crate::MapError;

/// Taille par défaut du viewport en pixels
const DEFAULT_VIEWPORT: (u32, u32) = (1024, 768);

/// Latitude maximale affichable en Web Mercator
const MAX_LATITUDE: f64 = 85.0;

/// Opérations pouvant être mises en échec pour les tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceOp {
    Create,
    Center,
    SetCenter,
    Zoom,
    Bounds,
    AddListener,
    AddMarker,
    SetMarkerPosition,
    AddInfoWindow,
    OpenInfoWindow,
    AddCircle,
}

/// Compteurs d'appels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceStats {
    pub set_center_calls: usize,
    pub marker_moves: usize,
    pub markers_created: usize,
    pub markers_removed: usize,
}

/// Vue d'un marqueur posé sur la surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSnapshot {
    pub id: u64,
    pub position: GeoPoint,
    pub title: String,
    pub color: String,
    pub size: MarkerSize,
    pub url: String,
}

#[derive(Default)]
struct Model {
    alive: bool,
    center: GeoPoint,
    zoom: u8,
    min_zoom: u8,
    viewport: (u32, u32),
    next_id: u64,
    listeners: Vec<(ListenerId, SurfaceEventKind, Rc<RefCell<Listener>>)>,
    markers: BTreeMap<MarkerId, MarkerOptions>,
    info_windows: BTreeMap<InfoWindowId, String>,
    opened: Option<(InfoWindowId, MarkerId)>,
    circles: BTreeMap<CircleId, CircleOptions>,
    faults: HashSet<SurfaceOp>,
    stats: SurfaceStats,
}

impl Model {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self, op: SurfaceOp) -> Result<(), MapError> {
        if self.faults.contains(&op) {
            return Err(MapError::surface(format!("{:?}", op), "injected fault"));
        }
        Ok(())
    }

    fn bounds(&self) -> Bounds {
        // Degrés par pixel au zoom courant (tuiles de 256 px)
        let degrees_per_px = 360.0 / (256.0 * 2f64.powi(i32::from(self.zoom)));
        let lng_span = f64::from(self.viewport.0) * degrees_per_px;
        let lat_span =
            f64::from(self.viewport.1) * degrees_per_px * self.center.latitude.to_radians().cos();

        let clamp_lat = |lat: f64| lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let clamp_lng = |lng: f64| lng.clamp(-180.0, 180.0);

        Bounds::new(
            GeoPoint::new(
                clamp_lat(self.center.latitude - lat_span / 2.0),
                clamp_lng(self.center.longitude - lng_span / 2.0),
            ),
            GeoPoint::new(
                clamp_lat(self.center.latitude + lat_span / 2.0),
                clamp_lng(self.center.longitude + lng_span / 2.0),
            ),
        )
    }
}

/// Émet un événement vers les listeners, sans garder l'état emprunté
fn emit(model: &Rc<RefCell<Model>>, event: SurfaceEvent) {
    let listeners: Vec<Rc<RefCell<Listener>>> = model
        .borrow()
        .listeners
        .iter()
        .filter(|(_, kind, _)| *kind == event.kind())
        .map(|(_, _, listener)| Rc::clone(listener))
        .collect();

    for listener in listeners {
        // Un listener déjà en cours d'exécution n'est pas ré-entré
        if let Ok(mut listener) = listener.try_borrow_mut() {
            listener(&event);
        }
    }
}

/// Surface en mémoire, possédée par le contrôleur
pub struct MemorySurface {
    model: Rc<RefCell<Model>>,
}

impl std::fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let model = self.model.borrow();
        f.debug_struct("MemorySurface")
            .field("center", &model.center)
            .field("zoom", &model.zoom)
            .field("markers", &model.markers.len())
            .finish()
    }
}

impl Drop for MemorySurface {
    fn drop(&mut self) {
        let mut model = self.model.borrow_mut();
        model.alive = false;
        model.listeners.clear();
    }
}

impl MapSurface for MemorySurface {
    fn center(&self) -> Result<GeoPoint, MapError> {
        let model = self.model.borrow();
        model.check(SurfaceOp::Center)?;
        Ok(model.center)
    }

    fn set_center(&mut self, center: GeoPoint) -> Result<(), MapError> {
        {
            let mut model = self.model.borrow_mut();
            model.check(SurfaceOp::SetCenter)?;
            let center = center.validate()?;
            model.center = center;
            model.stats.set_center_calls += 1;
        }
        emit(&self.model, SurfaceEvent::CenterChanged);
        Ok(())
    }

    fn zoom(&self) -> Result<u8, MapError> {
        let model = self.model.borrow();
        model.check(SurfaceOp::Zoom)?;
        Ok(model.zoom)
    }

    fn bounds(&self) -> Result<Bounds, MapError> {
        let model = self.model.borrow();
        model.check(SurfaceOp::Bounds)?;
        Ok(model.bounds())
    }

    fn add_listener(
        &mut self,
        kind: SurfaceEventKind,
        listener: Listener,
    ) -> Result<ListenerId, MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::AddListener)?;
        let id = ListenerId(model.next_id());
        model
            .listeners
            .push((id, kind, Rc::new(RefCell::new(listener))));
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.model
            .borrow_mut()
            .listeners
            .retain(|(listener_id, _, _)| *listener_id != id);
    }

    fn add_marker(&mut self, options: MarkerOptions) -> Result<MarkerId, MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::AddMarker)?;
        options.position.validate()?;
        let id = MarkerId(model.next_id());
        model.markers.insert(id, options);
        model.stats.markers_created += 1;
        Ok(id)
    }

    fn set_marker_position(
        &mut self,
        marker: MarkerId,
        position: GeoPoint,
    ) -> Result<(), MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::SetMarkerPosition)?;
        let position = position.validate()?;
        let options = model
            .markers
            .get_mut(&marker)
            .ok_or(MapError::UnknownMarker(marker.0))?;
        options.position = position;
        model.stats.marker_moves += 1;
        Ok(())
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        let mut model = self.model.borrow_mut();
        if model.markers.remove(&marker).is_some() {
            model.stats.markers_removed += 1;
        }
        if matches!(model.opened, Some((_, anchor)) if anchor == marker) {
            model.opened = None;
        }
    }

    fn add_info_window(&mut self, content: String) -> Result<InfoWindowId, MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::AddInfoWindow)?;
        let id = InfoWindowId(model.next_id());
        model.info_windows.insert(id, content);
        Ok(id)
    }

    fn open_info_window(
        &mut self,
        window: InfoWindowId,
        anchor: MarkerId,
    ) -> Result<(), MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::OpenInfoWindow)?;
        if !model.markers.contains_key(&anchor) {
            return Err(MapError::UnknownMarker(anchor.0));
        }
        if !model.info_windows.contains_key(&window) {
            return Err(MapError::surface(
                "open_info_window",
                format!("unknown info window {}", window),
            ));
        }
        model.opened = Some((window, anchor));
        Ok(())
    }

    fn remove_info_window(&mut self, window: InfoWindowId) {
        let mut model = self.model.borrow_mut();
        model.info_windows.remove(&window);
        if matches!(model.opened, Some((opened, _)) if opened == window) {
            model.opened = None;
        }
    }

    fn add_circle(&mut self, options: CircleOptions) -> Result<CircleId, MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::AddCircle)?;
        let id = CircleId(model.next_id());
        model.circles.insert(id, options);
        Ok(id)
    }

    fn remove_circle(&mut self, circle: CircleId) {
        self.model.borrow_mut().circles.remove(&circle);
    }
}

/// Fabrique de [`MemorySurface`]
///
/// Les clones partagent le même modèle : on garde un clone (ou un
/// [`MemorySurfaceHandle`]) pour observer la surface créée par le contrôleur.
#[derive(Clone)]
pub struct MemorySurfaceFactory {
    model: Rc<RefCell<Model>>,
}

impl Default for MemorySurfaceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurfaceFactory {
    pub fn new() -> Self {
        Self::with_viewport(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1)
    }

    /// Fabrique avec une taille de viewport en pixels
    pub fn with_viewport(width: u32, height: u32) -> Self {
        let model = Model {
            viewport: (width, height),
            ..Default::default()
        };
        Self {
            model: Rc::new(RefCell::new(model)),
        }
    }

    pub fn handle(&self) -> MemorySurfaceHandle {
        MemorySurfaceHandle {
            model: Rc::clone(&self.model),
        }
    }
}

impl SurfaceFactory for MemorySurfaceFactory {
    fn create(&self, options: SurfaceOptions) -> Result<Box<dyn MapSurface>, MapError> {
        let mut model = self.model.borrow_mut();
        model.check(SurfaceOp::Create)?;
        let center = options.center.validate()?;

        model.alive = true;
        model.center = center;
        model.min_zoom = options.min_zoom;
        model.zoom = options.zoom.max(options.min_zoom);
        model.listeners.clear();
        model.markers.clear();
        model.info_windows.clear();
        model.opened = None;
        model.circles.clear();
        model.stats = SurfaceStats::default();

        Ok(Box::new(MemorySurface {
            model: Rc::clone(&self.model),
        }))
    }
}

/// Accès d'observation et de simulation sur une [`MemorySurface`]
#[derive(Clone)]
pub struct MemorySurfaceHandle {
    model: Rc<RefCell<Model>>,
}

impl MemorySurfaceHandle {
    /// Vrai tant que la surface n'a pas été libérée
    pub fn is_alive(&self) -> bool {
        self.model.borrow().alive
    }

    pub fn center(&self) -> GeoPoint {
        self.model.borrow().center
    }

    pub fn zoom(&self) -> u8 {
        self.model.borrow().zoom
    }

    pub fn min_zoom(&self) -> u8 {
        self.model.borrow().min_zoom
    }

    pub fn bounds(&self) -> Bounds {
        self.model.borrow().bounds()
    }

    pub fn stats(&self) -> SurfaceStats {
        self.model.borrow().stats
    }

    pub fn listener_count(&self) -> usize {
        self.model.borrow().listeners.len()
    }

    pub fn marker_count(&self) -> usize {
        self.model.borrow().markers.len()
    }

    /// Marqueurs présents, dans l'ordre de création
    pub fn markers(&self) -> Vec<MarkerSnapshot> {
        self.model
            .borrow()
            .markers
            .iter()
            .map(|(id, options)| snapshot(*id, options))
            .collect()
    }

    pub fn marker(&self, id: MarkerId) -> Option<MarkerSnapshot> {
        self.model
            .borrow()
            .markers
            .get(&id)
            .map(|options| snapshot(id, options))
    }

    /// Marqueurs portant une couleur donnée
    pub fn markers_with_color(&self, color: MarkerColor) -> Vec<MarkerSnapshot> {
        self.markers()
            .into_iter()
            .filter(|m| m.color == color.hex())
            .collect()
    }

    pub fn info_window(&self, id: InfoWindowId) -> Option<String> {
        self.model.borrow().info_windows.get(&id).cloned()
    }

    /// Info-bulle ouverte et son marqueur d'ancrage
    pub fn opened_info_window(&self) -> Option<(InfoWindowId, MarkerId)> {
        self.model.borrow().opened
    }

    pub fn circles(&self) -> Vec<CircleOptions> {
        self.model.borrow().circles.values().cloned().collect()
    }

    pub fn inject_fault(&self, op: SurfaceOp) {
        self.model.borrow_mut().faults.insert(op);
    }

    pub fn clear_fault(&self, op: SurfaceOp) {
        self.model.borrow_mut().faults.remove(&op);
    }

    /// Simule un glisser de l'utilisateur jusqu'à `center`
    pub fn drag_to(&self, center: GeoPoint) {
        self.model.borrow_mut().center = center;
        emit(&self.model, SurfaceEvent::CenterChanged);
        emit(&self.model, SurfaceEvent::DragEnd);
    }

    /// Simule un zoom de l'utilisateur (borné par le zoom minimal) ;
    /// `ZoomChanged` n'est émis que si le niveau change
    pub fn zoom_to(&self, zoom: u8) {
        let changed = {
            let mut model = self.model.borrow_mut();
            let zoom = zoom.max(model.min_zoom);
            let changed = model.zoom != zoom;
            model.zoom = zoom;
            changed
        };
        if changed {
            emit(&self.model, SurfaceEvent::ZoomChanged);
        }
    }

    /// Simule un clic sur un marqueur
    pub fn click_marker(&self, marker: MarkerId) {
        emit(&self.model, SurfaceEvent::MarkerClick(marker));
    }
}

fn snapshot(id: MarkerId, options: &MarkerOptions) -> MarkerSnapshot {
    MarkerSnapshot {
        id: id.0,
        position: options.position,
        title: options.title.clone(),
        color: options.icon.color.hex(),
        size: options.icon.size,
        url: options.icon.url.clone(),
    }
}
