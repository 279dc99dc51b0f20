//! Contrôleur du viewport
//!
//! Réconcilie trois entrées asynchrones (position de l'appareil, pan/zoom de
//! l'utilisateur, liste de remarques) en un état visuel unique, et dérive le
//! rayon de recherche des bornes visibles.
//!
//! Toutes les entrées (méthodes publiques, événements du canal, listeners de
//! la surface) passent par une file de commandes traitée dans l'ordre
//! d'arrivée. Un événement émis pendant le traitement d'une commande (par
//! exemple `center_changed` déclenché par `set_center`) est mis en file et
//! traité juste après : il n'y a jamais de ré-entrance dans l'état.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, SubscriptionToken, Topic};
use crate::geometry::viewport_radius;
use crate::guard::{isolate, FailureTag};
use crate::marker::MarkerRenderer;
use crate::ports::Collaborators;
use crate::surface::{
    CircleId, CircleOptions, ListenerId, MapSurface, MarkerId, SurfaceEvent, SurfaceEventKind,
    SurfaceFactory, SurfaceOptions,
};
use crate::types::{GeoPoint, LocationUpdate, RadiusChange, Remark};
use crate::MapError;

/// Zoom minimal : en dessous, le rayon couvrirait tout le globe
pub const DEFAULT_MIN_ZOOM: u8 = 8;

/// Réglages du contrôleur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSettings {
    pub min_zoom: u8,
    /// Afficher le cercle du rayon de recherche
    pub draw_radius: bool,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            draw_radius: false,
        }
    }
}

/// État observable du contrôleur
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSnapshot {
    pub attached: bool,
    pub surface_ready: bool,
    pub position: GeoPoint,
    pub user_position: Option<GeoPoint>,
    pub map_dragged: bool,
    pub center_initialized: bool,
    pub user_marker: Option<u64>,
    pub remark_markers: usize,
}

type RadiusCallback = Box<dyn FnMut(RadiusChange)>;

enum Command {
    Attach,
    Detach,
    SetRemarks(Vec<Remark>),
    SetCenter(Option<GeoPoint>),
    LocationUpdated(LocationUpdate),
    ResetCenter(GeoPoint),
    Surface(SurfaceEvent),
    DrawRadius,
}

struct Shared {
    state: RefCell<ViewportState>,
    inbox: RefCell<VecDeque<Command>>,
    radius_changes: RefCell<VecDeque<RadiusChange>>,
    radius_changed: RefCell<Option<RadiusCallback>>,
    notifying: Cell<bool>,
}

impl Shared {
    fn submit(&self, command: Command) {
        self.inbox.borrow_mut().push_back(command);
        self.pump();
    }

    /// Traite la file si aucune commande n'est en cours
    fn pump(&self) {
        {
            // Déjà en cours : la boucle active videra la file
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            loop {
                let next = self.inbox.borrow_mut().pop_front();
                let Some(command) = next else {
                    break;
                };
                if let Some(change) = state.handle(command) {
                    self.radius_changes.borrow_mut().push_back(change);
                }
            }
        }
        self.notify();
    }

    /// Appelle le callback de rayon hors de tout emprunt de l'état
    fn notify(&self) {
        if self.notifying.replace(true) {
            return;
        }
        loop {
            let next = self.radius_changes.borrow_mut().pop_front();
            let Some(change) = next else {
                break;
            };
            let callback = self.radius_changed.borrow_mut().take();
            if let Some(mut callback) = callback {
                callback(change);
                let mut slot = self.radius_changed.borrow_mut();
                if slot.is_none() {
                    *slot = Some(callback);
                }
            }
        }
        self.notifying.set(false);
    }
}

struct ViewportState {
    weak: Weak<Shared>,
    collaborators: Collaborators,
    factory: Box<dyn SurfaceFactory>,
    settings: ViewportSettings,
    surface: Option<Box<dyn MapSurface>>,
    listeners: Vec<ListenerId>,
    subscriptions: Vec<SubscriptionToken>,
    renderer: MarkerRenderer,
    remarks: Vec<Remark>,
    position: GeoPoint,
    user_position: Option<GeoPoint>,
    center_initialized: bool,
    map_dragged: bool,
    radius_circle: Option<CircleId>,
    attached: bool,
}

fn surface_mut(
    surface: &mut Option<Box<dyn MapSurface>>,
) -> Result<&mut dyn MapSurface, MapError> {
    match surface {
        Some(surface) => Ok(surface.as_mut()),
        None => Err(MapError::SurfaceUnavailable),
    }
}

impl ViewportState {
    fn handle(&mut self, command: Command) -> Option<RadiusChange> {
        match command {
            Command::Attach => self.attach(),
            Command::Detach => self.detach(),
            Command::SetRemarks(remarks) => self.set_remarks(remarks),
            Command::SetCenter(center) => self.center_changed(center),
            Command::DrawRadius => self.draw_radius(),
            // Abonnements et listeners sont libérés au détachement, mais une
            // commande déjà en file peut encore arriver
            _ if !self.attached => debug!("event ignored: map detached"),
            Command::LocationUpdated(update) => self.location_updated(update),
            Command::ResetCenter(center) => self.reset_center(center),
            Command::Surface(event) => return self.surface_event(event),
        }
        None
    }

    fn attach(&mut self) {
        if self.attached {
            warn!("map already attached");
            return;
        }
        self.attached = true;

        // S'abonner avant toute publication pour ne manquer aucune position
        self.subscribe();

        let filters = self.collaborators.filters.filters();
        let device = self.collaborators.location.current();
        self.user_position = device;
        self.position = match device {
            Some(device) if filters.center.is_unset() => device,
            _ => filters.center,
        };

        self.draw_map();
        self.draw_user_marker();
        if self.settings.draw_radius {
            self.draw_radius();
        }
        if !self.remarks.is_empty() {
            self.render_remarks();
        }

        info!(position = %self.position, zoom = filters.zoom_level, "map attached");
        self.collaborators.channel.publish(&ChannelEvent::MapLoaded);
    }

    fn subscribe(&mut self) {
        let weak = self.weak.clone();
        let location = self.collaborators.channel.subscribe(
            Topic::LocationLoaded,
            Box::new(move |event| {
                if let (Some(shared), ChannelEvent::LocationLoaded(update)) = (weak.upgrade(), event)
                {
                    shared.submit(Command::LocationUpdated(*update));
                }
            }),
        );

        let weak = self.weak.clone();
        let reset = self.collaborators.channel.subscribe(
            Topic::ResetCenter,
            Box::new(move |event| {
                if let (Some(shared), ChannelEvent::ResetCenter(center)) = (weak.upgrade(), event) {
                    shared.submit(Command::ResetCenter(*center));
                }
            }),
        );

        self.subscriptions.push(location);
        self.subscriptions.push(reset);
    }

    fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;

        // Les abonnements d'abord, la surface ensuite
        for token in self.subscriptions.drain(..) {
            let topic = token.topic();
            if !self.collaborators.channel.cancel(token) {
                self.collaborators.logger.error(
                    FailureTag::Detach.as_str(),
                    &MapError::Channel(format!("subscription to {} already released", topic)),
                );
            }
        }

        if let Some(mut surface) = self.surface.take() {
            for listener in self.listeners.drain(..) {
                surface.remove_listener(listener);
            }
        }
        self.listeners.clear();
        self.renderer.forget();
        self.radius_circle = None;
        info!("map detached");
    }

    fn draw_map(&mut self) {
        let filters = self.collaborators.filters.filters();
        let logger = Rc::clone(&self.collaborators.logger);
        logger.trace("map_draw", &(self.position, &filters));

        let options = SurfaceOptions {
            center: self.position,
            zoom: filters.zoom_level.max(self.settings.min_zoom),
            min_zoom: self.settings.min_zoom,
        };
        self.surface = isolate(logger.as_ref(), FailureTag::DrawMap, || {
            self.factory.create(options)
        });

        // Pas de surface : pas de listeners
        if self.surface.is_none() {
            return;
        }
        isolate(logger.as_ref(), FailureTag::DrawMap, || self.register_listeners());
    }

    fn register_listeners(&mut self) -> Result<(), MapError> {
        let surface = surface_mut(&mut self.surface)?;
        for kind in [
            SurfaceEventKind::ZoomChanged,
            SurfaceEventKind::DragEnd,
            SurfaceEventKind::CenterChanged,
            SurfaceEventKind::MarkerClick,
        ] {
            let weak = self.weak.clone();
            let id = surface.add_listener(
                kind,
                Box::new(move |event| {
                    if let Some(shared) = weak.upgrade() {
                        shared.submit(Command::Surface(*event));
                    }
                }),
            )?;
            self.listeners.push(id);
        }
        Ok(())
    }

    fn draw_user_marker(&mut self) {
        let snap = !self.map_dragged;
        let logger = Rc::clone(&self.collaborators.logger);
        isolate(logger.as_ref(), FailureTag::DrawUserMarker, || {
            let position = self.user_position.ok_or(MapError::MissingPosition)?;
            let surface = surface_mut(&mut self.surface)?;
            self.renderer.draw_user_marker(surface, position, snap)?;
            Ok(())
        });
    }

    fn set_remarks(&mut self, remarks: Vec<Remark>) {
        self.remarks = remarks;
        if self.attached {
            self.render_remarks();
        }
    }

    fn render_remarks(&mut self) {
        let distinguish_liked = self.collaborators.filters.filters().distinguish_liked;
        match surface_mut(&mut self.surface) {
            Ok(surface) => {
                self.renderer
                    .render_remarks(surface, &self.remarks, distinguish_liked);
            }
            Err(e) => self
                .collaborators
                .logger
                .error(FailureTag::DrawRemarkMarker.as_str(), &e),
        }
    }

    /// Centrage initial à usage unique
    fn center_changed(&mut self, center: Option<GeoPoint>) {
        let logger = Rc::clone(&self.collaborators.logger);
        isolate(logger.as_ref(), FailureTag::CenterChanged, || {
            if self.center_initialized {
                return Ok(());
            }
            let Some(surface) = self.surface.as_deref_mut() else {
                return Ok(());
            };
            let Some(center) = center else {
                return Ok(());
            };
            let center = center.validate()?;
            self.position = center;
            surface.set_center(center)?;
            self.center_initialized = true;
            Ok(())
        });
    }

    fn location_updated(&mut self, update: LocationUpdate) {
        let logger = Rc::clone(&self.collaborators.logger);
        isolate(logger.as_ref(), FailureTag::LocationUpdated, || {
            let position = update.position().validate()?;
            self.user_position = Some(position);
            self.draw_user_marker();
            self.collaborators.filters.set_default_center(position);
            debug!(position = %position, dragged = self.map_dragged, "location updated");
            Ok(())
        });
    }

    fn reset_center(&mut self, center: GeoPoint) {
        let logger = Rc::clone(&self.collaborators.logger);
        isolate(logger.as_ref(), FailureTag::ResetCenter, || {
            let center = center.validate()?;
            self.map_dragged = false;
            self.position = center;
            surface_mut(&mut self.surface)?.set_center(center)
        });
    }

    fn surface_event(&mut self, event: SurfaceEvent) -> Option<RadiusChange> {
        let logger = Rc::clone(&self.collaborators.logger);
        match event {
            SurfaceEvent::ZoomChanged => {
                isolate(logger.as_ref(), FailureTag::RecalculateRadius, || {
                    let zoom = surface_mut(&mut self.surface)?.zoom()?;
                    self.collaborators.filters.set_zoom_level(zoom);
                    Ok(())
                });
                self.recalculate_radius()
            }
            SurfaceEvent::DragEnd => self.recalculate_radius(),
            SurfaceEvent::CenterChanged => {
                isolate(logger.as_ref(), FailureTag::CenterChangedListener, || {
                    let center = surface_mut(&mut self.surface)?.center()?;
                    self.collaborators.filters.set_center(center);
                    Ok(())
                });
                None
            }
            SurfaceEvent::MarkerClick(marker) => {
                isolate(logger.as_ref(), FailureTag::OpenPopup, || {
                    let surface = surface_mut(&mut self.surface)?;
                    self.renderer.open_popup(surface, marker)
                });
                None
            }
        }
    }

    /// Recalcule le rayon depuis les bornes visibles puis le persiste ;
    /// la notification est différée jusqu'à la fin du traitement
    fn recalculate_radius(&mut self) -> Option<RadiusChange> {
        let logger = Rc::clone(&self.collaborators.logger);
        let change = isolate(logger.as_ref(), FailureTag::RecalculateRadius, || {
            self.map_dragged = true;
            let bounds = surface_mut(&mut self.surface)?.bounds()?;
            let center = bounds.center();
            let radius_meters = viewport_radius(&bounds)?;

            self.collaborators.filters.set_radius(radius_meters);
            debug!(radius_meters, center = %center, "radius recalculated");
            Ok(RadiusChange {
                radius_meters,
                center,
            })
        })?;

        if self.radius_circle.is_some() {
            self.position = change.center;
            self.draw_radius();
        }
        Some(change)
    }

    /// Cercle du rayon de recherche, remplacé à chaque appel
    fn draw_radius(&mut self) {
        let radius_meters = self.collaborators.filters.filters().radius_meters;
        let logger = Rc::clone(&self.collaborators.logger);
        isolate(logger.as_ref(), FailureTag::DrawRadius, || {
            let surface = surface_mut(&mut self.surface)?;
            if let Some(previous) = self.radius_circle.take() {
                surface.remove_circle(previous);
            }
            let circle =
                surface.add_circle(CircleOptions::search_radius(self.position, radius_meters))?;
            self.radius_circle = Some(circle);
            Ok(())
        });
    }

    fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            attached: self.attached,
            surface_ready: self.surface.is_some(),
            position: self.position,
            user_position: self.user_position,
            map_dragged: self.map_dragged,
            center_initialized: self.center_initialized,
            user_marker: self.renderer.user_marker().map(|m| m.0),
            remark_markers: self.renderer.remark_markers().len(),
        }
    }
}

/// Contrôleur de la carte des remarques
///
/// Possède la surface pour toute la durée de l'écran. Aucune erreur ne
/// remonte au conteneur : les pannes sont journalisées par le logger des
/// [`Collaborators`] sous une étiquette stable.
pub struct ViewportController {
    shared: Rc<Shared>,
}

impl ViewportController {
    pub fn new(
        collaborators: Collaborators,
        factory: Box<dyn SurfaceFactory>,
        settings: ViewportSettings,
    ) -> Self {
        let renderer = MarkerRenderer::new(
            Rc::clone(&collaborators.translator),
            Rc::clone(&collaborators.router),
            Rc::clone(&collaborators.logger),
        );
        let shared = Rc::new_cyclic(|weak| Shared {
            state: RefCell::new(ViewportState {
                weak: weak.clone(),
                collaborators,
                factory,
                settings,
                surface: None,
                listeners: Vec::new(),
                subscriptions: Vec::new(),
                renderer,
                remarks: Vec::new(),
                position: GeoPoint::UNSET,
                user_position: None,
                center_initialized: false,
                map_dragged: false,
                radius_circle: None,
                attached: false,
            }),
            inbox: RefCell::new(VecDeque::new()),
            radius_changes: RefCell::new(VecDeque::new()),
            radius_changed: RefCell::new(None),
            notifying: Cell::new(false),
        });
        Self { shared }
    }

    /// Callback appelé après chaque recalcul du rayon, une fois le rayon
    /// persisté dans le magasin des filtres
    pub fn on_radius_changed(&self, callback: impl FnMut(RadiusChange) + 'static) {
        *self.shared.radius_changed.borrow_mut() = Some(Box::new(callback));
    }

    /// Activation : construit la surface, pose le marqueur utilisateur,
    /// s'abonne au canal et annonce `map:loaded`
    pub fn attach(&self) {
        self.shared.submit(Command::Attach);
    }

    /// Désactivation : libère les abonnements puis la surface
    pub fn detach(&self) {
        self.shared.submit(Command::Detach);
    }

    /// Remplace la liste des remarques affichées
    pub fn set_remarks(&self, remarks: Vec<Remark>) {
        self.shared.submit(Command::SetRemarks(remarks));
    }

    /// Centre fourni par le conteneur ; seule la première valeur non nulle
    /// reçue avec une surface prête est appliquée
    pub fn set_center(&self, center: Option<GeoPoint>) {
        self.shared.submit(Command::SetCenter(center));
    }

    /// Affiche (ou remplace) le cercle du rayon de recherche
    pub fn draw_radius(&self) {
        self.shared.submit(Command::DrawRadius);
    }

    /// État courant ; `None` si appelé pendant le traitement d'une commande
    pub fn snapshot(&self) -> Option<ViewportSnapshot> {
        self.shared
            .state
            .try_borrow()
            .ok()
            .map(|state| state.snapshot())
    }

    pub fn user_marker(&self) -> Option<MarkerId> {
        self.snapshot()
            .and_then(|snapshot| snapshot.user_marker)
            .map(MarkerId)
    }

    pub fn remark_marker(&self, remark_id: &str) -> Option<MarkerId> {
        self.shared
            .state
            .try_borrow()
            .ok()
            .and_then(|state| state.renderer.remark_marker(remark_id))
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        self.shared.submit(Command::Detach);
    }
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("state", &self.snapshot())
            .finish()
    }
}
