//! Pilote headless : écran d'accueil et carte sur une surface en mémoire

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use coolector_map::surface::memory::MarkerSnapshot;
use coolector_map::{
    Collaborators, FilterStore, GeoPoint, LocalChannel, MemorySurfaceFactory, RadiusChange,
    RecordingLogger, Remark, ViewportController, ViewportSnapshot,
};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::home::{Account, HomeScreen, LogLoader, LogToast, StaticAccountService, ToastMessage};
use crate::i18n::Catalog;
use crate::location::LocationService;
use crate::routes::Routes;
use crate::store::JsonFilterStore;

/// Paramètres d'une simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    pub config: AppConfig,
    /// Position de l'appareil
    pub position: GeoPoint,
    pub remarks: Vec<Remark>,
    /// Zoom appliqué après l'affichage (défaut : zoom courant)
    pub zoom: Option<u8>,
    /// Répertoire du fichier des filtres ; sans valeur, filtres en mémoire
    pub data_dir: Option<PathBuf>,
    pub distinguish_liked: bool,
}

/// Résultat d'une simulation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub title: String,
    pub center: GeoPoint,
    pub zoom: u8,
    pub radius_meters: f64,
    pub radius_changes: Vec<RadiusChange>,
    pub viewport: Option<ViewportSnapshot>,
    pub markers: Vec<MarkerSnapshot>,
    pub toasts: Vec<ToastMessage>,
    pub errors: Vec<String>,
}

impl Simulation {
    pub fn new(config: AppConfig, position: GeoPoint) -> Self {
        Self {
            config,
            position,
            remarks: Vec::new(),
            zoom: None,
            data_dir: None,
            distinguish_liked: false,
        }
    }

    /// Déroule : accueil, acquisition de la position, carte, remarques, zoom
    pub fn run(self) -> Result<SimulationSummary> {
        let position = self
            .position
            .validate()
            .context("Invalid device position")?;

        let store = Rc::new(match &self.data_dir {
            Some(dir) => JsonFilterStore::open(&self.config.filters_path(dir), &self.config.map)?,
            None => JsonFilterStore::in_memory(&self.config.map),
        });
        if self.distinguish_liked {
            store.set_distinguish_liked(true);
        }

        let channel = Rc::new(LocalChannel::new());
        let location = Rc::new(LocationService::new(channel.clone()));
        let translator = Rc::new(Catalog::english()?);
        let logger = Rc::new(RecordingLogger::new());
        let loader = Rc::new(LogLoader::default());
        let toast = Rc::new(LogToast::default());

        let mut home = HomeScreen::new(
            location.clone(),
            channel.clone(),
            translator.clone(),
            loader,
            toast.clone(),
            Rc::new(StaticAccountService(Account {
                user_id: "headless".to_string(),
                name: "Headless".to_string(),
            })),
        );
        home.attach();
        location.update(position);

        let factory = MemorySurfaceFactory::new();
        let surface = factory.handle();
        let controller = ViewportController::new(
            Collaborators {
                location: location.clone(),
                filters: store.clone(),
                channel: channel.clone(),
                translator,
                router: Rc::new(Routes::new()),
                logger: logger.clone(),
            },
            Box::new(factory),
            self.config.map.viewport_settings(),
        );

        let radius_changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&radius_changes);
        controller.on_radius_changed(move |change| sink.borrow_mut().push(change));

        controller.attach();
        controller.set_remarks(self.remarks);
        if let Some(zoom) = self.zoom {
            surface.zoom_to(zoom);
        }

        let filters = store.filters();
        let summary = SimulationSummary {
            title: self.config.title.clone(),
            center: surface.center(),
            zoom: surface.zoom(),
            radius_meters: filters.radius_meters,
            radius_changes: radius_changes.borrow().clone(),
            viewport: controller.snapshot(),
            markers: surface.markers(),
            toasts: toast.messages(),
            errors: logger.error_tags(),
        };

        controller.detach();
        home.detach();
        info!(
            markers = summary.markers.len(),
            radius_meters = summary.radius_meters,
            "simulation finished"
        );
        Ok(summary)
    }
}
