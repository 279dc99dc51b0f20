//! Rendu des marqueurs : utilisateur et remarques
//!
//! Le renderer possède ses marqueurs et leurs info-bulles. Le marqueur
//! utilisateur est unique : l'ancien est toujours détaché de la surface avant
//! la création du nouveau. Les marqueurs de remarques sont recréés en bloc à
//! chaque nouvelle liste.

pub mod style;

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::guard::{isolate, FailureTag};
use crate::logging::Logger;
use crate::ports::{RouteGenerator, Translator};
use crate::surface::{Icon, InfoWindowId, MapSurface, MarkerId, MarkerOptions};
use crate::types::{GeoPoint, Remark};
use crate::MapError;

use self::style::{popup_content, remark_color, remark_size, MarkerColor, MarkerSize};

/// Marqueur d'une remarque, indexé par l'identifiant de la remarque
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkMarker {
    pub remark_id: String,
    pub marker: MarkerId,
}

/// Description d'une épingle à poser
struct PinSpec {
    position: GeoPoint,
    title: String,
    content: String,
    color: MarkerColor,
    size: MarkerSize,
}

pub struct MarkerRenderer {
    translator: Rc<dyn Translator>,
    router: Rc<dyn RouteGenerator>,
    logger: Rc<dyn Logger>,
    user_marker: Option<MarkerId>,
    remark_markers: Vec<RemarkMarker>,
    popups: HashMap<MarkerId, InfoWindowId>,
}

impl MarkerRenderer {
    pub fn new(
        translator: Rc<dyn Translator>,
        router: Rc<dyn RouteGenerator>,
        logger: Rc<dyn Logger>,
    ) -> Self {
        Self {
            translator,
            router,
            logger,
            user_marker: None,
            remark_markers: Vec::new(),
            popups: HashMap::new(),
        }
    }

    pub fn user_marker(&self) -> Option<MarkerId> {
        self.user_marker
    }

    pub fn remark_markers(&self) -> &[RemarkMarker] {
        &self.remark_markers
    }

    /// Marqueur de la remarque `remark_id`, s'il est affiché
    pub fn remark_marker(&self, remark_id: &str) -> Option<MarkerId> {
        self.remark_markers
            .iter()
            .find(|m| m.remark_id == remark_id)
            .map(|m| m.marker)
    }

    /// Remplace le marqueur utilisateur par un nouveau à `position`
    ///
    /// Si `snap` est vrai, le marqueur est ensuite recalé explicitement sur
    /// la position (ce que l'on évite quand l'utilisateur a déplacé la carte).
    pub fn draw_user_marker(
        &mut self,
        surface: &mut dyn MapSurface,
        position: GeoPoint,
        snap: bool,
    ) -> Result<Option<MarkerId>, MapError> {
        let position = position.validate()?;

        if let Some(previous) = self.user_marker.take() {
            self.detach(surface, previous);
        }

        let spec = PinSpec {
            position,
            title: self.translator.tr("common.user"),
            content: self.translator.tr("common.you_are_here"),
            color: MarkerColor::USER,
            size: MarkerSize::STANDARD,
        };
        let marker = self.draw_marker(surface, spec);
        self.user_marker = marker;

        if let (Some(marker), true) = (marker, snap) {
            self.move_marker(surface, marker, position);
        }
        Ok(marker)
    }

    /// Recale un marqueur sur une position
    pub fn move_marker(&self, surface: &mut dyn MapSurface, marker: MarkerId, position: GeoPoint) {
        isolate(self.logger.as_ref(), FailureTag::MoveMarker, || {
            surface.set_marker_position(marker, position)
        });
    }

    /// Remplace tous les marqueurs de remarques par ceux de `remarks`
    ///
    /// Chaque remarque est isolée : une remarque invalide n'empêche pas le
    /// rendu des suivantes. Retourne le nombre de marqueurs posés.
    pub fn render_remarks(
        &mut self,
        surface: &mut dyn MapSurface,
        remarks: &[Remark],
        distinguish_liked: bool,
    ) -> usize {
        self.clear_remarks(surface);

        let logger = Rc::clone(&self.logger);
        for remark in remarks {
            isolate(logger.as_ref(), FailureTag::DrawRemarkMarker, || {
                self.draw_remark_marker(surface, remark, distinguish_liked)
            });
        }

        debug!(
            requested = remarks.len(),
            drawn = self.remark_markers.len(),
            "remark markers rendered"
        );
        self.remark_markers.len()
    }

    /// Pose le marqueur d'une remarque
    pub fn draw_remark_marker(
        &mut self,
        surface: &mut dyn MapSurface,
        remark: &Remark,
        distinguish_liked: bool,
    ) -> Result<Option<MarkerId>, MapError> {
        let position = remark.location.validate()?;
        let category = self
            .translator
            .tr(&format!("remark.category_{}", remark.category.as_str()));
        let details_text = self.translator.tr("common.details");
        let url = self.router.generate("remark", &[("id", remark.id.as_str())]);
        let description = remark.description.as_deref().unwrap_or("");

        let spec = PinSpec {
            position,
            title: details_text.clone(),
            content: popup_content(&category, &url, &details_text, description),
            color: remark_color(remark),
            size: remark_size(remark, distinguish_liked),
        };

        let marker = self.draw_marker(surface, spec);
        if let Some(marker) = marker {
            self.remark_markers.push(RemarkMarker {
                remark_id: remark.id.clone(),
                marker,
            });
        }
        Ok(marker)
    }

    /// Ouvre l'info-bulle du marqueur cliqué, ancrée sur ce marqueur
    pub fn open_popup(&self, surface: &mut dyn MapSurface, marker: MarkerId) -> Result<(), MapError> {
        let window = self
            .popups
            .get(&marker)
            .copied()
            .ok_or(MapError::UnknownMarker(marker.0))?;
        surface.open_info_window(window, marker)
    }

    /// Détache tous les marqueurs de remarques
    pub fn clear_remarks(&mut self, surface: &mut dyn MapSurface) {
        for remark_marker in std::mem::take(&mut self.remark_markers) {
            self.detach(surface, remark_marker.marker);
        }
    }

    /// Oublie les marqueurs sans toucher à la surface (surface déjà libérée)
    pub fn forget(&mut self) {
        self.user_marker = None;
        self.remark_markers.clear();
        self.popups.clear();
    }

    fn detach(&mut self, surface: &mut dyn MapSurface, marker: MarkerId) {
        if let Some(window) = self.popups.remove(&marker) {
            surface.remove_info_window(window);
        }
        surface.remove_marker(marker);
    }

    /// Pose une épingle et son info-bulle ; les erreurs sont journalisées
    /// sous `map_draw_marker`
    fn draw_marker(&mut self, surface: &mut dyn MapSurface, spec: PinSpec) -> Option<MarkerId> {
        let logger = Rc::clone(&self.logger);
        isolate(logger.as_ref(), FailureTag::DrawMarker, || {
            let window = surface.add_info_window(spec.content)?;
            let marker = match surface.add_marker(MarkerOptions {
                position: spec.position,
                title: spec.title,
                icon: Icon::pin(spec.color, spec.size),
            }) {
                Ok(marker) => marker,
                Err(e) => {
                    surface.remove_info_window(window);
                    return Err(e);
                }
            };
            self.popups.insert(marker, window);
            Ok(marker)
        })
    }
}
