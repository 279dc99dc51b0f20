//! Isolation des pannes
//!
//! Chaque opération publique de la carte passe par [`isolate`] : une erreur
//! est journalisée sous l'étiquette de l'opération puis absorbée, la carte
//! reste utilisable et le prochain événement retentera naturellement.

use std::fmt;

use crate::logging::Logger;
use crate::MapError;

/// Étiquettes stables des opérations de la carte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureTag {
    DrawMap,
    RecalculateRadius,
    DrawUserMarker,
    CenterChanged,
    CenterChangedListener,
    LocationUpdated,
    ResetCenter,
    DrawRemarkMarker,
    MoveMarker,
    DrawMarker,
    OpenPopup,
    DrawRadius,
    Detach,
}

impl FailureTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrawMap => "map_draw_map",
            Self::RecalculateRadius => "map_recalculate_radius",
            Self::DrawUserMarker => "map_draw_user_marker",
            Self::CenterChanged => "map_center_changed",
            Self::CenterChangedListener => "map_center_changed_listener",
            Self::LocationUpdated => "map_location_updated",
            Self::ResetCenter => "map_reset_center",
            Self::DrawRemarkMarker => "map_draw_remark_marker",
            Self::MoveMarker => "map_move_marker",
            Self::DrawMarker => "map_draw_marker",
            Self::OpenPopup => "map_open_popup",
            Self::DrawRadius => "map_draw_radius",
            Self::Detach => "map_detach",
        }
    }
}

impl fmt::Display for FailureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exécute `op` ; en cas d'erreur, la journalise sous `tag` et retourne `None`
pub fn isolate<T>(
    logger: &dyn Logger,
    tag: FailureTag,
    op: impl FnOnce() -> Result<T, MapError>,
) -> Option<T> {
    match op() {
        Ok(value) => Some(value),
        Err(e) => {
            logger.error(tag.as_str(), &e);
            None
        }
    }
}
