//! Encodage visuel des remarques : couleur, taille et contenu de l'info-bulle

use std::fmt;

use serde::Serialize;

use crate::types::{Remark, RemarkCategory};

/// Nombre maximal de caractères de description dans l'info-bulle
pub const DESCRIPTION_MAX_CHARS: usize = 15;

/// Note à partir de laquelle une remarque est "appréciée"
pub const LIKED_RATING: i32 = 2;

/// Couleur RVB d'une épingle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerColor(pub [u8; 3]);

impl MarkerColor {
    pub const SELECTED: MarkerColor = MarkerColor([0x33, 0x99, 0xFF]);
    pub const RESOLVED: MarkerColor = MarkerColor([0x00, 0x97, 0x20]);
    pub const ACCIDENTS: MarkerColor = MarkerColor([0xFB, 0xF5, 0x14]);
    pub const DAMAGES: MarkerColor = MarkerColor([0xE4, 0x05, 0x21]);
    pub const LITTER: MarkerColor = MarkerColor([0x9F, 0x68, 0x07]);
    pub const DEFAULT_REMARK: MarkerColor = MarkerColor([0x9F, 0x68, 0x07]);
    pub const USER: MarkerColor = MarkerColor([0xFF, 0xEB, 0xEE]);

    /// Code hexadécimal en majuscules, sans `#` (ex: `3399FF`)
    pub fn hex(&self) -> String {
        hex::encode_upper(self.0)
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Taille d'affichage d'une épingle en pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerSize {
    pub width: u32,
    pub height: u32,
}

impl MarkerSize {
    pub const STANDARD: MarkerSize = MarkerSize {
        width: 20,
        height: 30,
    };
    pub const ENLARGED: MarkerSize = MarkerSize {
        width: 30,
        height: 45,
    };
}

/// Couleur d'une remarque, première règle applicable :
/// sélectionnée, résolue, puis selon la catégorie
pub fn remark_color(remark: &Remark) -> MarkerColor {
    if remark.selected {
        return MarkerColor::SELECTED;
    }
    if remark.resolved {
        return MarkerColor::RESOLVED;
    }
    match remark.category {
        RemarkCategory::Accidents => MarkerColor::ACCIDENTS,
        RemarkCategory::Damages => MarkerColor::DAMAGES,
        RemarkCategory::Litter => MarkerColor::LITTER,
        RemarkCategory::Other(_) => MarkerColor::DEFAULT_REMARK,
    }
}

/// Taille d'une remarque : agrandie si appréciée et si le filtre le demande
pub fn remark_size(remark: &Remark, distinguish_liked: bool) -> MarkerSize {
    if remark.rating >= LIKED_RATING && distinguish_liked {
        MarkerSize::ENLARGED
    } else {
        MarkerSize::STANDARD
    }
}

/// Tronque la description à 15 caractères suivis de `...`
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        let head: String = description.chars().take(DESCRIPTION_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

/// Échappe le texte libre avant insertion dans le HTML de l'info-bulle
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Contenu HTML de l'info-bulle d'une remarque
pub fn popup_content(category_label: &str, url: &str, details_text: &str, description: &str) -> String {
    format!(
        r#"<strong>{}</strong><br/><a href="{}" class="btn waves-effect waves-light">{}</a><br/>{}"#,
        escape_html(category_label),
        escape_html(url),
        escape_html(details_text),
        escape_html(&truncate_description(description))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    fn remark(category: &str) -> Remark {
        Remark {
            id: "r1".to_string(),
            location: GeoPoint::new(52.0, 21.0),
            category: RemarkCategory::from(category),
            description: None,
            rating: 0,
            selected: false,
            resolved: false,
        }
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(remark_color(&remark("accidents")), MarkerColor::ACCIDENTS);
        assert_eq!(remark_color(&remark("damages")), MarkerColor::DAMAGES);
        assert_eq!(remark_color(&remark("litter")), MarkerColor::LITTER);
        assert_eq!(remark_color(&remark("other")), MarkerColor::DEFAULT_REMARK);
        assert_eq!(remark_color(&remark("graffiti")), MarkerColor::DEFAULT_REMARK);
    }

    #[test]
    fn test_selected_wins_over_everything() {
        for category in ["accidents", "damages", "litter", "other"] {
            for resolved in [false, true] {
                let mut r = remark(category);
                r.selected = true;
                r.resolved = resolved;
                assert_eq!(remark_color(&r), MarkerColor::SELECTED);
            }
        }
    }

    #[test]
    fn test_resolved_wins_over_category() {
        let mut r = remark("damages");
        r.resolved = true;
        assert_eq!(remark_color(&r), MarkerColor::RESOLVED);
    }

    #[test]
    fn test_size_policy() {
        let mut r = remark("litter");
        r.rating = 2;
        assert_eq!(remark_size(&r, true), MarkerSize::ENLARGED);
        assert_eq!(remark_size(&r, false), MarkerSize::STANDARD);
        r.rating = 1;
        assert_eq!(remark_size(&r, true), MarkerSize::STANDARD);
    }

    #[test]
    fn test_hex_codes() {
        assert_eq!(MarkerColor::SELECTED.hex(), "3399FF");
        assert_eq!(MarkerColor::RESOLVED.hex(), "009720");
        assert_eq!(MarkerColor::ACCIDENTS.hex(), "FBF514");
        assert_eq!(MarkerColor::DAMAGES.hex(), "E40521");
        assert_eq!(MarkerColor::LITTER.hex(), "9F6807");
        assert_eq!(MarkerColor::USER.hex(), "FFEBEE");
    }

    #[test]
    fn test_truncate_description() {
        assert_eq!(
            truncate_description("A very long remark description text"),
            "A very long rem..."
        );
        assert_eq!(truncate_description("Short text"), "Short text");
        assert_eq!(truncate_description("exactly 15 char"), "exactly 15 char");
        // Compte en caractères, pas en octets
        assert_eq!(truncate_description("żółw żółw żółw żółw"), "żółw żółw żółw ...");
    }

    #[test]
    fn test_popup_content() {
        let html = popup_content("Litter", "/remarks/r1", "Details", "Bin <full>");
        assert_eq!(
            html,
            r#"<strong>Litter</strong><br/><a href="/remarks/r1" class="btn waves-effect waves-light">Details</a><br/>Bin &lt;full&gt;"#
        );
    }
}
