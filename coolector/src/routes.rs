//! Routes nommées et génération d'URL

use std::collections::HashMap;

use coolector_map::RouteGenerator;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Missing parameter '{param}' for route {route}")]
    MissingParam { route: String, param: String },
}

/// Table des routes de l'application
#[derive(Debug, Clone)]
pub struct Routes {
    patterns: HashMap<&'static str, &'static str>,
}

impl Default for Routes {
    fn default() -> Self {
        Self::new()
    }
}

impl Routes {
    pub fn new() -> Self {
        let patterns = HashMap::from([
            ("home", "/"),
            ("remarks", "/remarks"),
            ("remark", "/remarks/:id"),
            ("filters", "/filters"),
        ]);
        Self { patterns }
    }

    /// Remplace chaque segment `:param` par sa valeur
    pub fn try_generate(&self, route: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let pattern = self
            .patterns
            .get(route)
            .ok_or_else(|| RouteError::UnknownRoute(route.to_string()))?;

        let segments = pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => params
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
                    .ok_or_else(|| RouteError::MissingParam {
                        route: route.to_string(),
                        param: name.to_string(),
                    }),
                None => Ok(segment.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(segments.join("/"))
    }
}

impl RouteGenerator for Routes {
    /// Route invalide : `#`
    fn generate(&self, route: &str, params: &[(&str, &str)]) -> String {
        self.try_generate(route, params).unwrap_or_else(|e| {
            warn!(error = %e, "route generation failed");
            "#".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remark_route() {
        let routes = Routes::new();
        assert_eq!(routes.generate("remark", &[("id", "abc")]), "/remarks/abc");
        assert_eq!(routes.generate("home", &[]), "/");
    }

    #[test]
    fn test_errors() {
        let routes = Routes::new();
        assert_eq!(
            routes.try_generate("nope", &[]),
            Err(RouteError::UnknownRoute("nope".to_string()))
        );
        assert!(matches!(
            routes.try_generate("remark", &[]),
            Err(RouteError::MissingParam { .. })
        ));
        assert_eq!(routes.generate("remark", &[]), "#");
    }
}
