//! YAML route tables.

use std::path::Path;

use serde::Deserialize;
use switchyard_router::{ConfigError, Router, RouterConfig, RouterError};
use switchyard_telemetry::log_route_rejected;
use thiserror::Error;

/// Errors from loading a route table or building its router.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid router config: {0}")]
    Config(#[from] ConfigError),

    #[error("route #{index} ({method} {path}): {source}")]
    Route {
        index: usize,
        method: String,
        path: String,
        #[source]
        source: RouterError,
    },
}

/// A route table file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    /// Router settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Registrations in order.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

/// One registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    pub handler: String,
}

impl RouteTable {
    /// Load a route table from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse a route table; `origin` names the source in errors.
    pub fn parse(yaml: &str, origin: &str) -> Result<Self, ManifestError> {
        serde_yaml::from_str(yaml).map_err(|source| ManifestError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Build a router whose handlers are indexes into `routes`.
    pub fn build_router(&self) -> Result<Router<usize>, ManifestError> {
        let mut router = Router::with_config(self.router.clone())?;

        for (index, route) in self.routes.iter().enumerate() {
            router
                .add(&route.method, &route.path, index)
                .map_err(|source| {
                    log_route_rejected!(
                        index,
                        method = %route.method,
                        path = %route.path,
                        error = %source
                    );
                    ManifestError::Route {
                        index,
                        method: route.method.clone(),
                        path: route.path.clone(),
                        source,
                    }
                })?;
        }

        Ok(router)
    }

    /// Handler name of a matched index.
    pub fn handler(&self, index: usize) -> &str {
        self.routes
            .get(index)
            .map(|r| r.handler.as_str())
            .unwrap_or("<unknown>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_router::Strategy;

    const TABLE: &str = r#"
router:
  strict: true
  strategies: [trie]
routes:
  - method: ALL
    path: "*"
    handler: logger
  - method: GET
    path: /users/:id
    handler: show_user
"#;

    #[test]
    fn parses_router_and_routes() {
        let table = RouteTable::parse(TABLE, "inline").expect("valid table");
        assert!(table.router.strict);
        assert_eq!(table.router.strategies, vec![Strategy::Trie]);
        assert_eq!(table.routes.len(), 2);
        assert_eq!(table.routes[1].path, "/users/:id");
        assert_eq!(table.handler(1), "show_user");
        assert_eq!(table.handler(9), "<unknown>");
    }

    #[test]
    fn router_section_is_optional() {
        let table = RouteTable::parse("routes: []\n", "inline").expect("valid table");
        assert_eq!(table.router, RouterConfig::default());
        assert!(table.routes.is_empty());
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let err = RouteTable::parse("router:\n  strategies: [radix]\n", "inline")
            .expect_err("unknown strategy");
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse inline"));
    }

    #[test]
    fn unknown_route_field_is_rejected() {
        let yaml = "routes:\n  - method: GET\n    path: /\n    handler: h\n    extra: 1\n";
        assert!(matches!(
            RouteTable::parse(yaml, "inline"),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn builds_a_working_router() {
        let table = RouteTable::parse(TABLE, "inline").expect("valid table");
        let router = table.build_router().expect("router builds");
        let found = router
            .lookup("GET", "/users/42")
            .expect("lookup")
            .expect("match");
        let names: Vec<&str> = found.handlers.iter().map(|&i| table.handler(i)).collect();
        assert_eq!(names, vec!["logger", "show_user"]);
        assert_eq!(found.params.get("id"), Some("42"));
    }

    #[test]
    fn bad_route_names_its_index() {
        let yaml = "routes:\n  - {method: GET, path: /ok, handler: a}\n  - {method: GET, path: '/:id/:id', handler: b}\n";
        let table = RouteTable::parse(yaml, "inline").expect("valid table");
        let err = table.build_router().expect_err("duplicate param");
        match err {
            ManifestError::Route { index, source, .. } => {
                assert_eq!(index, 1);
                assert!(matches!(source, RouterError::DuplicateParam { .. }));
            }
            other => panic!("expected Route error, got {other:?}"),
        }
    }

    #[test]
    fn empty_strategy_list_is_a_config_error() {
        let table = RouteTable::parse("router:\n  strategies: []\n", "inline").expect("valid yaml");
        assert!(matches!(
            table.build_router(),
            Err(ManifestError::Config(ConfigError::EmptyStrategies))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = RouteTable::load(Path::new("does-not-exist.yaml")).expect_err("missing");
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
