//! Asset resolver contracts: icon bodies, shape catalog, logo catalog.
//!
//! The catalogs themselves live outside the engine. `StaticAssets` is an
//! in-memory implementation for hosts that preload a subset, and for tests.

use crate::model::SubPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vector body of an icon: SVG inner markup plus its view-box size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconBody {
    pub body: String,
    pub width: f64,
    pub height: f64,
}

/// Looks up icons by fully-qualified `prefix:key` name.
pub trait IconResolver {
    fn resolve_icon(&self, name: &str) -> Option<IconBody>;

    /// Candidate names for a free-text query, best match first.
    fn search_icons(&self, query: &str, limit: usize) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDefinition {
    pub name: String,
    pub subpaths: Vec<SubPath>,
    /// Uniform scale from the catalog's normalized units to document units.
    pub scale: f64,
}

pub trait ShapeCatalog {
    fn shape(&self, name: &str) -> Option<ShapeDefinition>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoDefinition {
    pub name: String,
    /// Image source reference for the logo raster.
    pub source: String,
}

pub trait LogoCatalog {
    fn logo(&self, name: &str) -> Option<LogoDefinition>;
}

/// Preloaded assets keyed by name.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    pub icons: BTreeMap<String, IconBody>,
    pub shapes: BTreeMap<String, ShapeDefinition>,
    pub logos: BTreeMap<String, LogoDefinition>,
}

impl StaticAssets {
    pub fn with_icon(mut self, name: &str, body: &str, width: f64, height: f64) -> Self {
        self.icons.insert(
            name.to_string(),
            IconBody {
                body: body.to_string(),
                width,
                height,
            },
        );
        self
    }

    pub fn with_shape(mut self, shape: ShapeDefinition) -> Self {
        self.shapes.insert(shape.name.clone(), shape);
        self
    }

    pub fn with_logo(mut self, logo: LogoDefinition) -> Self {
        self.logos.insert(logo.name.clone(), logo);
        self
    }
}

impl IconResolver for StaticAssets {
    fn resolve_icon(&self, name: &str) -> Option<IconBody> {
        self.icons.get(name).cloned()
    }

    fn search_icons(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_ascii_lowercase();
        let mut hits: Vec<(usize, &String)> = self
            .icons
            .keys()
            .filter_map(|name| {
                let key = name.split_once(':').map_or(name.as_str(), |(_, k)| k);
                if key == query {
                    Some((0, name))
                } else if key.starts_with(&query) {
                    Some((1, name))
                } else if key.contains(&query) {
                    Some((2, name))
                } else {
                    None
                }
            })
            .collect();
        hits.sort();
        hits.into_iter().take(limit).map(|(_, n)| n.clone()).collect()
    }
}

impl ShapeCatalog for StaticAssets {
    fn shape(&self, name: &str) -> Option<ShapeDefinition> {
        self.shapes.get(name).cloned()
    }
}

impl LogoCatalog for StaticAssets {
    fn logo(&self, name: &str) -> Option<LogoDefinition> {
        self.logos.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn search_ranks_exact_then_prefix_then_substring() {
        let assets = StaticAssets::default()
            .with_icon("mdi:heart-outline", "", 24.0, 24.0)
            .with_icon("mdi:heart", "", 24.0, 24.0)
            .with_icon("mdi:broken-heart", "", 24.0, 24.0)
            .with_icon("mdi:star", "", 24.0, 24.0);
        assert_eq!(
            assets.search_icons("Heart", 10),
            vec!["mdi:heart", "mdi:heart-outline", "mdi:broken-heart"]
        );
        assert_eq!(assets.search_icons("heart", 1), vec!["mdi:heart"]);
    }
}
