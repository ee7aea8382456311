// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Panel assembly.
//!
//! A [`LayoutTable`] names, for every panel target, the thematic overlays to
//! stack between a shared base layer and a shared reference layer. Assembly
//! resolves each name against the [`LayerCatalog`] and binds the panels to
//! one view or to one view each, depending on [`ViewSharing`].

mod presets;

pub use presets::LayoutPreset;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::{names, LayerCatalog};
use crate::layer::LayerDefinition;
use crate::view::{ViewDefinition, ViewHandle};
use crate::ConfigError;

/// The viewer lays panels out in a 2x2 grid.
pub const MAX_PANELS: usize = 4;

/// Default panel targets, in grid order.
pub const DEFAULT_TARGETS: [&str; MAX_PANELS] = ["map1", "map2", "map3", "map4"];

/// On-map UI controls a panel may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Control {
    /// Zoom in/out buttons.
    Zoom,
    /// Provider attribution for the visible layers.
    Attribution,
    /// Legend images of the visible layers, each zooming to the area it describes.
    Legend,
}

/// Whether panels pan and zoom together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewSharing {
    /// Every panel is bound to one view.
    #[default]
    Shared,
    /// Each panel gets its own view with the same starting values.
    Independent,
}

/// One row of the layout table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    /// Panel slot identifier (e.g. `map1`).
    pub target: String,
    /// Thematic layers, bottom to top.
    #[serde(default)]
    pub overlays: Vec<String>,
    #[serde(default)]
    pub controls: BTreeSet<Control>,
}

impl PanelLayout {
    #[must_use]
    pub fn new(target: &str, overlays: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            overlays: overlays.iter().map(ToString::to_string).collect(),
            controls: BTreeSet::new(),
        }
    }
}

fn default_base() -> String {
    names::BASE.to_string()
}

fn default_reference() -> Option<String> {
    Some(names::COUNTY_BOUNDARIES.to_string())
}

/// Declarative description of every panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutTable {
    /// Background layer placed first in every panel.
    #[serde(default = "default_base")]
    pub base: String,
    /// Boundary layer placed last in every panel.
    #[serde(default = "default_reference")]
    pub reference: Option<String>,
    pub panels: Vec<PanelLayout>,
}

impl LayoutTable {
    #[must_use]
    pub fn new(panels: Vec<PanelLayout>) -> Self {
        Self {
            base: default_base(),
            reference: default_reference(),
            panels,
        }
    }

    /// Every layer name the table refers to, including base and reference.
    #[must_use]
    pub fn referenced_layers(&self) -> BTreeSet<&str> {
        let mut refs: BTreeSet<&str> = self
            .panels
            .iter()
            .flat_map(|p| p.overlays.iter().map(String::as_str))
            .collect();
        refs.insert(&self.base);
        if let Some(reference) = &self.reference {
            refs.insert(reference);
        }
        refs
    }

    fn stack_for<'a>(&'a self, panel: &'a PanelLayout) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.base.as_str())
            .chain(panel.overlays.iter().map(String::as_str))
            .chain(self.reference.as_deref())
    }
}

/// A fully resolved map panel.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub target: String,
    /// Layers bottom to top.
    pub layers: Vec<Arc<LayerDefinition>>,
    pub view: ViewHandle,
    pub controls: BTreeSet<Control>,
}

impl Panel {
    #[must_use]
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// The bottom layer, drawn opaque beneath everything else.
    #[must_use]
    pub fn base_layer(&self) -> Option<&Arc<LayerDefinition>> {
        self.layers.first()
    }

    /// Every layer above the base.
    #[must_use]
    pub fn overlays(&self) -> &[Arc<LayerDefinition>] {
        self.layers.get(1..).unwrap_or_default()
    }
}

/// Resolve `table` into panels.
///
/// Fails on the first layer name missing from `catalog`, naming both the
/// layer and the panel that asked for it.
pub fn assemble_panels(
    catalog: &LayerCatalog,
    table: &LayoutTable,
    view: &ViewDefinition,
    sharing: ViewSharing,
) -> Result<Vec<Panel>, ConfigError> {
    let count = table.panels.len();
    if count == 0 || count > MAX_PANELS {
        return Err(ConfigError::InvalidPanelCount { count });
    }

    let mut seen = HashSet::new();
    for layout in &table.panels {
        if !seen.insert(layout.target.as_str()) {
            return Err(ConfigError::DuplicateTarget(layout.target.clone()));
        }
    }

    let shared = ViewHandle::new(*view);
    let mut panels = Vec::with_capacity(count);

    for layout in &table.panels {
        let layers = table
            .stack_for(layout)
            .map(|name| {
                catalog
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownLayer {
                        layer: name.to_string(),
                        panel: layout.target.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let handle = match sharing {
            ViewSharing::Shared => shared.clone(),
            ViewSharing::Independent => ViewHandle::new(*view),
        };

        let panel = Panel {
            target: layout.target.clone(),
            layers,
            view: handle,
            controls: layout.controls.clone(),
        };
        debug!("Panel {}: {:?}", panel.target, panel.layer_names());
        panels.push(panel);
    }

    info!("Assembled {} panels ({:?} view)", panels.len(), sharing);
    Ok(panels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_layers, YearMonth};
    use crate::layer::{LayerDefinition, Opacity};
    use crate::projection::{LonLat, WebMercator};
    use crate::view::build_view;

    fn catalog() -> LayerCatalog {
        build_layers(YearMonth::new(2017, 12).unwrap()).unwrap()
    }

    fn colorado() -> ViewDefinition {
        build_view(LonLat::new(-105.36, 39.11), 6).unwrap()
    }

    #[test]
    fn test_all_panels_share_configured_view() {
        let panels = assemble_panels(
            &catalog(),
            &LayoutPreset::Indices.table(),
            &colorado(),
            ViewSharing::Shared,
        )
        .unwrap();

        let expected = WebMercator::project(LonLat::new(-105.36, 39.11)).unwrap();
        assert_eq!(panels.len(), 4);
        for panel in &panels {
            let view = panel.view.get();
            assert_eq!(view.center, expected);
            assert_eq!(view.zoom, 6);
            assert!(panel.view.is_linked_to(&panels[0].view));
        }
    }

    #[test]
    fn test_independent_views_start_equal() {
        let panels = assemble_panels(
            &catalog(),
            &LayoutPreset::Indices.table(),
            &colorado(),
            ViewSharing::Independent,
        )
        .unwrap();

        assert_eq!(panels[0].view.get(), panels[3].view.get());
        assert!(!panels[0].view.is_linked_to(&panels[3].view));

        panels[1].view.set_zoom(9).unwrap();
        assert_eq!(panels[0].view.get().zoom, 6);
    }

    #[test]
    fn test_panel_stack_order() {
        let table = LayoutTable::new(vec![PanelLayout::new("map1", &[names::DROUGHT_MONITOR])]);
        let panels = assemble_panels(&catalog(), &table, &colorado(), ViewSharing::Shared).unwrap();

        assert_eq!(panels[0].layers.len(), 3);
        assert_eq!(
            panels[0].layer_names(),
            [names::BASE, names::DROUGHT_MONITOR, names::COUNTY_BOUNDARIES]
        );
        assert_eq!(panels[0].base_layer().unwrap().name, names::BASE);
        assert_eq!(panels[0].overlays().len(), 2);
    }

    #[test]
    fn test_unknown_layer_fails_fast() {
        let table = LayoutTable::new(vec![
            PanelLayout::new("map1", &[names::DROUGHT_MONITOR]),
            PanelLayout::new("map2", &["foo"]),
        ]);
        let err = assemble_panels(&catalog(), &table, &colorado(), ViewSharing::Shared).unwrap_err();

        assert_eq!(
            err,
            ConfigError::UnknownLayer {
                layer: "foo".to_string(),
                panel: "map2".to_string(),
            }
        );
        assert!(err.to_string().contains("'foo'"));
        assert!(err.to_string().contains("'map2'"));
    }

    #[test]
    fn test_missing_catalog_entry_fails() {
        let mut sparse = LayerCatalog::new();
        sparse.insert(LayerDefinition::xyz(names::BASE, "https://tile.example.com/{z}/{x}/{y}.png"));
        sparse.insert(
            LayerDefinition::arcgis(names::SNOW_ANALYSIS, "https://example.com/MapServer")
                .with_opacity(Opacity::new(0.5).unwrap()),
        );

        let mut table = LayoutTable::new(vec![PanelLayout::new("map1", &[names::DROUGHT_MONITOR])]);
        table.reference = None;

        let err = assemble_panels(&sparse, &table, &colorado(), ViewSharing::Shared).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLayer { ref layer, .. } if layer == names::DROUGHT_MONITOR));
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let table = LayoutTable::new(vec![
            PanelLayout::new("map1", &[names::SPI_6]),
            PanelLayout::new("map1", &[names::PDSI]),
        ]);
        assert_eq!(
            assemble_panels(&catalog(), &table, &colorado(), ViewSharing::Shared).unwrap_err(),
            ConfigError::DuplicateTarget("map1".to_string())
        );
    }

    #[test]
    fn test_panel_count_bounds() {
        let empty = LayoutTable::new(Vec::new());
        assert_eq!(
            assemble_panels(&catalog(), &empty, &colorado(), ViewSharing::Shared).unwrap_err(),
            ConfigError::InvalidPanelCount { count: 0 }
        );

        let five = LayoutTable::new((1..=5).map(|i| PanelLayout::new(&format!("map{i}"), &[])).collect());
        assert!(assemble_panels(&catalog(), &five, &colorado(), ViewSharing::Shared).is_err());
    }

    #[test]
    fn test_layers_shared_between_panels() {
        let panels = assemble_panels(
            &catalog(),
            &LayoutPreset::Indices.table(),
            &colorado(),
            ViewSharing::Shared,
        )
        .unwrap();
        assert!(Arc::ptr_eq(&panels[0].layers[0], &panels[1].layers[0]));
    }

    #[test]
    fn test_layout_table_from_json() {
        let json = r#"{ "panels": [ { "target": "left", "overlays": ["snow-analysis"], "controls": ["zoom"] } ] }"#;
        let table: LayoutTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.base, names::BASE);
        assert_eq!(table.reference.as_deref(), Some(names::COUNTY_BOUNDARIES));
        assert!(table.panels[0].controls.contains(&Control::Zoom));
        assert!(table.referenced_layers().contains(names::SNOW_ANALYSIS));
    }
}
