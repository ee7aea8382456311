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

//! Application configuration management.
//!
//! Settings are persisted as TOML through `confy`. They choose the starting
//! view, how the climate index layers are filtered, which layout the four
//! panels use and whether the panels move together.

use log::info;
use panel_config::{Control, DateFilter, LayoutPreset, LayoutTable, LonLat, ViewSharing};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "drought-panels";
const CONFIG_NAME: &str = "config";

/// Current configuration schema version.
const CONFIG_VERSION: u32 = 1;

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default)]
    pub config_version: u32,

    /// Initial map center longitude (degrees)
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    /// Initial map center latitude (degrees)
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    /// Initial zoom level (0 - 20)
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// "shared" moves all panels together, "independent" gives each its own view
    #[serde(default)]
    pub view_sharing: ViewSharing,

    /// Month for the SPI/PDSI layers: "YYYYMM" or "previous-month"
    #[serde(default)]
    pub date_filter: DateFilter,

    /// Built-in layout: "indices", "hydrology" or "outlook"
    #[serde(default)]
    pub layout: LayoutPreset,

    /// Custom layout table, used instead of the preset when present
    #[serde(default)]
    pub custom_layout: Option<LayoutTable>,

    /// Override the background layer (e.g. "watercolor")
    #[serde(default)]
    pub base_layer: Option<String>,

    /// Show zoom buttons on every panel
    #[serde(default)]
    pub show_zoom_controls: bool,

    /// Show layer attribution on every panel
    #[serde(default)]
    pub show_attribution: bool,

    /// Show layer legends on every panel
    #[serde(default)]
    pub show_legend: bool,

    /// Keep downloaded tiles in the user cache directory
    #[serde(default = "default_true")]
    pub cache_tiles: bool,
}

// Default value functions for serde
fn default_center_lon() -> f64 {
    -105.36
}

fn default_center_lat() -> f64 {
    39.11
}

fn default_zoom() -> u8 {
    6
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            center_lon: default_center_lon(),
            center_lat: default_center_lat(),
            zoom: default_zoom(),
            view_sharing: ViewSharing::default(),
            date_filter: DateFilter::default(),
            layout: LayoutPreset::default(),
            custom_layout: None,
            base_layer: None,
            show_zoom_controls: false,
            show_attribution: false,
            show_legend: false,
            cache_tiles: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, upgrading older schema versions in place
    pub fn load() -> Result<Self, confy::ConfyError> {
        let mut config: AppConfig = confy::load(APP_NAME, CONFIG_NAME)?;

        if config.config_version < CONFIG_VERSION {
            info!(
                "Upgrading configuration from version {} to {}",
                config.config_version, CONFIG_VERSION
            );
            config.config_version = CONFIG_VERSION;
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Initial view center
    pub fn center(&self) -> LonLat {
        LonLat::new(self.center_lon, self.center_lat)
    }

    /// The layout table the panels are assembled from, with the base layer
    /// override and global controls applied.
    pub fn layout_table(&self) -> LayoutTable {
        let mut table = self
            .custom_layout
            .clone()
            .unwrap_or_else(|| self.layout.table());

        if let Some(base) = &self.base_layer {
            table.base.clone_from(base);
        }

        for panel in &mut table.panels {
            if self.show_zoom_controls {
                panel.controls.insert(Control::Zoom);
            }
            if self.show_attribution {
                panel.controls.insert(Control::Attribution);
            }
            if self.show_legend {
                panel.controls.insert(Control::Legend);
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_config::catalog::names;

    #[test]
    fn test_defaults_match_four_pane_page() {
        let config = AppConfig::default();
        assert_eq!(config.center(), LonLat::new(-105.36, 39.11));
        assert_eq!(config.zoom, 6);
        assert_eq!(config.view_sharing, ViewSharing::Shared);
        assert_eq!(config.layout_table(), LayoutPreset::Indices.table());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "zoom": 7, "layout": "hydrology" }"#).unwrap();
        assert_eq!(config.zoom, 7);
        assert_eq!(config.layout, LayoutPreset::Hydrology);
        assert_eq!(config.config_version, 0);
        assert!(config.cache_tiles);
        assert_eq!(config.date_filter, DateFilter::default());
    }

    #[test]
    fn test_layout_table_applies_overrides() {
        let config = AppConfig {
            base_layer: Some(names::WATERCOLOR.to_string()),
            show_zoom_controls: true,
            show_legend: true,
            ..Default::default()
        };
        let table = config.layout_table();
        assert_eq!(table.base, names::WATERCOLOR);
        assert!(table.panels.iter().all(|p| p.controls.contains(&Control::Zoom)));
        assert!(table.panels.iter().all(|p| p.controls.contains(&Control::Legend)));
        assert!(table.panels.iter().all(|p| !p.controls.contains(&Control::Attribution)));
    }

    #[test]
    fn test_custom_layout_wins_over_preset() {
        let custom = LayoutTable::new(vec![panel_config::PanelLayout::new("solo", &[names::SNOW_ANALYSIS])]);
        let config = AppConfig {
            layout: LayoutPreset::Outlook,
            custom_layout: Some(custom.clone()),
            ..Default::default()
        };
        assert_eq!(config.layout_table(), custom);
    }
}
