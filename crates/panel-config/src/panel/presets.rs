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

//! Built-in layout tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LayoutTable, PanelLayout, DEFAULT_TARGETS};
use crate::catalog::names;
use crate::ConfigError;

/// Named panel arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    /// Drought monitor beside SPI, PDSI and snow analysis.
    #[default]
    Indices,
    /// Drought monitor beside the National Water Model and snow analysis.
    Hydrology,
    /// Drought monitor beside the seasonal outlook and both climate indices.
    Outlook,
}

impl LayoutPreset {
    pub const ALL: [Self; 3] = [Self::Indices, Self::Hydrology, Self::Outlook];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indices => "indices",
            Self::Hydrology => "hydrology",
            Self::Outlook => "outlook",
        }
    }

    fn overlays(self) -> [&'static str; 4] {
        match self {
            Self::Indices => [names::DROUGHT_MONITOR, names::SPI_6, names::PDSI, names::SNOW_ANALYSIS],
            Self::Hydrology => [
                names::DROUGHT_MONITOR,
                names::STREAM_ANOMALY,
                names::SOIL_MOISTURE,
                names::SNOW_ANALYSIS,
            ],
            Self::Outlook => [names::DROUGHT_MONITOR, names::CLIMATE_OUTLOOK, names::SPI_6, names::PDSI],
        }
    }

    /// One overlay per default target, between the base map and county boundaries.
    #[must_use]
    pub fn table(self) -> LayoutTable {
        let panels = DEFAULT_TARGETS
            .iter()
            .zip(self.overlays())
            .map(|(target, overlay)| PanelLayout::new(target, &[overlay]))
            .collect();
        LayoutTable::new(panels)
    }
}

impl fmt::Display for LayoutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_layers, YearMonth};

    #[test]
    fn test_indices_matches_four_pane_page() {
        let table = LayoutPreset::Indices.table();
        let rows: Vec<(&str, &str)> = table
            .panels
            .iter()
            .map(|p| (p.target.as_str(), p.overlays[0].as_str()))
            .collect();
        assert_eq!(
            rows,
            [
                ("map1", names::DROUGHT_MONITOR),
                ("map2", names::SPI_6),
                ("map3", names::PDSI),
                ("map4", names::SNOW_ANALYSIS),
            ]
        );
    }

    #[test]
    fn test_presets_only_reference_catalog_layers() {
        let catalog = build_layers(YearMonth::new(2017, 12).unwrap()).unwrap();
        for preset in LayoutPreset::ALL {
            for name in preset.table().referenced_layers() {
                assert!(catalog.contains(name), "{preset} references {name}");
            }
        }
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!("hydrology".parse::<LayoutPreset>().unwrap(), LayoutPreset::Hydrology);
        assert_eq!(" Outlook ".parse::<LayoutPreset>().unwrap(), LayoutPreset::Outlook);
        assert_eq!(
            "weather".parse::<LayoutPreset>(),
            Err(ConfigError::UnknownPreset("weather".to_string()))
        );
    }
}
