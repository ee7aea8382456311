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

//! Declarative layer catalog and multi-panel map layout.
//!
//! This crate describes a four-panel drought monitoring map: which remote
//! services provide each layer, how those layers are stacked in every panel,
//! and which view (center and zoom) each panel starts from. It owns no
//! rendering; a viewer takes the assembled [`Panel`]s and hands the layer
//! request URLs to its tile engine.
//!
//! The pieces can be used independently:
//!
//! - **Projection**: [`WebMercator`] converts EPSG:4326 degrees to EPSG:3857
//!   metres and computes tile bounds.
//! - **Catalog**: [`build_layers`] creates every named [`LayerDefinition`],
//!   with the climate index filters keyed to a [`YearMonth`].
//! - **Layout**: [`assemble_panels`] resolves a [`LayoutTable`] against the
//!   catalog, failing on any unknown layer name.
//!
//! # Quick Start
//!
//! ```
//! use panel_config::{
//!     assemble_panels, build_layers, build_view, LayoutPreset, LonLat, ViewSharing, YearMonth,
//! };
//!
//! let catalog = build_layers(YearMonth::new(2017, 12).unwrap()).unwrap();
//! let view = build_view(LonLat::new(-105.36, 39.11), 6).unwrap();
//! let panels = assemble_panels(
//!     &catalog,
//!     &LayoutPreset::Indices.table(),
//!     &view,
//!     ViewSharing::Shared,
//! )
//! .unwrap();
//!
//! assert_eq!(panels.len(), 4);
//! assert_eq!(panels[0].layer_names(), ["base", "drought-monitor", "county-boundaries"]);
//! ```

pub mod catalog;
pub mod layer;
pub mod panel;
pub mod projection;
pub mod source;
pub mod view;

pub use catalog::{build_layers, DateFilter, LayerCatalog, YearMonth};
pub use layer::{LayerDefinition, Legend, Opacity, SourceKind};
pub use panel::{assemble_panels, Control, LayoutPreset, LayoutTable, Panel, PanelLayout, ViewSharing};
pub use projection::{Extent, LonLat, Projected, TileAddress, WebMercator};
pub use view::{build_view, fit_extent, ViewDefinition, ViewHandle};

use thiserror::Error;

/// Errors raised while building the map configuration.
///
/// All of these surface at startup; nothing here is raised once the panels
/// are rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("panel '{panel}' references unknown layer '{layer}'")]
    UnknownLayer { layer: String, panel: String },

    #[error("panel target '{0}' is defined more than once")]
    DuplicateTarget(String),

    #[error("layout must define between 1 and {max} panels, got {count}", max = panel::MAX_PANELS)]
    InvalidPanelCount { count: usize },

    #[error("opacity {0} is outside [0, 1]")]
    InvalidOpacity(f32),

    #[error("coordinate ({lon}, {lat}) is outside the geographic range")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("zoom level {0} is above the supported maximum")]
    InvalidZoom(u8),

    #[error("invalid year-month filter: {0}")]
    InvalidYearMonth(String),

    #[error("unknown layout preset: {0}")]
    UnknownPreset(String),

    #[error("invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
