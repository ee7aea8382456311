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

//! Layer definitions.

use std::fmt;

use serde::Serialize;

use crate::projection::{Extent, TileAddress};
use crate::{source, ConfigError};

/// How a layer's imagery is requested from its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Pre-rendered `{z}/{x}/{y}` tiles.
    Xyz,
    /// ArcGIS REST MapServer, rendered per tile through `export`.
    ArcGisRest,
    /// OGC Web Map Service image (`GetMap`).
    Wms,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Xyz => "xyz",
            Self::ArcGisRest => "arcgis-rest",
            Self::Wms => "wms",
        };
        f.write_str(name)
    }
}

/// Layer opacity, guaranteed to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Self = Self(1.0);

    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidOpacity(value))
        }
    }

    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Legend metadata shown next to a thematic layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: &'static str,
    /// `GetLegendGraphic` (or equivalent) image.
    pub image_url: Option<&'static str>,
    /// Area the legend describes, in projected metres.
    pub extent: Option<Extent>,
}

/// A single map layer backed by a remote service.
///
/// Definitions are immutable once built and are shared between panels
/// through [`std::sync::Arc`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDefinition {
    pub name: String,
    pub kind: SourceKind,
    pub service_url: String,
    /// Extra request parameters, in insertion order.
    pub params: Vec<(String, String)>,
    pub extent: Option<Extent>,
    pub opacity: Opacity,
    pub visible: bool,
    pub attribution: Option<&'static str>,
    pub attribution_url: Option<&'static str>,
    pub legend: Option<Legend>,
}

impl LayerDefinition {
    fn new(name: &str, kind: SourceKind, service_url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            service_url: service_url.to_string(),
            params: Vec::new(),
            extent: None,
            opacity: Opacity::OPAQUE,
            visible: true,
            attribution: None,
            attribution_url: None,
            legend: None,
        }
    }

    /// Layer served as XYZ tiles from a URL template (`{z}`, `{x}`, `{y}`, `{a-c}`).
    #[must_use]
    pub fn xyz(name: &str, template: &str) -> Self {
        Self::new(name, SourceKind::Xyz, template)
    }

    /// Layer rendered per tile by an ArcGIS REST MapServer.
    #[must_use]
    pub fn arcgis(name: &str, service_url: &str) -> Self {
        Self::new(name, SourceKind::ArcGisRest, service_url)
    }

    /// Layer rendered by a WMS endpoint.
    #[must_use]
    pub fn wms(name: &str, service_url: &str) -> Self {
        Self::new(name, SourceKind::Wms, service_url)
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: Opacity) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn with_attribution(mut self, text: &'static str, url: Option<&'static str>) -> Self {
        self.attribution = Some(text);
        self.attribution_url = url;
        self
    }

    #[must_use]
    pub fn with_legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    /// Look up a request parameter by name, ignoring ASCII case.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Whether any part of `area` is inside this layer's extent.
    #[must_use]
    pub fn intersects(&self, area: &Extent) -> bool {
        self.extent.map_or(true, |extent| extent.intersects(area))
    }

    /// Build the request URL for one tile.
    pub fn tile_request(&self, tile: TileAddress) -> Result<String, ConfigError> {
        source::request_url(self, tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_bounds() {
        assert!(Opacity::new(0.0).is_ok());
        assert!(Opacity::new(1.0).is_ok());
        assert_eq!(Opacity::new(1.5), Err(ConfigError::InvalidOpacity(1.5)));
        assert!(Opacity::new(-0.1).is_err());
        assert!(Opacity::new(f32::NAN).is_err());
    }

    #[test]
    fn test_param_lookup_ignores_case() {
        let layer = LayerDefinition::arcgis("test", "https://example.com/MapServer")
            .with_param("LAYERS", "show:7");
        assert_eq!(layer.param("layers"), Some("show:7"));
        assert_eq!(layer.param("layerDefs"), None);
    }

    #[test]
    fn test_intersects_without_extent() {
        let layer = LayerDefinition::xyz("base", "https://tile.example.com/{z}/{x}/{y}.png");
        assert!(layer.intersects(&TileAddress::new(0, 0, 3).bounds()));
    }

    #[test]
    fn test_intersects_respects_extent() {
        let conus = Extent::new(-13_884_991.0, 2_870_341.0, -7_455_066.0, 6_338_219.0);
        let layer = LayerDefinition::arcgis("test", "https://example.com/MapServer").with_extent(conus);
        // Western hemisphere, northern half at zoom 1
        assert!(layer.intersects(&TileAddress::new(0, 0, 1).bounds()));
        // Eastern hemisphere
        assert!(!layer.intersects(&TileAddress::new(1, 0, 1).bounds()));
    }

    #[test]
    fn test_defaults() {
        let layer = LayerDefinition::wms("usdm", "https://example.com/wms");
        assert!(layer.visible);
        assert_eq!(layer.opacity, Opacity::OPAQUE);
        assert_eq!(layer.kind, SourceKind::Wms);
        assert_eq!(layer.kind.to_string(), "wms");
    }
}
