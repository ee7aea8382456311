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

//! `walkers` tile sources backed by catalog layers.

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use panel_config::{LayerDefinition, TileAddress};
use walkers::sources::{Attribution, TileSource};
use walkers::{HttpOptions, HttpTiles, TileId};

/// Tile source that renders one catalog layer.
///
/// XYZ layers are fetched directly; ArcGIS REST and WMS layers are requested
/// as 256px images covering each tile's bounding box.
pub struct LayerTileSource {
    layer: Arc<LayerDefinition>,
}

impl LayerTileSource {
    pub fn new(layer: Arc<LayerDefinition>) -> Self {
        Self { layer }
    }
}

impl TileSource for LayerTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let tile = TileAddress::new(tile_id.x, tile_id.y, tile_id.zoom);
        match self.layer.tile_request(tile) {
            Ok(url) => url,
            Err(e) => {
                // Service URLs are checked at startup, so this only fires if
                // that check was bypassed
                log::error!("Failed to build request for layer {}: {}", self.layer.name, e);
                String::new()
            }
        }
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.layer.attribution.unwrap_or(""),
            url: self.layer.attribution_url.unwrap_or(""),
            logo_light: None,
            logo_dark: None,
        }
    }
}

/// Downloaded tiles for one layer plus the layer itself.
pub struct LayerTiles {
    pub layer: Arc<LayerDefinition>,
    pub tiles: HttpTiles,
}

impl LayerTiles {
    /// Start a tile downloader for `layer`, caching on disk when `cache` is set.
    pub fn new(layer: Arc<LayerDefinition>, cache: bool, ctx: &egui::Context) -> Self {
        let http_options = HttpOptions {
            cache: cache.then(|| cache_dir(&layer.name)),
            ..Default::default()
        };

        let source = LayerTileSource::new(Arc::clone(&layer));
        log::debug!("Creating tile downloader for {} ({})", layer.name, layer.kind);

        Self {
            layer,
            tiles: HttpTiles::with_options(source, http_options, ctx.clone()),
        }
    }

    pub fn opacity(&self) -> f32 {
        self.layer.opacity.get()
    }
}

fn cache_dir(layer_name: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("drought-panels")
        .join("tiles")
        .join(layer_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_config::{build_layers, YearMonth};

    fn source(name: &str) -> LayerTileSource {
        let catalog = build_layers(YearMonth::new(2017, 12).unwrap()).unwrap();
        LayerTileSource::new(Arc::clone(catalog.get(name).unwrap()))
    }

    #[test]
    fn test_base_tile_url() {
        let url = source("base").tile_url(TileId { x: 13, y: 24, zoom: 6 });
        assert_eq!(url, "https://b.tile.openstreetmap.org/6/13/24.png");
    }

    #[test]
    fn test_arcgis_tile_url() {
        let url = source("snow-analysis").tile_url(TileId { x: 13, y: 24, zoom: 6 });
        assert!(url.starts_with(
            "https://idpgis.ncep.noaa.gov/arcgis/rest/services/NWS_Observations/NOHRSC_Snow_Analysis/MapServer/export?"
        ));
        assert!(url.contains("LAYERS=show%3A7"));
    }

    #[test]
    fn test_attribution_falls_back_to_empty() {
        assert_eq!(source("drought-monitor").attribution().text, "NDMC USDM");
        assert_eq!(source("climate-outlook").attribution().text, "");
    }

    #[test]
    fn test_cache_dir_per_layer() {
        assert!(cache_dir("spi-6").ends_with("drought-panels/tiles/spi-6"));
    }
}
