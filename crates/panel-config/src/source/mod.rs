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

//! Request URL construction for each service family.
//!
//! Every layer is drawn from 256px tiles in EPSG:3857. XYZ services are
//! addressed directly; ArcGIS REST and WMS services are asked to render the
//! tile's bounding box.

mod arcgis;
mod wms;
mod xyz;

pub use arcgis::export_url;
pub use wms::get_map_url;
pub use xyz::expand_template;

use url::Url;

use crate::layer::{LayerDefinition, SourceKind};
use crate::projection::TileAddress;
use crate::ConfigError;

/// Edge length of every requested tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// Build the request URL for `tile` of `layer`.
pub fn request_url(layer: &LayerDefinition, tile: TileAddress) -> Result<String, ConfigError> {
    match layer.kind {
        SourceKind::Xyz => Ok(expand_template(&layer.service_url, tile)),
        SourceKind::ArcGisRest => {
            export_url(&layer.service_url, &layer.params, tile).map(String::from)
        }
        SourceKind::Wms => get_map_url(&layer.service_url, &layer.params, tile).map(String::from),
    }
}

/// Parse a service URL, dropping any dangling `&` left on its query string.
fn parse_service_url(service_url: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(service_url).map_err(|e| ConfigError::InvalidUrl {
        url: service_url.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(query) = url.query() {
        let trimmed = query.trim_matches('&').to_string();
        if trimmed.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&trimmed));
        }
    }

    Ok(url)
}

/// Overlay layer params on protocol defaults. Keys match case-insensitively
/// and a layer param replaces the default in place.
fn merge_params(defaults: Vec<(String, String)>, overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged = defaults;
    for (key, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(existing) => existing.1.clone_from(value),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

fn append_params(url: &mut Url, params: &[(String, String)]) {
    let mut pairs = url.query_pairs_mut();
    for (key, value) in params {
        pairs.append_pair(key, value);
    }
}
