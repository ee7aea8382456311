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

//! ArcGIS REST MapServer `export` requests.

use url::Url;

use super::{append_params, merge_params, parse_service_url, TILE_SIZE};
use crate::projection::TileAddress;
use crate::ConfigError;

/// Spatial reference of the Web Mercator plane, as ArcGIS names it.
const WEB_MERCATOR_WKID: &str = "3857";

/// Build an `export` request rendering `tile` from a MapServer.
///
/// Layer params (`LAYERS=show:14`, `layerDefs`, ...) are passed through
/// after the image defaults and may override them.
pub fn export_url(
    service_url: &str,
    params: &[(String, String)],
    tile: TileAddress,
) -> Result<Url, ConfigError> {
    let mut url = parse_service_url(service_url)?;

    url.path_segments_mut()
        .map_err(|()| ConfigError::InvalidUrl {
            url: service_url.to_string(),
            reason: "service url cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .push("export");

    let size = format!("{TILE_SIZE},{TILE_SIZE}");
    let defaults = vec![
        ("F".to_string(), "image".to_string()),
        ("FORMAT".to_string(), "PNG32".to_string()),
        ("TRANSPARENT".to_string(), "true".to_string()),
        ("BBOX".to_string(), tile.bounds().to_bbox_param()),
        ("BBOXSR".to_string(), WEB_MERCATOR_WKID.to_string()),
        ("IMAGESR".to_string(), WEB_MERCATOR_WKID.to_string()),
        ("SIZE".to_string(), size),
        ("DPI".to_string(), "96".to_string()),
    ];

    append_params(&mut url, &merge_params(defaults, params));
    Ok(url)
}
