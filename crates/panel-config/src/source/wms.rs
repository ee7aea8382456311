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

//! WMS 1.3.0 `GetMap` requests.

use url::Url;

use super::{append_params, merge_params, parse_service_url, TILE_SIZE};
use crate::projection::TileAddress;
use crate::ConfigError;

/// Build a `GetMap` request for `tile`.
///
/// EPSG:3857 keeps x/y axis order under WMS 1.3.0, so the bbox is written
/// as `minx,miny,maxx,maxy` without swapping.
pub fn get_map_url(
    service_url: &str,
    params: &[(String, String)],
    tile: TileAddress,
) -> Result<Url, ConfigError> {
    let mut url = parse_service_url(service_url)?;

    let defaults = vec![
        ("SERVICE".to_string(), "WMS".to_string()),
        ("VERSION".to_string(), "1.3.0".to_string()),
        ("REQUEST".to_string(), "GetMap".to_string()),
        ("FORMAT".to_string(), "image/png".to_string()),
        ("TRANSPARENT".to_string(), "true".to_string()),
        ("STYLES".to_string(), String::new()),
        ("CRS".to_string(), "EPSG:3857".to_string()),
        ("WIDTH".to_string(), TILE_SIZE.to_string()),
        ("HEIGHT".to_string(), TILE_SIZE.to_string()),
        ("BBOX".to_string(), tile.bounds().to_bbox_param()),
    ];

    append_params(&mut url, &merge_params(defaults, params));
    Ok(url)
}
