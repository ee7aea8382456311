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

//! XYZ URL templates.

use crate::projection::TileAddress;

/// Substitute `{z}`, `{x}`, `{y}` and a subdomain range such as `{a-c}`.
///
/// The subdomain is picked from the tile coordinates so requests spread
/// across hosts while any given tile always maps to the same one.
#[must_use]
pub fn expand_template(template: &str, tile: TileAddress) -> String {
    let mut url = template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string());

    if let Some((placeholder, subdomain)) = subdomain_placeholder(&url, tile) {
        url = url.replace(&placeholder, &subdomain.to_string());
    }

    url
}

fn subdomain_placeholder(url: &str, tile: TileAddress) -> Option<(String, char)> {
    let mut rest = url;
    let mut offset = 0;
    while let Some(start) = rest.find('{') {
        let end = start + rest[start..].find('}')?;
        if let Some(subdomain) = pick_subdomain(&rest[start + 1..end], tile) {
            return Some((url[offset + start..=offset + end].to_string(), subdomain));
        }
        offset += end + 1;
        rest = &rest[end + 1..];
    }
    None
}

/// Pick one character from a range such as `a-c`.
fn pick_subdomain(range: &str, tile: TileAddress) -> Option<char> {
    let mut chars = range.chars();
    let (first, dash, last) = (chars.next()?, chars.next()?, chars.next()?);
    if dash != '-' || chars.next().is_some() || last < first {
        return None;
    }

    let span = u32::from(last) - u32::from(first) + 1;
    let index = (tile.x + tile.y) % span;
    char::from_u32(u32::from(first) + index)
}
