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

//! Web Mercator projection utilities.
//!
//! Converts between geographic coordinates (EPSG:4326, degrees) and the
//! spherical Mercator plane (EPSG:3857, metres) used by every service in the
//! catalog, and computes the projected bounds of XYZ tiles.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Radius of the sphere used by EPSG:3857.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Half the side of the Mercator square (`π · R`).
pub const HALF_WORLD_METERS: f64 = std::f64::consts::PI * EARTH_RADIUS_METERS;

/// Deepest zoom level accepted for views and tiles.
pub const MAX_ZOOM: u8 = 20;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A coordinate in EPSG:3857 metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
}

impl Projected {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in EPSG:3857 metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// The whole Mercator square.
    #[must_use]
    pub const fn world() -> Self {
        Self::new(-HALF_WORLD_METERS, -HALF_WORLD_METERS, HALF_WORLD_METERS, HALF_WORLD_METERS)
    }

    /// Project a geographic bounding box (west, south, east, north).
    pub fn from_lon_lat(west: f64, south: f64, east: f64, north: f64) -> Result<Self, ConfigError> {
        let min = WebMercator::project(LonLat::new(west, south))?;
        let max = WebMercator::project(LonLat::new(east, north))?;
        Ok(Self::new(min.x, min.y, max.x, max.y))
    }

    #[must_use]
    pub fn contains(&self, point: Projected) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    /// Whether the two boxes overlap (touching edges do not count).
    #[must_use]
    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Comma-separated `minx,miny,maxx,maxy`, the form both ArcGIS and WMS expect.
    #[must_use]
    pub fn to_bbox_param(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Address of a tile in the XYZ pyramid (y grows southwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileAddress {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileAddress {
    #[must_use]
    pub const fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Projected bounds of this tile.
    #[must_use]
    pub fn bounds(&self) -> Extent {
        let size = 2.0 * HALF_WORLD_METERS / f64::from(1_u32 << self.zoom.min(31));
        let min_x = -HALF_WORLD_METERS + f64::from(self.x) * size;
        let max_y = HALF_WORLD_METERS - f64::from(self.y) * size;
        Extent::new(min_x, max_y - size, min_x + size, max_y)
    }
}

/// Spherical Mercator projection (EPSG:4326 <-> EPSG:3857).
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl WebMercator {
    /// Project a geographic coordinate into metres.
    ///
    /// Latitudes beyond the Mercator limit are clamped to the edge of the
    /// square rather than running off to infinity.
    pub fn project(coord: LonLat) -> Result<Projected, ConfigError> {
        if !coord.lon.is_finite()
            || !coord.lat.is_finite()
            || !(-180.0..=180.0).contains(&coord.lon)
            || !(-90.0..=90.0).contains(&coord.lat)
        {
            return Err(ConfigError::InvalidCoordinate { lon: coord.lon, lat: coord.lat });
        }

        let x = EARTH_RADIUS_METERS * coord.lon.to_radians();
        let lat_rad = coord.lat.to_radians();
        let y = EARTH_RADIUS_METERS * (std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan().ln();

        Ok(Projected::new(x, y.clamp(-HALF_WORLD_METERS, HALF_WORLD_METERS)))
    }

    /// Inverse of [`WebMercator::project`].
    #[must_use]
    pub fn unproject(point: Projected) -> LonLat {
        let lon = (point.x / EARTH_RADIUS_METERS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS_METERS).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        LonLat::new(lon, lat)
    }

    /// Ground resolution in metres per pixel at the equator for 256px tiles.
    #[must_use]
    pub fn resolution(zoom: f64) -> f64 {
        2.0 * HALF_WORLD_METERS / (256.0 * 2_f64.powf(zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_origin() {
        let p = WebMercator::project(LonLat::new(0.0, 0.0)).unwrap();
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_project_colorado() {
        let p = WebMercator::project(LonLat::new(-105.36, 39.11)).unwrap();
        assert!((p.x - (-11_728_621.55)).abs() < 1.0, "x = {}", p.x);
        assert!((p.y - 4_737_440.40).abs() < 1.0, "y = {}", p.y);
    }

    #[test]
    fn test_project_is_deterministic() {
        let coord = LonLat::new(-105.36, 39.11);
        let a = WebMercator::project(coord).unwrap();
        let b = WebMercator::project(coord).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unproject_round_trip() {
        let coord = LonLat::new(-98.6, 39.8);
        let back = WebMercator::unproject(WebMercator::project(coord).unwrap());
        assert!((back.lon - coord.lon).abs() < 1e-9);
        assert!((back.lat - coord.lat).abs() < 1e-9);
    }

    #[test]
    fn test_pole_is_clamped() {
        let p = WebMercator::project(LonLat::new(0.0, 90.0)).unwrap();
        assert!((p.y - HALF_WORLD_METERS).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            WebMercator::project(LonLat::new(200.0, 0.0)),
            Err(ConfigError::InvalidCoordinate { .. })
        ));
        assert!(WebMercator::project(LonLat::new(0.0, f64::NAN)).is_err());
    }

    #[test]
    fn test_root_tile_covers_world() {
        assert_eq!(TileAddress::new(0, 0, 0).bounds(), Extent::world());
    }

    #[test]
    fn test_tile_bounds_quadrant() {
        let b = TileAddress::new(1, 0, 1).bounds();
        assert!(b.min_x.abs() < 1e-6);
        assert!((b.max_x - HALF_WORLD_METERS).abs() < 1e-6);
        assert!(b.min_y.abs() < 1e-6);
        assert!((b.max_y - HALF_WORLD_METERS).abs() < 1e-6);
    }

    #[test]
    fn test_extent_intersects() {
        let conus = Extent::new(-13_884_991.0, 2_870_341.0, -7_455_066.0, 6_338_219.0);
        assert!(conus.intersects(&Extent::world()));
        assert!(!conus.intersects(&TileAddress::new(1, 0, 1).bounds()));
    }
}
