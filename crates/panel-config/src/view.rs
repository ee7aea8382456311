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

//! Map views: the camera state (center and zoom) of a panel.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Serialize, Serializer};

use crate::projection::{Extent, LonLat, Projected, WebMercator, MAX_ZOOM};
use crate::ConfigError;

/// Center (EPSG:3857) and integer zoom of a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewDefinition {
    pub center: Projected,
    pub zoom: u8,
}

impl ViewDefinition {
    /// The view center in degrees.
    #[must_use]
    pub fn geographic_center(&self) -> LonLat {
        WebMercator::unproject(self.center)
    }
}

/// Project `center` and validate `zoom` into a view.
pub fn build_view(center: LonLat, zoom: u8) -> Result<ViewDefinition, ConfigError> {
    if zoom > MAX_ZOOM {
        return Err(ConfigError::InvalidZoom(zoom));
    }

    Ok(ViewDefinition {
        center: WebMercator::project(center)?,
        zoom,
    })
}

/// The deepest view that shows all of `extent` in a map of `width` x `height` pixels.
#[must_use]
pub fn fit_extent(extent: &Extent, width: f64, height: f64) -> ViewDefinition {
    let center = Projected::new(
        (extent.min_x + extent.max_x) / 2.0,
        (extent.min_y + extent.max_y) / 2.0,
    );

    let needed = ((extent.max_x - extent.min_x) / width).max((extent.max_y - extent.min_y) / height);
    let zoom = if needed.is_finite() && needed > 0.0 {
        (WebMercator::resolution(0.0) / needed)
            .log2()
            .floor()
            .clamp(0.0, f64::from(MAX_ZOOM)) as u8
    } else {
        MAX_ZOOM
    };

    ViewDefinition { center, zoom }
}

/// A view that can be bound to several panels.
///
/// Clones share the same underlying state: a pan or zoom applied through any
/// clone is seen by all of them.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    inner: Arc<RwLock<ViewDefinition>>,
}

impl ViewHandle {
    #[must_use]
    pub fn new(view: ViewDefinition) -> Self {
        Self {
            inner: Arc::new(RwLock::new(view)),
        }
    }

    /// Snapshot of the current view.
    #[must_use]
    pub fn get(&self) -> ViewDefinition {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_center(&self, center: Projected) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).center = center;
    }

    /// Re-center on a geographic coordinate.
    pub fn pan_to(&self, center: LonLat) -> Result<(), ConfigError> {
        self.set_center(WebMercator::project(center)?);
        Ok(())
    }

    pub fn set_zoom(&self, zoom: u8) -> Result<(), ConfigError> {
        if zoom > MAX_ZOOM {
            return Err(ConfigError::InvalidZoom(zoom));
        }
        self.inner.write().unwrap_or_else(PoisonError::into_inner).zoom = zoom;
        Ok(())
    }

    /// Whether both handles are bound to the same view.
    #[must_use]
    pub fn is_linked_to(&self, other: &ViewHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Serialize for ViewHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}
