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

//! Four-panel map window.
//!
//! Each panel is a `walkers` map with the base layer as its primary tiles and
//! the remaining layers stacked on top at their configured opacity. Panels
//! bound to the same view share one `MapMemory`, so dragging or zooming one
//! moves all of them.

use std::collections::BTreeSet;
use std::sync::Arc;

use eframe::egui;
use log::{debug, info, warn};
use panel_config::{
    assemble_panels, build_layers, build_view, fit_extent, ConfigError, Control, Extent,
    LayerDefinition, Legend, LonLat, Panel, TileAddress, ViewDefinition, ViewHandle, WebMercator,
};
use walkers::{lon_lat, Map, MapMemory};

use crate::config::AppConfig;
use crate::tiles::LayerTiles;

/// Spacing between neighbouring panels, in points.
const PANEL_GAP: f32 = 4.0;

/// Width of the legend box drawn in a panel's top-right corner.
const LEGEND_WIDTH: f32 = 180.0;

/// Build the panels described by `config`.
///
/// Every service URL is exercised once here so that a malformed endpoint
/// stops startup instead of producing blank tiles.
pub fn build_panels(config: &AppConfig) -> Result<Vec<Panel>, ConfigError> {
    let month = config.date_filter.resolve();
    info!("Climate index layers filtered to {month}");

    let catalog = build_layers(month)?;
    let view = build_view(config.center(), config.zoom)?;
    let panels = assemble_panels(&catalog, &config.layout_table(), &view, config.view_sharing)?;

    check_service_urls(&panels)?;
    Ok(panels)
}

/// Build a request for the root tile of every layer, surfacing bad URLs.
pub fn check_service_urls(panels: &[Panel]) -> Result<(), ConfigError> {
    let root = TileAddress::new(0, 0, 0);
    for layer in panels.iter().flat_map(|p| p.layers.iter()) {
        layer.tile_request(root)?;
    }
    Ok(())
}

/// Split `rect` into cells for `count` panels: one or two side by side, otherwise a 2x2 grid.
pub fn grid_cells(rect: egui::Rect, count: usize) -> Vec<egui::Rect> {
    let (cols, rows) = match count {
        0 => return Vec::new(),
        1 => (1, 1),
        2 => (2, 1),
        _ => (2, 2),
    };

    let cell = egui::vec2(rect.width() / cols as f32, rect.height() / rows as f32);
    (0..count.min(cols * rows))
        .map(|i| {
            let min = rect.min + egui::vec2((i % cols) as f32 * cell.x, (i / cols) as f32 * cell.y);
            egui::Rect::from_min_size(min, cell)
        })
        .collect()
}

/// Projected area shown by a map of `size` points centred on `center`.
fn visible_extent(center: LonLat, zoom: f64, size: egui::Vec2) -> Option<Extent> {
    let center = WebMercator::project(center).ok()?;
    let resolution = WebMercator::resolution(zoom);
    let half_width = f64::from(size.x) / 2.0 * resolution;
    let half_height = f64::from(size.y) / 2.0 * resolution;

    Some(Extent::new(
        center.x - half_width,
        center.y - half_height,
        center.x + half_width,
        center.y + half_height,
    ))
}

/// One view shared by every panel bound to it.
struct ViewSlot {
    handle: ViewHandle,
    memory: MapMemory,
}

impl ViewSlot {
    fn new(handle: ViewHandle) -> Self {
        let view = handle.get();
        let mut slot = Self {
            handle,
            memory: MapMemory::default(),
        };
        slot.show(view);
        slot
    }

    /// Move the map widget to `view`. The shared view follows on the next [`ViewSlot::sync`].
    fn show(&mut self, view: ViewDefinition) {
        if self.memory.set_zoom(f64::from(view.zoom)).is_err() {
            warn!("Zoom level {} not supported by the map widget", view.zoom);
        }
        let center = view.geographic_center();
        self.memory.center_at(lon_lat(center.lon, center.lat));
    }

    /// Current center as tracked by the map widget.
    fn center(&self) -> LonLat {
        self.memory
            .detached()
            .map_or_else(|| self.handle.get().geographic_center(), |p| LonLat::new(p.x(), p.y()))
    }

    /// Copy the widget's pan and zoom back into the shared view.
    fn sync(&self) {
        if let Err(e) = self.handle.pan_to(self.center()) {
            debug!("Ignoring out-of-range pan: {e}");
        }

        let zoom = self.memory.zoom().round().clamp(0.0, 20.0) as u8;
        if zoom != self.handle.get().zoom {
            if let Err(e) = self.handle.set_zoom(zoom) {
                debug!("Ignoring zoom change: {e}");
            }
        }
    }
}

struct PanelState {
    target: String,
    base: LayerTiles,
    overlays: Vec<LayerTiles>,
    view_slot: usize,
    controls: BTreeSet<Control>,
}

impl PanelState {
    fn title(&self) -> String {
        let overlays: Vec<&str> = self
            .overlays
            .iter()
            .filter(|o| o.layer.visible)
            .map(|o| o.layer.legend.as_ref().map_or(o.layer.name.as_str(), |l| l.title))
            .collect();
        format!("{} │ {}", self.target, overlays.join(" + "))
    }

    fn layers(&self) -> impl Iterator<Item = &Arc<LayerDefinition>> {
        std::iter::once(&self.base.layer).chain(self.overlays.iter().map(|o| &o.layer))
    }
}

/// The viewer application.
pub struct PanelsApp {
    panels: Vec<PanelState>,
    views: Vec<ViewSlot>,
}

impl PanelsApp {
    pub fn new(panels: Vec<Panel>, cache_tiles: bool, ctx: &egui::Context) -> Self {
        let mut views: Vec<ViewSlot> = Vec::new();
        let mut states = Vec::with_capacity(panels.len());

        for panel in panels {
            let Some((base, overlays)) = panel.layers.split_first() else {
                warn!("Panel {} has no layers, skipping", panel.target);
                continue;
            };

            let view_slot = match views.iter().position(|v| v.handle.is_linked_to(&panel.view)) {
                Some(index) => index,
                None => {
                    views.push(ViewSlot::new(panel.view.clone()));
                    views.len() - 1
                }
            };

            states.push(PanelState {
                target: panel.target.clone(),
                base: LayerTiles::new(Arc::clone(base), cache_tiles, ctx),
                overlays: overlays
                    .iter()
                    .map(|layer| LayerTiles::new(Arc::clone(layer), cache_tiles, ctx))
                    .collect(),
                view_slot,
                controls: panel.controls,
            });
        }

        info!("Showing {} panels over {} view(s)", states.len(), views.len());
        Self { panels: states, views }
    }
}

impl eframe::App for PanelsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let cells = grid_cells(ui.max_rect(), self.panels.len());
                for (panel, cell) in self.panels.iter_mut().zip(cells) {
                    let slot = &mut self.views[panel.view_slot];
                    show_panel(ui, panel, slot, cell.shrink(PANEL_GAP / 2.0));
                }
            });
    }
}

fn show_panel(ui: &mut egui::Ui, panel: &mut PanelState, slot: &mut ViewSlot, rect: egui::Rect) {
    let builder = egui::UiBuilder::new().max_rect(rect).id_salt(&panel.target);
    ui.scope_builder(builder, |ui| {
        let home = slot.handle.get().geographic_center();
        let visible = visible_extent(slot.center(), slot.memory.zoom(), rect.size());

        let mut map = Map::new(
            Some(&mut panel.base.tiles),
            &mut slot.memory,
            lon_lat(home.lon, home.lat),
        );
        for overlay in &mut panel.overlays {
            if !overlay.layer.visible {
                continue;
            }
            if visible.is_some_and(|area| !overlay.layer.intersects(&area)) {
                continue;
            }
            let opacity = overlay.opacity();
            map = map.with_layer(&mut overlay.tiles, opacity);
        }
        ui.add(map);

        ui.painter().text(
            rect.left_top() + egui::vec2(8.0, 8.0),
            egui::Align2::LEFT_TOP,
            panel.title(),
            egui::FontId::proportional(12.0),
            egui::Color32::BLACK,
        );

        if panel.controls.contains(&Control::Zoom) {
            zoom_control(ui, rect, &mut slot.memory);
        }
        if panel.controls.contains(&Control::Attribution) {
            attribution_control(ui, rect, panel);
        }
        if panel.controls.contains(&Control::Legend) {
            legend_control(ui, rect, panel, slot);
        }
    });

    slot.sync();
}

fn zoom_control(ui: &mut egui::Ui, rect: egui::Rect, memory: &mut MapMemory) {
    let size = egui::vec2(24.0, 24.0);
    let zoom_in = egui::Rect::from_min_size(rect.left_top() + egui::vec2(8.0, 28.0), size);
    let zoom_out = zoom_in.translate(egui::vec2(0.0, size.y + 4.0));

    if ui.put(zoom_in, egui::Button::new("+")).clicked() && memory.zoom_in().is_err() {
        debug!("Already at maximum zoom");
    }
    if ui.put(zoom_out, egui::Button::new("−")).clicked() && memory.zoom_out().is_err() {
        debug!("Already at minimum zoom");
    }
}

fn attribution_control(ui: &mut egui::Ui, rect: egui::Rect, panel: &PanelState) {
    let mut credits: Vec<(&str, Option<&str>)> = Vec::new();
    for layer in panel.layers().filter(|l| l.visible) {
        if let Some(text) = layer.attribution {
            if !credits.iter().any(|(t, _)| *t == text) {
                credits.push((text, layer.attribution_url));
            }
        }
    }

    let line_height = 16.0;
    let mut bottom = rect.bottom() - 6.0;
    for (text, url) in credits.into_iter().rev() {
        let line = egui::Rect::from_min_max(
            egui::pos2(rect.left() + 8.0, bottom - line_height),
            egui::pos2(rect.right() - 8.0, bottom),
        );
        let label = egui::RichText::new(text)
            .size(10.0)
            .color(egui::Color32::from_black_alpha(180));
        let response = ui.put(line, egui::Button::new(label).frame(false));

        if response.clicked() {
            if let Some(url) = url.filter(|u| !u.is_empty()) {
                if let Err(e) = webbrowser::open(url) {
                    warn!("Failed to open {url}: {e}");
                }
            }
        }
        bottom -= line_height;
    }
}

/// Legends of the visible layers. Clicking a title zooms to the area the legend describes.
fn legend_control(ui: &mut egui::Ui, rect: egui::Rect, panel: &PanelState, slot: &mut ViewSlot) {
    let legends: Vec<&Legend> = panel
        .layers()
        .filter(|l| l.visible)
        .filter_map(|l| l.legend.as_ref())
        .collect();
    if legends.is_empty() {
        return;
    }

    let area = egui::Rect::from_min_max(
        egui::pos2(rect.right() - LEGEND_WIDTH - 8.0, rect.top() + 8.0),
        egui::pos2(rect.right() - 8.0, rect.bottom() - 8.0),
    );

    let mut zoom_to = None;
    ui.scope_builder(egui::UiBuilder::new().max_rect(area), |ui| {
        egui::Frame::popup(ui.style()).show(ui, |ui| {
            for legend in &legends {
                let title = egui::RichText::new(legend.title).size(11.0).strong();
                let response = ui.add(egui::Button::new(title).frame(false));
                if response.clicked() {
                    zoom_to = legend.extent;
                }
                if let Some(url) = legend.image_url {
                    ui.add(egui::Image::new(url).max_width(LEGEND_WIDTH - 16.0));
                }
            }
        });
    });

    if let Some(extent) = zoom_to {
        let size = rect.size();
        let view = fit_extent(&extent, f64::from(size.x), f64::from(size.y));
        debug!("Zooming {} to legend extent at zoom {}", panel.target, view.zoom);
        slot.show(view);
    }
}
