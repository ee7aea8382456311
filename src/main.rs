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

mod app;
mod config;
mod tiles;

use app::PanelsApp;
use clap::Parser;
use config::AppConfig;
use eframe::egui;
use log::{error, info, warn};
use panel_config::{DateFilter, LayoutPreset, ViewSharing};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Four-panel drought monitoring map viewer
#[derive(Parser, Debug)]
#[command(name = "drought-panels", version, about)]
struct Args {
    /// Built-in panel layout (indices, hydrology, outlook)
    #[arg(long)]
    layout: Option<LayoutPreset>,

    /// Month shown by the SPI and PDSI layers (YYYYMM or previous-month)
    #[arg(long = "year-month", value_name = "YYYYMM")]
    date_filter: Option<DateFilter>,

    /// Give every panel its own view instead of moving them together
    #[arg(long)]
    independent_views: bool,

    /// Initial zoom level
    #[arg(long)]
    zoom: Option<u8>,

    /// Show layer legends on every panel
    #[arg(long)]
    legend: bool,

    /// Print the assembled panels as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Print the configuration file location and exit
    #[arg(long)]
    config_path: bool,
}

impl Args {
    /// Command-line values take precedence over the config file.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(layout) = self.layout {
            config.layout = layout;
            config.custom_layout = None;
        }
        if let Some(filter) = self.date_filter {
            config.date_filter = filter;
        }
        if self.independent_views {
            config.view_sharing = ViewSharing::Independent;
        }
        if self.legend {
            config.show_legend = true;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
    }
}

fn load_config() -> AppConfig {
    match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let mut config = load_config();
    args.apply(&mut config);

    let panels = app::build_panels(&config)
        .inspect_err(|e| error!("Invalid map configuration: {}", e))?;

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&panels)?);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Drought Panels"),
        ..Default::default()
    };

    info!("Starting Drought Panels...");
    let cache_tiles = config.cache_tiles;
    eframe::run_native(
        "Drought Panels",
        options,
        Box::new(move |cc| {
            // Legend images are fetched by URI
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(PanelsApp::new(panels, cache_tiles, &cc.egui_ctx)))
        }),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "drought-panels",
            "--layout",
            "hydrology",
            "--year-month",
            "202301",
            "--independent-views",
            "--zoom",
            "5",
            "--legend",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.layout, LayoutPreset::Hydrology);
        assert_eq!(config.date_filter, "202301".parse::<DateFilter>().unwrap());
        assert_eq!(config.view_sharing, ViewSharing::Independent);
        assert_eq!(config.zoom, 5);
        assert!(config.show_legend);
    }

    #[test]
    fn test_args_reject_bad_month() {
        assert!(Args::try_parse_from(["drought-panels", "--year-month", "2023"]).is_err());
    }

    #[test]
    fn test_no_args_keeps_config() {
        let args = Args::parse_from(["drought-panels"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config, AppConfig::default());
    }
}
