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

//! The fixed layer catalog.
//!
//! Every layer the panels can show is defined here with its service URL,
//! request parameters, opacity and attribution. The NCEI climate index layers
//! are filtered to a single month, supplied as a [`YearMonth`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::layer::{LayerDefinition, Legend, Opacity};
use crate::projection::Extent;
use crate::ConfigError;

/// Symbolic layer names.
pub mod names {
    pub const BASE: &str = "base";
    pub const WATERCOLOR: &str = "watercolor";
    pub const COUNTY_BOUNDARIES: &str = "county-boundaries";
    pub const DROUGHT_MONITOR: &str = "drought-monitor";
    pub const SPI_6: &str = "spi-6";
    pub const PDSI: &str = "pdsi";
    pub const CLIMATE_OUTLOOK: &str = "climate-outlook";
    pub const STREAMFLOW: &str = "streamflow";
    pub const STREAM_ANOMALY: &str = "stream-anomaly";
    pub const SOIL_MOISTURE: &str = "soil-moisture";
    pub const SNOW_ANALYSIS: &str = "snow-analysis";
    pub const WATER_WATCH: &str = "water-watch";
    pub const PRECIP_7DAY: &str = "precip-7day";
    pub const VEGDRI: &str = "vegdri";
    pub const QUICKDRI: &str = "quickdri";
    pub const HUC_WATERSHEDS: &str = "huc-watersheds";
}

/// Contiguous United States in EPSG:3857, shared by every thematic layer.
pub const CONUS_EXTENT: Extent = Extent::new(-13_884_991.0, 2_870_341.0, -7_455_066.0, 6_338_219.0);

const OSM_URL: &str = "https://{a-c}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const WATERCOLOR_URL: &str = "http://tile.stamen.com/watercolor/{z}/{x}/{y}.jpg";
const TIGER_URL: &str = "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb/State_County/MapServer";
const USDM_URL: &str =
    "http://ndmc-001.unl.edu:8080/cgi-bin/mapserv.exe?map=/ms4w/apps/usdm/service/usdm_current_wms.map&";
const USDM_LEGEND_URL: &str = "http://ndmc-001.unl.edu:8080/cgi-bin/mapserv.exe?map=/ms4w/apps/usdm/service/usdm_current_wms.map&version=1.3.0&service=WMS&request=GetLegendGraphic&sld_version=1.1.0&layer=usdm_current&format=image/png&STYLE=default";
const NCEI_INDICES_URL: &str = "https://gis.ncdc.noaa.gov/arcgis/rest/services/cdo/indices/MapServer";
const CPC_OUTLOOK_URL: &str =
    "https://idpgis.ncep.noaa.gov/arcgis/rest/services/NWS_Climate_Outlooks/cpc_drought_outlk/MapServer";
const NWM_STREAM_URL: &str =
    "https://mapservice.nohrsc.noaa.gov/arcgis/rest/services/national_water_model/NWM_Stream_Analysis/MapServer";
const NWM_LAND_URL: &str =
    "https://mapservice.nohrsc.noaa.gov/arcgis/rest/services/national_water_model/NWM_Land_Analysis/MapServer";
const SNOW_URL: &str =
    "https://idpgis.ncep.noaa.gov/arcgis/rest/services/NWS_Observations/NOHRSC_Snow_Analysis/MapServer";
const WATER_WATCH_URL: &str = "https://edcintl.cr.usgs.gov/geoserver/qdriwaterwatchshapefile/wms?";
const WATER_WATCH_LEGEND_URL: &str = "https://edcintl.cr.usgs.gov/geoserver/qdriwaterwatchshapefile/ows?service=WMS&request=GetLegendGraphic&format=image%2Fpng&width=20&height=20&layer=water_watch_today";
const VEGDRI_URL: &str = "https://vegdri.cr.usgs.gov/wms.php?";
const PRECIP_7DAY_LEGEND_URL: &str = "https://vegdri.cr.usgs.gov/wms.php?service=WMS&request=GetLegendGraphic&format=image%2Fpng&width=20&height=20&LAYER=PRECIP_TP7";
const VEGDRI_LEGEND_URL: &str = "https://vegdri.cr.usgs.gov/wms.php?service=WMS&request=GetLegendGraphic&format=image%2Fpng&width=20&height=20&LAYER=DROUGHT_VDRI_EMODIS_1";
const QUICKDRI_LEGEND_URL: &str = "https://vegdri.cr.usgs.gov/wms.php?service=WMS&request=GetLegendGraphic&format=image%2Fpng&width=20&height=20&LAYER=DROUGHT_QDRI_EMODIS_1";
const WBD_URL: &str = "https://services.nationalmap.gov/arcgis/rest/services/wbd/MapServer";

/// A calendar month used to filter the climate index layers (`YEARMONTH=201712`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        if (1..=12).contains(&month) && (1000..=9999).contains(&year) {
            Ok(Self { year, month })
        } else {
            Err(ConfigError::InvalidYearMonth(format!("{year}-{month}")))
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before the one containing `date`.
    #[must_use]
    pub fn previous_month_of(date: NaiveDate) -> Self {
        if date.month() == 1 {
            Self { year: date.year() - 1, month: 12 }
        } else {
            Self { year: date.year(), month: date.month() - 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ConfigError;

    /// Accepts `YYYYMM` or `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidYearMonth(s.to_string());
        let trimmed = s.trim();
        let digits = match trimmed.split_once('-') {
            Some((year, month)) if year.len() == 4 => format!("{year}{month}"),
            Some(_) => return Err(invalid()),
            None => trimmed.to_string(),
        };

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year = digits[..4].parse().ok().ok_or_else(invalid)?;
        let month = digits[4..].parse().ok().ok_or_else(invalid)?;
        Self::new(year, month).ok().ok_or_else(invalid)
    }
}

/// Which month the climate index layers show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateFilter {
    /// A fixed month.
    Fixed(YearMonth),
    /// The most recent complete month, resolved when the catalog is built.
    PreviousMonth,
}

impl DateFilter {
    /// Resolve against a given date.
    #[must_use]
    pub fn resolve_at(self, today: NaiveDate) -> YearMonth {
        match self {
            Self::Fixed(ym) => ym,
            Self::PreviousMonth => YearMonth::previous_month_of(today),
        }
    }

    /// Resolve against the current UTC date.
    #[must_use]
    pub fn resolve(self) -> YearMonth {
        self.resolve_at(Utc::now().date_naive())
    }
}

impl Default for DateFilter {
    fn default() -> Self {
        Self::Fixed(YearMonth { year: 2017, month: 12 })
    }
}

impl FromStr for DateFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "previous-month" | "latest" => Ok(Self::PreviousMonth),
            other => other.parse().map(Self::Fixed),
        }
    }
}

impl TryFrom<String> for DateFilter {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateFilter> for String {
    fn from(filter: DateFilter) -> Self {
        match filter {
            DateFilter::Fixed(ym) => ym.to_string(),
            DateFilter::PreviousMonth => "previous-month".to_string(),
        }
    }
}

/// Named layer definitions, shared by reference between panels.
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    layers: BTreeMap<String, Arc<LayerDefinition>>,
}

impl LayerCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer under its own name, replacing any previous definition.
    pub fn insert(&mut self, layer: LayerDefinition) {
        self.layers.insert(layer.name.clone(), Arc::new(layer));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<LayerDefinition>> {
        self.layers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LayerDefinition>> {
        self.layers.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

fn index_filter(layer_id: u32, month: YearMonth) -> String {
    format!(r#"{{"{layer_id}":"YEARMONTH={month}"}}"#)
}

/// Geographic area described by the national drought legends.
fn conus_legend_extent() -> Result<Extent, ConfigError> {
    Extent::from_lon_lat(-126.0, 24.5, -66.2, 49.0)
}

/// Upper Colorado and Arkansas basins, the focus of the hydrology legends.
fn basin_legend_extent() -> Result<Extent, ConfigError> {
    Extent::from_lon_lat(-112.0, 36.3, -98.5, 41.66)
}

/// Build every layer the panels can reference.
pub fn build_layers(month: YearMonth) -> Result<LayerCatalog, ConfigError> {
    let mut catalog = LayerCatalog::new();
    let legend_extent = conus_legend_extent()?;
    let basin_extent = basin_legend_extent()?;

    catalog.insert(
        LayerDefinition::xyz(names::BASE, OSM_URL)
            .with_attribution("© OpenStreetMap contributors", Some("https://www.openstreetmap.org/copyright")),
    );
    catalog.insert(
        LayerDefinition::xyz(names::WATERCOLOR, WATERCOLOR_URL)
            .with_attribution("Map tiles by Stamen Design, under CC BY 3.0", Some("http://stamen.com")),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::COUNTY_BOUNDARIES, TIGER_URL)
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.7)?)
            .with_attribution("U.S. Census Bureau TIGERweb", None),
    );
    catalog.insert(
        LayerDefinition::wms(names::DROUGHT_MONITOR, USDM_URL)
            .with_param("LAYERS", "usdm_current")
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.5)?)
            .with_attribution("NDMC USDM", Some("https://droughtmonitor.unl.edu/"))
            .with_legend(Legend {
                title: "USDM",
                image_url: Some(USDM_LEGEND_URL),
                extent: Some(legend_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::SPI_6, NCEI_INDICES_URL)
            .with_param("LAYERS", "show:14")
            .with_param("layerDefs", index_filter(14, month))
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.6)?)
            .with_attribution("NCEI SPI", Some("https://www.ncei.noaa.gov/")),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::PDSI, NCEI_INDICES_URL)
            .with_param("LAYERS", "show:2")
            .with_param("layerDefs", index_filter(2, month))
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.6)?)
            .with_attribution("NCEI PDSI", Some("https://www.ncei.noaa.gov/")),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::CLIMATE_OUTLOOK, CPC_OUTLOOK_URL)
            .with_param("LAYERS", "show:0")
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.5)?),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::STREAMFLOW, NWM_STREAM_URL)
            .with_param("LAYERS", "show:1,2,3,4,5,12")
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::OPAQUE)
            .with_visible(false)
            .with_legend(Legend {
                title: "NWM Streamflow",
                image_url: None,
                extent: Some(basin_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::STREAM_ANOMALY, NWM_STREAM_URL)
            .with_param("LAYERS", "show:7,8,9,10,11,12")
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.5)?),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::SOIL_MOISTURE, NWM_LAND_URL)
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.5)?),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::SNOW_ANALYSIS, SNOW_URL)
            .with_param("LAYERS", "show:7")
            .with_extent(CONUS_EXTENT)
            .with_opacity(Opacity::new(0.5)?),
    );
    catalog.insert(
        LayerDefinition::wms(names::WATER_WATCH, WATER_WATCH_URL)
            .with_param("LAYERS", "water_watch_today")
            .with_opacity(Opacity::new(0.5)?)
            .with_attribution("USGS WaterWatch", Some("https://waterwatch.usgs.gov/"))
            .with_legend(Legend {
                title: "USGS Water Watch",
                image_url: Some(WATER_WATCH_LEGEND_URL),
                extent: Some(legend_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::wms(names::PRECIP_7DAY, VEGDRI_URL)
            .with_param("LAYERS", "PRECIP_TP7")
            .with_opacity(Opacity::new(0.5)?)
            .with_visible(false)
            .with_legend(Legend {
                title: "7-day Precip",
                image_url: Some(PRECIP_7DAY_LEGEND_URL),
                extent: Some(legend_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::wms(names::VEGDRI, VEGDRI_URL)
            .with_param("LAYERS", "DROUGHT_VDRI_EMODIS_1")
            .with_opacity(Opacity::new(0.5)?)
            .with_visible(false)
            .with_legend(Legend {
                title: "VegDRI",
                image_url: Some(VEGDRI_LEGEND_URL),
                extent: Some(legend_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::wms(names::QUICKDRI, VEGDRI_URL)
            .with_param("LAYERS", "DROUGHT_QDRI_EMODIS_1")
            .with_opacity(Opacity::new(0.5)?)
            .with_visible(false)
            .with_legend(Legend {
                title: "QuickDRI",
                image_url: Some(QUICKDRI_LEGEND_URL),
                extent: Some(legend_extent),
            }),
    );
    catalog.insert(
        LayerDefinition::arcgis(names::HUC_WATERSHEDS, WBD_URL)
            .with_opacity(Opacity::new(0.4)?)
            .with_legend(Legend {
                title: "HUC Watersheds",
                image_url: None,
                extent: Some(basin_extent),
            }),
    );

    debug!("Built layer catalog with {} layers for {}", catalog.len(), month);
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::SourceKind;

    fn catalog() -> LayerCatalog {
        build_layers(YearMonth::new(2017, 12).unwrap()).unwrap()
    }

    #[test]
    fn test_year_month_parse() {
        let ym: YearMonth = "201712".parse().unwrap();
        assert_eq!((ym.year(), ym.month()), (2017, 12));
        assert_eq!("2018-03".parse::<YearMonth>().unwrap().to_string(), "201803");
    }

    #[test]
    fn test_year_month_rejects_garbage() {
        assert!("2017".parse::<YearMonth>().is_err());
        assert!("201713".parse::<YearMonth>().is_err());
        assert!("2017ab".parse::<YearMonth>().is_err());
        assert!("20-17-12".parse::<YearMonth>().is_err());
        assert!("-201712".parse::<YearMonth>().is_err());
        assert!("2017-1-2".parse::<YearMonth>().is_err());
        assert!(matches!(
            "201700".parse::<YearMonth>(),
            Err(ConfigError::InvalidYearMonth(s)) if s == "201700"
        ));
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let jan = NaiveDate::from_ymd_opt(2018, 1, 15).unwrap();
        assert_eq!(YearMonth::previous_month_of(jan), YearMonth::new(2017, 12).unwrap());

        let jun = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(YearMonth::previous_month_of(jun), YearMonth::new(2024, 5).unwrap());
    }

    #[test]
    fn test_date_filter_strings() {
        assert_eq!("previous-month".parse::<DateFilter>().unwrap(), DateFilter::PreviousMonth);
        assert_eq!(
            "201712".parse::<DateFilter>().unwrap(),
            DateFilter::Fixed(YearMonth::new(2017, 12).unwrap())
        );
        assert_eq!(String::from(DateFilter::default()), "201712");

        let json = serde_json::to_string(&DateFilter::PreviousMonth).unwrap();
        assert_eq!(json, "\"previous-month\"");
        let back: DateFilter = serde_json::from_str("\"201805\"").unwrap();
        assert_eq!(back, DateFilter::Fixed(YearMonth::new(2018, 5).unwrap()));
        assert!(serde_json::from_str::<DateFilter>("\"soon\"").is_err());
    }

    #[test]
    fn test_catalog_has_named_layers() {
        let catalog = catalog();
        for name in [
            names::BASE,
            names::COUNTY_BOUNDARIES,
            names::DROUGHT_MONITOR,
            names::SPI_6,
            names::PDSI,
            names::CLIMATE_OUTLOOK,
            names::STREAM_ANOMALY,
            names::SOIL_MOISTURE,
            names::SNOW_ANALYSIS,
        ] {
            assert!(catalog.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_opacities_in_unit_range() {
        for layer in catalog().iter() {
            let opacity = layer.opacity.get();
            assert!((0.0..=1.0).contains(&opacity), "{} has opacity {opacity}", layer.name);
        }
    }

    #[test]
    fn test_index_layers_use_month_filter() {
        let catalog = build_layers(YearMonth::new(2020, 7).unwrap()).unwrap();
        let spi = catalog.get(names::SPI_6).unwrap();
        assert_eq!(spi.param("LAYERS"), Some("show:14"));
        assert_eq!(spi.param("layerDefs"), Some(r#"{"14":"YEARMONTH=202007"}"#));

        let pdsi = catalog.get(names::PDSI).unwrap();
        assert_eq!(pdsi.param("layerDefs"), Some(r#"{"2":"YEARMONTH=202007"}"#));
    }

    #[test]
    fn test_drought_monitor_is_wms() {
        let catalog = catalog();
        let usdm = catalog.get(names::DROUGHT_MONITOR).unwrap();
        assert_eq!(usdm.kind, SourceKind::Wms);
        assert_eq!(usdm.param("LAYERS"), Some("usdm_current"));
        assert_eq!(usdm.attribution, Some("NDMC USDM"));
        assert_eq!(usdm.extent, Some(CONUS_EXTENT));
    }

    #[test]
    fn test_streamflow_layer() {
        let catalog = catalog();
        let streamflow = catalog.get(names::STREAMFLOW).unwrap();
        assert_eq!(streamflow.kind, SourceKind::ArcGisRest);
        assert_eq!(streamflow.param("LAYERS"), Some("show:1,2,3,4,5,12"));
        assert_eq!(streamflow.opacity, Opacity::OPAQUE);
        assert!(!streamflow.visible);
        assert_eq!(streamflow.legend.as_ref().map(|l| l.title), Some("NWM Streamflow"));

        let anomaly = catalog.get(names::STREAM_ANOMALY).unwrap();
        assert_eq!(streamflow.service_url, anomaly.service_url);
    }

    #[test]
    fn test_hidden_vegetation_layers() {
        let catalog = catalog();
        assert!(!catalog.get(names::VEGDRI).unwrap().visible);
        assert!(!catalog.get(names::QUICKDRI).unwrap().visible);
        assert!(catalog.get(names::SNOW_ANALYSIS).unwrap().visible);
    }
}
