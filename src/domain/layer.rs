use {
    serde::{Deserialize, Serialize},
    strum_macros::{AsRefStr, Display, EnumIter, EnumString},
};

/// Raster (or derived) layers a city is described by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[strum(serialize = "ndvi")]
    #[serde(rename = "ndvi")]
    Vegetation,
    #[strum(serialize = "lst")]
    #[serde(rename = "lst")]
    Temperature,
    #[strum(serialize = "no2")]
    #[serde(rename = "no2")]
    Pollutant,
    #[strum(serialize = "pwv")]
    #[serde(rename = "pwv")]
    Moisture,
    Accessibility,
    Population,
    Vulnerability,
}

impl Layer {
    /// Layers read from rasters (everything except the derived accessibility layer).
    pub fn is_raster(&self) -> bool {
        !matches!(self, Layer::Accessibility)
    }
}
