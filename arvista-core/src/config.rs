//! Experience configuration

use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

/// One authored point of interest as written in the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoiEntry {
    pub id: u32,
    pub name: String,
    /// Name of the asset node the POI sits on
    pub anchor: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Tunables for placement, POI layout, transitions and picking
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// World size in metres of the placed asset's longest edge
    pub ar_target_size: f32,
    /// Radius of the circle used for POIs whose anchor node is missing
    pub fallback_radius: f32,
    /// Height of that circle
    pub fallback_height: f32,
    pub transition_duration_ms: u64,
    /// Amplitude of the cosmetic hop during transitions
    pub hop_height: f32,
    /// Max distance between a picked offset and a POI offset
    pub pick_tolerance: f32,
    /// Preview camera distance in bounding-box lengths
    pub preview_distance: f32,
    #[serde(rename = "poi")]
    pub pois: Vec<PoiEntry>,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            ar_target_size: 0.3,
            fallback_radius: 0.35,
            fallback_height: 0.0,
            transition_duration_ms: 800,
            hop_height: 0.08,
            pick_tolerance: 0.05,
            preview_distance: 2.5,
            pois: Vec::new(),
        }
    }
}

impl ExperienceConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(?path, pois = config.pois.len(), "loaded experience config");
        Ok(config)
    }

    /// Reject values that would make placement or transitions meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidData(format!("{name} must be positive, got {value}")))
            }
        };
        positive("ar_target_size", self.ar_target_size)?;
        positive("fallback_radius", self.fallback_radius)?;
        positive("preview_distance", self.preview_distance)?;
        if !self.fallback_height.is_finite() || !self.hop_height.is_finite() || !self.pick_tolerance.is_finite() {
            return Err(Error::InvalidData("layout values must be finite".to_string()));
        }
        if self.pick_tolerance < 0.0 {
            return Err(Error::InvalidData(format!(
                "pick_tolerance must not be negative, got {}",
                self.pick_tolerance
            )));
        }
        if self.transition_duration_ms == 0 {
            return Err(Error::InvalidData(
                "transition_duration_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
