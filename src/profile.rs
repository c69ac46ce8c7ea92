//! The synthetic identity record consumed by the override engine.
//!
//! A Profile is produced by an external generator, delivered already rendered,
//! and never mutated after decoding. Field names follow the camelCase names of
//! the browser properties they feed.

use crate::error::{PersonaError, Result};
use crate::overrides::plugins::{plugin_filename, FILENAME_SUFFIX};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use wasm_bindgen::JsValue;

/// A fully rendered persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_agent: String,
    pub platform: String,
    pub vendor: String,
    /// First entry is the primary `navigator.language`.
    pub languages: Vec<String>,
    pub hardware_concurrency: u32,
    /// GiB, as reported by `navigator.deviceMemory`.
    pub device_memory: f64,
    pub max_touch_points: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    pub pixel_ratio: f64,
    /// IANA zone name.
    pub timezone: String,
    /// Minutes, in `Date.prototype.getTimezoneOffset` convention. Trusted as-is.
    pub timezone_offset: i32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Configured geolocation, present only when both coordinates are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Profile {
    /// Decode from a JS value: either a plain object or a JSON string.
    pub fn from_js(value: &JsValue) -> Result<Self> {
        if let Some(json) = value.as_string() {
            return Self::from_json(&json);
        }
        if value.is_undefined() || value.is_null() {
            return Err(PersonaError::MalformedInput("no profile supplied".into()));
        }
        let profile: Profile = serde_wasm_bindgen::from_value(value.clone())
            .map_err(|e| PersonaError::MalformedInput(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Decode and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Profile =
            serde_json::from_str(json).map_err(|e| PersonaError::MalformedInput(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject any record that would produce a half-applied or self-contradicting
    /// override set.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.string_fields() {
            if is_unresolved_placeholder(value) {
                return Err(PersonaError::UnresolvedPlaceholder { field });
            }
        }

        if self.languages.is_empty() {
            return Err(PersonaError::invalid("languages", "at least one locale is required"));
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(PersonaError::invalid("languages", "locale tags must not be empty"));
        }
        if self.hardware_concurrency == 0 {
            return Err(PersonaError::invalid("hardwareConcurrency", "must be positive"));
        }
        if !(self.device_memory.is_finite() && self.device_memory > 0.0) {
            return Err(PersonaError::invalid("deviceMemory", "must be a positive number"));
        }
        if self.screen_width == 0 {
            return Err(PersonaError::invalid("screenWidth", "must be positive"));
        }
        if self.screen_height == 0 {
            return Err(PersonaError::invalid("screenHeight", "must be positive"));
        }
        if self.color_depth == 0 {
            return Err(PersonaError::invalid("colorDepth", "must be positive"));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(PersonaError::invalid("pixelRatio", "must be a positive number"));
        }
        if self.timezone.trim().is_empty() {
            return Err(PersonaError::invalid("timezone", "zone name is required"));
        }

        let mut seen = HashSet::new();
        let mut filenames = HashSet::new();
        for name in &self.plugins {
            if !seen.insert(name.as_str()) {
                return Err(PersonaError::invalid(
                    "plugins",
                    format!("duplicate plugin name {:?}", name),
                ));
            }
            let filename = plugin_filename(name);
            if filename.len() == FILENAME_SUFFIX.len() {
                return Err(PersonaError::invalid(
                    "plugins",
                    format!("plugin name {:?} has no letters or digits", name),
                ));
            }
            if !filenames.insert(filename) {
                return Err(PersonaError::invalid(
                    "plugins",
                    format!("plugin name {:?} repeats an earlier plugin's filename", name),
                ));
            }
        }

        match (self.latitude, self.longitude) {
            (None, None) => {}
            (Some(lat), Some(lon)) => {
                if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
                    return Err(PersonaError::invalid("latitude", "must be within -90..=90"));
                }
                if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
                    return Err(PersonaError::invalid("longitude", "must be within -180..=180"));
                }
            }
            (Some(_), None) => {
                return Err(PersonaError::invalid("longitude", "latitude given without longitude"))
            }
            (None, Some(_)) => {
                return Err(PersonaError::invalid("latitude", "longitude given without latitude"))
            }
        }

        Ok(())
    }

    /// The singular `navigator.language`.
    pub fn primary_language(&self) -> &str {
        self.languages.first().map(String::as_str).unwrap_or_default()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    fn string_fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("userAgent", self.user_agent.as_str()),
            ("platform", self.platform.as_str()),
            ("vendor", self.vendor.as_str()),
            ("timezone", self.timezone.as_str()),
            ("webglVendor", self.webgl_vendor.as_str()),
            ("webglRenderer", self.webgl_renderer.as_str()),
        ]
        .into_iter()
        .chain(self.languages.iter().map(|l| ("languages", l.as_str())))
        .chain(self.plugins.iter().map(|p| ("plugins", p.as_str())))
    }
}

/// A `{{NAME}}` marker left behind by an unrendered template.
fn is_unresolved_placeholder(value: &str) -> bool {
    match value.find("{{") {
        Some(start) => value[start + 2..].contains("}}"),
        None => false,
    }
}
