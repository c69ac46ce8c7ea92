//! Installation context shared by every override unit.
//!
//! One context is built per installation from a validated Profile and the
//! caller's options and handed to every unit. Units copy what they need into
//! their closures instead of reaching for module-level state, so independent
//! installations (e.g. separate iframes) never share values.

use super::noise::NoiseInjector;
use crate::error::{PersonaError, Result};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};

/// Which units to install, plus the tunable geometry and noise constants.
/// All units are enabled by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverrideConfig {
    pub navigator: bool,
    pub screen: bool,
    pub webgl: bool,
    pub canvas: bool,
    #[serde(alias = "image_data")]
    pub image_data: bool,
    #[serde(alias = "webgl_read_pixels")]
    pub webgl_read_pixels: bool,
    pub plugins: bool,
    pub timezone: bool,
    pub permissions: bool,
    pub geolocation: bool,
    pub battery: bool,
    #[serde(alias = "chrome_runtime")]
    pub chrome_runtime: bool,
    #[serde(alias = "automation_markers")]
    pub automation_markers: bool,
    pub console: bool,

    /// Pixels reserved for the OS taskbar below the available screen area.
    #[serde(alias = "taskbar_allowance")]
    pub taskbar_allowance: u32,
    /// Pixels of browser UI (tabs, toolbar) above the viewport.
    #[serde(alias = "chrome_allowance")]
    pub chrome_allowance: u32,
    /// Every N-th pixel is eligible for noise.
    #[serde(alias = "noise_pixel_stride")]
    pub noise_pixel_stride: u32,
}

impl OverrideConfig {
    pub const DEFAULT_TASKBAR_ALLOWANCE: u32 = 40;
    pub const DEFAULT_CHROME_ALLOWANCE: u32 = 140;

    pub fn validate(&self) -> Result<()> {
        if self.noise_pixel_stride == 0 {
            return Err(PersonaError::InvalidConfig(
                "noisePixelStride must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            taskbar_allowance: self.taskbar_allowance,
            chrome_allowance: self.chrome_allowance,
        }
    }
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            navigator: true,
            screen: true,
            webgl: true,
            canvas: true,
            image_data: true,
            webgl_read_pixels: true,
            plugins: true,
            timezone: true,
            permissions: true,
            geolocation: true,
            battery: true,
            chrome_runtime: true,
            automation_markers: true,
            console: true,
            taskbar_allowance: Self::DEFAULT_TASKBAR_ALLOWANCE,
            chrome_allowance: Self::DEFAULT_CHROME_ALLOWANCE,
            noise_pixel_stride: NoiseInjector::DEFAULT_PIXEL_STRIDE as u32,
        }
    }
}

/// Fixed offsets between the configured screen size and the derived
/// window/available dimensions.
///
/// These are not part of the Profile. Values that disagree with the
/// persona's OS (e.g. a 40px taskbar on macOS) are themselves a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub taskbar_allowance: u32,
    pub chrome_allowance: u32,
}

/// Every width/height the screen and window units report, derived from one
/// screen size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMetrics {
    pub width: i64,
    pub height: i64,
    pub avail_width: i64,
    pub avail_height: i64,
    pub inner_width: i64,
    pub inner_height: i64,
    pub outer_width: i64,
    pub outer_height: i64,
    pub color_depth: i64,
    pub pixel_depth: i64,
    pub device_pixel_ratio: f64,
}

impl ScreenMetrics {
    /// Unclamped signed arithmetic: `availHeight == height - taskbar` holds for
    /// every screen size, including ones smaller than the allowance.
    pub fn derive(profile: &Profile, geometry: Geometry) -> Self {
        let width = i64::from(profile.screen_width);
        let height = i64::from(profile.screen_height);
        let avail_height = height - i64::from(geometry.taskbar_allowance);
        Self {
            width,
            height,
            avail_width: width,
            avail_height,
            inner_width: width,
            inner_height: height - i64::from(geometry.chrome_allowance),
            outer_width: width,
            outer_height: avail_height,
            color_depth: i64::from(profile.color_depth),
            pixel_depth: i64::from(profile.color_depth),
            device_pixel_ratio: profile.pixel_ratio,
        }
    }
}

/// Everything a unit needs, built once per installation.
#[derive(Debug)]
pub struct InstallContext {
    pub profile: Profile,
    pub config: OverrideConfig,
    pub metrics: ScreenMetrics,
    pub noise: NoiseInjector,
}

impl InstallContext {
    pub fn new(profile: Profile, config: OverrideConfig) -> Result<Self> {
        profile.validate()?;
        config.validate()?;
        let metrics = ScreenMetrics::derive(&profile, config.geometry());
        let noise = NoiseInjector::new(config.noise_pixel_stride as usize);
        Ok(Self {
            profile,
            config,
            metrics,
            noise,
        })
    }
}
