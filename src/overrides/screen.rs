//! Screen and window dimension overrides.
//!
//! Every reported dimension comes from `ScreenMetrics`, so the
//! screen/avail/inner/outer family can never disagree with itself.

use super::context::{InstallContext, ScreenMetrics};
use super::property::{self, PropertyOverride};
use super::proxy_helpers;
use wasm_bindgen::prelude::*;

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    if let Some(screen) = proxy_helpers::get_prop(global, "screen") {
        apply_to_screen(&ctx.metrics, &screen)?;
    }
    apply_to_window(&ctx.metrics, global)?;
    Ok(true)
}

/// Apply screen overrides to a specific screen object.
pub fn apply_to_screen(metrics: &ScreenMetrics, screen: &JsValue) -> Result<(), JsValue> {
    property::install_all(
        screen,
        vec![
            PropertyOverride::number("width", metrics.width as f64),
            PropertyOverride::number("height", metrics.height as f64),
            PropertyOverride::number("availWidth", metrics.avail_width as f64),
            PropertyOverride::number("availHeight", metrics.avail_height as f64),
            PropertyOverride::number("availLeft", 0.0),
            PropertyOverride::number("availTop", 0.0),
            PropertyOverride::number("colorDepth", metrics.color_depth as f64),
            PropertyOverride::number("pixelDepth", metrics.pixel_depth as f64),
        ],
    )
}

/// Apply window dimension overrides.
pub fn apply_to_window(metrics: &ScreenMetrics, window: &JsValue) -> Result<(), JsValue> {
    property::install_all(
        window,
        vec![
            PropertyOverride::number("devicePixelRatio", metrics.device_pixel_ratio),
            PropertyOverride::number("innerWidth", metrics.inner_width as f64),
            PropertyOverride::number("innerHeight", metrics.inner_height as f64),
            PropertyOverride::number("outerWidth", metrics.outer_width as f64),
            PropertyOverride::number("outerHeight", metrics.outer_height as f64),
        ],
    )
}
