//! Navigator identity and hardware overrides.
//!
//! All getters are WASM closures → native toString() automatically.

use super::context::InstallContext;
use super::property::{self, PropertyOverride};
use super::proxy_helpers;
use wasm_bindgen::prelude::*;

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let navigator = match proxy_helpers::get_prop(global, "navigator") {
        Some(n) => n,
        None => return Ok(false),
    };
    apply_to_navigator(ctx, &navigator)?;
    Ok(true)
}

/// Apply navigator overrides to a specific navigator object.
pub fn apply_to_navigator(ctx: &InstallContext, navigator: &JsValue) -> Result<(), JsValue> {
    let profile = &ctx.profile;

    // One frozen array for the lifetime of the page, as the native getter
    // returns the same object until the language settings change.
    let languages = proxy_helpers::frozen_string_array(&profile.languages);

    property::install_all(
        navigator,
        vec![
            PropertyOverride::string("userAgent", &profile.user_agent),
            PropertyOverride::string("platform", &profile.platform),
            PropertyOverride::string("vendor", &profile.vendor),
            PropertyOverride::constant("languages", languages),
            PropertyOverride::string("language", profile.primary_language()),
            PropertyOverride::number("hardwareConcurrency", f64::from(profile.hardware_concurrency)),
            PropertyOverride::number("deviceMemory", profile.device_memory),
            PropertyOverride::number("maxTouchPoints", f64::from(profile.max_touch_points)),
            // Non-automated browsers report `undefined`; `false` is itself a tell.
            PropertyOverride::absent("webdriver"),
        ],
    )
}
