//! The override engine.
//!
//! Every surface the Profile describes is patched by one unit. The registry
//! validates the Profile and options first, then installs each enabled unit
//! against a global object in a single pass. A unit whose host API is missing
//! reports itself skipped; any other failure aborts the install.
//!
//! All installed getters and traps are WASM closures, so
//! `Function.prototype.toString()` reports `[native code]` for them without any
//! toString spoofing.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { install_profile } from './pkg/persona_wasm.js';
//! await init();
//! install_profile(profile);                       // every unit
//! install_profile(profile, { battery: false });   // selective
//! ```
//!
//! Patches land on shared prototypes (`Navigator.prototype`,
//! `WebGLRenderingContext.prototype`, ...), so one page lifetime carries one
//! profile. Installing again re-wraps every surface with the new values.

use crate::error::{ErrorInfo, PersonaError, Result};
use crate::profile::Profile;
use js_sys::{Array, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod automation;
pub mod battery;
pub mod canvas;
pub mod context;
pub mod geolocation;
pub mod intercept;
pub mod navigator;
pub mod noise;
pub mod permissions;
pub mod plugins;
pub mod property;
pub mod proxy_helpers;
pub mod screen;
pub mod timezone;
pub mod webgl;

use context::{InstallContext, OverrideConfig};

type ApplyFn = fn(&InstallContext, &JsValue) -> std::result::Result<bool, JsValue>;

/// One independently toggleable group of overrides.
pub struct OverrideUnit {
    pub name: &'static str,
    enabled: fn(&OverrideConfig) -> bool,
    apply: ApplyFn,
}

/// Install order. `console` goes last so nothing after it loses debug output.
pub const UNITS: &[OverrideUnit] = &[
    OverrideUnit { name: "navigator", enabled: |c| c.navigator, apply: navigator::apply },
    OverrideUnit { name: "screen", enabled: |c| c.screen, apply: screen::apply },
    OverrideUnit { name: "webgl", enabled: |c| c.webgl, apply: webgl::apply },
    OverrideUnit { name: "canvas", enabled: |c| c.canvas, apply: canvas::apply },
    // After `canvas`, which keeps the unwrapped `getImageData` for its own reads.
    OverrideUnit { name: "imageData", enabled: |c| c.image_data, apply: canvas::apply_image_data },
    OverrideUnit {
        name: "webglReadPixels",
        enabled: |c| c.webgl_read_pixels,
        apply: canvas::apply_read_pixels,
    },
    OverrideUnit { name: "plugins", enabled: |c| c.plugins, apply: plugins::apply },
    OverrideUnit { name: "timezone", enabled: |c| c.timezone, apply: timezone::apply },
    OverrideUnit { name: "permissions", enabled: |c| c.permissions, apply: permissions::apply },
    OverrideUnit { name: "geolocation", enabled: |c| c.geolocation, apply: geolocation::apply },
    OverrideUnit { name: "battery", enabled: |c| c.battery, apply: battery::apply },
    OverrideUnit {
        name: "chromeRuntime",
        enabled: |c| c.chrome_runtime,
        apply: automation::apply_chrome_runtime,
    },
    OverrideUnit {
        name: "automationMarkers",
        enabled: |c| c.automation_markers,
        apply: automation::apply_markers,
    },
    OverrideUnit { name: "console", enabled: |c| c.console, apply: automation::apply_console },
];

/// What one installation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Units that patched at least one surface.
    pub applied: Vec<&'static str>,
    /// Enabled units whose host API is absent (or, for geolocation, whose
    /// coordinates are not configured).
    pub skipped: Vec<&'static str>,
}

/// Installs a validated Profile into one global object.
pub struct OverrideRegistry {
    ctx: InstallContext,
}

impl OverrideRegistry {
    /// Fails fast on a bad Profile or options; nothing is patched yet.
    pub fn new(profile: Profile, config: OverrideConfig) -> Result<Self> {
        Ok(Self {
            ctx: InstallContext::new(profile, config)?,
        })
    }

    pub fn context(&self) -> &InstallContext {
        &self.ctx
    }

    /// Run every enabled unit against `global` (a window or a same-origin
    /// iframe's `contentWindow`).
    pub fn install(&self, global: &JsValue) -> Result<InstallReport> {
        let mut report = InstallReport::default();
        for unit in UNITS {
            if !(unit.enabled)(&self.ctx.config) {
                continue;
            }
            let installed =
                (unit.apply)(&self.ctx, global).map_err(|e| PersonaError::install(unit.name, e))?;
            if installed {
                report.applied.push(unit.name);
            } else {
                log::debug!("{} overrides skipped: host API absent", unit.name);
                report.skipped.push(unit.name);
            }
        }
        log::info!("persona installed: {} override units applied", report.applied.len());
        Ok(report)
    }
}

fn decode_options(options: &JsValue) -> Result<OverrideConfig> {
    if options.is_undefined() || options.is_null() {
        return Ok(OverrideConfig::default());
    }
    serde_wasm_bindgen::from_value(options.clone()).map_err(|e| PersonaError::InvalidConfig(e.to_string()))
}

/// Install a Profile into the current global.
///
/// `profile` is a plain object or a JSON string. `options` is an optional
/// `OverrideConfig` object:
/// ```javascript
/// install_profile(profile, { canvas: false, taskbarAllowance: 48 });
/// ```
///
/// Returns `{ applied: string[], skipped: string[], count: number, profile: object }`.
/// Throws, with nothing patched, when the Profile or options are malformed.
#[wasm_bindgen]
pub fn install_profile(profile: JsValue, options: JsValue) -> std::result::Result<JsValue, JsValue> {
    let profile = Profile::from_js(&profile)?;
    let config = decode_options(&options)?;
    let registry = OverrideRegistry::new(profile, config)?;
    let report = registry.install(&js_sys::global())?;

    let result = js_sys::Object::new();
    Reflect::set(&result, &"applied".into(), &string_array(&report.applied))?;
    Reflect::set(&result, &"skipped".into(), &string_array(&report.skipped))?;
    Reflect::set(&result, &"count".into(), &JsValue::from_f64(report.applied.len() as f64))?;
    let profile_js = serde_wasm_bindgen::to_value(&registry.context().profile)
        .map_err(|e| PersonaError::Js(e.to_string()))?;
    Reflect::set(&result, &"profile".into(), &profile_js)?;
    Ok(result.into())
}

/// Dry-run validation: `null` when the Profile would install, an `ErrorInfo`
/// object otherwise.
#[wasm_bindgen]
pub fn validate_profile(profile: JsValue) -> JsValue {
    match Profile::from_js(&profile) {
        Ok(_) => JsValue::NULL,
        Err(e) => serde_wasm_bindgen::to_value(&ErrorInfo::from(&e)).unwrap_or(JsValue::NULL),
    }
}

/// Per-surface agreement between the live page and a Profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideStatus {
    pub navigator: bool,
    pub screen: bool,
    pub webdriver: bool,
    pub timezone: bool,
    pub intl: bool,
    pub plugins: bool,
    /// `None` when the page cannot create a WebGL context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webgl: Option<bool>,
    /// Installed getters still print as native code.
    pub native_to_string: bool,
}

/// Verify the installed surfaces against `profile`.
#[wasm_bindgen]
pub fn check_override_status(profile: JsValue) -> std::result::Result<JsValue, JsValue> {
    let profile = Profile::from_js(&profile)?;
    let status = collect_status(&js_sys::global(), &profile);
    serde_wasm_bindgen::to_value(&status).map_err(|e| PersonaError::Js(e.to_string()).into())
}

pub fn collect_status(global: &JsValue, profile: &Profile) -> OverrideStatus {
    let navigator = proxy_helpers::get_prop(global, "navigator").unwrap_or(JsValue::UNDEFINED);
    let read = |obj: &JsValue, name: &str| Reflect::get(obj, &name.into()).unwrap_or(JsValue::UNDEFINED);

    let navigator_ok = read(&navigator, "userAgent").as_string().as_deref() == Some(profile.user_agent.as_str())
        && read(&navigator, "platform").as_string().as_deref() == Some(profile.platform.as_str())
        && read(&navigator, "language").as_string().as_deref() == Some(profile.primary_language())
        && read(&navigator, "hardwareConcurrency").as_f64() == Some(f64::from(profile.hardware_concurrency));

    let screen = proxy_helpers::get_prop(global, "screen").unwrap_or(JsValue::UNDEFINED);
    let screen_ok = read(&screen, "width").as_f64() == Some(f64::from(profile.screen_width))
        && read(&screen, "height").as_f64() == Some(f64::from(profile.screen_height));

    let plugins = read(&navigator, "plugins");
    let plugins_ok = read(&plugins, "length").as_f64() == Some(profile.plugins.len() as f64);

    OverrideStatus {
        navigator: navigator_ok,
        screen: screen_ok,
        webdriver: read(&navigator, "webdriver").is_undefined(),
        timezone: current_offset(global) == Some(f64::from(profile.timezone_offset)),
        intl: resolved_zone(global).as_deref() == Some(profile.timezone.as_str()),
        plugins: plugins_ok,
        webgl: reported_gpu_vendor(global).map(|v| v == profile.webgl_vendor),
        native_to_string: getter_prints_native(&navigator, "platform"),
    }
}

/// `new Date().getTimezoneOffset()`
fn current_offset(global: &JsValue) -> Option<f64> {
    let date_ctor = proxy_helpers::get_prop(global, "Date")?;
    let date = proxy_helpers::construct_with(&date_ctor, &Array::new(), &JsValue::UNDEFINED).ok()?;
    let method = proxy_helpers::get_prop(&date, "getTimezoneOffset")?;
    proxy_helpers::call_function(&method, &date, &Array::new()).ok()?.as_f64()
}

/// `new Intl.DateTimeFormat().resolvedOptions().timeZone`
fn resolved_zone(global: &JsValue) -> Option<String> {
    let dtf = proxy_helpers::get_prop(global, "Intl").and_then(|i| proxy_helpers::get_prop(&i, "DateTimeFormat"))?;
    let formatter = proxy_helpers::construct_with(&dtf, &Array::new(), &JsValue::UNDEFINED).ok()?;
    let method = proxy_helpers::get_prop(&formatter, "resolvedOptions")?;
    let options = proxy_helpers::call_function(&method, &formatter, &Array::new()).ok()?;
    proxy_helpers::get_prop(&options, "timeZone")?.as_string()
}

/// `document.createElement('canvas').getContext('webgl').getParameter(UNMASKED_VENDOR_WEBGL)`
fn reported_gpu_vendor(global: &JsValue) -> Option<String> {
    let document = proxy_helpers::get_prop(global, "document")?;
    let create = proxy_helpers::get_prop(&document, "createElement")?;
    let canvas = proxy_helpers::call_function(&create, &document, &Array::of1(&"canvas".into())).ok()?;
    let get_context = proxy_helpers::get_prop(&canvas, "getContext")?;
    let gl = proxy_helpers::call_function(&get_context, &canvas, &Array::of1(&"webgl".into())).ok()?;
    let get_parameter = proxy_helpers::get_prop(&gl, "getParameter")?;
    let pname = JsValue::from_f64(f64::from(webgl::UNMASKED_VENDOR_WEBGL));
    proxy_helpers::call_function(&get_parameter, &gl, &Array::of1(&pname)).ok()?.as_string()
}

fn getter_prints_native(target: &JsValue, prop: &str) -> bool {
    let owner = proxy_helpers::owner_of(target, prop);
    if !owner.is_object() {
        return false;
    }
    let descriptor = js_sys::Object::get_own_property_descriptor::<JsValue>(owner.unchecked_ref(), &prop.into());
    proxy_helpers::get_prop(&descriptor, "get")
        .filter(JsValue::is_function)
        .map(|g| g.unchecked_into::<js_sys::Function>())
        .map(|g| String::from(g.to_string()).contains("[native code]"))
        .unwrap_or(false)
}

fn string_array(items: &[&str]) -> Array {
    items.iter().map(|s| JsValue::from_str(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_names_are_unique() {
        let mut names: Vec<_> = UNITS.iter().map(|u| u.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), UNITS.len());
    }

    #[test]
    fn test_every_unit_follows_its_toggle() {
        let all = OverrideConfig::default();
        assert!(UNITS.iter().all(|u| (u.enabled)(&all)));

        let none: OverrideConfig = serde_json::from_str(
            r#"{"navigator": false, "screen": false, "webgl": false, "canvas": false,
                "imageData": false, "webglReadPixels": false, "plugins": false, "timezone": false,
                "permissions": false, "geolocation": false, "battery": false,
                "chromeRuntime": false, "automationMarkers": false, "console": false}"#,
        )
        .unwrap();
        assert!(UNITS.iter().all(|u| !(u.enabled)(&none)));
    }

    #[test]
    fn test_console_unit_is_last() {
        assert_eq!(UNITS.last().map(|u| u.name), Some("console"));
    }

    #[test]
    fn test_canvas_unit_precedes_image_data() {
        let position = |name| UNITS.iter().position(|u| u.name == name);
        assert!(position("canvas") < position("imageData"));
    }
}
