//! Automation tells that are about presence rather than value.
//!
//! - `window.chrome`: the members detectors check for, filled in where missing
//! - driver markers: deleted outright, by exact name and by prefix
//! - `console.debug` / `profile` / `profileEnd`: no-ops

use super::context::InstallContext;
use super::proxy_helpers::{self, key};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

/// Globals left behind by Selenium, PhantomJS, Nightmare, Watir and
/// ChromeDriver.
pub const MARKER_NAMES: &[&str] = &[
    "callPhantom",
    "_phantom",
    "phantom",
    "__nightmare",
    "domAutomation",
    "domAutomationController",
    "_selenium",
    "_Selenium_IDE_Recorder",
    "callSelenium",
    "__webdriver_script_fn",
    "__webdriver_script_func",
    "__webdriver_script_function",
    "__driver_evaluate",
    "__webdriver_evaluate",
    "__selenium_evaluate",
    "__fxdriver_evaluate",
    "__driver_unwrapped",
    "__webdriver_unwrapped",
    "__selenium_unwrapped",
    "__fxdriver_unwrapped",
    "_WEBDRIVER_ELEM_CACHE",
    "ChromeDriverw",
    "driver-evaluate",
    "webdriver-evaluate",
    "selenium-evaluate",
    "webdriverCommand",
    "webdriver-evaluate-response",
    "__webdriverFunc",
    "__lastWatirAlert",
    "__lastWatirConfirm",
    "__lastWatirPrompt",
    "$chrome_asyncScriptInfo",
];

/// Prefixes of per-session marker names (`cdc_adoQpoasnfa76pfcZLmcfl_Array`, ...).
pub const MARKER_PREFIXES: &[&str] = &[
    "cdc_",
    "$cdc_",
    "$wdc_",
    "$chrome_",
    "__webdriver",
    "__selenium",
    "__driver",
    "__fxdriver",
];

pub const SILENCED_CONSOLE_METHODS: [&str; 3] = ["debug", "profile", "profileEnd"];

pub fn is_automation_marker(name: &str) -> bool {
    MARKER_NAMES.contains(&name) || MARKER_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Headless Chrome ships a `window.chrome` without `runtime` or `app`, so an
/// existing object is completed rather than left alone.
pub fn apply_chrome_runtime(_ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let chrome = match proxy_helpers::get_prop(global, "chrome") {
        Some(existing) if proxy_helpers::as_object(&existing).is_some() => existing,
        Some(_) => return Ok(false),
        None => {
            let fresh: JsValue = Object::new().into();
            // Same shape as a `var` the page assigned itself.
            Reflect::set(global, &key("chrome"), &fresh)?;
            fresh
        }
    };

    let members: [(&str, fn() -> Result<JsValue, JsValue>); 4] = [
        ("runtime", stub_runtime),
        ("loadTimes", stub_timing),
        ("csi", stub_timing),
        ("app", stub_app),
    ];
    let mut added = false;
    for (member, build) in members {
        if proxy_helpers::get_prop(&chrome, member).is_none() {
            Reflect::set(&chrome, &key(member), &build()?)?;
            added = true;
        }
    }
    Ok(added)
}

fn stub_runtime() -> Result<JsValue, JsValue> {
    let noop = || proxy_helpers::noop_function(JsValue::UNDEFINED);
    let runtime = proxy_helpers::plain_object(&[
        ("connect", noop()),
        ("sendMessage", noop()),
        ("id", JsValue::UNDEFINED),
    ])?;
    Ok(runtime.into())
}

/// `loadTimes()` / `csi()`: an empty timing record.
fn stub_timing() -> Result<JsValue, JsValue> {
    Ok(proxy_helpers::noop_function(Object::new().into()))
}

fn stub_app() -> Result<JsValue, JsValue> {
    let app = proxy_helpers::plain_object(&[
        ("isInstalled", JsValue::FALSE),
        ("getDetails", proxy_helpers::noop_function(JsValue::NULL)),
        ("getIsInstalled", proxy_helpers::noop_function(JsValue::FALSE)),
    ])?;
    Ok(app.into())
}

pub fn apply_markers(_ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let mut removed = 0;
    let mut targets = vec![global.clone()];
    if let Some(document) = proxy_helpers::get_prop(global, "document") {
        targets.push(document);
    }

    for target in &targets {
        let obj = match proxy_helpers::as_object(target) {
            Some(o) => o,
            None => continue,
        };
        let names: Array = Object::get_own_property_names(obj);
        for name in names.iter().filter_map(|n| n.as_string()) {
            if is_automation_marker(&name) && Reflect::delete_property(obj, &key(&name))? {
                removed += 1;
            }
        }
    }

    // Fixed names may also live on the prototype chain of `window`.
    for name in MARKER_NAMES {
        if Reflect::has(global, &key(name)).unwrap_or(false) {
            let owner = proxy_helpers::owner_of(global, name);
            if let Some(obj) = proxy_helpers::as_object(&owner) {
                if Reflect::delete_property(obj, &key(name))? {
                    removed += 1;
                }
            }
        }
    }

    if removed > 0 {
        log::debug!("removed {} automation markers", removed);
    }
    Ok(true)
}

pub fn apply_console(_ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let console = match proxy_helpers::get_prop(global, "console") {
        Some(c) => c,
        None => return Ok(false),
    };
    let mut patched = false;
    for method in SILENCED_CONSOLE_METHODS {
        patched |= super::intercept::replace_with_constant(&console, method, JsValue::UNDEFINED)?;
    }
    Ok(patched)
}
