//! Battery Status normalization.
//!
//! `navigator.getBattery()` resolves to one fixed manager: full, charging,
//! never discharging. Listener registration is accepted and ignored.

use super::context::InstallContext;
use super::intercept;
use super::proxy_helpers::{self, key};
use js_sys::Reflect;
use wasm_bindgen::prelude::*;

const EVENT_HANDLERS: [&str; 4] = [
    "onchargingchange",
    "onchargingtimechange",
    "ondischargingtimechange",
    "onlevelchange",
];

pub fn apply(_ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let navigator = match proxy_helpers::get_prop(global, "navigator") {
        Some(n) => n,
        None => return Ok(false),
    };
    if !proxy_helpers::get_prop(&navigator, "getBattery").map_or(false, |f| f.is_function()) {
        return Ok(false);
    }

    // Native getBattery hands out the same promise on every call.
    let manager = battery_manager(global)?;
    let promise = proxy_helpers::resolved_promise(&manager);
    let owner = proxy_helpers::owner_of(&navigator, "getBattery");
    intercept::replace_with_constant(&owner, "getBattery", promise)
}

fn battery_manager(global: &JsValue) -> Result<JsValue, JsValue> {
    let manager = proxy_helpers::plain_object(&[
        ("charging", JsValue::TRUE),
        ("chargingTime", JsValue::from_f64(0.0)),
        ("dischargingTime", JsValue::from_f64(f64::INFINITY)),
        ("level", JsValue::from_f64(1.0)),
    ])?;
    for handler in EVENT_HANDLERS {
        Reflect::set(&manager, &key(handler), &JsValue::NULL)?;
    }

    // Reuse EventTarget's own methods as proxy targets when the host has them,
    // so the stubs report native names.
    let event_target = proxy_helpers::prototype_of(global, "EventTarget");
    for (method, returns) in [
        ("addEventListener", JsValue::UNDEFINED),
        ("removeEventListener", JsValue::UNDEFINED),
        ("dispatchEvent", JsValue::TRUE),
    ] {
        let stub = match event_target.as_ref().and_then(|p| proxy_helpers::get_prop(p, method)) {
            Some(native) => constant_proxy(&native, returns)?,
            None => proxy_helpers::noop_function(returns),
        };
        Reflect::set(&manager, &key(method), &stub)?;
    }
    Ok(manager.into())
}

fn constant_proxy(native: &JsValue, returns: JsValue) -> Result<JsValue, JsValue> {
    let apply_trap = Closure::wrap(Box::new(
        move |_target: JsValue, _this: JsValue, _args: JsValue| -> Result<JsValue, JsValue> {
            Ok(returns.clone())
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);
    proxy_helpers::proxy_function_with_apply(native, apply_trap)
}
