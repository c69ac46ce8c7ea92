//! Geolocation spoofing.
//!
//! Only installed when the Profile carries both coordinates. Position requests
//! succeed with the configured point; the error callback is never invoked.

use super::context::InstallContext;
use super::intercept::{self, Dispatch};
use super::proxy_helpers::{self, key};
use crate::profile::Coordinates;
use js_sys::{Array, Function};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Reported accuracy, in meters.
pub const ACCURACY_METERS: f64 = 100.0;

/// The id every `watchPosition` call returns; no updates ever follow.
pub const WATCH_ID: u32 = 1;

/// Fields of `GeolocationCoordinates` the profile does not describe.
const NULL_COORDINATE_FIELDS: [&str; 4] = ["altitude", "altitudeAccuracy", "heading", "speed"];

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let coords = match ctx.profile.coordinates() {
        Some(c) => c,
        None => return Ok(false),
    };
    let geolocation = match proxy_helpers::get_prop(global, "navigator")
        .and_then(|nav| proxy_helpers::get_prop(&nav, "geolocation"))
    {
        Some(g) => g,
        None => return Ok(false),
    };
    let owner = proxy_helpers::owner_of(&geolocation, "getCurrentPosition");
    let schedule = proxy_helpers::get_prop(global, "queueMicrotask").filter(JsValue::is_function);

    let current_schedule = schedule.clone();
    let mut patched = intercept::intercept(&owner, "getCurrentPosition", move |_this, args| {
        Ok(match success_callback(args) {
            Some(success) => {
                deliver(&success, coords, current_schedule.as_ref())?;
                Dispatch::Synthetic(JsValue::UNDEFINED)
            }
            None => Dispatch::Forward,
        })
    })?;

    patched |= intercept::intercept(&owner, "watchPosition", move |_this, args| {
        Ok(match success_callback(args) {
            Some(success) => {
                deliver(&success, coords, schedule.as_ref())?;
                Dispatch::Synthetic(JsValue::from_f64(f64::from(WATCH_ID)))
            }
            None => Dispatch::Forward,
        })
    })?;

    patched |= intercept::intercept(&owner, "clearWatch", |_this, args| {
        Ok(if args.get(0).as_f64() == Some(f64::from(WATCH_ID)) {
            Dispatch::Synthetic(JsValue::UNDEFINED)
        } else {
            Dispatch::Forward
        })
    })?;

    Ok(patched)
}

/// A callable first argument, from any realm. Anything else goes to the
/// native method, which throws its own `TypeError`.
fn success_callback(args: &Array) -> Option<Function> {
    let callback = args.get(0);
    if callback.is_function() {
        Some(callback.unchecked_into())
    } else {
        None
    }
}

/// Invoke `success` with a fresh position, after the caller's current task
/// when the host can queue a microtask.
fn deliver(success: &Function, coords: Coordinates, schedule: Option<&JsValue>) -> Result<(), JsValue> {
    let position = position(coords)?;
    let scheduler: Option<&Function> = schedule.map(|s| s.unchecked_ref());
    match scheduler {
        Some(queue) => {
            let success = success.clone();
            let task = Closure::once_into_js(move || {
                if let Err(e) = success.call1(&JsValue::UNDEFINED, &position) {
                    log::debug!("geolocation callback threw: {:?}", e);
                }
            });
            queue.call1(&JsValue::UNDEFINED, &task)?;
        }
        None => {
            success.call1(&JsValue::UNDEFINED, &position)?;
        }
    }
    Ok(())
}

/// `{ coords: { latitude, longitude, accuracy, altitude: null, ... }, timestamp }`
fn position(coords: Coordinates) -> Result<JsValue, JsValue> {
    let c = proxy_helpers::plain_object(&[
        ("latitude", JsValue::from_f64(coords.latitude)),
        ("longitude", JsValue::from_f64(coords.longitude)),
        ("accuracy", JsValue::from_f64(ACCURACY_METERS)),
    ])?;
    for field in NULL_COORDINATE_FIELDS {
        js_sys::Reflect::set(&c, &key(field), &JsValue::NULL)?;
    }
    let position = proxy_helpers::plain_object(&[
        ("coords", c.into()),
        ("timestamp", JsValue::from_f64(js_sys::Date::now())),
    ])?;
    Ok(position.into())
}
