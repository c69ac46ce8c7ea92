//! Conditional method interception.
//!
//! `intercept` wraps a method in a `Proxy` whose `apply` trap asks a decision
//! function what to do with each call. The decision sees the receiver and the
//! arguments and either answers synthetically or lets the call through to the
//! original with the same `this` and arguments, so `.call`/`.apply` with an
//! arbitrary receiver behave exactly as before.
//!
//! A decision that fails is treated as `Forward`: an argument pattern we do not
//! understand must never turn into an exception the real API would not throw.

use super::proxy_helpers;
use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Outcome of inspecting one intercepted call.
pub enum Dispatch {
    /// Return this value without invoking the original.
    Synthetic(JsValue),
    /// Invoke the original unmodified and return its result.
    Forward,
}

/// Wrap `target[method]`. Returns `Ok(false)` without touching anything when
/// the host has no such method.
pub fn intercept<F>(target: &JsValue, method: &str, mut decide: F) -> Result<bool, JsValue>
where
    F: FnMut(&JsValue, &Array) -> Result<Dispatch, JsValue> + 'static,
{
    let original = match proxy_helpers::get_prop(target, method) {
        Some(f) if f.is_function() => f,
        _ => return Ok(false),
    };
    let forward_to = original.clone();

    let apply_trap = Closure::wrap(Box::new(
        move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
            let args_arr: &Array = args.unchecked_ref();
            match decide(&this_arg, args_arr) {
                Ok(Dispatch::Synthetic(value)) => Ok(value),
                Ok(Dispatch::Forward) | Err(_) => {
                    proxy_helpers::call_function(&forward_to, &this_arg, &args)
                }
            }
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

    let proxied = proxy_helpers::proxy_function_with_apply(&original, apply_trap)?;
    proxy_helpers::patch_method(target, method, &proxied)?;
    Ok(true)
}

/// Like `intercept`, but every call gets the same synthetic answer.
pub fn replace_with_constant(target: &JsValue, method: &str, value: JsValue) -> Result<bool, JsValue> {
    intercept(target, method, move |_, _| Ok(Dispatch::Synthetic(value.clone())))
}

/// `args[index].name` as a Rust string, for dictionary-style arguments such as
/// `permissions.query({ name })`.
pub fn dictionary_name(args: &Array, index: u32) -> Option<String> {
    let dict = args.get(index);
    if !dict.is_object() {
        return None;
    }
    Reflect::get(&dict, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string())
}
