//! Proxy and Reflect utility wrappers for API interception.
//!
//! All closures installed via these helpers are WASM-compiled functions.
//! When fingerprinting scripts call `.toString()` on them, browsers return
//! `"function() { [native code] }"` automatically, and a `Proxy` around a
//! native method keeps that method's own `name`, `length` and `toString()`.

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub type ApplyTrap = Closure<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>;

pub fn key(name: &str) -> JsValue {
    JsValue::from_str(name)
}

/// `obj[name]`, or `None` when the object itself is missing or the value is
/// `undefined`/`null`.
pub fn get_prop(obj: &JsValue, name: &str) -> Option<JsValue> {
    if obj.is_undefined() || obj.is_null() {
        return None;
    }
    match Reflect::get(obj, &key(name)) {
        Ok(v) if !v.is_undefined() && !v.is_null() => Some(v),
        _ => None,
    }
}

/// A global constructor's prototype (e.g. `"HTMLCanvasElement"` →
/// `HTMLCanvasElement.prototype`) in the realm of `global`, if the host has it.
pub fn prototype_of(global: &JsValue, constructor_name: &str) -> Option<JsValue> {
    let ctor = get_prop(global, constructor_name)?;
    get_prop(&ctor, "prototype")
}

/// `value` as an `Object` when it is one, from any realm. `dyn_ref` tests
/// `instanceof` against this module's realm and rejects iframe objects.
pub fn as_object(value: &JsValue) -> Option<&Object> {
    if value.is_object() || value.is_function() {
        Some(value.unchecked_ref())
    } else {
        None
    }
}

/// The `Object.prototype.toString` tag of `value` (`"HTMLCanvasElement"`,
/// `"Uint8Array"`), which holds across realms.
pub fn brand_of(value: &JsValue) -> Option<String> {
    as_object(value)?;
    let to_string = prototype_of(&js_sys::global(), "Object").and_then(|p| get_prop(&p, "toString"))?;
    let tag = call_function(&to_string, value, &Array::new()).ok()?.as_string()?;
    tag.strip_prefix("[object ")
        .and_then(|t| t.strip_suffix(']'))
        .map(str::to_string)
}

/// Walk the prototype chain of `obj` and return the object that owns `prop`.
/// Falls back to the immediate prototype (or `obj` for prototype-less
/// objects) so new accessors land where native ones would.
pub fn owner_of(obj: &JsValue, prop: &str) -> JsValue {
    let name = key(prop);
    let mut current: JsValue = obj.clone();
    while current.is_object() {
        let as_obj: &Object = current.unchecked_ref();
        if !Object::get_own_property_descriptor(as_obj, &name).is_undefined() {
            return current;
        }
        current = Object::get_prototype_of(&current).into();
    }
    let proto: JsValue = Object::get_prototype_of(obj).into();
    if proto.is_object() {
        proto
    } else {
        obj.clone()
    }
}

fn own_descriptor(obj: &JsValue, prop: &str) -> JsValue {
    if !obj.is_object() {
        return JsValue::UNDEFINED;
    }
    Object::get_own_property_descriptor::<JsValue>(obj.unchecked_ref(), &key(prop))
}

fn descriptor_flag(descriptor: &JsValue, flag: &str, default: bool) -> bool {
    if descriptor.is_undefined() {
        return default;
    }
    Reflect::get(descriptor, &key(flag))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(default)
}

/// `Object.defineProperty` that throws like the real thing instead of
/// returning `false` (which is what `Reflect.defineProperty` does).
fn define_property(obj: &JsValue, prop: &str, descriptor: &Object) -> Result<(), JsValue> {
    let target = as_object(obj).ok_or_else(|| JsValue::from_str("cannot define a property on a primitive"))?;
    if Reflect::define_property(target, &key(prop), descriptor)? {
        Ok(())
    } else {
        Err(JsValue::from_str(&format!("property `{}` is not redefinable", prop)))
    }
}

/// Override a property with a getter on an object.
///
/// The accessor is always `configurable: true` so a later redefinition (a
/// second install, or a detector probing descriptors) succeeds. Enumerability
/// is copied from the property being replaced. No setter is installed:
/// assignments are ignored in sloppy mode, as for native read-only accessors.
pub fn patch_getter(
    obj: &JsValue,
    prop_name: &str,
    getter: Closure<dyn FnMut() -> JsValue>,
) -> Result<(), JsValue> {
    let enumerable = descriptor_flag(&own_descriptor(obj, prop_name), "enumerable", true);

    let descriptor = Object::new();
    Reflect::set(&descriptor, &key("get"), getter.as_ref())?;
    Reflect::set(&descriptor, &key("set"), &JsValue::UNDEFINED)?;
    Reflect::set(&descriptor, &key("configurable"), &JsValue::TRUE)?;
    Reflect::set(&descriptor, &key("enumerable"), &JsValue::from_bool(enumerable))?;
    define_property(obj, prop_name, &descriptor)?;

    getter.forget();
    Ok(())
}

/// Replace a method on an object, keeping the data descriptor's attributes.
/// Returns the original method.
pub fn patch_method(obj: &JsValue, method_name: &str, replacement: &JsValue) -> Result<JsValue, JsValue> {
    let original = Reflect::get(obj, &key(method_name))?;
    let existing = own_descriptor(obj, method_name);
    if existing.is_undefined() {
        Reflect::set(obj, &key(method_name), replacement)?;
        return Ok(original);
    }

    let descriptor = Object::new();
    Reflect::set(&descriptor, &key("value"), replacement)?;
    Reflect::set(
        &descriptor,
        &key("writable"),
        &JsValue::from_bool(descriptor_flag(&existing, "writable", true)),
    )?;
    Reflect::set(
        &descriptor,
        &key("enumerable"),
        &JsValue::from_bool(descriptor_flag(&existing, "enumerable", false)),
    )?;
    Reflect::set(&descriptor, &key("configurable"), &JsValue::TRUE)?;
    define_property(obj, method_name, &descriptor)?;
    Ok(original)
}

/// Define a read-only data property, shadowing any inherited accessor.
pub fn define_data(obj: &JsValue, prop: &JsValue, value: &JsValue, enumerable: bool) -> Result<(), JsValue> {
    let descriptor = Object::new();
    Reflect::set(&descriptor, &key("value"), value)?;
    Reflect::set(&descriptor, &key("writable"), &JsValue::FALSE)?;
    Reflect::set(&descriptor, &key("enumerable"), &JsValue::from_bool(enumerable))?;
    Reflect::set(&descriptor, &key("configurable"), &JsValue::TRUE)?;
    let target = as_object(obj).ok_or_else(|| JsValue::from_str("cannot define a property on a primitive"))?;
    Reflect::define_property(target, prop, &descriptor)?;
    Ok(())
}

/// Non-enumerable variant of `define_data`, for named plugin access and
/// method/iterator slots.
pub fn define_hidden(obj: &JsValue, prop: &JsValue, value: &JsValue) -> Result<(), JsValue> {
    define_data(obj, prop, value, false)
}

fn construct_proxy(target: &JsValue, handler: &Object) -> Result<JsValue, JsValue> {
    let proxy_ctor: Function = Reflect::get(&js_sys::global(), &key("Proxy"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("Proxy not found"))?;
    Reflect::construct(&proxy_ctor, &Array::of2(target, handler))
}

/// Create a Proxy around a target function with an `apply` trap.
/// The trap receives (target, thisArg, argumentsList).
/// Use this for method interception where you need to call the original
/// and post-process the result.
pub fn proxy_function_with_apply(target: &JsValue, apply_trap: ApplyTrap) -> Result<JsValue, JsValue> {
    let handler = Object::new();
    Reflect::set(&handler, &key("apply"), apply_trap.as_ref())?;
    apply_trap.forget();
    construct_proxy(target, &handler)
}

/// Create a Proxy around a constructor that is also callable as a function
/// (e.g. `Intl.DateTimeFormat`). The `construct` trap receives
/// (target, argumentsList, newTarget).
pub fn proxy_callable_constructor(
    target: &JsValue,
    apply_trap: ApplyTrap,
    construct_trap: ApplyTrap,
) -> Result<JsValue, JsValue> {
    let handler = Object::new();
    Reflect::set(&handler, &key("apply"), apply_trap.as_ref())?;
    Reflect::set(&handler, &key("construct"), construct_trap.as_ref())?;
    apply_trap.forget();
    construct_trap.forget();
    construct_proxy(target, &handler)
}

/// Call a JS function with arguments via Reflect.apply.
pub fn call_function(func: &JsValue, this_arg: &JsValue, args: &JsValue) -> Result<JsValue, JsValue> {
    let func: &Function = func.unchecked_ref();
    Reflect::apply(func, this_arg, args.unchecked_ref())
}

/// `Reflect.construct(target, args, newTarget)` with `newTarget` defaulting to
/// `target`.
pub fn construct_with(target: &JsValue, args: &Array, new_target: &JsValue) -> Result<JsValue, JsValue> {
    let target_fn: &Function = target.unchecked_ref();
    if new_target.is_function() {
        Reflect::construct_with_new_target(target_fn, args, new_target.unchecked_ref())
    } else {
        Reflect::construct(target_fn, args)
    }
}

/// `Promise.resolve(value)` from the realm of the running module.
pub fn resolved_promise(value: &JsValue) -> JsValue {
    js_sys::Promise::resolve(value).into()
}

/// Create a frozen JS array from string slices.
pub fn frozen_string_array<S: AsRef<str>>(items: &[S]) -> JsValue {
    let arr = Array::new();
    for item in items {
        arr.push(&JsValue::from_str(item.as_ref()));
    }
    Object::freeze(&arr).into()
}

/// Build a plain object from `(key, value)` pairs.
pub fn plain_object(entries: &[(&str, JsValue)]) -> Result<Object, JsValue> {
    let obj = Object::new();
    for (name, value) in entries {
        Reflect::set(&obj, &key(name), value)?;
    }
    Ok(obj)
}

/// A native-looking function that does nothing, for stub surfaces.
/// Created once per install and intentionally leaked with the rest of the
/// installed closures.
pub fn noop_function(returns: JsValue) -> JsValue {
    let f = Closure::wrap(Box::new(move || -> JsValue { returns.clone() }) as Box<dyn FnMut() -> JsValue>);
    let js = f.as_ref().clone();
    f.forget();
    js
}
