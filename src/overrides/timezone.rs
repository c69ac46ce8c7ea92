//! Timezone consistency across `Date` and `Intl`.
//!
//! `getTimezoneOffset` reports the configured offset, and every formatter
//! constructed without an explicit `timeZone` gets the configured zone
//! injected, so offset queries, zone-name queries and formatted strings all
//! agree no matter where the host machine really is.

use super::context::InstallContext;
use super::intercept::{self, Dispatch};
use super::proxy_helpers::{self, key};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// `Intl.DateTimeFormat(locales, options)` and `toLocale*String(locales, options)`
const OPTIONS_ARG: u32 = 1;

const LOCALE_METHODS: [&str; 3] = ["toLocaleString", "toLocaleDateString", "toLocaleTimeString"];

/// Shape of the options argument of a formatting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOptions {
    /// Omitted or `undefined`.
    NoOptions,
    /// An object whose `timeZone` is absent or `undefined`.
    WithoutZone,
    /// An object naming a zone explicitly; the caller's choice wins.
    WithZone,
    /// `null` or a primitive: left for the engine to accept or reject.
    Unsupported,
}

/// How the options argument is rewritten before the real call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsRewrite {
    /// Pass `{ timeZone }`.
    Fresh,
    /// Pass an object whose prototype is the caller's options and whose own
    /// `timeZone` holds the zone already read. Inherited options still reach
    /// the engine and the caller's object is never touched.
    Derived,
    Unchanged,
}

impl FormatOptions {
    /// Classify `options`, reading its `timeZone` once. The value read is
    /// returned with the shape so nothing reads it again. A throwing getter
    /// propagates, as it would from the native constructor.
    pub fn read(options: &JsValue) -> Result<(Self, JsValue), JsValue> {
        if options.is_undefined() {
            return Ok((FormatOptions::NoOptions, JsValue::UNDEFINED));
        }
        if proxy_helpers::as_object(options).is_none() {
            return Ok((FormatOptions::Unsupported, JsValue::UNDEFINED));
        }
        let zone = Reflect::get(options, &key("timeZone"))?;
        let shape = if zone.is_undefined() {
            FormatOptions::WithoutZone
        } else {
            FormatOptions::WithZone
        };
        Ok((shape, zone))
    }

    pub fn rewrite(self) -> OptionsRewrite {
        match self {
            FormatOptions::NoOptions => OptionsRewrite::Fresh,
            FormatOptions::WithoutZone | FormatOptions::WithZone => OptionsRewrite::Derived,
            FormatOptions::Unsupported => OptionsRewrite::Unchanged,
        }
    }
}

/// Arguments with a zone pinned into the options, or `None` when the call
/// should go through untouched. The caller's explicit zone is kept; an absent
/// one becomes `zone`.
fn with_zone(args: &Array, zone: &JsValue) -> Result<Option<Array>, JsValue> {
    let options = args.get(OPTIONS_ARG);
    let (shape, caller_zone) = FormatOptions::read(&options)?;
    let pinned = if caller_zone.is_undefined() { zone } else { &caller_zone };
    let injected: JsValue = match shape.rewrite() {
        OptionsRewrite::Unchanged => return Ok(None),
        OptionsRewrite::Fresh => proxy_helpers::plain_object(&[("timeZone", pinned.clone())])?.into(),
        OptionsRewrite::Derived => {
            let derived: JsValue = match proxy_helpers::as_object(&options) {
                Some(parent) => Object::create(parent).into(),
                None => return Ok(None),
            };
            // Defined rather than set: an inherited getter-only `timeZone`
            // would swallow an assignment.
            proxy_helpers::define_data(&derived, &key("timeZone"), pinned, true)?;
            derived
        }
    };

    let rewritten = Array::new();
    rewritten.push(&args.get(0));
    rewritten.push(&injected);
    for i in (OPTIONS_ARG + 1)..args.length() {
        rewritten.push(&args.get(i));
    }
    Ok(Some(rewritten))
}

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let zone = JsValue::from_str(&ctx.profile.timezone);

    if let Some(date_proto) = proxy_helpers::prototype_of(global, "Date") {
        apply_timezone_offset(&date_proto, ctx.profile.timezone_offset)?;
        apply_locale_methods(&date_proto, &zone)?;
    }

    if let Some(intl) = proxy_helpers::get_prop(global, "Intl") {
        apply_date_time_format(&intl, &zone)?;
    }

    Ok(true)
}

fn apply_timezone_offset(date_proto: &JsValue, offset: i32) -> Result<bool, JsValue> {
    let offset = JsValue::from_f64(f64::from(offset));
    // The realm's own getTime doubles as a brand check that works for dates
    // from any frame.
    let get_time = proxy_helpers::get_prop(date_proto, "getTime").filter(JsValue::is_function);
    intercept::intercept(date_proto, "getTimezoneOffset", move |this, _args| {
        let time = match get_time.as_ref() {
            Some(f) => proxy_helpers::call_function(f, this, &Array::new())?.as_f64(),
            None => None,
        };
        // Non-dates throw and invalid dates answer NaN natively; keep both.
        Ok(match time {
            Some(t) if !t.is_nan() => Dispatch::Synthetic(offset.clone()),
            _ => Dispatch::Forward,
        })
    })
}

fn apply_locale_methods(date_proto: &JsValue, zone: &JsValue) -> Result<(), JsValue> {
    for method in LOCALE_METHODS {
        let original = match proxy_helpers::get_prop(date_proto, method) {
            Some(f) if f.is_function() => f,
            _ => continue,
        };
        let forward_to = original.clone();
        let zone = zone.clone();
        intercept::intercept(date_proto, method, move |this, args| {
            Ok(match with_zone(args, &zone)? {
                Some(rewritten) => {
                    Dispatch::Synthetic(proxy_helpers::call_function(&forward_to, this, &rewritten)?)
                }
                None => Dispatch::Forward,
            })
        })?;
    }
    Ok(())
}

fn apply_date_time_format(intl: &JsValue, zone: &JsValue) -> Result<(), JsValue> {
    let dtf = match proxy_helpers::get_prop(intl, "DateTimeFormat") {
        Some(f) if f.is_function() => f,
        _ => return Ok(()),
    };
    let dtf_proto = proxy_helpers::get_prop(&dtf, "prototype");

    // --- resolvedOptions: always report the configured zone ---
    if let Some(proto) = dtf_proto.as_ref() {
        if let Some(orig_resolved) = proxy_helpers::get_prop(proto, "resolvedOptions") {
            let orig_ro = orig_resolved.clone();
            let zone = zone.clone();
            let apply_trap = Closure::wrap(Box::new(
                move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
                    let result = proxy_helpers::call_function(&orig_ro, &this_arg, &args)?;
                    if result.is_object() {
                        Reflect::set(&result, &key("timeZone"), &zone)?;
                    }
                    Ok(result)
                },
            )
                as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);
            let proxied = proxy_helpers::proxy_function_with_apply(&orig_resolved, apply_trap)?;
            proxy_helpers::patch_method(proto, "resolvedOptions", &proxied)?;
        }
    }

    // --- the constructor itself, both `new Intl.DateTimeFormat()` and the bare call ---
    let orig_call = dtf.clone();
    let call_zone = zone.clone();
    let apply_trap = Closure::wrap(Box::new(
        move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
            let args_arr: &Array = args.unchecked_ref();
            let rewritten = with_zone(args_arr, &call_zone)?.unwrap_or_else(|| args_arr.clone());
            proxy_helpers::call_function(&orig_call, &this_arg, &rewritten)
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

    let orig_new = dtf.clone();
    let new_zone = zone.clone();
    let construct_trap = Closure::wrap(Box::new(
        move |_target: JsValue, args: JsValue, new_target: JsValue| -> Result<JsValue, JsValue> {
            let args_arr: &Array = args.unchecked_ref();
            let rewritten = with_zone(args_arr, &new_zone)?.unwrap_or_else(|| args_arr.clone());
            proxy_helpers::construct_with(&orig_new, &rewritten, &new_target)
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

    let proxied = proxy_helpers::proxy_callable_constructor(&dtf, apply_trap, construct_trap)?;
    proxy_helpers::patch_method(intl, "DateTimeFormat", &proxied)?;
    if let Some(proto) = dtf_proto.as_ref() {
        // `formatter.constructor === Intl.DateTimeFormat` must still hold.
        proxy_helpers::patch_method(proto, "constructor", &proxied)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_per_variant() {
        assert_eq!(FormatOptions::NoOptions.rewrite(), OptionsRewrite::Fresh);
        assert_eq!(FormatOptions::WithoutZone.rewrite(), OptionsRewrite::Derived);
        assert_eq!(FormatOptions::WithZone.rewrite(), OptionsRewrite::Derived);
        assert_eq!(FormatOptions::Unsupported.rewrite(), OptionsRewrite::Unchanged);
    }
}
