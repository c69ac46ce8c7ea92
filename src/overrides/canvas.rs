//! Canvas and WebGL read-back noise.
//!
//! Both serialization entry points (`toDataURL`, `toBlob`) run the noise pass
//! against the canvas's 2D backing store before the native encoder sees it.
//! `getImageData` results and WebGL `readPixels` output buffers get the same
//! pass after the browser fills them. The pixel work runs in WASM linear
//! memory: one copy in, one copy out.
//!
//! The serializer hook never calls `getContext` itself: that would bind a 2D
//! context to a canvas the page may still want for WebGL. Instead the canvas
//! unit wraps `getContext` and remembers which context each canvas got.

use super::context::InstallContext;
use super::intercept::{self, Dispatch};
use super::noise::NoiseInjector;
use super::proxy_helpers;
use super::webgl::GL_PROTOTYPES;
use js_sys::{Array, Uint8Array, WeakMap};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

const SERIALIZERS: [&str; 2] = ["toDataURL", "toBlob"];

/// Prototypes carrying a `getImageData` whose results are perturbed.
const IMAGE_DATA_PROTOTYPES: [&str; 2] = ["CanvasRenderingContext2D", "OffscreenCanvasRenderingContext2D"];

/// `readPixels(x, y, width, height, format, type, pixels)`
const READ_PIXELS_DEST_ARG: u32 = 6;

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let canvas_proto = match proxy_helpers::prototype_of(global, "HTMLCanvasElement") {
        Some(p) => p,
        None => return Ok(false),
    };

    // canvas -> the context `getContext` handed out for it
    let contexts = WeakMap::new();
    if !track_contexts(&canvas_proto, &contexts)? {
        return Ok(false);
    }

    // Read through the unwrapped `getImageData` so the serializer pass never
    // stacks on top of the `imageData` unit's noise.
    let read_image = proxy_helpers::prototype_of(global, "CanvasRenderingContext2D")
        .and_then(|p| proxy_helpers::get_prop(&p, "getImageData"))
        .filter(JsValue::is_function);

    let mut patched = false;
    for method in SERIALIZERS {
        let noise = ctx.noise;
        let contexts = contexts.clone();
        let read_image = read_image.clone();
        patched |= intercept::intercept(&canvas_proto, method, move |this, _args| {
            // Failures (tainted canvas, zero size) are left for the native
            // serializer to report in its own words.
            if let Err(e) = perturb_canvas(this, &contexts, read_image.as_ref(), &noise) {
                log::debug!("canvas noise skipped: {:?}", e);
            }
            Ok(Dispatch::Forward)
        })?;
    }
    Ok(patched)
}

/// Wrap `getContext` so every context it returns is recorded against its
/// canvas. Calls, arguments and results are otherwise untouched.
fn track_contexts(canvas_proto: &JsValue, contexts: &WeakMap) -> Result<bool, JsValue> {
    let original = match proxy_helpers::get_prop(canvas_proto, "getContext") {
        Some(f) if f.is_function() => f,
        _ => return Ok(false),
    };
    let forward_to = original.clone();
    let contexts = contexts.clone();

    let apply_trap = Closure::wrap(Box::new(
        move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
            let context = proxy_helpers::call_function(&forward_to, &this_arg, &args)?;
            match proxy_helpers::as_object(&this_arg) {
                Some(canvas) if !context.is_null() => {
                    contexts.set(canvas, &context);
                }
                _ => {}
            }
            Ok(context)
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

    let proxied = proxy_helpers::proxy_function_with_apply(&original, apply_trap)?;
    proxy_helpers::patch_method(canvas_proto, "getContext", &proxied)?;
    Ok(true)
}

/// Read the canvas's pixels, perturb them, write them back.
///
/// Only canvases holding a 2D context are touched. A canvas nobody has drawn
/// on serializes to the same blank image on every machine, and WebGL-backed
/// canvases are covered by the `readPixels` unit.
fn perturb_canvas(
    this: &JsValue,
    contexts: &WeakMap,
    read_image: Option<&JsValue>,
    noise: &NoiseInjector,
) -> Result<(), JsValue> {
    let (canvas, read_image) = match (proxy_helpers::as_object(this), read_image) {
        (Some(c), Some(r)) => (c, r),
        _ => return Ok(()),
    };
    let context = contexts.get(canvas);
    // Brand check rather than `instanceof`: canvases from same-origin frames
    // belong to another realm.
    if proxy_helpers::brand_of(&context).as_deref() != Some("CanvasRenderingContext2D") {
        return Ok(());
    }

    let element: &HtmlCanvasElement = this.unchecked_ref();
    let (width, height) = (element.width(), element.height());
    if width == 0 || height == 0 {
        return Ok(());
    }

    let rect = Array::of4(
        &JsValue::from_f64(0.0),
        &JsValue::from_f64(0.0),
        &JsValue::from_f64(f64::from(width)),
        &JsValue::from_f64(f64::from(height)),
    );
    let image = proxy_helpers::call_function(read_image, &context, &rect)?;
    if perturb_image(&image, noise) == 0 {
        return Ok(());
    }
    let ctx: &CanvasRenderingContext2d = context.unchecked_ref();
    ctx.put_image_data(image.unchecked_ref::<ImageData>(), 0.0, 0.0)
}

/// Perturb an `ImageData`'s pixels in place. Returns the number of bytes changed.
fn perturb_image(image: &JsValue, noise: &NoiseInjector) -> usize {
    match proxy_helpers::get_prop(image, "data") {
        Some(data) if proxy_helpers::brand_of(&data).as_deref() == Some("Uint8ClampedArray") => {
            let clamped: &js_sys::Uint8ClampedArray = data.unchecked_ref();
            // Same bytes, unclamped view.
            let bytes = Uint8Array::new_with_byte_offset_and_length(
                &clamped.buffer(),
                clamped.byte_offset(),
                clamped.length(),
            );
            perturb_bytes(&bytes, noise)
        }
        _ => 0,
    }
}

fn perturb_bytes(pixels: &Uint8Array, noise: &NoiseInjector) -> usize {
    let mut buffer = vec![0u8; pixels.length() as usize];
    pixels.copy_to(&mut buffer);
    let changed = noise.perturb(&mut buffer);
    if changed > 0 {
        pixels.copy_from(&buffer);
    }
    changed
}

/// Noise on every `getImageData` result. The canvas itself is not modified;
/// each call returns a freshly perturbed copy.
pub fn apply_image_data(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let mut patched = false;
    for proto_name in IMAGE_DATA_PROTOTYPES {
        let proto = match proxy_helpers::prototype_of(global, proto_name) {
            Some(p) => p,
            None => continue,
        };
        let original = match proxy_helpers::get_prop(&proto, "getImageData") {
            Some(f) if f.is_function() => f,
            _ => continue,
        };
        let forward_to = original.clone();
        let noise = ctx.noise;

        let apply_trap = Closure::wrap(Box::new(
            move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
                // Security and range errors propagate exactly as they would unpatched.
                let image = proxy_helpers::call_function(&forward_to, &this_arg, &args)?;
                perturb_image(&image, &noise);
                Ok(image)
            },
        )
            as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

        let proxied = proxy_helpers::proxy_function_with_apply(&original, apply_trap)?;
        proxy_helpers::patch_method(&proto, "getImageData", &proxied)?;
        patched = true;
    }
    Ok(patched)
}

pub fn apply_read_pixels(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let mut patched = false;
    for gl_name in GL_PROTOTYPES {
        let proto = match proxy_helpers::prototype_of(global, gl_name) {
            Some(p) => p,
            None => continue,
        };
        let original = match proxy_helpers::get_prop(&proto, "readPixels") {
            Some(f) if f.is_function() => f,
            _ => continue,
        };
        let orig_rp = original.clone();
        let noise = ctx.noise;

        let apply_trap = Closure::wrap(Box::new(
            move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
                // Driver errors propagate exactly as they would unpatched.
                let result = proxy_helpers::call_function(&orig_rp, &this_arg, &args)?;

                let args_arr: &Array = args.unchecked_ref();
                let dest = args_arr.get(READ_PIXELS_DEST_ARG);
                // Float and 16-bit destinations are left alone.
                if proxy_helpers::brand_of(&dest).as_deref() == Some("Uint8Array") {
                    perturb_bytes(dest.unchecked_ref(), &noise);
                }
                Ok(result)
            },
        )
            as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);

        let proxied = proxy_helpers::proxy_function_with_apply(&original, apply_trap)?;
        proxy_helpers::patch_method(&proto, "readPixels", &proxied)?;
        patched = true;
    }
    Ok(patched)
}
