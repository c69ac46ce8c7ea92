//! WebGL GPU identity.
//!
//! Only the two `WEBGL_debug_renderer_info` constants are answered
//! synthetically; every other `getParameter` query reaches the real driver.

use super::context::InstallContext;
use super::intercept::{self, Dispatch};
use super::proxy_helpers;
use wasm_bindgen::prelude::*;

pub const UNMASKED_VENDOR_WEBGL: u32 = 0x9245; // 37445
pub const UNMASKED_RENDERER_WEBGL: u32 = 0x9246; // 37446

pub const GL_PROTOTYPES: [&str; 2] = ["WebGLRenderingContext", "WebGL2RenderingContext"];

/// What a `getParameter(pname)` call is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlQuery {
    UnmaskedVendor,
    UnmaskedRenderer,
    Other,
}

impl GlQuery {
    /// Strict match on the numeric value: `"37445"` or `37445.5` are not the
    /// vendor constant and go to the driver, which decides how to reject them.
    pub fn classify(pname: Option<f64>) -> Self {
        match pname {
            Some(v) if v == f64::from(UNMASKED_VENDOR_WEBGL) => GlQuery::UnmaskedVendor,
            Some(v) if v == f64::from(UNMASKED_RENDERER_WEBGL) => GlQuery::UnmaskedRenderer,
            _ => GlQuery::Other,
        }
    }
}

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let mut patched = false;
    for gl_name in GL_PROTOTYPES {
        if let Some(proto) = proxy_helpers::prototype_of(global, gl_name) {
            patched |= apply_to_gl_proto(ctx, &proto)?;
        }
    }
    Ok(patched)
}

fn apply_to_gl_proto(ctx: &InstallContext, proto: &JsValue) -> Result<bool, JsValue> {
    let vendor = JsValue::from_str(&ctx.profile.webgl_vendor);
    let renderer = JsValue::from_str(&ctx.profile.webgl_renderer);

    intercept::intercept(proto, "getParameter", move |_this, args| {
        Ok(match GlQuery::classify(args.get(0).as_f64()) {
            GlQuery::UnmaskedVendor => Dispatch::Synthetic(vendor.clone()),
            GlQuery::UnmaskedRenderer => Dispatch::Synthetic(renderer.clone()),
            GlQuery::Other => Dispatch::Forward,
        })
    })
}
