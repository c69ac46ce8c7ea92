//! `navigator.permissions.query` normalization.
//!
//! Headless and automated browsers answer the notifications query with a state
//! that contradicts `Notification.permission`. The query for `"notifications"`
//! resolves to a fixed denied status; every other name reaches the real API.

use super::context::InstallContext;
use super::intercept::{self, Dispatch};
use super::proxy_helpers::{self, key};
use wasm_bindgen::prelude::*;

/// What a `permissions.query(descriptor)` call is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionQuery {
    Notifications,
    Other(String),
    /// No dictionary, or one without a string `name`; the real API rejects it.
    Malformed,
}

impl PermissionQuery {
    pub fn classify(name: Option<&str>) -> Self {
        match name {
            Some("notifications") => PermissionQuery::Notifications,
            Some(other) => PermissionQuery::Other(other.to_string()),
            None => PermissionQuery::Malformed,
        }
    }
}

pub fn apply(_ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let permissions = match proxy_helpers::get_prop(global, "navigator")
        .and_then(|nav| proxy_helpers::get_prop(&nav, "permissions"))
    {
        Some(p) => p,
        None => return Ok(false),
    };
    let owner = proxy_helpers::owner_of(&permissions, "query");

    intercept::intercept(&owner, "query", move |_this, args| {
        let name = intercept::dictionary_name(args, 0);
        Ok(match PermissionQuery::classify(name.as_deref()) {
            // A fresh promise per call, as the native query never shares one.
            PermissionQuery::Notifications => {
                Dispatch::Synthetic(proxy_helpers::resolved_promise(&denied_status()?))
            }
            PermissionQuery::Other(_) | PermissionQuery::Malformed => Dispatch::Forward,
        })
    })
}

/// `{ name, state: "denied", onchange: null }`: a status nothing can subscribe to.
fn denied_status() -> Result<JsValue, JsValue> {
    let status = proxy_helpers::plain_object(&[
        ("name", key("notifications")),
        ("state", key("denied")),
        ("onchange", JsValue::NULL),
    ])?;
    Ok(status.into())
}
