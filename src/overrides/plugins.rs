//! Synthetic `navigator.plugins`.
//!
//! Every read of `navigator.plugins` builds a new list object (native
//! `PluginArray` is a live collection), but the list's methods are created
//! once at install time. They are `Proxy` wrappers around the host's own
//! `PluginArray.prototype.item` / `namedItem` / `refresh`, so they keep native
//! names and `toString()`, and they answer from their receiver's indexed
//! entries, which keeps `plugins.namedItem(n) === plugins[i]`.

use super::context::InstallContext;
use super::property::PropertyOverride;
use super::proxy_helpers::{self, key};
use js_sys::{Array, Object, Reflect};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub const FILENAME_SUFFIX: &str = ".plugin";

/// One synthetic plugin entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePlugin {
    pub name: String,
    pub filename: String,
    pub description: String,
}

impl FakePlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filename: plugin_filename(name),
            description: name.to_string(),
        }
    }
}

/// `"Chrome PDF Viewer"` → `"chrome-pdf-viewer.plugin"`.
pub fn plugin_filename(name: &str) -> String {
    let mut slug = String::with_capacity(name.len() + FILENAME_SUFFIX.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug.push_str(FILENAME_SUFFIX);
    slug
}

/// The ordered plugin sequence backing every materialized list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCatalog {
    plugins: Vec<FakePlugin>,
}

impl PluginCatalog {
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            plugins: names.iter().map(|n| FakePlugin::new(n.as_ref())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Restartable: every call walks the same backing sequence from the start.
    pub fn iter(&self) -> impl Iterator<Item = &FakePlugin> {
        self.plugins.iter()
    }
}

/// Shared, install-time pieces every materialized list is assembled from.
struct ListShape {
    catalog: PluginCatalog,
    list_proto: Option<JsValue>,
    plugin_proto: Option<JsValue>,
    list_item: JsValue,
    list_named_item: JsValue,
    list_refresh: JsValue,
    plugin_item: JsValue,
    plugin_named_item: JsValue,
    values: JsValue,
}

pub fn apply(ctx: &InstallContext, global: &JsValue) -> Result<bool, JsValue> {
    let navigator = match proxy_helpers::get_prop(global, "navigator") {
        Some(n) => n,
        None => return Ok(false),
    };
    let shape = Rc::new(ListShape::new(ctx, global)?);
    PropertyOverride::computed("plugins", move || {
        shape.materialize().unwrap_or(JsValue::UNDEFINED)
    })
    .install(&navigator)?;
    Ok(true)
}

impl ListShape {
    fn new(ctx: &InstallContext, global: &JsValue) -> Result<Self, JsValue> {
        let list_proto = proxy_helpers::prototype_of(global, "PluginArray");
        let plugin_proto = proxy_helpers::prototype_of(global, "Plugin");
        let values = proxy_helpers::prototype_of(global, "Array")
            .and_then(|p| proxy_helpers::get_prop(&p, "values"))
            .unwrap_or(JsValue::UNDEFINED);

        Ok(Self {
            catalog: PluginCatalog::from_names(&ctx.profile.plugins),
            list_item: receiver_method(list_proto.as_ref(), "item", index_lookup)?,
            list_named_item: receiver_method(list_proto.as_ref(), "namedItem", name_lookup)?,
            list_refresh: receiver_method(list_proto.as_ref(), "refresh", |_, _| JsValue::UNDEFINED)?,
            // Mime types are not synthesized: a plugin's own lookups find nothing.
            plugin_item: receiver_method(plugin_proto.as_ref(), "item", |_, _| JsValue::NULL)?,
            plugin_named_item: receiver_method(plugin_proto.as_ref(), "namedItem", |_, _| JsValue::NULL)?,
            list_proto,
            plugin_proto,
            values,
        })
    }

    /// A fresh list instance over the catalog.
    fn materialize(&self) -> Result<JsValue, JsValue> {
        let list = new_object(self.list_proto.as_ref());
        for (index, plugin) in self.catalog.iter().enumerate() {
            let entry = self.plugin_object(plugin)?;
            proxy_helpers::define_data(&list, &JsValue::from_f64(index as f64), &entry, true)?;
            proxy_helpers::define_hidden(&list, &key(&plugin.name), &entry)?;
        }
        self.finish(&list, self.catalog.len(), &self.list_item, &self.list_named_item)?;
        proxy_helpers::define_hidden(&list, &key("refresh"), &self.list_refresh)?;
        Ok(list.into())
    }

    fn plugin_object(&self, plugin: &FakePlugin) -> Result<Object, JsValue> {
        let obj = new_object(self.plugin_proto.as_ref());
        // Defined, not assigned: the host prototype's accessors have no setters.
        for (field, value) in [
            ("name", &plugin.name),
            ("filename", &plugin.filename),
            ("description", &plugin.description),
        ] {
            proxy_helpers::define_data(&obj, &key(field), &JsValue::from_str(value), true)?;
        }
        self.finish(&obj, 1, &self.plugin_item, &self.plugin_named_item)?;
        Ok(obj)
    }

    /// `length`, lookup methods and the iterator slot shared by lists and plugins.
    fn finish(&self, obj: &Object, length: usize, item: &JsValue, named_item: &JsValue) -> Result<(), JsValue> {
        proxy_helpers::define_hidden(obj, &key("length"), &JsValue::from_f64(length as f64))?;
        proxy_helpers::define_hidden(obj, &key("item"), item)?;
        proxy_helpers::define_hidden(obj, &key("namedItem"), named_item)?;
        if !self.values.is_undefined() {
            let iterator: JsValue = js_sys::Symbol::iterator().into();
            proxy_helpers::define_hidden(obj, &iterator, &self.values)?;
        }
        Ok(())
    }
}

fn new_object(proto: Option<&JsValue>) -> Object {
    match proto.and_then(proxy_helpers::as_object) {
        Some(p) => Object::create(p),
        None => Object::new(),
    }
}

/// A method that reads its answer off the receiver. Wraps the host's native
/// method when there is one, a WASM function otherwise.
fn receiver_method(
    proto: Option<&JsValue>,
    name: &str,
    answer: fn(&JsValue, &Array) -> JsValue,
) -> Result<JsValue, JsValue> {
    let target = proto
        .and_then(|p| proxy_helpers::get_prop(p, name))
        .filter(JsValue::is_function)
        .unwrap_or_else(|| proxy_helpers::noop_function(JsValue::NULL));

    let apply_trap = Closure::wrap(Box::new(
        move |_target: JsValue, this_arg: JsValue, args: JsValue| -> Result<JsValue, JsValue> {
            Ok(answer(&this_arg, args.unchecked_ref()))
        },
    )
        as Box<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>);
    proxy_helpers::proxy_function_with_apply(&target, apply_trap)
}

fn receiver_length(this: &JsValue) -> u32 {
    Reflect::get(this, &key("length"))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|n| n as u32)
        .unwrap_or(0)
}

/// `item(i)`: the i-th entry, `null` past the end or for non-numeric input.
fn index_lookup(this: &JsValue, args: &Array) -> JsValue {
    let index = match args.get(0).as_f64() {
        Some(i) if i >= 0.0 && i.fract() == 0.0 && i < f64::from(receiver_length(this)) => i as u32,
        _ => return JsValue::NULL,
    };
    Reflect::get_u32(this, index).unwrap_or(JsValue::NULL)
}

/// `namedItem(name)`: exact match on each entry's `name`, `null` on miss.
fn name_lookup(this: &JsValue, args: &Array) -> JsValue {
    let wanted = match args.get(0).as_string() {
        Some(n) => n,
        None => return JsValue::NULL,
    };
    for index in 0..receiver_length(this) {
        let entry = match Reflect::get_u32(this, index) {
            Ok(e) if e.is_object() => e,
            _ => continue,
        };
        let name = Reflect::get(&entry, &key("name")).ok().and_then(|n| n.as_string());
        if name.as_deref() == Some(wanted.as_str()) {
            return entry;
        }
    }
    JsValue::NULL
}
