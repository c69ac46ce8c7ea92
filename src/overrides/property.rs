//! Accessor replacement for read-only browser properties.
//!
//! A `PropertyOverride` is installed on whichever object in the target's
//! prototype chain owns the native accessor (`Navigator.prototype` for
//! `navigator.platform`, the window itself for `innerWidth`), so
//! `Object.getOwnPropertyNames(navigator)` stays empty and the descriptor keeps
//! its native shape: getter only, `configurable: true`, native enumerability.

use super::proxy_helpers;
use wasm_bindgen::prelude::*;

type Getter = Box<dyn FnMut() -> JsValue>;

pub struct PropertyOverride {
    name: &'static str,
    getter: Getter,
}

impl PropertyOverride {
    /// Report the same value on every read.
    pub fn constant(name: &'static str, value: JsValue) -> Self {
        Self {
            name,
            getter: Box::new(move || value.clone()),
        }
    }

    pub fn number(name: &'static str, value: f64) -> Self {
        Self::constant(name, JsValue::from_f64(value))
    }

    pub fn string(name: &'static str, value: &str) -> Self {
        Self::constant(name, JsValue::from_str(value))
    }

    /// Resolve to `undefined`, so `typeof obj[name] === 'undefined'`.
    pub fn absent(name: &'static str) -> Self {
        Self::constant(name, JsValue::UNDEFINED)
    }

    /// Recompute the value on every read.
    pub fn computed<F>(name: &'static str, getter: F) -> Self
    where
        F: FnMut() -> JsValue + 'static,
    {
        Self {
            name,
            getter: Box::new(getter),
        }
    }

    /// Install on the owner of the property in `target`'s prototype chain.
    pub fn install(self, target: &JsValue) -> Result<(), JsValue> {
        let owner = proxy_helpers::owner_of(target, self.name);
        let getter = Closure::wrap(self.getter);
        proxy_helpers::patch_getter(&owner, self.name, getter)
    }
}

/// Install a batch of overrides against one target.
pub fn install_all(target: &JsValue, overrides: Vec<PropertyOverride>) -> Result<(), JsValue> {
    for o in overrides {
        o.install(target)?;
    }
    Ok(())
}
