//! Error types for the persona override engine
//!
//! Two failure classes reach callers:
//! - configuration errors (malformed Profile or options), raised before any
//!   surface is patched
//! - install errors, a JS exception thrown while a unit was being installed
//!
//! Missing host APIs are not errors; units skip them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, PersonaError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Profile errors (1xx)
    InvalidProfile = 100,
    UnresolvedPlaceholder = 101,
    MalformedInput = 102,

    // Option errors (2xx)
    InvalidConfig = 200,

    // Install errors (3xx)
    InstallFailed = 300,

    // Internal errors (9xx)
    JsException = 900,
}

/// Main error type for the override engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersonaError {
    // ===== Profile Errors =====
    #[error("Invalid profile field `{field}`: {reason}")]
    InvalidProfile { field: &'static str, reason: String },

    #[error("Profile field `{field}` still contains an unresolved template placeholder")]
    UnresolvedPlaceholder { field: &'static str },

    #[error("Malformed profile: {0}")]
    MalformedInput(String),

    // ===== Option Errors =====
    #[error("Invalid override options: {0}")]
    InvalidConfig(String),

    // ===== Install Errors =====
    #[error("Failed to install `{unit}` overrides: {message}")]
    Install { unit: &'static str, message: String },

    // ===== JS Errors =====
    #[error("JS exception: {0}")]
    Js(String),
}

impl PersonaError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PersonaError::InvalidProfile {
            field,
            reason: reason.into(),
        }
    }

    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            PersonaError::InvalidProfile { .. } => ErrorCode::InvalidProfile,
            PersonaError::UnresolvedPlaceholder { .. } => ErrorCode::UnresolvedPlaceholder,
            PersonaError::MalformedInput(_) => ErrorCode::MalformedInput,
            PersonaError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            PersonaError::Install { .. } => ErrorCode::InstallFailed,
            PersonaError::Js(_) => ErrorCode::JsException,
        }
    }

    /// Whether the caller supplied bad input (as opposed to a host failure).
    ///
    /// Configuration errors are always raised before anything is patched.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PersonaError::InvalidProfile { .. }
                | PersonaError::UnresolvedPlaceholder { .. }
                | PersonaError::MalformedInput(_)
                | PersonaError::InvalidConfig(_)
        )
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            PersonaError::InvalidProfile { field, .. } => {
                format!("The profile value for `{}` is not usable. Regenerate the profile.", field)
            }
            PersonaError::UnresolvedPlaceholder { field } => format!(
                "The profile template was not fully rendered (`{}`). Check the delivery step.",
                field
            ),
            PersonaError::MalformedInput(_) => {
                "The profile could not be read. Check that every required field is present.".into()
            }
            PersonaError::InvalidConfig(_) => "The override options are invalid.".into(),
            PersonaError::Install { unit, .. } => format!(
                "The `{}` overrides could not be installed in this page.",
                unit
            ),
            PersonaError::Js(_) => "An unexpected script error occurred.".into(),
        }
    }

    /// Wrap a JS exception raised while installing `unit`.
    pub fn install(unit: &'static str, err: JsValue) -> Self {
        PersonaError::Install {
            unit,
            message: describe_js(&err),
        }
    }
}

/// Best-effort stringification of a thrown JS value.
pub(crate) fn describe_js(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    match js_sys::Reflect::get(err, &JsValue::from_str("message")) {
        Ok(msg) if msg.is_string() => msg.as_string().unwrap_or_default(),
        _ => format!("{:?}", err),
    }
}

impl From<JsValue> for PersonaError {
    fn from(err: JsValue) -> Self {
        PersonaError::Js(describe_js(&err))
    }
}

impl From<PersonaError> for JsValue {
    fn from(err: PersonaError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Error information for JavaScript consumption
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub is_config_error: bool,
}

impl From<&PersonaError> for ErrorInfo {
    fn from(err: &PersonaError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            is_config_error: err.is_config_error(),
        }
    }
}
