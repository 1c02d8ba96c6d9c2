//! Property key names and built-in defaults for the API options.
//!
//! # Design
//! - Centralize the persisted key names so the options component and the
//!   stores agree on the flat `api.*` namespace.
//! - Keep the compile-time defaults explicit; `load` falls back to these when
//!   a persisted value is absent or malformed.

use std::time::Duration;

pub(crate) const API_ENABLED: &str = "api.enabled";
pub(crate) const API_SECURE: &str = "api.secure";
pub(crate) const API_KEY: &str = "api.key";
pub(crate) const API_DISABLE_KEY: &str = "api.disablekey";
pub(crate) const API_INC_ERROR_DETAILS: &str = "api.incerrordetails";
pub(crate) const API_AUTOFILL_KEY: &str = "api.autofillkey";
pub(crate) const API_ENABLE_JSONP: &str = "api.enablejsonp";
pub(crate) const API_NO_KEY_FOR_SAFE_OPS: &str = "api.nokeyforsafeops";
pub(crate) const API_REPORT_PERM_ERRORS: &str = "api.reportpermerrors";

/// The API is on unless the host explicitly turns it off.
pub(crate) const DEFAULT_ENABLED: bool = true;
pub(crate) const DEFAULT_SECURE_ONLY: bool = false;
pub(crate) const DEFAULT_DISABLE_KEY: bool = false;
pub(crate) const DEFAULT_INC_ERROR_DETAILS: bool = false;
pub(crate) const DEFAULT_AUTOFILL_KEY: bool = false;
pub(crate) const DEFAULT_ENABLE_JSONP: bool = false;
pub(crate) const DEFAULT_NO_KEY_FOR_SAFE_OPS: bool = false;
pub(crate) const DEFAULT_REPORT_PERM_ERRORS: bool = false;

/// Validity window for request nonces; fixed, never persisted.
pub(crate) const NONCE_TIME_TO_LIVE: Duration = Duration::from_secs(5 * 60);

/// Length of a generated key: 32 alphanumeric characters, ~190 bits of entropy.
pub(crate) const GENERATED_KEY_LEN: usize = 32;
