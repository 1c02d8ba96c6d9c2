//! Runtime options for the API subsystem.
//!
//! # Design
//! - `ApiOptions` is a synchronous data holder: eight boolean flags, the
//!   authentication key, and a fixed nonce time-to-live. It starts detached
//!   and becomes useful once [`ApiOptions::load`] binds a property store;
//!   every persisting mutator refuses to run before that.
//! - The secret has two views: [`ApiOptions::key`] is the public one, forced
//!   empty while key authentication is disabled, and [`ApiOptions::real_key`]
//!   is the internal one that always returns the actual secret.

use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, info, warn};

use crate::defaults::{
    API_AUTOFILL_KEY, API_DISABLE_KEY, API_ENABLE_JSONP, API_ENABLED, API_INC_ERROR_DETAILS,
    API_KEY, API_NO_KEY_FOR_SAFE_OPS, API_REPORT_PERM_ERRORS, API_SECURE, DEFAULT_AUTOFILL_KEY,
    DEFAULT_DISABLE_KEY, DEFAULT_ENABLE_JSONP, DEFAULT_ENABLED, DEFAULT_INC_ERROR_DETAILS,
    DEFAULT_NO_KEY_FOR_SAFE_OPS, DEFAULT_REPORT_PERM_ERRORS, DEFAULT_SECURE_ONLY,
    GENERATED_KEY_LEN, NONCE_TIME_TO_LIVE,
};
use crate::error::{ConfigError, ConfigResult};
use crate::store::{PropertyStore, SharedStore};

/// Configuration holder for the API subsystem.
///
/// Constructed with built-in defaults, then populated from a property store
/// via [`ApiOptions::load`]. Setters write through the attached store and
/// flush it immediately; the in-memory value is updated before the flush, so
/// a [`ConfigError::Persistence`] failure leaves memory ahead of disk.
#[derive(Debug)]
pub struct ApiOptions {
    enabled: bool,
    secure_only: bool,
    disable_key: bool,
    inc_error_details: bool,
    autofill_key: bool,
    enable_jsonp: bool,
    no_key_for_safe_ops: bool,
    report_perm_errors: bool,
    real_key: String,
    store: Option<SharedStore>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            secure_only: DEFAULT_SECURE_ONLY,
            disable_key: DEFAULT_DISABLE_KEY,
            inc_error_details: DEFAULT_INC_ERROR_DETAILS,
            autofill_key: DEFAULT_AUTOFILL_KEY,
            enable_jsonp: DEFAULT_ENABLE_JSONP,
            no_key_for_safe_ops: DEFAULT_NO_KEY_FOR_SAFE_OPS,
            report_perm_errors: DEFAULT_REPORT_PERM_ERRORS,
            real_key: String::new(),
            store: None,
        }
    }
}

impl Clone for ApiOptions {
    /// Copies flag and key state at call time; the clone is detached and must
    /// be bound to a store with [`ApiOptions::load`] before it can persist.
    fn clone(&self) -> Self {
        Self {
            enabled: self.enabled,
            secure_only: self.secure_only,
            disable_key: self.disable_key,
            inc_error_details: self.inc_error_details,
            autofill_key: self.autofill_key,
            enable_jsonp: self.enable_jsonp,
            no_key_for_safe_ops: self.no_key_for_safe_ops,
            report_perm_errors: self.report_perm_errors,
            real_key: self.real_key.clone(),
            store: None,
        }
    }
}

impl ApiOptions {
    /// Create options with the built-in defaults and no attached store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a property store is currently attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.store.is_some()
    }

    /// Bind `store` and populate every option from it.
    ///
    /// Each flag falls back to its built-in default when the persisted value
    /// is absent or malformed; a corrupted document must degrade the
    /// subsystem to safe defaults, never crash it. When the store holds no
    /// key, a fresh one is generated and written back immediately.
    ///
    /// Calling `load` again rebinds to the new store and re-reads all values.
    ///
    /// # Errors
    /// [`ConfigError::Persistence`] when flushing a newly generated key fails.
    pub fn load(&mut self, store: SharedStore) -> ConfigResult<()> {
        {
            let guard = store.lock().expect("property store mutex poisoned");
            self.enabled = bool_property(&*guard, API_ENABLED, DEFAULT_ENABLED);
            self.secure_only = bool_property(&*guard, API_SECURE, DEFAULT_SECURE_ONLY);
            self.disable_key = bool_property(&*guard, API_DISABLE_KEY, DEFAULT_DISABLE_KEY);
            self.inc_error_details =
                bool_property(&*guard, API_INC_ERROR_DETAILS, DEFAULT_INC_ERROR_DETAILS);
            self.autofill_key = bool_property(&*guard, API_AUTOFILL_KEY, DEFAULT_AUTOFILL_KEY);
            self.enable_jsonp = bool_property(&*guard, API_ENABLE_JSONP, DEFAULT_ENABLE_JSONP);
            self.no_key_for_safe_ops = bool_property(
                &*guard,
                API_NO_KEY_FOR_SAFE_OPS,
                DEFAULT_NO_KEY_FOR_SAFE_OPS,
            );
            self.report_perm_errors = bool_property(
                &*guard,
                API_REPORT_PERM_ERRORS,
                DEFAULT_REPORT_PERM_ERRORS,
            );
            self.real_key = guard.get_string(API_KEY).unwrap_or_default();
        }
        self.store = Some(store);

        if self.real_key.is_empty() {
            self.real_key = generate_api_key();
            info!("no API key stored, generated a fresh one");
            self.persist_key()?;
        }
        Ok(())
    }

    /// Whether the API is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the API.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_enabled(&mut self, enabled: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.enabled = enabled;
        self.persist_flag(API_ENABLED, enabled)
    }

    /// Whether the API is restricted to secure transport.
    #[must_use]
    pub const fn is_secure_only(&self) -> bool {
        self.secure_only
    }

    /// Restrict the API to secure transport.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_secure_only(&mut self, secure_only: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.secure_only = secure_only;
        self.persist_flag(API_SECURE, secure_only)
    }

    /// Whether key authentication is disabled for the public key view.
    #[must_use]
    pub const fn is_disable_key(&self) -> bool {
        self.disable_key
    }

    /// Disable or re-enable key authentication.
    ///
    /// The real key is kept; only the public view changes.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_disable_key(&mut self, disable_key: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.disable_key = disable_key;
        self.persist_flag(API_DISABLE_KEY, disable_key)
    }

    /// Whether error responses include internal details.
    #[must_use]
    pub const fn is_inc_error_details(&self) -> bool {
        self.inc_error_details
    }

    /// Include or hide internal details in error responses.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_inc_error_details(&mut self, inc_error_details: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.inc_error_details = inc_error_details;
        self.persist_flag(API_INC_ERROR_DETAILS, inc_error_details)
    }

    /// Whether UI forms are pre-filled with the key.
    #[must_use]
    pub const fn is_autofill_key(&self) -> bool {
        self.autofill_key
    }

    /// Toggle pre-filling UI forms with the key.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_autofill_key(&mut self, autofill_key: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.autofill_key = autofill_key;
        self.persist_flag(API_AUTOFILL_KEY, autofill_key)
    }

    /// Whether JSONP responses are enabled.
    #[must_use]
    pub const fn is_enable_jsonp(&self) -> bool {
        self.enable_jsonp
    }

    /// Enable or disable JSONP responses.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_enable_jsonp(&mut self, enable_jsonp: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.enable_jsonp = enable_jsonp;
        self.persist_flag(API_ENABLE_JSONP, enable_jsonp)
    }

    /// Whether safe (read-only) operations bypass key checks.
    #[must_use]
    pub const fn is_no_key_for_safe_ops(&self) -> bool {
        self.no_key_for_safe_ops
    }

    /// Allow or forbid safe operations without a key.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_no_key_for_safe_ops(&mut self, no_key_for_safe_ops: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.no_key_for_safe_ops = no_key_for_safe_ops;
        self.persist_flag(API_NO_KEY_FOR_SAFE_OPS, no_key_for_safe_ops)
    }

    /// Whether permission errors are reported to callers.
    #[must_use]
    pub const fn is_report_perm_errors(&self) -> bool {
        self.report_perm_errors
    }

    /// Toggle reporting of permission errors.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_report_perm_errors(&mut self, report_perm_errors: bool) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.report_perm_errors = report_perm_errors;
        self.persist_flag(API_REPORT_PERM_ERRORS, report_perm_errors)
    }

    /// Validity window for request nonces. Fixed at five minutes.
    #[must_use]
    pub const fn nonce_time_to_live(&self) -> Duration {
        NONCE_TIME_TO_LIVE
    }

    /// Public view of the authentication key.
    ///
    /// Returns the empty string while key authentication is disabled. The
    /// real key is guaranteed non-empty once requested: when still unset it
    /// is generated here, and written through the store when one is attached
    /// (a failed flush is logged, not surfaced, and the key stays usable in
    /// memory).
    #[must_use]
    pub fn key(&mut self) -> &str {
        if self.disable_key {
            return "";
        }
        if self.real_key.is_empty() {
            self.real_key = generate_api_key();
            if self.store.is_some() {
                if let Err(err) = self.persist_key() {
                    warn!(error = %err, "failed to persist freshly generated API key");
                }
            }
        }
        &self.real_key
    }

    /// Internal view of the authentication key, regardless of the disable
    /// switch. Callers hold the actual secret; do not expose it to ordinary
    /// API clients.
    #[must_use]
    pub fn real_key(&self) -> &str {
        &self.real_key
    }

    /// Set the authentication key and persist it.
    ///
    /// `None` or an empty value requests a freshly generated key; any other
    /// value is adopted verbatim, without format validation.
    ///
    /// # Errors
    /// [`ConfigError::NotAttached`] before [`ApiOptions::load`];
    /// [`ConfigError::Persistence`] when the store flush fails.
    pub fn set_key(&mut self, key: Option<&str>) -> ConfigResult<()> {
        self.ensure_attached()?;
        self.real_key = match key {
            Some(value) if !value.is_empty() => value.to_owned(),
            _ => generate_api_key(),
        };
        self.persist_key()
    }

    fn ensure_attached(&self) -> ConfigResult<()> {
        if self.store.is_some() {
            Ok(())
        } else {
            Err(ConfigError::NotAttached)
        }
    }

    fn persist_flag(&self, key: &str, value: bool) -> ConfigResult<()> {
        let store = self.store.as_ref().ok_or(ConfigError::NotAttached)?;
        let mut guard = store.lock().expect("property store mutex poisoned");
        guard.set_bool(key, value);
        guard
            .save()
            .map_err(|source| ConfigError::Persistence { source })
    }

    fn persist_key(&self) -> ConfigResult<()> {
        let store = self.store.as_ref().ok_or(ConfigError::NotAttached)?;
        let mut guard = store.lock().expect("property store mutex poisoned");
        guard.set_string(API_KEY, &self.real_key);
        guard
            .save()
            .map_err(|source| ConfigError::Persistence { source })
    }
}

/// Read a persisted flag, falling back to its built-in default when the value
/// is absent or does not parse as a boolean.
fn bool_property(store: &dyn PropertyStore, key: &str, default: bool) -> bool {
    match store.get_bool(key) {
        Ok(value) => value,
        Err(err) => {
            debug!(key, error = %err, "using built-in default for property");
            default
        }
    }
}

/// Generate a fresh authentication key from the thread-local CSPRNG.
fn generate_api_key() -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(GENERATED_KEY_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_printable_and_sized_for_auth() {
        let key = generate_api_key();
        assert_eq!(key.len(), GENERATED_KEY_LEN);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_keys_do_not_repeat() {
        let first = generate_api_key();
        let second = generate_api_key();
        assert_ne!(first, second);
    }
}
