//! Per-project plugin enablement, shared by every view and kept in sync with
//! the backend's global plugin-settings record.
//!
//! [`PluginEnablementStore`] owns the in-memory [`EnablementMap`] and writes the
//! whole record back through a [`SettingsBackend`] after each change. The
//! REST implementation lives in [`http_impl`] behind the `http-backend`
//! feature.

mod backend;
mod enablement;
mod error;
mod plugin;
mod store;

pub use backend::SettingsBackend;
pub use enablement::EnablementMap;
pub use error::{BackendError, StoreError};
pub use plugin::{EntityId, PluginId};
pub use store::PluginEnablementStore;

#[cfg(feature = "http-backend")]
pub use backend::http_impl;
