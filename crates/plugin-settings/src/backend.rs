use async_trait::async_trait;

use crate::{BackendError, EnablementMap};

/// Remote home of the plugin-settings record.
///
/// There is exactly one global record. `persist` replaces it wholesale; there
/// is no versioning, so concurrent writers overwrite each other.
#[async_trait]
pub trait SettingsBackend: Send + Sync + 'static {
    /// Read the whole record.
    async fn fetch(&self) -> Result<EnablementMap, BackendError>;

    /// Replace the whole record.
    async fn persist(&self, map: &EnablementMap) -> Result<(), BackendError>;
}

#[cfg(feature = "http-backend")]
pub mod http_impl {
    //! `SettingsBackend` over the REST API using the `settings-client` crate.

    use super::*;

    use settings_client::SettingsClient;

    pub struct HttpSettingsBackend {
        client: SettingsClient,
    }

    impl HttpSettingsBackend {
        pub fn new(client: SettingsClient) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl SettingsBackend for HttpSettingsBackend {
        async fn fetch(&self) -> Result<EnablementMap, BackendError> {
            let record = self.client.get_plugin_settings().await?;
            EnablementMap::from_wire(&record)
        }

        async fn persist(&self, map: &EnablementMap) -> Result<(), BackendError> {
            self.client.put_plugin_settings(map).await?;
            Ok(())
        }
    }
}
