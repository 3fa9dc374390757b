//! Ensure-exists provisioning of the remote index.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::IndexConfig;
use crate::error::{IngestError, Result};
use crate::index::{CreateIndexRequest, IndexHandle, IndexService};

/// Resolves an [`IndexConfig`] to a usable [`IndexHandle`].
///
/// The existence check and the creation are two separate remote calls, so
/// another process can create the index in between. When creation reports
/// [`IngestError::IndexAlreadyExistsError`] the provisioner checks existence
/// once more and binds to the index that won the race. A second conflict is
/// returned to the caller.
#[derive(Clone)]
pub struct IndexProvisioner {
    service: Arc<dyn IndexService>,
}

impl IndexProvisioner {
    /// Create a provisioner over the given service.
    pub fn new(service: Arc<dyn IndexService>) -> Self {
        Self { service }
    }

    /// Create the index if it is absent, otherwise open it by host.
    ///
    /// # Errors
    ///
    /// - [`IngestError::MissingHostError`] if the index exists and
    ///   `config.host` is unset
    /// - [`IngestError::IndexAlreadyExistsError`] if creation conflicts twice
    /// - any remote failure from the service
    pub async fn ensure_index(&self, config: &IndexConfig) -> Result<Arc<dyn IndexHandle>> {
        config.validate()?;

        match self.provision_once(config).await {
            Err(IngestError::IndexAlreadyExistsError { index }) => {
                warn!(index = %index, "index was created concurrently, retrying existence check");
                self.provision_once(config).await
            }
            other => other,
        }
    }

    async fn provision_once(&self, config: &IndexConfig) -> Result<Arc<dyn IndexHandle>> {
        let exists = self.service.has_index(&config.name).await.inspect_err(|e| {
            error!(index = %config.name, error = %e, "index existence check failed");
        })?;

        if exists {
            let host = config
                .host
                .as_deref()
                .filter(|host| !host.is_empty())
                .ok_or_else(|| IngestError::MissingHostError { index: config.name.clone() })?;
            info!(index = %config.name, host, "using existing index");
            return self.service.open_index(host);
        }

        info!(index = %config.name, dimension = config.dimension, "creating index");
        let request = CreateIndexRequest::from(config);
        let handle = self.service.create_index(&request).await.inspect_err(|e| {
            if !e.is_recoverable() {
                error!(index = %config.name, error = %e, "index creation failed");
            }
        })?;
        info!(index = %config.name, host = handle.host(), "created index");
        Ok(handle)
    }
}

impl std::fmt::Debug for IndexProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexProvisioner").finish_non_exhaustive()
    }
}
