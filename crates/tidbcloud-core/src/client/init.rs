//! One-time transport construction

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{ApiClient, ApiClientBuilder, Credentials};
use crate::error::Result;

/// Builds the shared [`ApiClient`] at most once.
///
/// Repeated or concurrent calls after the first successful one return the
/// same handle without reconstructing it. A failed construction leaves the
/// cell empty so a later call may try again.
#[derive(Debug, Default)]
pub struct TransportInitializer {
    template: ApiClientBuilder,
    cell: OnceCell<Arc<ApiClient>>,
}

impl TransportInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `template` (base URL, timeout, user agent) for the one construction
    pub fn with_builder(template: ApiClientBuilder) -> Self {
        Self {
            template,
            cell: OnceCell::new(),
        }
    }

    /// Construct the client on first call; later calls are no-ops
    pub async fn initialize(&self, credentials: &Credentials) -> Result<Arc<ApiClient>> {
        let template = self.template.clone();
        let credentials = credentials.clone();
        self.initialize_with(move || template.credentials(credentials).build())
            .await
    }

    /// Like [`initialize`](Self::initialize) with a caller-supplied constructor
    pub async fn initialize_with<F>(&self, build: F) -> Result<Arc<ApiClient>>
    where
        F: FnOnce() -> Result<ApiClient>,
    {
        if let Some(client) = self.cell.get() {
            debug!("transport already initialized");
            return Ok(Arc::clone(client));
        }

        let client = self
            .cell
            .get_or_try_init(move || async move {
                info!("initializing HTTP client");
                build().map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// The shared client, if it has been constructed
    pub fn get(&self) -> Option<Arc<ApiClient>> {
        self.cell.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
