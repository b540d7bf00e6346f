//! Store loading and saving for a single CLI invocation.

use std::{path::PathBuf, sync::Arc, time::Duration};

use filekeep::{InMemory, OpContext, Storage, StorageConfig, Stores};

use crate::cli::GlobalArgs;

const STORE_FILE: &str = "filekeep.json";

/// The facade plus what is needed to write the store back.
pub struct Backend {
    pub storage: Storage,
    store: Arc<InMemory>,
    path: PathBuf,
    timeout: Option<Duration>,
}

impl Backend {
    /// Load the store and configuration named by the global arguments.
    pub async fn open(args: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir(args).join(STORE_FILE);

        let config = match &args.config {
            Some(config) => {
                tracing::info!("Loading configuration from {}", config.display());
                StorageConfig::load_from_file(config).await?
            }
            None => StorageConfig::default(),
        };

        let store = Arc::new(InMemory::load_from_file(&path).await?);
        tracing::debug!("Loaded store from {}", path.display());

        Ok(Self {
            storage: Storage::open(Stores::shared(store.clone()), config),
            store,
            path,
            timeout: args.timeout_ms.map(Duration::from_millis),
        })
    }

    /// Context for one operation, carrying `--timeout-ms` if given.
    pub fn context(&self) -> OpContext {
        match self.timeout {
            Some(timeout) => OpContext::new().with_timeout(timeout),
            None => OpContext::new(),
        }
    }

    /// Write the store back to the data directory.
    pub async fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.store.save_to_file(&self.path).await?;
        tracing::debug!("Saved store to {}", self.path.display());
        Ok(())
    }
}

pub fn data_dir(args: &GlobalArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}
