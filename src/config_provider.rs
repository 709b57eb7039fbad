//! Startup collaborator that resolves the remote log store
//!
//! `ConfigProvider` is built once per process. It owns the loaded
//! [`EcosystemConfig`], the optional remote store handle, and the sinks
//! handed to the loggers it creates. Handle acquisition never fails the
//! caller: every problem degrades to local-only logging.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::EcosystemConfig;
use crate::config_loader::load_config;
use crate::ecosystem_logger::EcosystemLogger;
use crate::errors::{ConfigResult, LoggerResult};
use crate::firestore_store::FirestoreStore;
use crate::log_sink::{FileSink, SharedSink, SinkRegistry, StdoutSink, TeeSink};
use crate::remote_store::RemoteHandle;

pub struct ConfigProvider {
    config: EcosystemConfig,
    remote: Option<RemoteHandle>,
    sinks: SinkRegistry,
    file_sink: Option<SharedSink>,
}

impl ConfigProvider {
    /// Load configuration from file and environment, then resolve the handle
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self::new(load_config()?))
    }

    pub fn new(config: EcosystemConfig) -> Self {
        let remote = connect_remote_store(&config);
        Self::with_remote_store(config, remote)
    }

    /// Use an already-resolved handle instead of connecting
    pub fn with_remote_store(config: EcosystemConfig, remote: Option<RemoteHandle>) -> Self {
        let file_sink = config.log_file.as_ref().and_then(|path| match FileSink::open(path) {
            Ok(sink) => Some(Arc::new(sink) as SharedSink),
            Err(e) => {
                error!("Failed to open log file {}: {}", path.display(), e);
                None
            }
        });

        Self {
            config,
            remote,
            sinks: SinkRegistry::new(),
            file_sink,
        }
    }

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn remote_store_handle(&self) -> Option<RemoteHandle> {
        self.remote.clone()
    }

    pub fn has_remote_store(&self) -> bool {
        self.remote.is_some()
    }

    /// Build a logger for `component` wired to this provider's sink and handle
    pub fn logger(
        &self,
        component: &str,
        agent_id: Option<String>,
    ) -> LoggerResult<EcosystemLogger> {
        let sink = self.sinks.sink_for(component, || match &self.file_sink {
            Some(file) => Arc::new(TeeSink::new(vec![
                Arc::new(StdoutSink) as SharedSink,
                file.clone(),
            ])) as SharedSink,
            None => Arc::new(StdoutSink) as SharedSink,
        });

        let mut builder = EcosystemLogger::builder(component).sink(sink);
        if let Some(agent_id) = agent_id {
            builder = builder.agent_id(agent_id);
        }
        if let Some(remote) = &self.remote {
            builder = builder.remote_store(remote.clone());
        }
        builder.build()
    }
}

/// Resolve the remote store handle from configuration, or `None`.
///
/// The emulator host wins over credentials. Otherwise a complete
/// service-account descriptor plus an access token is required.
pub fn connect_remote_store(config: &EcosystemConfig) -> Option<RemoteHandle> {
    let firebase = &config.firebase;

    if !firebase.has_project() {
        warn!("Firebase credentials not found. Running in local mode.");
        return None;
    }

    let store = if let Some(host) = firebase.emulator_host() {
        FirestoreStore::with_emulator(host, &firebase.project_id, config.remote_timeout())
    } else if !firebase.is_configured() {
        error!("Firebase credentials incomplete for project {}", firebase.project_id);
        return None;
    } else if let Some(token) = firebase.access_token() {
        FirestoreStore::new(&firebase.project_id, token, config.remote_timeout())
    } else {
        error!(
            "No Firebase access token available for {}; set FIREBASE_ACCESS_TOKEN",
            firebase.client_email
        );
        return None;
    };

    match store {
        Ok(store) => {
            info!("Firestore log store initialized for project {}", store.project_id());
            Some(Arc::new(store) as RemoteHandle)
        }
        Err(e) => {
            error!("Failed to initialize Firestore: {}", e);
            None
        }
    }
}
