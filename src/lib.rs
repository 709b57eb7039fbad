//! Library root for the `ecosystem_log` crate
//! Structured, local-first logging for independently running trading agents

// Core error handling
pub mod errors;

// Record model & local output
pub mod log_record;
pub mod log_sink;

// Remote mirroring
pub mod firestore_store;
pub mod remote_store;

// The per-component logger
pub mod ecosystem_logger;

// Configuration & startup
pub mod config;
pub mod config_loader;
pub mod config_provider;

// Diagnostics & CLI
pub mod cli;
pub mod telemetry;

pub use config::{EcosystemConfig, FirebaseConfig, TradingMode};
pub use config_provider::ConfigProvider;
pub use ecosystem_logger::{EcosystemLogger, EcosystemLoggerBuilder};
pub use errors::{ConfigError, LoggerError, LoggerResult, RemoteStoreError};
pub use log_record::{Document, Level, LogContext, LogRecord};
pub use log_sink::{LocalSink, MemorySink, SharedSink, SinkRegistry};
pub use remote_store::{MemoryStore, RemoteHandle, RemoteStore, LOG_COLLECTION};
