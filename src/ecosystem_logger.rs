//! Per-component logger with local-first, remote best-effort delivery
//!
//! Every call writes one line to the component's local sink, then mirrors a
//! structured [`LogRecord`] to the remote store when a handle is present.
//! Remote failures are absorbed: the caller only ever sees validation errors.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::{LoggerError, LoggerResult, RemoteStoreError};
use crate::log_record::{monotonic_now, Level, LogContext, LogRecord};
use crate::log_sink::{format_line, SharedSink, SinkRegistry, StdoutSink};
use crate::remote_store::{RemoteHandle, LOG_COLLECTION};

pub struct EcosystemLogger {
    component_name: String,
    agent_id: Option<String>,
    sink: SharedSink,
    remote: Option<RemoteHandle>,
    // serializes remote appends issued through this instance
    remote_lock: Mutex<()>,
}

impl fmt::Debug for EcosystemLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcosystemLogger")
            .field("component_name", &self.component_name)
            .field("agent_id", &self.agent_id)
            .field("has_remote_store", &self.remote.is_some())
            .finish()
    }
}

impl EcosystemLogger {
    /// Logger writing to stdout through the process-wide sink registry
    pub fn new(
        component_name: impl Into<String>,
        agent_id: Option<String>,
        remote: Option<RemoteHandle>,
    ) -> LoggerResult<Self> {
        let mut builder = Self::builder(component_name);
        builder.agent_id = agent_id;
        builder.remote = remote;
        builder.build()
    }

    pub fn builder(component_name: impl Into<String>) -> EcosystemLoggerBuilder {
        EcosystemLoggerBuilder {
            component_name: component_name.into(),
            agent_id: None,
            remote: None,
            sink: None,
        }
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn has_remote_store(&self) -> bool {
        self.remote.is_some()
    }

    pub fn info(&self, message: &str, context: LogContext) -> LoggerResult<()> {
        self.log(Level::Info, message, context)
    }

    pub fn warning(&self, message: &str, context: LogContext) -> LoggerResult<()> {
        self.log(Level::Warning, message, context)
    }

    /// Log at ERROR. The cause's text is appended to the local line and
    /// stored as `error_details` on the remote record.
    pub fn error(
        &self,
        message: &str,
        cause: Option<&dyn fmt::Display>,
        context: LogContext,
    ) -> LoggerResult<()> {
        let details = cause.map(|c| c.to_string());
        let record = LogRecord::error(
            self.component_name.as_str(),
            message,
            details.clone(),
            self.resolve_context(context),
        )?;

        let text = match &details {
            Some(details) => format!("{message}: {details}"),
            None => message.to_string(),
        };
        self.emit(&record, &text);
        Ok(())
    }

    pub fn critical(&self, message: &str, context: LogContext) -> LoggerResult<()> {
        self.log(Level::Critical, message, context)
    }

    /// Log at a level chosen at runtime
    pub fn log(&self, level: Level, message: &str, context: LogContext) -> LoggerResult<()> {
        if level == Level::Error {
            return self.error(message, None, context);
        }

        let record = LogRecord::new(
            level,
            self.component_name.as_str(),
            message,
            self.resolve_context(context),
        )?;
        self.emit(&record, message);
        Ok(())
    }

    fn resolve_context(&self, context: LogContext) -> LogContext {
        LogContext {
            agent_id: context.agent_id.or_else(|| self.agent_id.clone()),
            ..context
        }
    }

    fn emit(&self, record: &LogRecord, text: &str) {
        let line = format_line(record.timestamp(), &self.component_name, record.level(), text);
        self.sink.write_line(&line);

        if let Err(e) = self.mirror(record) {
            self.note_delivery_failure(&e);
        }
    }

    fn mirror(&self, record: &LogRecord) -> Result<(), RemoteStoreError> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };

        let document = record.to_document().map_err(|e| match e {
            LoggerError::Serialization(source) => RemoteStoreError::Serialization(source),
            other => RemoteStoreError::rejected(other.to_string()),
        })?;

        let _guard = self.remote_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // a panicking store is reported like any other delivery failure
        panic::catch_unwind(AssertUnwindSafe(|| remote.append(LOG_COLLECTION, &document)))
            .unwrap_or_else(|payload| {
                Err(RemoteStoreError::rejected(format!(
                    "remote store panicked: {}",
                    panic_message(payload.as_ref())
                )))
            })
    }

    fn note_delivery_failure(&self, error: &RemoteStoreError) {
        let line = format_line(
            monotonic_now(),
            &self.component_name,
            Level::Warning,
            &format!("remote log delivery failed: {error}"),
        );
        self.sink.write_line(&line);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        *text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "unknown panic"
    }
}

pub struct EcosystemLoggerBuilder {
    component_name: String,
    agent_id: Option<String>,
    remote: Option<RemoteHandle>,
    sink: Option<SharedSink>,
}

impl EcosystemLoggerBuilder {
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn remote_store(mut self, remote: RemoteHandle) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Use an explicit sink instead of the process-wide stdout sink
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> LoggerResult<EcosystemLogger> {
        if self.component_name.trim().is_empty() {
            return Err(LoggerError::EmptyComponent);
        }

        let sink = match self.sink {
            Some(sink) => sink,
            None => SinkRegistry::global()
                .sink_for(&self.component_name, || Arc::new(StdoutSink) as SharedSink),
        };

        Ok(EcosystemLogger {
            component_name: self.component_name,
            agent_id: self.agent_id,
            sink,
            remote: self.remote,
            remote_lock: Mutex::new(()),
        })
    }
}
