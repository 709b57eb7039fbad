// log_sink.rs
// Local, human-readable output for ecosystem log lines

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;

use crate::log_record::Level;

/// Destination for formatted local log lines.
///
/// Sinks are trusted: a write that cannot be accepted is a process-level
/// fault, so `write_line` has no error channel back to the logger.
pub trait LocalSink: Send + Sync {
    fn write_line(&self, line: &str);
}

pub type SharedSink = Arc<dyn LocalSink>;

/// Render a local line: `<timestamp> - <component> - <LEVEL> - <text>`
pub fn format_line(timestamp: DateTime<Utc>, component: &str, level: Level, text: &str) -> String {
    format!(
        "{} - {} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        component,
        level.as_str(),
        text
    )
}

/// Writes each line to stdout under the stdout lock
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LocalSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Appends lines to a file
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalSink for FileSink {
    fn write_line(&self, line: &str) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{line}") {
            tracing::error!("Failed to write log line to {}: {}", self.path.display(), e);
        }
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Fans a line out to several sinks in order
pub struct TeeSink {
    sinks: Vec<SharedSink>,
}

impl TeeSink {
    pub fn new(sinks: Vec<SharedSink>) -> Self {
        Self { sinks }
    }
}

impl LocalSink for TeeSink {
    fn write_line(&self, line: &str) {
        for sink in &self.sinks {
            sink.write_line(line);
        }
    }
}

lazy_static! {
    static ref GLOBAL_SINKS: SinkRegistry = SinkRegistry::new();
}

/// One shared sink per component name.
///
/// Asking for the same component twice returns the sink created the first
/// time, so a component instantiated twice never duplicates its output.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: Mutex<HashMap<String, SharedSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`crate::EcosystemLogger::new`]
    pub fn global() -> &'static SinkRegistry {
        &GLOBAL_SINKS
    }

    pub fn sink_for<F>(&self, component: &str, factory: F) -> SharedSink
    where
        F: FnOnce() -> SharedSink,
    {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        sinks
            .entry(component.to_string())
            .or_insert_with(factory)
            .clone()
    }

    pub fn contains(&self, component: &str) -> bool {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(component)
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
