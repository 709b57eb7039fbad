//! Structured log records mirrored to the remote store
//!
//! A `LogRecord` is built once per log call, serialized once into a
//! [`Document`] for remote delivery, and then dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LoggerError, LoggerResult};

/// Serialized form of a record: a flat map of field name to scalar
pub type Document = serde_json::Map<String, Value>;

/// Severity of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Info, Level::Warning, Level::Error, Level::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(input: &str) -> Result<Level, Self::Err> {
        match input.trim().to_uppercase().as_str() {
            "INFO" => Ok(Level::Info),
            "WARNING" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            _ => Err(LoggerError::InvalidLevel(input.to_string())),
        }
    }
}

/// Correlation identifiers supplied by the caller of a log call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub agent_id: Option<String>,
    pub strategy_id: Option<String>,
    pub trade_id: Option<String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_strategy(mut self, strategy_id: impl Into<String>) -> Self {
        self.strategy_id = Some(strategy_id.into());
        self
    }

    pub fn with_trade(mut self, trade_id: impl Into<String>) -> Self {
        self.trade_id = Some(trade_id.into());
        self
    }

    /// Build a context from dynamic key/value pairs.
    ///
    /// Keys outside `agent_id`, `strategy_id` and `trade_id` are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> LoggerResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut context = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "agent_id" => &mut context.agent_id,
                "strategy_id" => &mut context.strategy_id,
                "trade_id" => &mut context.trade_id,
                other => return Err(LoggerError::UnknownContextField(other.to_string())),
            };
            *slot = Some(value.into());
        }
        Ok(context)
    }

    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.strategy_id.is_none() && self.trade_id.is_none()
    }
}

static LAST_ISSUED_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current UTC time, never earlier than any timestamp previously issued in
/// this process. Truncated to microseconds so it survives serialization.
pub fn monotonic_now() -> DateTime<Utc> {
    let now = Utc::now();
    let micros = now.timestamp_micros();
    let previous = LAST_ISSUED_MICROS.fetch_max(micros, Ordering::AcqRel);
    DateTime::<Utc>::from_timestamp_micros(previous.max(micros)).unwrap_or(now)
}

mod rfc3339_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Immutable structured record of one log call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct LogRecord {
    #[serde(serialize_with = "rfc3339_micros::serialize")]
    timestamp: DateTime<Utc>,
    level: Level,
    component: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trade_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<String>,
}

#[derive(Deserialize)]
struct RecordFields {
    #[serde(with = "rfc3339_micros")]
    timestamp: DateTime<Utc>,
    level: Level,
    component: String,
    message: String,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    strategy_id: Option<String>,
    #[serde(default)]
    trade_id: Option<String>,
    #[serde(default)]
    error_details: Option<String>,
}

impl TryFrom<RecordFields> for LogRecord {
    type Error = LoggerError;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        validate_identity(&fields.component, &fields.message)?;
        if fields.error_details.is_some() && fields.level != Level::Error {
            return Err(LoggerError::invalid_document(
                "error_details",
                format!("only allowed on ERROR records, found {}", fields.level),
            ));
        }

        Ok(Self {
            timestamp: fields.timestamp,
            level: fields.level,
            component: fields.component,
            message: fields.message,
            agent_id: fields.agent_id,
            strategy_id: fields.strategy_id,
            trade_id: fields.trade_id,
            error_details: fields.error_details,
        })
    }
}

fn validate_identity(component: &str, message: &str) -> LoggerResult<()> {
    if component.trim().is_empty() {
        return Err(LoggerError::EmptyComponent);
    }
    if message.trim().is_empty() {
        return Err(LoggerError::EmptyMessage);
    }
    Ok(())
}

impl LogRecord {
    /// Build a record stamped with the current time
    pub fn new(
        level: Level,
        component: impl Into<String>,
        message: impl Into<String>,
        context: LogContext,
    ) -> LoggerResult<Self> {
        let component = component.into();
        let message = message.into();
        validate_identity(&component, &message)?;

        Ok(Self {
            timestamp: monotonic_now(),
            level,
            component,
            message,
            agent_id: context.agent_id,
            strategy_id: context.strategy_id,
            trade_id: context.trade_id,
            error_details: None,
        })
    }

    /// Build an ERROR record carrying the text of its cause, if any
    pub fn error(
        component: impl Into<String>,
        message: impl Into<String>,
        error_details: Option<String>,
        context: LogContext,
    ) -> LoggerResult<Self> {
        let mut record = Self::new(Level::Error, component, message, context)?;
        record.error_details = error_details;
        Ok(record)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn strategy_id(&self) -> Option<&str> {
        self.strategy_id.as_deref()
    }

    pub fn trade_id(&self) -> Option<&str> {
        self.trade_id.as_deref()
    }

    pub fn error_details(&self) -> Option<&str> {
        self.error_details.as_deref()
    }

    /// Serialize into the document shape appended to the remote store.
    /// Absent optional fields are omitted rather than written as null.
    pub fn to_document(&self) -> LoggerResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(LoggerError::invalid_document(
                "record",
                format!("expected an object, got {other}"),
            )),
        }
    }

    /// Rebuild a record from a document produced by [`LogRecord::to_document`]
    pub fn from_document(document: &Document) -> LoggerResult<Self> {
        Ok(serde_json::from_value(Value::Object(document.clone()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!(" Critical ".parse::<Level>().unwrap(), Level::Critical);
        assert!(matches!(
            "TRACE".parse::<Level>(),
            Err(LoggerError::InvalidLevel(level)) if level == "TRACE"
        ));
        assert!("warn".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_names_match_wire_format() {
        for level in Level::ALL {
            let wire = serde_json::to_value(level).unwrap();
            assert_eq!(wire, Value::String(level.as_str().to_string()));
        }
    }

    #[test]
    fn test_empty_message_rejected() {
        let err = LogRecord::new(Level::Info, "risk", "", LogContext::new()).unwrap_err();
        assert!(matches!(err, LoggerError::EmptyMessage));

        let err = LogRecord::new(Level::Info, "risk", "   ", LogContext::new()).unwrap_err();
        assert!(matches!(err, LoggerError::EmptyMessage));
    }

    #[test]
    fn test_empty_component_rejected() {
        let err = LogRecord::new(Level::Info, "", "hello", LogContext::new()).unwrap_err();
        assert!(matches!(err, LoggerError::EmptyComponent));
    }

    #[test]
    fn test_document_omits_absent_fields() {
        let record = LogRecord::new(
            Level::Warning,
            "exec",
            "slippage above threshold",
            LogContext::new().with_strategy("S-7"),
        )
        .unwrap();

        let doc = record.to_document().unwrap();
        assert_eq!(doc["level"], "WARNING");
        assert_eq!(doc["component"], "exec");
        assert_eq!(doc["message"], "slippage above threshold");
        assert_eq!(doc["strategy_id"], "S-7");
        assert!(!doc.contains_key("agent_id"));
        assert!(!doc.contains_key("trade_id"));
        assert!(!doc.contains_key("error_details"));
        assert_eq!(doc["timestamp"], record.timestamp_string());
        assert!(doc["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_document_round_trip() {
        let record = LogRecord::error(
            "exec",
            "order rejected",
            Some("value out of range".into()),
            LogContext::new().with_agent("A-1").with_trade("T-42"),
        )
        .unwrap();

        let doc = record.to_document().unwrap();
        let rebuilt = LogRecord::from_document(&doc).unwrap();
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn test_from_document_rejects_unknown_level() {
        let mut doc = LogRecord::new(Level::Info, "risk", "ok", LogContext::new())
            .unwrap()
            .to_document()
            .unwrap();
        doc.insert("level".into(), Value::String("DEBUG".into()));

        assert!(matches!(
            LogRecord::from_document(&doc),
            Err(LoggerError::Serialization(_))
        ));
    }

    #[test]
    fn test_from_document_rejects_error_details_outside_error() {
        let mut doc = LogRecord::new(Level::Info, "risk", "ok", LogContext::new())
            .unwrap()
            .to_document()
            .unwrap();
        doc.insert("error_details".into(), Value::String("boom".into()));

        assert!(LogRecord::from_document(&doc).is_err());
    }

    #[test]
    fn test_context_from_pairs() {
        let ctx = LogContext::from_pairs([("strategy_id", "S-1"), ("trade_id", "T-9")]).unwrap();
        assert_eq!(ctx.strategy_id.as_deref(), Some("S-1"));
        assert_eq!(ctx.trade_id.as_deref(), Some("T-9"));
        assert!(ctx.agent_id.is_none());

        let err = LogContext::from_pairs([("order_id", "O-1")]).unwrap_err();
        assert!(matches!(err, LoggerError::UnknownContextField(key) if key == "order_id"));
    }

    #[test]
    fn test_monotonic_now_never_decreases() {
        let mut previous = monotonic_now();
        for _ in 0..1_000 {
            let next = monotonic_now();
            assert!(next >= previous);
            previous = next;
        }
    }
}
