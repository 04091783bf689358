//! Structured JSON logging through an injected sink.
//!
//! A [`Logger`] is handed to the components that log; nothing here is
//! process-global. Each record is one JSON object:
//! `{ts, run_id, seq, lvl, component, event, msg, <top keys>, data}`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Map, Value};

// =============================================================================
// Levels and domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Validation, // Parameter checks
    Session,    // Credentials, client construction
    Exec,       // Order submission and venue responses
    System,     // Startup, driver
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Validation => "validation",
            Domain::Session => "session",
            Domain::Exec => "exec",
            Domain::System => "system",
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination for finished log records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &Value);
}

/// Appends one JSON line per record to a file.
pub struct JsonlFileSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlFileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        Ok(Self { writer: Mutex::new(BufWriter::new(file)) })
    }
}

impl LogSink for JsonlFileSink {
    fn emit(&self, record: &Value) {
        if let Ok(mut w) = self.writer.lock() {
            let _ = writeln!(w, "{}", record);
            let _ = w.flush();
        }
    }
}

/// Keeps records in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Records whose `event` equals `event`.
    pub fn events(&self, event: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r.get("event").and_then(Value::as_str) == Some(event))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &Value) {
        if let Ok(mut r) = self.records.lock() {
            r.push(record.clone());
        }
    }
}

pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _record: &Value) {}
}

// =============================================================================
// Logger
// =============================================================================

#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    run_id: String,
    min_level: Level,
    seq: Arc<AtomicU64>,
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, min_level: Level) -> Self {
        Self {
            sink,
            run_id: format!("r-{}-{}", ts_epoch_ms(), process::id()),
            min_level,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn null() -> Self {
        Self::new(Arc::new(NullSink), Level::Fatal)
    }

    pub fn log(&self, level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
        if level < self.min_level {
            return;
        }
        let fields = sanitize_fields(fields);
        let (mut top, data) = split_fields(fields);

        let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
        let mut entry = Map::new();
        entry.insert("ts".to_string(), json!(ts_now()));
        entry.insert("run_id".to_string(), json!(self.run_id));
        entry.insert("seq".to_string(), json!(self.seq.fetch_add(1, Ordering::SeqCst)));
        entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
        entry.insert("component".to_string(), json!(domain.as_str()));
        entry.insert("event".to_string(), json!(event));
        entry.insert("msg".to_string(), msg);
        for (k, v) in top {
            entry.insert(k, v);
        }
        entry.insert("data".to_string(), Value::Object(data));

        self.sink.emit(&Value::Object(entry));
    }

    pub fn info(&self, domain: Domain, event: &str, fields: Map<String, Value>) {
        self.log(Level::Info, domain, event, fields);
    }

    pub fn warn(&self, domain: Domain, event: &str, fields: Map<String, Value>) {
        self.log(Level::Warn, domain, event, fields);
    }

    pub fn error(&self, domain: Domain, event: &str, fields: Map<String, Value>) {
        self.log(Level::Error, domain, event, fields);
    }
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in [
        "authorization",
        "Authorization",
        "X-MBX-APIKEY",
        "api_key",
        "api_secret",
        "signature",
    ] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["symbol", "order_id", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

// =============================================================================
// Helpers
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}
