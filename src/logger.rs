//! Structured log lines tagged with a per-instance request id.
//!
//! Every line is emitted through the `log` facade as `"<message> <json>"`,
//! where the JSON record carries the timestamp, service name, environment,
//! request id, level and optional payload.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{log, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::LoggerConfig;

const LOG_TARGET: &str = "mongo_facade";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Debug,
    Error,
    Trace,
}

impl Level {
    fn as_log_level(self) -> log::Level {
        match self {
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Debug => log::Level::Debug,
            Level::Error => log::Level::Error,
            Level::Trace => log::Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Debug => "debug",
            Level::Error => "error",
            Level::Trace => "trace",
        };
        f.write_str(name)
    }
}

/// One serialized log line
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord<'a> {
    /// Unix epoch milliseconds
    pub time: i64,
    pub service_name: &'a str,
    pub environment: &'a str,
    pub request_id: String,
    pub message: &'a str,
    pub level: Level,
    pub log_data: Option<&'a Value>,
}

#[derive(Debug)]
pub struct LoggerClient {
    service_name: String,
    environment: String,
    request_id: RwLock<String>,
    enabled: bool,
    timers: DashMap<String, Instant>,
}

impl LoggerClient {
    pub fn new(service_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environment: environment.into(),
            request_id: RwLock::new(Uuid::new_v4().to_string()),
            enabled: true,
            timers: DashMap::new(),
        }
    }

    /// A logger that keeps request ids and timers but never writes a line
    pub fn silent(service_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(service_name, environment)
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        if config.enabled {
            Self::new(&config.service_name, &config.environment)
        } else {
            Self::silent(&config.service_name, &config.environment)
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_request_id(&self, id: impl Into<String>) {
        let mut request_id = self
            .request_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *request_id = id.into();
    }

    pub fn request_id(&self) -> String {
        self.request_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn record<'a>(
        &'a self,
        message: &'a str,
        level: Level,
        log_data: Option<&'a Value>,
    ) -> LogRecord<'a> {
        LogRecord {
            time: Utc::now().timestamp_millis(),
            service_name: &self.service_name,
            environment: &self.environment,
            request_id: self.request_id(),
            message,
            level,
            log_data,
        }
    }

    pub fn info(&self, message: &str, data: Option<Value>) {
        self.emit(Level::Info, message, data);
    }

    pub fn warn(&self, message: &str, data: Option<Value>) {
        self.emit(Level::Warn, message, data);
    }

    pub fn error(&self, message: &str, data: Option<Value>) {
        self.emit(Level::Error, message, data);
    }

    pub fn debug(&self, message: &str, data: Option<Value>) {
        self.emit(Level::Debug, message, data);
    }

    pub fn trace(&self, message: &str, data: Option<Value>) {
        self.emit(Level::Trace, message, data);
    }

    /// Start a timer under `label`. A running timer with the same label is kept.
    pub fn time(&self, label: &str) {
        match self.timers.entry(label.to_string()) {
            Entry::Occupied(_) => {
                if self.enabled {
                    warn!(target: LOG_TARGET, "Timer '{}' already exists", label);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
            }
        }
    }

    /// Stop the timer under `label` and report the elapsed time
    pub fn time_end(&self, label: &str) -> Option<Duration> {
        let Some((_, started)) = self.timers.remove(label) else {
            if self.enabled {
                warn!(target: LOG_TARGET, "Timer '{}' does not exist", label);
            }
            return None;
        };

        let elapsed = started.elapsed();
        if self.enabled {
            log!(
                target: LOG_TARGET,
                log::Level::Info,
                "{}: {:.3}ms",
                label,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        Some(elapsed)
    }

    /// Whether a line at `level` would actually be written
    pub fn enabled_for(&self, level: Level) -> bool {
        self.enabled && log::log_enabled!(target: LOG_TARGET, level.as_log_level())
    }

    fn emit(&self, level: Level, message: &str, data: Option<Value>) {
        if !self.enabled_for(level) {
            return;
        }

        let record = self.record(message, level, data.as_ref());
        match serde_json::to_string(&record) {
            Ok(json) => log!(target: LOG_TARGET, level.as_log_level(), "{} {}", message, json),
            Err(e) => log!(
                target: LOG_TARGET,
                level.as_log_level(),
                "{} (unserializable log record: {})",
                message,
                e
            ),
        }
    }
}
