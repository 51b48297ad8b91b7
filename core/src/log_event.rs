use std::fmt;

use serde_json::{Map, Value};

/// Text frame a viewer sends right after the log stream opens.
pub const JOIN_FRAME: &str = "join:client";

/// One line of the server log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Entry {
        time: String,
        level: String,
        message: String,
    },
    /// The server (or this decoder) could not split the record into fields.
    Malformed(String),
}

impl LogEvent {
    pub fn entry(time: &str, level: &str, message: &str) -> Self {
        LogEvent::Entry {
            time: time.to_string(),
            level: level.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, LogEvent::Malformed(_))
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::Entry {
                time,
                level,
                message,
            } => write!(f, "{time} {level} {message}"),
            LogEvent::Malformed(raw) => write!(f, "[malformed] {raw}"),
        }
    }
}

/// Decodes a single text frame. Never fails: anything that is not a JSON
/// object comes back as [`LogEvent::Malformed`] carrying the raw text.
pub fn decode_log_frame(raw: &str) -> LogEvent {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(raw) else {
        return LogEvent::Malformed(raw.to_string());
    };
    if let Some(malformed) = fields.get("malformed").filter(|value| is_truthy(value)) {
        return LogEvent::Malformed(value_text(malformed));
    }
    LogEvent::Entry {
        time: field_text(&fields, "time"),
        level: field_text(&fields, "level"),
        message: field_text(&fields, "message"),
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
