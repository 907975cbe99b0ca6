//! Record serialization: txt, json, and raw wire formats.
//!
//! Each serializer turns one [`Record`] into one self-contained byte buffer.
//! Non-raw buffers end with exactly one newline so the writer can append
//! them atomically; raw buffers carry no framing at all. Record flags
//! override the configured format: [`RecordFlags::RAW`] forces raw
//! rendering, [`RecordFlags::STRUCTURED_JSON`] forces json.

use chrono::{DateTime, Local};
use serde_json::json;

use crate::core::config::{FormatConfig, LogFormat};
use crate::record::{Record, RecordFlags, Value};

/// Converts a record into its wire form. Implementations are stateless and
/// shared; the processor picks one per record from the configured format
/// and the record's flags.
pub trait Serializer: Send + Sync {
    /// Render `record` into a byte buffer. For non-raw serializers the
    /// buffer ends with a newline; the caller appends nothing.
    fn serialize(&self, opts: &FormatConfig, record: &Record) -> Vec<u8>;
}

/// Human-readable single-line format.
pub struct TextSerializer;

/// One JSON object per line.
pub struct JsonSerializer;

/// Arguments only, no metadata, no trailing newline.
pub struct RawSerializer;

static TEXT: TextSerializer = TextSerializer;
static JSON: JsonSerializer = JsonSerializer;
static RAW: RawSerializer = RawSerializer;

/// Resolve the serializer for a record, honoring per-record flag overrides.
#[must_use]
pub fn for_record(opts: &FormatConfig, record: &Record) -> &'static dyn Serializer {
    if record.flags.contains(RecordFlags::RAW) {
        return &RAW;
    }
    if record.flags.contains(RecordFlags::STRUCTURED_JSON) {
        return &JSON;
    }
    match opts.format {
        LogFormat::Txt => &TEXT,
        LogFormat::Json => &JSON,
        LogFormat::Raw => &RAW,
    }
}

/// Render a record with the configured format and the record's flags.
#[must_use]
pub fn render(opts: &FormatConfig, record: &Record) -> Vec<u8> {
    for_record(opts, record).serialize(opts, record)
}

// ──────────────────── txt ────────────────────

impl Serializer for TextSerializer {
    fn serialize(&self, opts: &FormatConfig, record: &Record) -> Vec<u8> {
        let mut line = String::with_capacity(64);

        if record.flags.contains(RecordFlags::SHOW_TIMESTAMP) {
            line.push_str(&format_time(record.timestamp, &opts.timestamp_format));
            line.push(' ');
        }
        if record.flags.contains(RecordFlags::SHOW_LEVEL) {
            line.push_str(record.level.as_str());
            line.push(' ');
        }
        if let Some(trace) = record.trace.as_deref()
            && !trace.is_empty()
        {
            line.push('[');
            line.push_str(trace);
            line.push_str("] ");
        }

        let mut first = true;
        for arg in &record.args {
            if !first {
                line.push(' ');
            }
            first = false;
            line.push_str(&value_text(arg, opts));
        }

        line.push('\n');
        line.into_bytes()
    }
}

// ──────────────────── json ────────────────────

impl Serializer for JsonSerializer {
    fn serialize(&self, opts: &FormatConfig, record: &Record) -> Vec<u8> {
        let mut obj = serde_json::Map::new();
        if record.flags.contains(RecordFlags::SHOW_TIMESTAMP) {
            obj.insert(
                "time".to_string(),
                json!(format_time(record.timestamp, &opts.timestamp_format)),
            );
        }
        if record.flags.contains(RecordFlags::SHOW_LEVEL) {
            obj.insert("level".to_string(), json!(record.level.as_str()));
        }
        if let Some(trace) = record.trace.as_deref()
            && !trace.is_empty()
        {
            obj.insert("trace".to_string(), json!(trace));
        }
        let fields: Vec<serde_json::Value> =
            record.args.iter().map(|v| value_json(v, opts)).collect();
        obj.insert("fields".to_string(), serde_json::Value::Array(fields));

        // Map/array serialization of plain values cannot fail.
        let mut bytes = serde_json::to_vec(&serde_json::Value::Object(obj)).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

// ──────────────────── raw ────────────────────

impl Serializer for RawSerializer {
    fn serialize(&self, opts: &FormatConfig, record: &Record) -> Vec<u8> {
        let mut out = Vec::new();
        for (idx, arg) in record.args.iter().enumerate() {
            if idx > 0 {
                out.push(b' ');
            }
            match arg {
                Value::Bytes(b) => out.extend_from_slice(b),
                other => out.extend_from_slice(value_text(other, opts).as_bytes()),
            }
        }
        out
    }
}

// ──────────────────── value rendering ────────────────────

fn format_time(ts: DateTime<Local>, fmt: &str) -> String {
    ts.format(fmt).to_string()
}

fn value_text(value: &Value, opts: &FormatConfig) -> String {
    match value {
        Value::String(s) => {
            if opts.sanitization {
                sanitize(s)
            } else {
                s.clone()
            }
        }
        Value::Bytes(b) => hex_string(b),
        Value::Signed(v) => v.to_string(),
        Value::Unsigned(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Null => "null".to_string(),
        Value::Time(t) => format_time(*t, &opts.timestamp_format),
    }
}

fn value_json(value: &Value, opts: &FormatConfig) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Bytes(b) => json!(hex_string(b)),
        Value::Signed(v) => json!(v),
        Value::Unsigned(v) => json!(v),
        Value::Float(v) => {
            // NaN/inf have no JSON representation.
            serde_json::Number::from_f64(*v).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Value::Bool(v) => json!(v),
        Value::Null => serde_json::Value::Null,
        Value::Time(t) => json!(format_time(*t, &opts.timestamp_format)),
    }
}

/// Replace control characters with spaces so one record stays one line.
fn sanitize(s: &str) -> String {
    if !s.chars().any(char::is_control) {
        return s.to_string();
    }
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

// ──────────────────── tests ────────────────────
