use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};

/// Key of the field whose declared type is string but which the service may
/// send as any JSON value.
pub const VALUE_FIELD: &str = "value";

/// Rewrites every `value` entry that is not a string (or null) into its JSON
/// text, walking nested objects and arrays. All other entries are copied as-is.
pub fn stringify_value_fields(input: Value) -> Result<Value, serde_json::Error> {
    match input {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let repaired = if key == VALUE_FIELD {
                    stringify_leaf(value)?
                } else {
                    stringify_value_fields(value)?
                };
                out.insert(key, repaired);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(stringify_value_fields)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

fn stringify_leaf(value: Value) -> Result<Value, serde_json::Error> {
    match value {
        Value::String(_) | Value::Null => Ok(value),
        other => to_spaced_string(&other).map(Value::String),
    }
}

/// Serializes with `", "` and `": "` separators, e.g. `{"x": 1, "y": [1, 2]}`.
/// Non-ASCII characters are written as `\uXXXX` escapes (UTF-16 code units).
pub fn to_spaced_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    String::from_utf8(buf).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
