//! Document layers: JSON or TOML text decoded onto an existing record.
//!
//! A document is sparse. Each top-level key is matched against the record's
//! [`FieldTable`](crate::FieldTable) and decoded into that one field with
//! serde. Fields the document does not name are never read or written, so
//! documents compose with each other and with the other binding layers.
//!
//! - `null` resets the field to its type's `Default` (absent for `Nullable`,
//!   `None` for optional fields, zero for primitives).
//! - An object is merged onto the field's current value, so nested keys the
//!   document omits keep their values. The field's current value goes
//!   through `serde_json` in that case, which cannot carry non-finite floats.
//! - Keys that match no field are skipped (strict mode reports them).
//!
//! TOML documents are converted to the same tree before decoding.

use std::path::Path;

use serde::Serialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ConfbindError;
use crate::field::{IgnoredKeys, Record};
use crate::merge::deep_merge;
use crate::types::Format;

/// One loaded document, before parsing.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the bytes came from, used in error messages.
    pub origin: String,
    pub format: Format,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(origin: impl Into<String>, format: Format, content: impl Into<Vec<u8>>) -> Self {
        Document {
            origin: origin.into(),
            format,
            content: content.into(),
        }
    }

    /// Read a file, picking the format from its extension.
    pub fn read(path: &Path) -> Result<Self, ConfbindError> {
        let content = std::fs::read(path).map_err(|source| ConfbindError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "read config document");
        Ok(Document::new(
            path.display().to_string(),
            Format::from_path(path),
            content,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content as text, for TOML parsing and line lookups.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Parse into an object tree. The top level must be an object.
    pub fn parse(&self) -> Result<Map<String, Value>, ConfbindError> {
        let tree = match self.format {
            Format::Json => serde_json::from_slice::<Value>(&self.content).map_err(|source| {
                ConfbindError::JsonParse {
                    origin: self.origin.clone(),
                    source,
                }
            })?,
            Format::Toml => {
                let table: toml::Table =
                    toml::from_str(&self.text()).map_err(|source| ConfbindError::TomlParse {
                        origin: self.origin.clone(),
                        source,
                    })?;
                serde_json::to_value(table).map_err(ConfbindError::Decode)?
            }
        };
        match tree {
            Value::Object(map) => Ok(map),
            other => Err(ConfbindError::JsonParse {
                origin: self.origin.clone(),
                source: serde_json::Error::custom(format!(
                    "expected an object at the top level, found {}",
                    kind_of(&other)
                )),
            }),
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode one document entry into a value for a field of type `F`.
///
/// `current` is the field's value before this document, or `None` for an
/// unset optional field.
pub(crate) fn decode_entry<F>(
    current: Option<&F>,
    entry: Value,
    ignored: IgnoredKeys<'_>,
) -> Result<F, serde_json::Error>
where
    F: Serialize + DeserializeOwned + Default,
{
    match entry {
        Value::Null => Ok(F::default()),
        Value::Object(overlay) => {
            let zero = serde_json::to_value(F::default())?;
            let base = match current {
                Some(current) => serde_json::to_value(current)?,
                None => zero.clone(),
            };
            let merged = match base {
                Value::Object(base) => deep_merge(base, overlay, zero.as_object()),
                _ => overlay,
            };
            deserialize_reporting(Value::Object(merged), ignored)
        }
        other => deserialize_reporting(other, ignored),
    }
}

fn deserialize_reporting<F: DeserializeOwned>(
    entry: Value,
    ignored: IgnoredKeys<'_>,
) -> Result<F, serde_json::Error> {
    serde_ignored::deserialize(entry, |path| ignored(path.to_string()))
}

/// Overlay parsed document objects onto `dest`, in order.
///
/// Every entry of a document is decoded before any of them is written, so a
/// failing document leaves `dest` as the previous documents left it.
pub fn decode_onto<T: Record>(
    layers: &[Map<String, Value>],
    dest: &mut T,
) -> Result<(), ConfbindError> {
    if layers.is_empty() {
        return Ok(());
    }
    let table = T::fields();
    table.validate()?;

    for layer in layers {
        let mut staged = Vec::with_capacity(layer.len());
        for (key, entry) in layer {
            let Some(field) = table.document_field(key) else {
                debug!(key = %key, "skipping document key with no matching field");
                continue;
            };
            let commit = field
                .decode(dest, entry.clone(), &mut |_: String| {})
                .map_err(|source| ConfbindError::DocumentField {
                    field: field.name().to_string(),
                    source,
                })?;
            trace!(field = field.name(), key = %key, "decoded document entry");
            staged.push(commit);
        }
        for commit in staged {
            commit(dest);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldTable;
    use crate::fixtures::test::{Everything, Mode, Pointers, Server};
    use crate::nullable::*;
    use std::io::Write;

    #[derive(Debug, Default)]
    struct Runtime {
        timeout: f64,
        label: String,
        handle: i64,
    }

    impl Record for Runtime {
        fn fields() -> FieldTable<Self> {
            FieldTable::<Self>::new()
                .field("Timeout", |r| &mut r.timeout)
                .field("Label", |r| &mut r.label)
        }
    }

    fn decode_json<T: Record>(bytes: &[u8], dest: &mut T) -> Result<(), ConfbindError> {
        let layer = Document::new("<document>", Format::Json, bytes).parse()?;
        decode_onto(std::slice::from_ref(&layer), dest)
    }

    #[test]
    fn json_fills_every_kind() {
        let json = br#"{
            "Int": 1, "NullInt": 1, "Int8": 8, "NullInt8": 8,
            "Int16": 16, "NullInt16": 16, "Int32": 32, "NullInt32": 32,
            "Int64": 64, "NullInt64": 64, "Float32": 3.2, "NullFloat32": 3.2,
            "Float64": 6.4, "NullFloat64": 6.4, "Bool": true, "NullBool": true,
            "String": "string", "NullString": "string"
        }"#;
        let mut config = Everything::default();
        decode_json(json, &mut config).unwrap();
        assert_eq!(config, Everything::expected());
    }

    #[test]
    fn absent_keys_keep_current_values() {
        let mut server = Server {
            host: "keep".into(),
            port: 1,
            ..Server::default()
        };
        decode_json(br#"{"Port": 8080}"#, &mut server).unwrap();
        assert_eq!(server.host, "keep");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn null_resets_to_default() {
        let mut server = Server {
            port: 9,
            timeout: NullFloat64::new(2.0),
            ..Server::default()
        };
        decode_json(br#"{"Port": null, "Timeout": null}"#, &mut server).unwrap();
        assert_eq!(server.port, 0);
        assert!(!server.timeout.is_present());
    }

    #[test]
    fn nullable_literal_sets_present() {
        let mut server = Server::default();
        decode_json(br#"{"Timeout": 2.5, "Mode": "slow"}"#, &mut server).unwrap();
        assert_eq!(server.timeout, NullFloat64::new(2.5));
        assert_eq!(server.mode, Mode::Slow);
    }

    #[test]
    fn nested_objects_merge() {
        let mut server = Server::default();
        server.limits.burst = 4;
        decode_json(br#"{"Limits": {"max_connections": 10}}"#, &mut server).unwrap();
        assert_eq!(server.limits.max_connections, 10);
        assert_eq!(server.limits.burst, 4);
    }

    #[test]
    fn unnamed_non_finite_float_is_never_read() {
        let mut runtime = Runtime {
            timeout: f64::INFINITY,
            ..Runtime::default()
        };
        decode_json(br#"{"Label": "x"}"#, &mut runtime).unwrap();
        assert_eq!(runtime.label, "x");
        assert_eq!(runtime.timeout, f64::INFINITY);

        decode_json(br#"{"Timeout": 1.5}"#, &mut runtime).unwrap();
        assert_eq!(runtime.timeout, 1.5);
    }

    #[test]
    fn unregistered_field_survives_documents() {
        let mut runtime = Runtime {
            handle: 42,
            ..Runtime::default()
        };
        decode_json(br#"{"Label": "x", "Timeout": null, "handle": 7}"#, &mut runtime).unwrap();
        assert_eq!(runtime.handle, 42);
        assert_eq!(runtime.timeout, 0.0);
    }

    #[test]
    fn keys_fall_back_to_case_insensitive_match() {
        let mut server = Server::default();
        decode_json(br#"{"host": "lower", "PORT": 1}"#, &mut server).unwrap();
        assert_eq!(server.host, "lower");
        assert_eq!(server.port, 1);
    }

    #[test]
    fn optional_fields_from_documents() {
        let mut pointers = Pointers::default();
        decode_json(br#"{"Int8": 8, "NullString": "string", "Bool": null}"#, &mut pointers)
            .unwrap();
        assert_eq!(pointers.int8, Some(8));
        assert_eq!(pointers.null_string, Some(NullString::new("string".into())));
        assert_eq!(pointers.bool, None);

        decode_json(br#"{"Int8": null}"#, &mut pointers).unwrap();
        assert_eq!(pointers.int8, None);
        assert!(pointers.null_string.is_some());
    }

    #[test]
    fn failing_document_keeps_earlier_documents() {
        let first = Document::new("a", Format::Json, r#"{"Host": "a"}"#).parse().unwrap();
        let second = Document::new("b", Format::Json, r#"{"Port": 2, "Verbose": "yes"}"#)
            .parse()
            .unwrap();
        let mut server = Server::default();
        let err = decode_onto(&[first, second], &mut server).unwrap_err();
        assert_eq!(err.field(), Some("Verbose"));
        assert_eq!(server.host, "a");
        assert_eq!(server.port, 0);
    }

    #[test]
    fn nested_null_takes_nested_default() {
        let mut server = Server::default();
        server.limits.burst = 4;
        server.limits.max_connections = 9;
        decode_json(br#"{"Limits": {"burst": null}}"#, &mut server).unwrap();
        assert_eq!(server.limits.burst, 0);
        assert_eq!(server.limits.max_connections, 9);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let mut server = Server::default();
        let err = decode_json(b"{\"Port\": ", &mut server).unwrap_err();
        assert!(matches!(err, ConfbindError::JsonParse { .. }));
        assert_eq!(server, Server::default());
    }

    #[test]
    fn wrong_type_is_decode_error_and_leaves_dest() {
        let mut server = Server {
            host: "keep".into(),
            ..Server::default()
        };
        let err = decode_json(br#"{"Host": "x", "Port": "eighty"}"#, &mut server).unwrap_err();
        assert!(matches!(err, ConfbindError::DocumentField { .. }));
        assert_eq!(err.field(), Some("Port"));
        assert_eq!(server.host, "keep");
    }

    #[test]
    fn top_level_must_be_object() {
        let mut server = Server::default();
        let err = decode_json(b"[1, 2]", &mut server).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn toml_document_decodes() {
        let doc = Document::new(
            "server.toml",
            Format::Toml,
            "Host = \"0.0.0.0\"\nPort = 3000\n[Limits]\nburst = 2\n",
        );
        let layer = doc.parse().unwrap();
        let mut server = Server::default();
        decode_onto(&[layer], &mut server).unwrap();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);
        assert_eq!(server.limits.burst, 2);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let doc = Document::new("bad.toml", Format::Toml, "Port = = 1");
        assert!(matches!(doc.parse(), Err(ConfbindError::TomlParse { .. })));
    }

    #[test]
    fn later_layers_win() {
        let first = Document::new("a", Format::Json, r#"{"Port": 1, "Host": "a"}"#)
            .parse()
            .unwrap();
        let second = Document::new("b", Format::Json, r#"{"Port": 2}"#).parse().unwrap();
        let mut server = Server::default();
        decode_onto(&[first, second], &mut server).unwrap();
        assert_eq!(server.port, 2);
        assert_eq!(server.host, "a");
    }

    #[test]
    fn read_picks_format_from_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "Port = 7").unwrap();
        let doc = Document::read(file.path()).unwrap();
        assert_eq!(doc.format, Format::Toml);
        assert_eq!(doc.parse().unwrap()["Port"], 7);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::read(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfbindError::IoError { .. }));
    }
}
