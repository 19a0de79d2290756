//! Strict-mode validation: detect document keys the record does not consume.
//!
//! A top-level key is unknown when no field in the record's table matches it.
//! Known keys are decoded into their field through `serde_ignored`, which
//! reports every nested key serde skipped. Decoding here never writes to the
//! record. Each unknown key is reported with the document's origin and a
//! best-effort line number.

use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::ConfbindError;
use crate::field::Record;
use crate::types::Format;

/// Validate that `layer` (parsed from `doc`) holds no keys unknown to `T`.
///
/// `record` is only read; it is taken mutably because fields are reached
/// through the same accessors the binder uses.
pub fn validate_unknown_keys<T: Record>(
    doc: &Document,
    layer: &Map<String, Value>,
    record: &mut T,
) -> Result<(), ConfbindError> {
    let table = T::fields();
    table.validate()?;

    let mut unknown_keys: Vec<String> = Vec::new();
    for (key, entry) in layer {
        let Some(field) = table.document_field(key) else {
            unknown_keys.push(key.clone());
            continue;
        };
        field
            .decode(record, entry.clone(), &mut |path: String| {
                unknown_keys.push(format!("{key}.{path}"))
            })
            .map_err(|source| ConfbindError::DocumentField {
                field: field.name().to_string(),
                source,
            })?;
    }

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let text = doc.text();
    let errors: Vec<ConfbindError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = match doc.format {
                Format::Json => find_json_key_line(&text, &key),
                Format::Toml => find_toml_key_line(&text, &key),
            };
            ConfbindError::UnknownKey {
                key,
                origin: doc.origin.clone(),
                line,
            }
        })
        .collect();

    Err(ConfbindError::UnknownKeys(errors))
}

/// Find the 1-indexed line of a key in JSON text.
///
/// Matches the quoted leaf segment followed by a colon. The first hit wins, so
/// a leaf name that also appears elsewhere may point at the wrong line.
/// Returns 0 if the key cannot be located.
fn find_json_key_line(content: &str, dotted_key: &str) -> usize {
    let leaf = dotted_key.rsplit('.').next().unwrap_or(dotted_key);
    let quoted = format!("\"{leaf}\"");

    for (i, line) in content.lines().enumerate() {
        let mut rest = line;
        while let Some(pos) = rest.find(&quoted) {
            let after = &rest[pos + quoted.len()..];
            if after.trim_start().starts_with(':') {
                return i + 1;
            }
            rest = after;
        }
    }
    0
}

/// Find the 1-indexed line of a key in TOML text.
///
/// For a dotted key like `"Limits.typo"`, tracks the current `[section]`
/// header while scanning and only matches the leaf key inside that section.
/// Quoted keys and inline tables are not handled. Returns 0 if the key cannot
/// be located.
fn find_toml_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let leaf = segments.last().unwrap_or(&dotted_key);
    let expected_section = &segments[..segments.len() - 1];

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if in_right_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Server;

    fn check(doc: &Document) -> Result<(), ConfbindError> {
        let layer = doc.parse().unwrap();
        validate_unknown_keys(doc, &layer, &mut Server::default())
    }

    fn single_unknown(err: ConfbindError) -> (String, usize) {
        match err {
            ConfbindError::UnknownKeys(keys) => {
                assert_eq!(keys.len(), 1);
                match keys.into_iter().next() {
                    Some(ConfbindError::UnknownKey { key, line, .. }) => (key, line),
                    other => panic!("Expected UnknownKey, got: {other:?}"),
                }
            }
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn valid_sparse_document_passes() {
        let doc = Document::new("app.json", Format::Json, r#"{"Port": 3000}"#);
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn empty_object_passes() {
        let doc = Document::new("app.json", Format::Json, "{}");
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn unknown_top_level_json_key() {
        let doc = Document::new(
            "app.json",
            Format::Json,
            "{\n  \"Host\": \"x\",\n  \"Prot\": 80\n}",
        );
        let (key, line) = single_unknown(check(&doc).unwrap_err());
        assert_eq!(key, "Prot");
        assert_eq!(line, 3);
    }

    #[test]
    fn unknown_nested_json_key() {
        let doc = Document::new(
            "app.json",
            Format::Json,
            "{\n  \"Limits\": {\n    \"brust\": 1\n  }\n}",
        );
        let (key, line) = single_unknown(check(&doc).unwrap_err());
        assert_eq!(key, "Limits.brust");
        assert_eq!(line, 3);
    }

    #[test]
    fn unknown_toml_key_in_section() {
        let doc = Document::new(
            "app.toml",
            Format::Toml,
            "Host = \"x\"\nPort = 8080\n[Limits]\ntypo = 1\n",
        );
        let (key, line) = single_unknown(check(&doc).unwrap_err());
        assert_eq!(key, "Limits.typo");
        assert_eq!(line, 4);
    }

    #[test]
    fn multiple_unknown_keys() {
        let doc = Document::new("app.toml", Format::Toml, "typo1 = 1\ntypo2 = 2\n");
        match check(&doc).unwrap_err() {
            ConfbindError::UnknownKeys(keys) => assert_eq!(keys.len(), 2),
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn error_names_origin() {
        let doc = Document::new("/etc/app/config.json", Format::Json, r#"{"x": 1}"#);
        match check(&doc).unwrap_err() {
            ConfbindError::UnknownKeys(keys) => {
                assert!(keys[0].to_string().contains("/etc/app/config.json"));
            }
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn explicit_null_is_a_known_value() {
        let doc = Document::new(
            "app.json",
            Format::Json,
            r#"{"Port": null, "Timeout": null, "Limits": {"burst": null}}"#,
        );
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn keys_match_field_names_ignoring_case() {
        let doc = Document::new("app.json", Format::Json, r#"{"port": 1, "HOST": "x"}"#);
        assert!(check(&doc).is_ok());
    }

    #[test]
    fn validation_never_writes_the_record() {
        let doc = Document::new("app.json", Format::Json, r#"{"Port": 9, "typo": 1}"#);
        let layer = doc.parse().unwrap();
        let mut server = Server::default();
        assert!(validate_unknown_keys(&doc, &layer, &mut server).is_err());
        assert_eq!(server, Server::default());
    }

    #[test]
    fn wrong_type_names_the_field() {
        let doc = Document::new("app.json", Format::Json, r#"{"Port": "eighty"}"#);
        let err = check(&doc).unwrap_err();
        assert_eq!(err.field(), Some("Port"));
    }

    #[test]
    fn json_line_skips_values_that_look_like_keys() {
        let content = "{\n  \"Host\": \"typo\",\n  \"typo\": 1\n}";
        assert_eq!(find_json_key_line(content, "typo"), 3);
    }

    #[test]
    fn missing_key_line_is_zero() {
        assert_eq!(find_json_key_line("{}", "nope"), 0);
        assert_eq!(find_toml_key_line("", "nope"), 0);
    }
}
