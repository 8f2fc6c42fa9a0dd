// ServiceDocument Model
// The contents of one services.json, held as an order-preserving JSON tree

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::Service;

const FORMAT_VERSION_KEY: &str = "format_version";
const SERVICES_KEY: &str = "services";

/// Errors produced while turning bytes into a document and back
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unexpected document layout: {0}")]
    Layout(String),

    #[error("Failed to encode document: {0}")]
    Encode(serde_json::Error),
}

/// A services file decoded into a generic tree.
///
/// Patching happens on the tree itself, never through a typed re-encode, so
/// keys the patcher does not know about keep their values and positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDocument {
    root: Map<String, Value>,
}

impl ServiceDocument {
    /// Decode raw file bytes. The root must be an object and `services`,
    /// when present, must be an array.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let root = match value {
            Value::Object(map) => map,
            other => {
                return Err(DocumentError::Layout(format!(
                    "root is {}, expected an object",
                    json_type_name(&other)
                )))
            }
        };

        if let Some(services) = root.get(SERVICES_KEY) {
            if !services.is_array() {
                return Err(DocumentError::Layout(format!(
                    "'{SERVICES_KEY}' is {}, expected an array",
                    json_type_name(services)
                )));
            }
        }

        Ok(Self { root })
    }

    /// The `format_version` field, untouched by any patch
    pub fn format_version(&self) -> Option<i64> {
        self.root.get(FORMAT_VERSION_KEY).and_then(Value::as_i64)
    }

    /// Entries of the services array, in file order
    pub fn services(&self) -> &[Value] {
        self.root
            .get(SERVICES_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of every service entry that has a string `name`
    pub fn service_names(&self) -> Vec<&str> {
        self.services()
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .collect()
    }

    /// Exact, case-sensitive match on the `name` field of each entry.
    /// Text elsewhere in the document never counts.
    pub fn contains_service(&self, name: &str) -> bool {
        self.services()
            .iter()
            .any(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Append a service at the end of the services array, creating the
    /// array if the document has none.
    pub fn append_service(&mut self, service: &Service) -> Result<(), DocumentError> {
        let entry = service.to_value().map_err(DocumentError::Encode)?;
        let services = self
            .root
            .entry(SERVICES_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));

        match services {
            Value::Array(entries) => {
                entries.push(entry);
                Ok(())
            }
            other => Err(DocumentError::Layout(format!(
                "'{SERVICES_KEY}' is {}, expected an array",
                json_type_name(other)
            ))),
        }
    }

    /// Encode with the 4-space indentation OBS ships its services file with
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>, DocumentError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.root
            .serialize(&mut serializer)
            .map_err(DocumentError::Encode)?;
        out.push(b'\n');
        Ok(out)
    }

    /// Borrow the underlying tree
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
