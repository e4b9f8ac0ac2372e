use common::storage::types::SeedRecord;
use serde_json::Value;

/// One instruction to write data, built fresh from source JSON each run.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedUnit {
    Collection {
        name: String,
        records: Vec<Value>,
    },
    Document {
        collection: String,
        document_id: String,
        label: String,
        data: Value,
    },
}

impl SeedUnit {
    pub fn collection(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self::Collection {
            name: name.into(),
            records,
        }
    }

    pub fn document(
        collection: impl Into<String>,
        document_id: impl Into<String>,
        data: Value,
    ) -> Self {
        let collection = collection.into();
        let document_id = document_id.into();
        Self::Document {
            label: format!("{collection}/{document_id}"),
            collection,
            document_id,
            data,
        }
    }

    #[must_use]
    pub fn with_label(self, new_label: impl Into<String>) -> Self {
        match self {
            Self::Document {
                collection,
                document_id,
                data,
                ..
            } => Self::Document {
                collection,
                document_id,
                label: new_label.into(),
                data,
            },
            collection @ Self::Collection { .. } => collection,
        }
    }

    /// Collection the unit writes into.
    pub fn collection_name(&self) -> &str {
        match self {
            Self::Collection { name, .. } => name,
            Self::Document { collection, .. } => collection,
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            Self::Collection { records, .. } => records.len(),
            Self::Document { .. } => 1,
        }
    }
}

/// Records arrive as raw JSON so that a malformed entry fails on its own
/// instead of failing the whole file.
pub fn as_record(value: Value) -> Result<SeedRecord, String> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, found {}", kind_of(&other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
