//! Field metadata for describing what a collector puts into its samples

use serde::{Deserialize, Serialize};

/// Type of data a field contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Text data (e.g., "wlan0", "/home")
    Text,
    /// Numerical data (e.g., 45.2, 3)
    Numerical,
    /// Percentage (0.0 to 100.0)
    Percentage,
    /// Byte amount already formatted with a unit (e.g., "7.42 GiB")
    Bytes,
    /// Rate already formatted with a unit (e.g., "1.20 Mbit/s")
    Rate,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Numerical => "number",
            FieldType::Percentage => "percent",
            FieldType::Bytes => "bytes",
            FieldType::Rate => "rate",
        }
    }
}

/// Metadata describing a single template field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Key used in templates, e.g. `{used}`
    pub id: String,
    /// Description of what this field represents
    pub description: String,
    /// Type of data this field contains
    pub field_type: FieldType,
}

impl FieldMetadata {
    /// Create a new field metadata
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            field_type,
        }
    }
}
