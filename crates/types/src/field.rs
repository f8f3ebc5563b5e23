//! Metadata describing the fields a data source publishes

use serde::{Deserialize, Serialize};

/// Type of data a field contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Text data (e.g., "CPU Package", "RPM")
    Text,
    /// Numerical data (e.g., 45.5, 3200.0)
    Numerical,
    /// Seconds since the Unix epoch
    Timestamp,
}

/// Role of a field in the published values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPurpose {
    /// Caption or label (e.g., "CPU")
    Caption,
    /// Primary value (e.g., current temperature)
    Value,
    /// Unit of measurement (e.g., "°C", "MHz")
    Unit,
    /// Min, max, average and limits
    SecondaryValue,
    /// Freshness or availability information
    Status,
}

/// Metadata describing a single data field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub field_type: FieldType,
    pub purpose: FieldPurpose,
}

impl FieldMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        field_type: FieldType,
        purpose: FieldPurpose,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            field_type,
            purpose,
        }
    }
}
