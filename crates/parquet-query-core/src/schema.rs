//! Resolved dataset schema.
//!
//! The schema is read from parquet footer metadata when a file is opened and
//! never requires a scan. Columns keep the file's order; every consumer
//! (validation, `schema-info`, stats) relies on that order.

use std::fmt;

use arrow::datatypes::{DataType, Schema};
use serde::{Serialize, Serializer};

/// Scalar type tag of a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Fixed-width integer.
    Int {
        /// Width in bits (8, 16, 32, 64).
        bits: u8,
        /// Whether the integer is signed.
        signed: bool,
    },
    /// IEEE floating point.
    Float {
        /// Width in bits (32 or 64).
        bits: u8,
    },
    /// UTF-8 string, regardless of physical encoding.
    String,
    /// Boolean.
    Boolean,
    /// Anything else, carrying the engine's rendering of the type.
    Other(String),
}

impl ColumnType {
    /// Map an Arrow type onto a type tag.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8 => ColumnType::Int { bits: 8, signed: true },
            DataType::Int16 => ColumnType::Int { bits: 16, signed: true },
            DataType::Int32 => ColumnType::Int { bits: 32, signed: true },
            DataType::Int64 => ColumnType::Int { bits: 64, signed: true },
            DataType::UInt8 => ColumnType::Int { bits: 8, signed: false },
            DataType::UInt16 => ColumnType::Int { bits: 16, signed: false },
            DataType::UInt32 => ColumnType::Int { bits: 32, signed: false },
            DataType::UInt64 => ColumnType::Int { bits: 64, signed: false },
            DataType::Float32 => ColumnType::Float { bits: 32 },
            DataType::Float64 => ColumnType::Float { bits: 64 },
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => ColumnType::String,
            DataType::Boolean => ColumnType::Boolean,
            other => ColumnType::Other(other.to_string()),
        }
    }

    /// Integer and floating point columns only.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int { .. } | ColumnType::Float { .. })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int { bits, signed: true } => write!(f, "Int{bits}"),
            ColumnType::Int {
                bits,
                signed: false,
            } => write!(f, "UInt{bits}"),
            ColumnType::Float { bits } => write!(f, "Float{bits}"),
            ColumnType::String => f.write_str("String"),
            ColumnType::Boolean => f.write_str("Boolean"),
            ColumnType::Other(name) => f.write_str(name),
        }
    }
}

/// One resolved column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name as stored in the file.
    pub name: String,
    /// Arrow type reported by the engine.
    pub data_type: DataType,
    /// Type tag derived from `data_type`.
    pub column_type: ColumnType,
}

/// Ordered column name → type mapping of one dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetSchema {
    columns: Vec<ColumnSchema>,
}

impl DatasetSchema {
    /// Build from an Arrow schema, keeping field order.
    pub fn from_arrow(schema: &Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnSchema {
                name: field.name().clone(),
                data_type: field.data_type().clone(),
                column_type: ColumnType::from_arrow(field.data_type()),
            })
            .collect();
        Self { columns }
    }

    /// Columns in file order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Column names in file order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `name` is a column of this dataset.
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the dataset has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Integer and floating point columns, in file order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.column_type.is_numeric())
    }
}

impl Serialize for DatasetSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), c.column_type.to_string())),
        )
    }
}
