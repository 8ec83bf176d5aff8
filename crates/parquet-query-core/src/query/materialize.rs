//! Record batches to JSON-compatible rows.
//!
//! Every row carries every output column, nulls included, in output column
//! order. Numbers stay numbers; floats that have no JSON form (NaN, ±inf)
//! become `null`. Types without a natural JSON scalar are rendered through
//! Arrow's display formatter.

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array},
    compute::cast,
    datatypes::{DataType, Float64Type, Int64Type, UInt64Type},
    error::ArrowError,
    record_batch::RecordBatch,
    util::display::{ArrayFormatter, FormatOptions},
};
use serde_json::{Map, Number, Value};

/// One output row: column name → JSON value, in output column order.
pub type ResultRow = Map<String, Value>;

enum ColumnEncoder<'a> {
    Null,
    Boolean(&'a BooleanArray),
    Signed(Int64Array),
    Unsigned(UInt64Array),
    Float(Float64Array),
    Utf8(StringArray),
    Display(&'a dyn Array, ArrayFormatter<'a>),
}

impl<'a> ColumnEncoder<'a> {
    fn try_new(array: &'a ArrayRef, options: &'a FormatOptions<'a>) -> Result<Self, ArrowError> {
        let encoder = match array.data_type() {
            DataType::Null => ColumnEncoder::Null,
            DataType::Boolean => ColumnEncoder::Boolean(array.as_boolean()),
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                ColumnEncoder::Signed(cast(array, &DataType::Int64)?.as_primitive::<Int64Type>().clone())
            }
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                ColumnEncoder::Unsigned(
                    cast(array, &DataType::UInt64)?
                        .as_primitive::<UInt64Type>()
                        .clone(),
                )
            }
            DataType::Float16 | DataType::Float32 | DataType::Float64 => ColumnEncoder::Float(
                cast(array, &DataType::Float64)?
                    .as_primitive::<Float64Type>()
                    .clone(),
            ),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                ColumnEncoder::Utf8(cast(array, &DataType::Utf8)?.as_string::<i32>().clone())
            }
            _ => ColumnEncoder::Display(
                array.as_ref(),
                ArrayFormatter::try_new(array.as_ref(), options)?,
            ),
        };
        Ok(encoder)
    }

    fn is_null(&self, idx: usize) -> bool {
        match self {
            ColumnEncoder::Null => true,
            ColumnEncoder::Boolean(a) => a.is_null(idx),
            ColumnEncoder::Signed(a) => a.is_null(idx),
            ColumnEncoder::Unsigned(a) => a.is_null(idx),
            ColumnEncoder::Float(a) => a.is_null(idx),
            ColumnEncoder::Utf8(a) => a.is_null(idx),
            ColumnEncoder::Display(a, _) => a.is_null(idx),
        }
    }

    fn value(&self, idx: usize) -> Result<Value, ArrowError> {
        if self.is_null(idx) {
            return Ok(Value::Null);
        }
        let value = match self {
            ColumnEncoder::Null => Value::Null,
            ColumnEncoder::Boolean(a) => Value::Bool(a.value(idx)),
            ColumnEncoder::Signed(a) => Value::from(a.value(idx)),
            ColumnEncoder::Unsigned(a) => Value::from(a.value(idx)),
            ColumnEncoder::Float(a) => Number::from_f64(a.value(idx)).map_or(Value::Null, Value::Number),
            ColumnEncoder::Utf8(a) => Value::String(a.value(idx).to_string()),
            ColumnEncoder::Display(_, formatter) => {
                Value::String(formatter.value(idx).try_to_string()?)
            }
        };
        Ok(value)
    }
}

/// Convert collected batches into rows, preserving batch and row order.
pub fn rows_from_batches(batches: &[RecordBatch]) -> Result<Vec<ResultRow>, ArrowError> {
    let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows = Vec::with_capacity(total);
    let options = FormatOptions::default();

    for batch in batches {
        let schema = batch.schema();
        let encoders = batch
            .columns()
            .iter()
            .map(|column| ColumnEncoder::try_new(column, &options))
            .collect::<Result<Vec<_>, _>>()?;

        for idx in 0..batch.num_rows() {
            let mut row = ResultRow::with_capacity(encoders.len());
            for (field, encoder) in schema.fields().iter().zip(&encoders) {
                row.insert(field.name().clone(), encoder.value(idx)?);
            }
            rows.push(row);
        }
    }

    Ok(rows)
}
