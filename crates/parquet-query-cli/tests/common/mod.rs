use std::{path::Path, sync::Arc};

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// `(1,"a",10.0) (2,"b",null) (3,"c",30.0)` as `{id, name, score}`.
pub fn write_customers(path: &Path) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut ids = Int64Builder::new();
    let mut names = StringBuilder::new();
    let mut scores = Float64Builder::new();
    for (id, name, score) in [(1, "a", Some(10.0)), (2, "b", None), (3, "c", Some(30.0))] {
        ids.append_value(id);
        names.append_value(name);
        scores.append_option(score);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(ids.finish()) as ArrayRef,
            Arc::new(names.finish()),
            Arc::new(scores.finish()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
