#![allow(dead_code)]

use std::{
    fmt,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::stream::BoxStream;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOptions, PutOptions, PutPayload, PutResult, Result as StoreResult,
    memory::InMemory, path::Path as ObjectPath,
};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet_query_core::{DatasetService, RemoteScanner, ScannerConfig, StorageLocation};
use url::Url;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const CUSTOMERS: &str = "Customer List.parquet";

fn write_batch(path: &Path, batch: &RecordBatch, row_group_rows: usize) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_rows)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// `(1,"a",10.0) (2,"b",null) (3,"c",30.0)` as `{id, name, score}`.
pub fn write_customers(path: &Path) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]);

    let mut ids = Int64Builder::new();
    let mut names = StringBuilder::new();
    let mut scores = Float64Builder::new();
    for (id, name, score) in [(1, "a", Some(10.0)), (2, "b", None), (3, "c", Some(30.0))] {
        ids.append_value(id);
        names.append_value(name);
        scores.append_option(score);
    }

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(ids.finish()) as ArrayRef,
            Arc::new(names.finish()),
            Arc::new(scores.finish()),
        ],
    )?;
    write_batch(path, &batch, 1024)
}

/// `rows` rows of `{id: 0.., label: "row-<id>", even: bool}` split into
/// small row groups.
pub fn write_numbered(path: &Path, rows: usize) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("label", DataType::Utf8, false),
        Field::new("even", DataType::Boolean, false),
    ]);

    let mut ids = Int64Builder::with_capacity(rows);
    let mut labels = StringBuilder::new();
    let mut evens = BooleanBuilder::with_capacity(rows);
    for i in 0..rows {
        ids.append_value(i as i64);
        labels.append_value(format!("row-{i}"));
        evens.append_value(i % 2 == 0);
    }

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(ids.finish()) as ArrayRef,
            Arc::new(labels.finish()),
            Arc::new(evens.finish()),
        ],
    )?;
    write_batch(path, &batch, 7)
}

/// `{name, score}` where `score` is null on every row.
pub fn write_all_null_scores(path: &Path) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("score", DataType::Float64, true),
    ]);

    let mut names = StringBuilder::new();
    let mut scores = Float64Builder::new();
    for name in ["x", "y"] {
        names.append_value(name);
        scores.append_null();
    }

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(names.finish()) as ArrayRef, Arc::new(scores.finish())],
    )?;
    write_batch(path, &batch, 1024)
}

/// Zero rows of `{score: Float64, n: Int64}`.
pub fn write_empty(path: &Path) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("score", DataType::Float64, true),
        Field::new("n", DataType::Int64, true),
    ]);
    let batch = RecordBatch::new_empty(Arc::new(schema));
    write_batch(path, &batch, 1024)
}

/// `{name, active}`: no numeric column.
pub fn write_text_only(path: &Path) -> TestResult {
    let schema = Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("active", DataType::Boolean, false),
    ]);

    let mut names = StringBuilder::new();
    let mut active = BooleanBuilder::new();
    names.append_value("only");
    active.append_value(true);

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(names.finish()) as ArrayRef, Arc::new(active.finish())],
    )?;
    write_batch(path, &batch, 1024)
}

pub fn local_service(root: &Path) -> TestResult<DatasetService> {
    let config =
        ScannerConfig::new(StorageLocation::local(root)).with_timeout(Duration::from_secs(30));
    Ok(DatasetService::new(RemoteScanner::new(&config)?))
}

/// Stall long enough for any test timeout to fire first.
const STALL: Duration = Duration::from_secs(10);

/// In-memory store whose calls can be made to stall, to exercise timeouts
/// without depending on network latency.
#[derive(Debug)]
pub struct StallingStore {
    inner: InMemory,
    stall_head: bool,
    stall_reads: AtomicBool,
}

impl StallingStore {
    /// Every `HEAD` stalls.
    pub fn stalling_head() -> Self {
        Self {
            inner: InMemory::new(),
            stall_head: true,
            stall_reads: AtomicBool::new(false),
        }
    }

    /// Nothing stalls until [`StallingStore::stall_reads`] is called.
    pub fn responsive() -> Self {
        Self {
            inner: InMemory::new(),
            stall_head: false,
            stall_reads: AtomicBool::new(false),
        }
    }

    /// From now on, every ranged or full read stalls.
    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }
}

impl fmt::Display for StallingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StallingStore({})", self.inner)
    }
}

#[async_trait::async_trait]
impl ObjectStore for StallingStore {
    async fn put_opts(
        &self,
        location: &ObjectPath,
        payload: PutPayload,
        opts: PutOptions,
    ) -> StoreResult<PutResult> {
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &ObjectPath,
        opts: PutMultipartOptions,
    ) -> StoreResult<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, location: &ObjectPath, options: GetOptions) -> StoreResult<GetResult> {
        if self.stall_reads.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        self.inner.get_opts(location, options).await
    }

    async fn head(&self, location: &ObjectPath) -> StoreResult<ObjectMeta> {
        if self.stall_head {
            tokio::time::sleep(STALL).await;
        }
        self.inner.head(location).await
    }

    async fn delete(&self, location: &ObjectPath) -> StoreResult<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&ObjectPath>) -> BoxStream<'static, StoreResult<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&ObjectPath>) -> StoreResult<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &ObjectPath, to: &ObjectPath) -> StoreResult<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &ObjectPath, to: &ObjectPath) -> StoreResult<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}

/// The customers fixture as parquet bytes, stored at `name`.
pub async fn put_customers(store: &dyn ObjectStore, name: &str) -> TestResult {
    let tmp = tempfile::TempDir::new()?;
    let file = tmp.path().join(name);
    write_customers(&file)?;
    let bytes = std::fs::read(&file)?;
    store.put(&ObjectPath::from(name), PutPayload::from(bytes)).await?;
    Ok(())
}

/// A scanner over `store`, mounted at `memory://dataset/`.
pub fn memory_scanner(store: Arc<dyn ObjectStore>, timeout: Duration) -> TestResult<RemoteScanner> {
    let url = Url::parse("memory://dataset/")?;
    Ok(RemoteScanner::from_store(url, store, timeout))
}
