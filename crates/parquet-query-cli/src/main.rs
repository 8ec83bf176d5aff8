//! Command-line transport for schema, row and stats queries over a parquet
//! file in object storage.

mod error;
mod output;

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use parquet_query_core::{
    DatasetService, RemoteScanner, RowsParams, ScannerConfig, StorageLocation,
};
use snafu::ResultExt;

use crate::{
    error::{CliResult, ConnectSnafu, InvalidStoreSnafu},
    output::{print_error, print_json, print_text, render_rows_table},
};

const DEFAULT_STORE: &str = "gs://pfdta-shop-bucket";
const DEFAULT_FILE: &str = "Customer List.parquet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Column types and row count
    Schema {
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,
    },

    /// One page of rows, optionally projected and filtered
    Rows {
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,

        /// Page size (1..=10000, default 100)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Rows to skip (default 0)
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,

        /// Comma separated column names
        #[arg(long)]
        columns: Option<String>,

        /// Column for an exact-match filter
        #[arg(long = "filter-column")]
        filter_column: Option<String>,

        /// Value the filter column must equal
        #[arg(long = "filter-value", allow_hyphen_values = true)]
        filter_value: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Print the optimized plan instead of running it
        #[arg(long, default_value_t = false)]
        explain: bool,
    },

    /// Row count, columns and min/max/mean of numeric columns
    Stats {
        #[arg(long, default_value = DEFAULT_FILE)]
        file: String,
    },

    /// Liveness report; touches no storage
    Health,
}

#[derive(Debug, Parser)]
#[command(name = "pqquery", version, about)]
struct Cli {
    /// gs://<bucket> or a local directory
    #[arg(long, global = true, env = "PQ_STORE")]
    store: Option<String>,

    /// Bucket name, used as gs://<bucket> when --store is not given
    #[arg(long, global = true, env = "GCS_BUCKET_NAME", hide = true)]
    bucket: Option<String>,

    /// Service-account key file for GCS
    #[arg(long, global = true, env = "PQ_CREDENTIALS")]
    credentials: Option<PathBuf>,

    #[arg(long, global = true, env = "GCP_PROJECT_ID")]
    project: Option<String>,

    /// Bound on each remote call, in seconds
    #[arg(long = "timeout-secs", global = true, env = "PQ_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    cmd: Command,
}

impl Cli {
    fn store_spec(&self) -> String {
        match (&self.store, &self.bucket) {
            (Some(store), _) => store.clone(),
            (None, Some(bucket)) => format!("gs://{bucket}"),
            (None, None) => DEFAULT_STORE.to_string(),
        }
    }

    fn scanner_config(&self) -> CliResult<ScannerConfig> {
        let spec = self.store_spec();
        let location = StorageLocation::parse(&spec).context(InvalidStoreSnafu { spec })?;

        let mut config = ScannerConfig::new(location)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(path) = &self.credentials {
            config = config.with_credentials(path);
        }
        if let Some(project) = &self.project {
            config = config.with_project_id(project);
        }
        Ok(config)
    }
}

fn connect(config: &ScannerConfig) -> CliResult<DatasetService> {
    let scanner = RemoteScanner::new(config).context(ConnectSnafu {
        store: config.location.to_string(),
    })?;
    Ok(DatasetService::new(scanner))
}

async fn cmd_rows(
    service: &DatasetService,
    file: &str,
    params: RowsParams,
    format: OutputFormat,
    explain: bool,
) -> CliResult<()> {
    if explain {
        let plan = service.explain_rows(file, &params).await?;
        return print_text(&plan);
    }

    let page = service.rows(file, &params).await?;
    match format {
        OutputFormat::Json => print_json(&page),
        OutputFormat::Table => print_text(&render_rows_table(&page)),
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = cli.scanner_config()?;
    debug!("store={} timeout={:?}", config.location, config.timeout);
    let service = connect(&config)?;

    match cli.cmd {
        Command::Schema { file } => print_json(&service.schema_info(&file).await?),

        Command::Rows {
            file,
            limit,
            offset,
            columns,
            filter_column,
            filter_value,
            format,
            explain,
        } => {
            let params = RowsParams {
                limit,
                offset,
                columns,
                filter_column,
                filter_value,
            };
            cmd_rows(&service, &file, params, format, explain).await
        }

        Command::Stats { file } => print_json(&service.stats(&file).await?),

        Command::Health => print_json(&service.health()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(e.exit_code());
    }
}
