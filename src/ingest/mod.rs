// src/ingest/mod.rs
pub mod coerce;

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

pub use coerce::{CoerceOptions, ColumnKind, RawTable};

use crate::history::{History, EVENT_INGESTED};
use crate::process::{read_survey_csv, SurveyTable};
use crate::store::parquet_store::write_batch;

/// Typed Arrow batch for one raw table file.
pub fn raw_batch(raw: RawTable, table: &SurveyTable, opts: CoerceOptions) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.headers.len());

    for (idx, name) in table.headers.iter().enumerate() {
        let (dtype, array): (DataType, ArrayRef) = match raw.kind(name) {
            ColumnKind::Float => (
                DataType::Float64,
                Arc::new(table.column(idx).map(|v| opts.float(v)).collect::<Float64Array>()),
            ),
            ColumnKind::Int => (
                DataType::Int64,
                Arc::new(table.column(idx).map(|v| opts.int(v)).collect::<Int64Array>()),
            ),
            ColumnKind::Code => (
                DataType::Utf8,
                Arc::new(
                    table
                        .column(idx)
                        .map(|v| opts.code(name, v))
                        .collect::<StringArray>(),
                ),
            ),
            ColumnKind::Text => (
                DataType::Utf8,
                Arc::new(table.column(idx).map(|v| opts.text(v)).collect::<StringArray>()),
            ),
        };
        fields.push(Field::new(name, dtype, true));
        columns.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .with_context(|| format!("building {} batch for {}", raw.name(), table.name))
}

/// Loads raw CSVs of one table into `<out_dir>/<table>/<stem>.parquet`.
pub struct RawIngest {
    raw: RawTable,
    table_dir: PathBuf,
    opts: CoerceOptions,
    history: Option<History>,
}

impl RawIngest {
    pub fn new(
        raw: RawTable,
        out_dir: &Path,
        use_sentinels: bool,
        history: Option<History>,
    ) -> Result<Self> {
        let table_dir = out_dir.join(raw.name());
        fs::create_dir_all(&table_dir)
            .with_context(|| format!("creating {:?}", &table_dir))?;
        Ok(Self {
            raw,
            table_dir,
            opts: raw.options(use_sentinels),
            history,
        })
    }

    pub fn table_dir(&self) -> &Path {
        &self.table_dir
    }

    fn event(&self) -> String {
        format!("{}_{}", EVENT_INGESTED, self.raw.name())
    }

    /// Convert one file. Returns the number of rows written.
    #[tracing::instrument(level = "info", skip(self, path), fields(table = self.raw.name(), path = %path.display()))]
    pub fn ingest_file(&self, path: &Path) -> Result<usize> {
        let table = read_survey_csv(path)?;
        let batch = raw_batch(self.raw, &table, self.opts)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("source file has no usable name")?;
        let out = self.table_dir.join(format!("{}.parquet", stem));
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        write_batch(&out, &batch, props)?;
        info!(rows = batch.num_rows(), out = %out.display(), "ingested raw records");
        Ok(batch.num_rows())
    }

    /// Convert every file not already in the history. Per-file failures are
    /// logged and skipped. Returns total rows written.
    pub fn ingest_all(&self, files: &[PathBuf]) -> Result<usize> {
        let event = self.event();
        let done = match &self.history {
            Some(h) => h.load_event_names(&event)?,
            None => Default::default(),
        };

        let mut total = 0;
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if done.contains(&name) {
                info!(table = self.raw.name(), file = %name, "already ingested, skipping");
                continue;
            }
            match self.ingest_file(path) {
                Ok(rows) => {
                    total += rows;
                    if let Some(h) = &self.history {
                        h.record_event(&name, &event)?;
                    }
                }
                Err(e) => warn!(table = self.raw.name(), file = %name, error = %e, "raw ingest failed"),
            }
        }
        Ok(total)
    }
}
