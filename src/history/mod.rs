// src/history/mod.rs
use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    collections::HashSet,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};

use crate::store::parquet_store::write_batch;

pub const EVENT_INGESTED: &str = "ingested";

/// Which source files have already been handled, kept as one tiny Parquet
/// file per (file, event).
#[derive(Debug, Clone)]
pub struct History {
    history_dir: PathBuf,
}

fn history_schema() -> Schema {
    Schema::new(vec![
        Field::new("file_name", DataType::Utf8, false),
        Field::new("event", DataType::Utf8, false),
        Field::new(
            "event_time",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
    ])
}

/// File-name safe form of a source name.
fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

impl History {
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {:?}", &history_dir))?;
        Ok(Self { history_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.history_dir
    }

    /// Writes `<event>/<slug>_<ts>.parquet` holding the exact file name.
    pub fn record_event(&self, file_name: &str, event: &str) -> Result<()> {
        let ts = Utc::now().timestamp_micros();
        let event_dir = self.history_dir.join(slug(event));
        fs::create_dir_all(&event_dir)?;
        let path = event_dir.join(format!("{}_{}.parquet", slug(file_name), ts));

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![file_name])),
            Arc::new(StringArray::from(vec![event])),
            Arc::new(TimestampMicrosecondArray::from_iter_values([ts])),
        ];
        let batch = RecordBatch::try_new(Arc::new(history_schema()), columns)
            .context("building history record batch")?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        write_batch(&path, &batch, props)?;
        debug!(file_name, event, "recorded history event");
        Ok(())
    }

    /// Distinct file names recorded for `event`. Unreadable entries are
    /// skipped with a warning.
    pub fn load_event_names(&self, event: &str) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        let pattern = format!("{}/{}/*.parquet", self.history_dir.display(), slug(event));
        for path in glob(&pattern)?.flatten() {
            match read_names(&path) {
                Ok(found) => names.extend(found),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping history entry"),
            }
        }
        Ok(names)
    }
}

fn read_names(path: &Path) -> Result<Vec<String>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let mut out = Vec::new();
    for batch in reader {
        let batch = batch?;
        let col = batch
            .column_by_name("file_name")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .context("history file lacks a file_name column")?;
        out.extend((0..col.len()).filter(|&i| col.is_valid(i)).map(|i| col.value(i).to_string()));
    }
    Ok(out)
}
