// src/store/parquet_store.rs
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use super::{IndicatorSink, CITY_COLUMN, MONTH_COLUMN, PERIOD_COLUMN, YEAR_COLUMN};
use crate::indicators::{Indicator, IndicatorRecord};

/// Where and how indicator tables are written. Passed in explicitly; nothing
/// is read from the environment here.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub out_dir: PathBuf,
    pub national_table: String,
    pub city_table: String,
}

impl StoreConfig {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            out_dir: out_dir.into(),
            national_table: "indicadores_nacionales".to_string(),
            city_table: "indicadores_por_ciudad".to_string(),
        }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.out_dir.join(format!("{}.parquet", table))
    }
}

/// Arrow schema of an indicator table: period columns, optional city, then
/// one nullable Float64 per indicator in fixed order.
pub fn indicator_schema(with_city: bool) -> Schema {
    let mut fields = vec![
        Field::new(YEAR_COLUMN, DataType::Int32, false),
        Field::new(PERIOD_COLUMN, DataType::UInt32, false),
        Field::new(MONTH_COLUMN, DataType::Utf8, false),
    ];
    if with_city {
        fields.push(Field::new(CITY_COLUMN, DataType::Utf8, false));
    }
    fields.extend(
        Indicator::ALL
            .iter()
            .map(|i| Field::new(i.column(), DataType::Float64, true)),
    );
    Schema::new(fields)
}

/// Build one record batch. Undefined indicators become nulls.
pub fn records_to_batch(records: &[IndicatorRecord], with_city: bool) -> Result<RecordBatch> {
    let schema = Arc::new(indicator_schema(with_city));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.period))),
        Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.month.as_str()))),
    ];
    if with_city {
        columns.push(Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.city.as_deref().unwrap_or_default()),
        )));
    }
    for indicator in Indicator::ALL {
        let values: Float64Array = records.iter().map(|r| r.values.get(indicator)).collect();
        columns.push(Arc::new(values));
    }

    RecordBatch::try_new(schema, columns).context("building indicator record batch")
}

/// Indicator tables as Parquet files under `out_dir`, one file per table.
pub struct ParquetStore {
    config: StoreConfig,
    props: WriterProperties,
}

impl ParquetStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.out_dir)
            .with_context(|| format!("creating store directory {:?}", &config.out_dir))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        Ok(Self { config, props })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replace `<table>.parquet` atomically with `batch`.
    fn write_table(&self, table: &str, batch: &RecordBatch) -> Result<PathBuf> {
        let final_path = self.config.table_path(table);
        let tmp = final_path.with_extension("parquet.tmp");
        write_batch(&tmp, batch, self.props.clone())?;
        fs::rename(&tmp, &final_path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp, final_path))?;
        info!(table, rows = batch.num_rows(), path = %final_path.display(), "wrote table");
        Ok(final_path)
    }
}

pub(crate) fn write_batch(path: &Path, batch: &RecordBatch, props: WriterProperties) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing Arrow writer")?;
    Ok(())
}

impl IndicatorSink for ParquetStore {
    fn write_national(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        let batch = records_to_batch(records, false)?;
        let table = self.config.national_table.clone();
        self.write_table(&table, &batch)?;
        Ok(batch.num_rows())
    }

    fn write_city(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        let batch = records_to_batch(records, true)?;
        let table = self.config.city_table.clone();
        self.write_table(&table, &batch)?;
        Ok(batch.num_rows())
    }
}
