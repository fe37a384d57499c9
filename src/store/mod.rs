// src/store/mod.rs
pub mod csv_export;
pub mod parquet_store;

use anyhow::Result;

pub use self::csv_export::CsvExport;
pub use self::parquet_store::{indicator_schema, records_to_batch, ParquetStore, StoreConfig};

use crate::indicators::IndicatorRecord;

pub const YEAR_COLUMN: &str = "anio";
pub const PERIOD_COLUMN: &str = "periodo";
pub const MONTH_COLUMN: &str = "mes";
pub const CITY_COLUMN: &str = "ciudad";

/// Destination for computed indicator records.
pub trait IndicatorSink {
    /// Bulk-insert national records; returns the number of rows written.
    fn write_national(&mut self, records: &[IndicatorRecord]) -> Result<usize>;
    /// Bulk-insert per-city records; returns the number of rows written.
    fn write_city(&mut self, records: &[IndicatorRecord]) -> Result<usize>;
}
