// src/store/csv_export.rs
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use super::IndicatorSink;
use crate::indicators::{Indicator, IndicatorRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes indicator records as spreadsheet-friendly CSV with human labels.
pub struct CsvExport {
    out_dir: PathBuf,
}

impl CsvExport {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating export directory {:?}", &out_dir))?;
        Ok(Self { out_dir })
    }

    pub fn national_path(&self) -> PathBuf {
        self.out_dir.join("indicadores_nacionales.csv")
    }

    pub fn city_path(&self) -> PathBuf {
        self.out_dir.join("indicadores_por_ciudad.csv")
    }
}

pub fn header_row(with_city: bool) -> Vec<&'static str> {
    let mut headers = vec!["Año", "Periodo", "Mes"];
    if with_city {
        headers.push("Ciudad");
    }
    headers.extend(Indicator::ALL.iter().map(|i| i.label()));
    headers
}

fn write_records(path: &Path, records: &[IndicatorRecord], with_city: bool) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut buf = BufWriter::new(file);
    buf.write_all(UTF8_BOM)?;
    let mut w = WriterBuilder::new().from_writer(buf);

    w.write_record(header_row(with_city))?;
    for r in records {
        let mut row = vec![r.year.to_string(), r.period.to_string(), r.month.clone()];
        if with_city {
            row.push(r.city.clone().unwrap_or_default());
        }
        row.extend(
            r.values
                .iter()
                .map(|(_, v)| v.map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        w.write_record(&row)?;
    }
    w.flush()?;
    info!(rows = records.len(), path = %path.display(), "exported csv");
    Ok(records.len())
}

impl IndicatorSink for CsvExport {
    fn write_national(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        write_records(&self.national_path(), records, false)
    }

    fn write_city(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        write_records(&self.city_path(), records, true)
    }
}
