// src/pipeline.rs
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{SurveyError, SurveyResult};
use crate::indicators::{compute, IndicatorRecord, PreparedSurvey, RowSelection};
use crate::process::{period_from_path, read_survey_csv, SurveyPeriod, SurveyTable};
use crate::roles::RoleCatalog;

/// A file the batch skipped, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Everything a batch run produced. Records are appended file by file.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub national: Vec<IndicatorRecord>,
    pub city: Vec<IndicatorRecord>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutput {
    /// Concatenate another batch's output after this one.
    pub fn extend(&mut self, other: BatchOutput) {
        self.national.extend(other.national);
        self.city.extend(other.city);
        self.failures.extend(other.failures);
    }
}

/// National record plus one record per city for a single survey file.
#[derive(Debug, Clone)]
pub struct FileIndicators {
    pub national: IndicatorRecord,
    pub cities: Vec<IndicatorRecord>,
}

/// Compute national and per-city indicators for an in-memory table.
pub fn process_table(
    table: &SurveyTable,
    period: SurveyPeriod,
    catalog: &RoleCatalog,
) -> SurveyResult<FileIndicators> {
    let month = period
        .month_name()
        .ok_or_else(|| {
            SurveyError::parse(&table.name, format!("period {:02} is not a month", period.period))
        })?
        .to_string();

    let survey = PreparedSurvey::prepare(table, catalog)?;
    let record = |city: Option<String>, selection: RowSelection<'_>| IndicatorRecord {
        year: period.year,
        period: period.period,
        month: month.clone(),
        city,
        values: compute(&survey, selection),
    };

    let national = record(None, RowSelection::All);
    let cities = match survey.city_groups() {
        Some(groups) => groups
            .iter()
            .map(|(code, rows)| record(Some(code.clone()), RowSelection::Rows(rows)))
            .collect(),
        None => Vec::new(),
    };

    Ok(FileIndicators { national, cities })
}

/// Read one survey CSV and compute its indicators.
#[tracing::instrument(level = "info", skip(path, catalog), fields(path = %path.as_ref().display()))]
pub fn process_file<P: AsRef<Path>>(path: P, catalog: &RoleCatalog) -> SurveyResult<FileIndicators> {
    let path = path.as_ref();
    let period = period_from_path(path).ok_or_else(|| {
        SurveyError::parse(path.display().to_string(), "no YYYY?MM period in file name")
    })?;
    let table = read_survey_csv(path)?;
    process_table(&table, period, catalog)
}

/// Process files strictly one after another. A failing file is logged and
/// recorded; it never stops the batch.
pub fn run_batch(files: &[PathBuf], catalog: &RoleCatalog) -> BatchOutput {
    let start = Instant::now();
    let mut out = BatchOutput::default();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        match process_file(path, catalog) {
            Ok(FileIndicators { national, cities }) => {
                info!(file = %name, cities = cities.len(), "computed indicators");
                out.national.push(national);
                out.city.extend(cities);
            }
            Err(e) => {
                warn!(file = %name, error = %e, "skipping file");
                out.failures.push(FileFailure {
                    file: name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        national = out.national.len(),
        city = out.city.len(),
        failed = out.failures.len(),
        elapsed = ?start.elapsed(),
        "batch complete"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Indicator;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn period(year: i32, period: u32) -> SurveyPeriod {
        SurveyPeriod { year, period }
    }

    fn table(text: &str) -> SurveyTable {
        crate::process::parse_survey_text("t.csv", text).unwrap()
    }

    #[test]
    fn no_city_column_means_no_city_records() {
        let t = table("edad;sexo;condact;fexp;ingrl\n30;1;1;1;500\n25;2;7;1;\n");
        let out = process_table(&t, period(2020, 6), RoleCatalog::builtin()).unwrap();
        assert!(out.cities.is_empty());
        assert_eq!(out.national.month, "Junio");
        assert_eq!(out.national.city, None);
        assert_eq!(out.national.values[Indicator::Unemployment], Some(50.0));
    }

    #[test]
    fn one_record_per_city() {
        let t = table("edad;sexo;condact;fexp;ingrl;ciudad\n30;1;1;1;500;10150\n25;2;7;1;;10150\n40;1;1;2;;170150\n");
        let out = process_table(&t, period(2021, 3), RoleCatalog::builtin()).unwrap();
        let codes: Vec<_> = out.cities.iter().map(|c| c.city.clone().unwrap()).collect();
        assert_eq!(codes, vec!["010150", "170150"]);
        assert_eq!(out.cities[0].values[Indicator::Unemployment], Some(50.0));
        assert_eq!(out.cities[1].values[Indicator::Unemployment], Some(0.0));
        assert!(out.cities.iter().all(|c| c.year == 2021 && c.month == "Marzo"));
    }

    #[test]
    fn missing_study_column_makes_neet_undefined_everywhere() {
        let t = table("edad;sexo;condact;fexp;ingrl;ciudad\n18;1;7;1;;10150\n20;2;8;1;;20150\n");
        let out = process_table(&t, period(2019, 12), RoleCatalog::builtin()).unwrap();
        assert_eq!(out.national.values[Indicator::YouthNeet], None);
        assert!(out.cities.iter().all(|c| c.values[Indicator::YouthNeet].is_none()));
    }

    #[test]
    fn invalid_month_is_a_parse_failure() {
        let t = table("edad;sexo;condact;fexp;ingrl\n30;1;1;1;500\n");
        let err = process_table(&t, period(2020, 13), RoleCatalog::builtin()).unwrap_err();
        assert!(matches!(err, SurveyError::ParseFailure { .. }));
    }

    #[test]
    fn bad_files_do_not_stop_the_batch() -> Result<()> {
        let dir = tempdir()?;
        let good = dir.path().join("2020_06_enemdu_persona.csv");
        fs::write(&good, "edad;sexo;condact;fexp;ingrl;ciudad\n30;1;1;1;500;10150\n")?;
        let no_weight = dir.path().join("2020_09_enemdu_persona.csv");
        fs::write(&no_weight, "edad;sexo;condact;ingrl\n30;1;1;500\n")?;
        let no_period = dir.path().join("enemdu_persona.csv");
        fs::write(&no_period, "edad;sexo;condact;fexp;ingrl\n30;1;1;1;500\n")?;
        let later = dir.path().join("2020_12_enemdu_persona.csv");
        fs::write(&later, "edad,sexo,condact,fexp,ingrl\n30,2,7,1,\n")?;

        let out = run_batch(&[good, no_weight, no_period, later], RoleCatalog::builtin());
        assert_eq!(out.national.len(), 2);
        assert_eq!(out.city.len(), 1);
        assert_eq!(out.failures.len(), 2);
        assert!(out.failures[0].error.contains("weight"));
        assert_eq!(out.national[1].period, 12);
        assert_eq!(out.national[1].values[Indicator::Unemployment], Some(100.0));
        Ok(())
    }
}
