use anyhow::Result;
use arrow::array::{Array, Float64Array, StringArray};
use enemdu::{
    discover::{csv_files_in, discover_survey_files, stage_housing_files, stage_survey_files},
    history::History,
    indicators::Indicator,
    ingest::{RawIngest, RawTable},
    pipeline::run_batch,
    roles::RoleCatalog,
    store::{CsvExport, IndicatorSink, ParquetStore, StoreConfig},
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::{self, File};
use tempfile::tempdir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const JUNE: &str = "\
ciudad;p02;p03;condact;fexp;ingrl;p07;rama1
10150;1;30;1;100,5;800;2;3
10150;2;28;7;100;;2;
170150;1;45;1;200;650;2;5
170150;2;17;8;150;;1;
;2;52;9;80;;2;
";

const SEPTEMBER: &str = "\
edad,sexo,condact,fexp,ingrl
33,1,1,10,400
41,2,1,10,350
";

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[test]
fn raw_tree_to_indicator_tables() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;

    let raw = dir.path().join("raw");
    let june = raw.join("2021").join("06 Junio");
    let september = raw.join("2021").join("09 Septiembre");
    fs::create_dir_all(&june)?;
    fs::create_dir_all(&september)?;
    fs::write(june.join("enemdu_persona_2021_06.csv"), JUNE)?;
    fs::write(june.join("enemdu_vivienda_2021_06.csv"), "x;y\n1;2\n")?;
    fs::write(september.join("enemdu_persona_2021_09.csv"), SEPTEMBER)?;

    let staged_dir = dir.path().join("staged");
    assert_eq!(stage_survey_files(&raw, &staged_dir)?.len(), 2);
    let files = discover_survey_files(&staged_dir)?;
    assert_eq!(files.len(), 2);

    let output = run_batch(&files, RoleCatalog::builtin());
    assert!(output.failures.is_empty());
    assert_eq!(output.national.len(), 2);
    assert_eq!(output.city.len(), 2);

    let june_rec = &output.national[0];
    assert_eq!((june_rec.year, june_rec.period), (2021, 6));
    assert_eq!(june_rec.month, "Junio");
    // PEA = 100.5 + 100 + 200 + 150, unemployed = 100 + 150
    assert_eq!(june_rec.values[Indicator::Unemployment], Some(45.41));

    let out_dir = dir.path().join("out");
    let mut store = ParquetStore::new(StoreConfig::new(&out_dir))?;
    let mut export = CsvExport::new(&out_dir)?;
    for sink in [&mut store as &mut dyn IndicatorSink, &mut export] {
        assert_eq!(sink.write_national(&output.national)?, 2);
        assert_eq!(sink.write_city(&output.city)?, 2);
    }

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(
        out_dir.join("indicadores_por_ciudad.parquet"),
    )?)?
    .build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let batch = &batches[0];
    let cities = batch
        .column_by_name("ciudad")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(cities.value(0), "010150");
    assert_eq!(cities.value(1), "170150");
    let td = batch
        .column_by_name("td")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(td.value(0), 49.88);

    let csv = fs::read_to_string(out_dir.join("indicadores_nacionales.csv"))?;
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Septiembre"));

    let history = History::new(dir.path().join("history"))?;
    let ingest = RawIngest::new(RawTable::Person, &out_dir, false, Some(history.clone()))?;
    assert_eq!(ingest.ingest_all(&files)?, 7);
    assert_eq!(ingest.ingest_all(&files)?, 0);
    assert_eq!(fs::read_dir(out_dir.join("enemdu_persona"))?.count(), 2);

    let housing_dir = dir.path().join("housing");
    assert_eq!(stage_housing_files(&raw, &housing_dir)?.len(), 1);
    let housing = RawIngest::new(RawTable::Housing, &out_dir, true, Some(history))?;
    assert_eq!(housing.ingest_all(&csv_files_in(&housing_dir)?)?, 1);
    assert!(out_dir
        .join("enemdu_vivienda")
        .join("2021_06_Junio_enemdu_vivienda_2021_06.parquet")
        .is_file());
    Ok(())
}
