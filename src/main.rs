use anyhow::Result;
use clap::Parser;
use enemdu::{
    discover::{csv_files_in, discover_survey_files, stage_housing_files, stage_survey_files},
    history::History,
    ingest::{RawIngest, RawTable},
    pipeline::run_batch,
    roles::RoleCatalog,
    store::{CsvExport, IndicatorSink, ParquetStore, StoreConfig},
};
use std::{path::PathBuf, time::Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Labor-market indicators from ENEMDU person extracts"
)]
struct Args {
    /// Directory holding the person CSV extracts.
    #[arg(long, env = "ENEMDU_DATA_DIR", default_value = "data/enemdu_persona")]
    data_dir: PathBuf,

    /// Directory holding the housing CSV extracts.
    #[arg(long, env = "ENEMDU_HOUSING_DIR", default_value = "data/enemdu_vivienda")]
    housing_dir: PathBuf,

    /// Directory holding the INEC housing code lists.
    #[arg(long, env = "ENEMDU_CODES_DIR", default_value = "data/codigos_vivienda_inec")]
    codes_dir: PathBuf,

    /// Raw `<year>/<period>/` tree to stage into the data directories first.
    #[arg(long, env = "ENEMDU_RAW_ROOT")]
    stage_from: Option<PathBuf>,

    /// Where indicator tables and exports are written.
    #[arg(long, env = "ENEMDU_OUT_DIR", default_value = "output")]
    out_dir: PathBuf,

    /// JSON role catalog overriding the built-in candidate lists.
    #[arg(long, env = "ENEMDU_ROLES")]
    roles: Option<PathBuf>,

    /// Also load the raw person, housing and code tables into the column store.
    #[arg(long)]
    raw: bool,

    /// Store -404 instead of nulls for blank raw values.
    #[arg(long, env = "USE_SENTINELS")]
    use_sentinels: bool,

    #[arg(long, env = "ENEMDU_HISTORY_DIR", default_value = "history")]
    history_dir: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    info!(?args, "startup");
    let start = Instant::now();

    // ─── 1) configuration ───────────────────────────────────────────
    let custom;
    let catalog = match &args.roles {
        Some(path) => {
            custom = RoleCatalog::from_path(path)?;
            &custom
        }
        None => RoleCatalog::builtin(),
    };
    info!(version = catalog.version, "role catalog loaded");

    // ─── 2) stage & discover ────────────────────────────────────────
    if let Some(raw_root) = &args.stage_from {
        let staged = stage_survey_files(raw_root, &args.data_dir)?;
        let housing = stage_housing_files(raw_root, &args.housing_dir)?;
        info!(
            "{} person and {} housing files staged from {}",
            staged.len(),
            housing.len(),
            raw_root.display()
        );
    }
    let files = discover_survey_files(&args.data_dir)?;
    if files.is_empty() {
        warn!(dir = %args.data_dir.display(), "no survey files found; exit");
        return Ok(());
    }
    info!("{} survey files to process", files.len());

    // ─── 3) compute indicators ──────────────────────────────────────
    let output = run_batch(&files, catalog);
    for failure in &output.failures {
        error!(file = %failure.file, error = %failure.error, "file skipped");
    }

    // ─── 4) persist ─────────────────────────────────────────────────
    let mut sinks: Vec<Box<dyn IndicatorSink>> = vec![
        Box::new(ParquetStore::new(StoreConfig::new(&args.out_dir))?),
        Box::new(CsvExport::new(&args.out_dir)?),
    ];
    for sink in sinks.iter_mut() {
        sink.write_national(&output.national)?;
        sink.write_city(&output.city)?;
    }

    // ─── 5) raw tables ──────────────────────────────────────────────
    if args.raw {
        let history = History::new(&args.history_dir)?;
        for raw in RawTable::ALL {
            let sources = match raw {
                RawTable::Person => files.clone(),
                RawTable::Housing => csv_files_in(&args.housing_dir)?,
                RawTable::Codes => csv_files_in(&args.codes_dir)?,
            };
            let ingest =
                RawIngest::new(raw, &args.out_dir, args.use_sentinels, Some(history.clone()))?;
            let rows = ingest.ingest_all(&sources)?;
            info!(table = raw.name(), files = sources.len(), rows, "raw records loaded");
        }
    }

    info!(
        national = output.national.len(),
        city = output.city.len(),
        failures = output.failures.len(),
        "done in {:?}",
        start.elapsed()
    );
    Ok(())
}
