// src/discover/mod.rs
pub mod zips;

use anyhow::{Context, Result};
use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub use zips::extract_nested_zips;

use crate::process::period_from_path;

static PERSONAS_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"personas.*\.csv$").expect("valid regex"));
static PERSONA_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"persona(?:[^s].*)?\.csv$").expect("valid regex"));
static HOUSING_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"viv.*\.csv$").expect("valid regex"));

/// Whether `name` is the person-level extract for `year`. The publisher
/// renamed files over time: `personas*` up to 2018, `persona*` from 2020
/// (excluding the ICT module), both in 2019.
pub fn matches_person_file(name: &str, year: i32) -> bool {
    let lower = name.to_lowercase();
    let plural = PERSONAS_RX.is_match(&lower);
    let singular = PERSONA_RX.is_match(&lower);
    match year {
        y if y <= 2018 => plural,
        2019 => plural || singular,
        _ => singular && !lower.contains("tics"),
    }
}

/// Whether `name` is a housing extract. Full survey databases (`bdd`) and
/// the ICT module are excluded.
pub fn matches_housing_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    HOUSING_RX.is_match(&lower) && !lower.contains("bdd") && !lower.contains("tics")
}

/// `<year>_<period with spaces as _>_<name>`
pub fn staged_name(year: &str, period: &str, name: &str) -> String {
    format!("{}_{}_{}", year, period.replace(' ', "_"), name)
}

/// Every `*.csv` under `root` whose stem names a person extract and carries
/// a year/period, sorted by path.
pub fn discover_survey_files(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.csv", root.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("bad glob pattern {}", pattern))?
        .flatten()
        .filter(|p| {
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            stem.contains("persona") && period_from_path(p).is_some()
        })
        .collect();
    files.sort();
    debug!(count = files.len(), root = %root.display(), "discovered survey files");
    Ok(files)
}

/// Sorted `*.csv` files directly inside `dir`; none when `dir` is missing.
pub fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let pattern = format!("{}/*.csv", dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)?.flatten().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

/// Walk `<raw_root>/<year>/<period>/`, copying person CSVs (loose or inside
/// nested zips) into `staged_dir` under their staged names. Targets that
/// already exist are left alone. Returns the newly staged paths.
pub fn stage_survey_files(raw_root: &Path, staged_dir: &Path) -> Result<Vec<PathBuf>> {
    stage_matching(raw_root, staged_dir, "person", matches_person_file)
}

/// Same walk as [`stage_survey_files`] for housing CSVs.
pub fn stage_housing_files(raw_root: &Path, staged_dir: &Path) -> Result<Vec<PathBuf>> {
    stage_matching(raw_root, staged_dir, "housing", |name, _| matches_housing_file(name))
}

fn stage_matching(
    raw_root: &Path,
    staged_dir: &Path,
    kind: &str,
    matches: impl Fn(&str, i32) -> bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(staged_dir)
        .with_context(|| format!("creating staging directory {:?}", staged_dir))?;
    let mut staged = Vec::new();

    for year_dir in sorted_subdirs(raw_root)? {
        let year_name = dir_name(&year_dir);
        let Ok(year) = year_name.parse::<i32>() else {
            debug!(dir = %year_dir.display(), "not a year directory");
            continue;
        };
        for period_dir in sorted_subdirs(&year_dir)? {
            let period = dir_name(&period_dir);
            info!(year, period = %period, kind, "scanning period");

            let mut candidates = csv_files_under(&period_dir)?;
            let scratch = tempfile::tempdir()?;
            for (i, zip) in files_with_ext(&period_dir, "zip")?.iter().enumerate() {
                let dest = scratch.path().join(i.to_string());
                extract_nested_zips(zip, &dest)?;
                candidates.extend(csv_files_under(&dest)?);
            }

            for src in candidates {
                let name = dir_name(&src);
                if !matches(&name, year) {
                    continue;
                }
                let target = staged_dir.join(staged_name(&year_name, &period, &name));
                if target.exists() {
                    debug!(file = %name, "already staged");
                    continue;
                }
                match fs::copy(&src, &target) {
                    Ok(_) => staged.push(target),
                    Err(e) => warn!(file = %name, error = %e, "copy failed"),
                }
            }
        }
    }
    info!(count = staged.len(), kind, "staged new files");
    Ok(staged)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {:?}", dir))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn files_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.{}", dir.display(), ext);
    let mut files: Vec<PathBuf> = glob(&pattern)?.flatten().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

fn csv_files_under(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_ext(dir, "csv")
}
