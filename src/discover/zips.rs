// src/discover/zips.rs
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Extract `zip_path` into `dest`, then every `.zip` it contained into a
/// sibling directory named after that archive's stem, recursively.
/// Archives that cannot be opened are logged and skipped.
pub fn extract_nested_zips(zip_path: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("creating {:?}", dest))?;

    let inner = match extract_archive(zip_path, dest) {
        Ok(inner) => inner,
        Err(e) => {
            warn!(zip = %zip_path.display(), error = %e, "skipping invalid archive");
            return Ok(());
        }
    };

    for nested in inner {
        let subdir = nested.with_extension("");
        extract_nested_zips(&nested, &subdir)?;
    }
    Ok(())
}

/// Returns the paths of any zip files written.
fn extract_archive(zip_path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut inner = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            warn!(name = entry.name(), "unsafe entry path, skipping");
            continue;
        };
        let out = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut target = File::create(&out).with_context(|| format!("creating {:?}", out))?;
        io::copy(&mut entry, &mut target)?;
        debug!(entry = %out.display(), "extracted");

        let is_zip = out
            .extension()
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if is_zip {
            inner.push(out);
        }
    }
    Ok(inner)
}
