// src/process/mod.rs
pub mod clean;
pub mod period;
pub mod table;

use csv::ReaderBuilder;
use std::{fs, io::Cursor, path::Path};
use tracing::debug;

pub use clean::FieldValue;
pub use period::{period_from_path, period_from_stem, SurveyPeriod};
pub use table::SurveyTable;

use crate::error::{SurveyError, SurveyResult};

const SNIFF_LINES: usize = 5;

/// Decode file bytes: UTF-8 when valid, otherwise Latin-1 (every byte is one char).
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Choose between `;` and `,` from the first few lines.
///
/// A delimiter that appears the same non-zero number of times on every
/// sampled line wins; otherwise the one more frequent in the header line.
/// Ties go to `;`.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let header = sample.first()?;

    let consistent = |d: char| {
        let first = header.matches(d).count();
        first > 0 && sample.iter().all(|l| l.matches(d).count() == first)
    };
    match (consistent(';'), consistent(',')) {
        (true, false) => return Some(b';'),
        (false, true) => return Some(b','),
        _ => {}
    }

    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    match (semis, commas) {
        (0, 0) => None,
        (s, c) if c > s => Some(b','),
        _ => Some(b';'),
    }
}

/// Parse the decoded text of one survey extract.
pub fn parse_survey_text(name: &str, text: &str) -> SurveyResult<SurveyTable> {
    let delimiter = sniff_delimiter(text)
        .ok_or_else(|| SurveyError::parse(name, "no `;` or `,` delimiter in header"))?;

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| SurveyError::parse(name, format!("reading header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| SurveyError::parse(name, format!("record {idx}: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        file = name,
        delimiter = %(delimiter as char),
        columns = headers.len(),
        rows = rows.len(),
        "parsed survey table"
    );
    Ok(SurveyTable::new(name, headers, rows))
}

/// Read and parse a survey CSV from disk.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_survey_csv<P: AsRef<Path>>(path: P) -> SurveyResult<SurveyTable> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = fs::read(path)?;
    let text = decode_text(bytes);
    parse_survey_text(&name, &text)
}
