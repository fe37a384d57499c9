// src/roles/resolve.rs

/// Strip surrounding whitespace (and a stray BOM) and lowercase a column name.
pub fn fold_column_name(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Pick the column for an ordered candidate list.
///
/// - First pass: the first candidate that equals a column name exactly.
/// - Second pass: for each candidate in order, the columns whose name starts
///   with it; the lexicographically smallest such name wins so the choice
///   never depends on column order.
///
/// `columns` must already be folded with [`fold_column_name`].
pub fn resolve_column(columns: &[String], candidates: &[String]) -> Option<usize> {
    for cand in candidates {
        if let Some(idx) = columns.iter().position(|c| c == cand) {
            return Some(idx);
        }
    }

    for cand in candidates {
        let best = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.starts_with(cand.as_str()))
            .min_by(|(ia, a), (ib, b)| a.cmp(b).then(ia.cmp(ib)));
        if let Some((idx, _)) = best {
            return Some(idx);
        }
    }

    None
}
