use crate::roles::fold_column_name;

/// One survey extract held in memory: one row per surveyed person.
#[derive(Debug, Clone)]
pub struct SurveyTable {
    /// Source file name, used in logs and error messages.
    pub name: String,
    /// Column names, stripped and lowercased.
    pub headers: Vec<String>,
    /// Raw cell text; every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl SurveyTable {
    /// Build a table, folding header names and padding/truncating ragged rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| fold_column_name(h)).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        SurveyTable {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    /// Raw text of column `col`, in row order.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[col].as_str())
    }
}
