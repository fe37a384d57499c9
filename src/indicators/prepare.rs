use std::collections::BTreeMap;
use tracing::debug;

use super::sector::{derive_sectors, sectors_from_codes, Sector};
use crate::error::{SurveyError, SurveyResult};
use crate::process::clean::{clean_income, clean_weight, normalize_text, parse_numeric};
use crate::process::{FieldValue, SurveyTable};
use crate::roles::{Role, RoleCatalog};

/// Width city codes are zero-padded to.
pub const CITY_CODE_WIDTH: usize = 6;

/// Columns picked for each role; `None` for optional roles that did not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub age: usize,
    pub sex: usize,
    pub status: usize,
    pub weight: usize,
    pub income: usize,
    pub study: Option<usize>,
    pub hours: Option<usize>,
    pub industry: Option<usize>,
    pub city: Option<usize>,
    pub sector: Option<usize>,
    pub size: Option<usize>,
    pub tax: Option<usize>,
    pub domestic: Option<usize>,
}

impl ResolvedColumns {
    pub fn resolve(headers: &[String], catalog: &RoleCatalog) -> SurveyResult<Self> {
        let opt = |role| catalog.resolve(headers, role);
        Ok(ResolvedColumns {
            age: catalog.resolve_required(headers, Role::Age)?,
            sex: catalog.resolve_required(headers, Role::Sex)?,
            status: catalog.resolve_required(headers, Role::ActivityStatus)?,
            weight: catalog.resolve_required(headers, Role::Weight)?,
            income: catalog.resolve_required(headers, Role::Income)?,
            study: opt(Role::StudyStatus),
            hours: opt(Role::HoursWorked),
            industry: opt(Role::IndustryCode),
            city: opt(Role::CityCode),
            sector: opt(Role::SectorCode),
            size: opt(Role::EstablishmentSize),
            tax: opt(Role::TaxRegistration),
            domestic: opt(Role::DomesticWorker),
        })
    }

    /// Every column index that resolved, required roles first.
    pub fn picked(&self) -> Vec<usize> {
        let optional = [
            self.study,
            self.hours,
            self.industry,
            self.city,
            self.sector,
            self.size,
            self.tax,
            self.domestic,
        ];
        [self.age, self.sex, self.status, self.weight, self.income]
            .into_iter()
            .chain(optional.into_iter().flatten())
            .collect()
    }
}

/// Study attendance kept both as normalized text and as a numeric code.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyColumn {
    pub text: Vec<String>,
    pub code: Vec<FieldValue>,
}

impl StudyColumn {
    const NOT_STUDYING_CODE: i64 = 2;
    const NOT_STUDYING_TEXT: [&'static str; 5] = ["no", "0", "n", "ninguno", ""];

    pub fn not_studying(&self, row: usize) -> bool {
        self.code[row].is_code(Self::NOT_STUDYING_CODE)
            || Self::NOT_STUDYING_TEXT.contains(&self.text[row].as_str())
    }
}

/// A survey table after column resolution and cleaning, ready for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSurvey {
    pub columns: ResolvedColumns,
    pub age: Vec<FieldValue>,
    pub sex: Vec<FieldValue>,
    pub status: Vec<FieldValue>,
    pub weight: Vec<FieldValue>,
    pub income: Vec<FieldValue>,
    /// `NotApplicable` throughout when no hours column resolved.
    pub hours: Vec<FieldValue>,
    pub study: Option<StudyColumn>,
    /// Trimmed industry code text.
    pub industry: Option<Vec<String>>,
    /// `None` when neither a sector column nor the derivation columns resolved.
    pub sector: Option<Vec<Sector>>,
    /// Zero-padded city code per row; `None` for rows with a blank city.
    pub city: Option<Vec<Option<String>>>,
}

fn numeric(table: &SurveyTable, col: usize) -> Vec<FieldValue> {
    table.column(col).map(parse_numeric).collect()
}

fn optional_numeric(table: &SurveyTable, col: Option<usize>) -> Vec<FieldValue> {
    match col {
        Some(c) => numeric(table, c),
        None => vec![FieldValue::NotApplicable; table.len()],
    }
}

/// Left-pad a city code with zeros to [`CITY_CODE_WIDTH`]; blank codes have no city.
pub fn pad_city_code(raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.is_empty() {
        return None;
    }
    Some(format!("{:0>width$}", code, width = CITY_CODE_WIDTH))
}

impl PreparedSurvey {
    /// Resolve roles and clean every column the engine reads.
    pub fn prepare(table: &SurveyTable, catalog: &RoleCatalog) -> SurveyResult<Self> {
        let columns = ResolvedColumns::resolve(&table.headers, catalog)?;
        // Headers that fold to the same name would make the pick depend on column order.
        if let Some(dup) = columns
            .picked()
            .into_iter()
            .find(|&c| table.headers.iter().filter(|h| **h == table.headers[c]).count() > 1)
        {
            return Err(SurveyError::parse(
                &table.name,
                format!("column `{}` appears more than once", table.headers[dup]),
            ));
        }
        debug!(file = %table.name, ?columns, "resolved survey columns");

        let study = columns.study.map(|c| StudyColumn {
            text: table.column(c).map(normalize_text).collect(),
            code: numeric(table, c),
        });
        let industry = columns
            .industry
            .map(|c| table.column(c).map(|v| v.trim().to_string()).collect());
        let city = columns
            .city
            .map(|c| table.column(c).map(pad_city_code).collect());

        let sector = match (columns.sector, columns.size, columns.tax, columns.domestic) {
            (Some(c), _, _, _) => Some(sectors_from_codes(&numeric(table, c))),
            (None, Some(size), Some(tax), Some(dom)) => Some(derive_sectors(
                &numeric(table, size),
                &numeric(table, tax),
                &numeric(table, dom),
            )),
            _ => None,
        };

        Ok(PreparedSurvey {
            age: numeric(table, columns.age),
            sex: numeric(table, columns.sex),
            status: numeric(table, columns.status),
            weight: table.column(columns.weight).map(clean_weight).collect(),
            income: table.column(columns.income).map(clean_income).collect(),
            hours: optional_numeric(table, columns.hours),
            study,
            industry,
            sector,
            city,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
    }

    pub fn has_hours(&self) -> bool {
        self.columns.hours.is_some()
    }

    /// Row indices per city code, in ascending code order. `None` without a city column.
    pub fn city_groups(&self) -> Option<BTreeMap<String, Vec<usize>>> {
        let city = self.city.as_ref()?;
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, code) in city.iter().enumerate() {
            if let Some(code) = code {
                groups.entry(code.clone()).or_default().push(row);
            }
        }
        Some(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SurveyTable {
        SurveyTable::new(
            "t.csv",
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn pads_city_codes() {
        assert_eq!(pad_city_code("10150").as_deref(), Some("010150"));
        assert_eq!(pad_city_code(" 170150 ").as_deref(), Some("170150"));
        assert_eq!(pad_city_code("  "), None);
    }

    #[test]
    fn missing_required_role_fails() {
        let t = table(&["edad", "sexo", "condact", "fexp"], &[&["20", "1", "1", "1"]]);
        let err = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap_err();
        assert!(matches!(err, crate::SurveyError::ColumnNotFound { role: Role::Income }));
    }

    #[test]
    fn duplicate_folded_headers_are_rejected_in_any_order() {
        for headers in [
            ["edad", "EDAD", "sexo", "condact", "fexp", "ingrl"],
            ["EDAD", "edad", "sexo", "condact", "fexp", "ingrl"],
        ] {
            let t = table(&headers, &[&["30", "12", "1", "1", "1", ""]]);
            let err = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap_err();
            assert!(matches!(err, crate::SurveyError::ParseFailure { .. }));
        }

        // repeats of a column no role uses are harmless
        let t = table(
            &["edad", "sexo", "condact", "fexp", "ingrl", "area", "AREA"],
            &[&["30", "1", "1", "1", "", "1", "1"]],
        );
        assert!(PreparedSurvey::prepare(&t, RoleCatalog::builtin()).is_ok());
    }

    #[test]
    fn optional_roles_degrade() {
        let t = table(&["P03", "P02", "CONDACT", "FEXP", "INGRL"], &[&["20", "1", "1", "1,5", "999999"]]);
        let s = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap();
        assert_eq!(s.weight[0], FieldValue::Value(1.5));
        assert_eq!(s.income[0], FieldValue::Missing);
        assert_eq!(s.hours[0], FieldValue::NotApplicable);
        assert!(!s.has_hours());
        assert!(s.study.is_none());
        assert!(s.industry.is_none());
        assert!(s.sector.is_none());
        assert!(s.city_groups().is_none());
    }

    #[test]
    fn sector_column_beats_derivation() {
        let t = table(
            &["edad", "sexo", "condact", "fexp", "ingrl", "secemp", "p47a", "p49", "p42"],
            &[&["30", "1", "1", "1", "500", "2", "2", "1", "1"]],
        );
        let s = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap();
        assert_eq!(s.sector, Some(vec![Sector::Informal]));
    }

    #[test]
    fn study_text_and_code() {
        let t = table(
            &["edad", "sexo", "condact", "fexp", "ingrl", "p07"],
            &[&["16", "1", "7", "1", "", "2"], &["17", "2", "7", "1", "", " No "], &["18", "1", "7", "1", "", "1"], &["19", "1", "7", "1", "", ""]],
        );
        let s = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap();
        let study = s.study.as_ref().unwrap();
        assert!(study.not_studying(0));
        assert!(study.not_studying(1));
        assert!(!study.not_studying(2));
        assert!(study.not_studying(3));
    }

    #[test]
    fn groups_rows_by_padded_city() {
        let t = table(
            &["edad", "sexo", "condact", "fexp", "ingrl", "ciudad"],
            &[&["30", "1", "1", "1", "", "90150"], &["31", "1", "1", "1", "", "010150"], &["32", "1", "1", "1", "", "10150"], &["33", "1", "1", "1", "", ""]],
        );
        let s = PreparedSurvey::prepare(&t, RoleCatalog::builtin()).unwrap();
        let groups = s.city_groups().unwrap();
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["010150", "090150"]);
        assert_eq!(groups["010150"], vec![1, 2]);
    }
}
