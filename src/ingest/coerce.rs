// src/ingest/coerce.rs
use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const SENTINEL_INT: i64 = -404;
pub const SENTINEL_FLOAT: f64 = -404.0;
pub const SENTINEL_STRING: &str = "-404";

const CITY_COLUMN: &str = "ciudad";

const PERSON_FLOAT: &[&str] = &["fexp", "ingrl", "ingpc"];

const PERSON_INT: &[&str] = &[
    "condact", "desempleo", "empleo", "secemp", "estrato", "nnivins", "rama1", "vivienda",
    "grupo1", "hogar", "id_hogar", "id_persona", "id_vivienda", "upm", "p01", "p02", "p03",
    "p04", "p06", "p07", "p09", "p10a", "p10b", "p15", "p20", "p21", "p22", "p23", "p24", "p25",
    "p26", "p27", "p28", "p29", "p32", "p33", "p34", "p35", "p36", "p37", "p38", "p39", "p40",
    "p41", "p42", "p44f", "p46", "p47a", "p47b", "p49", "p50", "p51a", "p51b", "p51c", "p63",
    "p64a", "p64b", "p65", "p66", "p67", "p68a", "p68b", "p69", "p70a", "p70b", "p71a", "p71b",
    "p72a", "p72b", "p73a", "p73b", "p74a", "p74b", "p75", "p76",
];

const PERSON_CODE: &[&str] = &["area", "ciudad", "cod_inf", "periodo", "panelm"];

const HOUSING_FLOAT: &[&str] = &["fexp"];

const HOUSING_INT: &[&str] = &["hogar", "id_hogar", "id_vivienda", "sector", "upm"];

/// Housing questionnaire items, all integer coded.
const HOUSING_QUESTIONS: &[&str] = &[
    "vi01", "vi02", "vi03a", "vi03b", "vi04a", "vi04b", "vi05a", "vi05b", "vi06", "vi07",
    "vi07a", "vi07b", "vi08", "vi09", "vi09a", "vi09b", "vi10", "vi101", "vi102", "vi10a",
    "vi11", "vi12", "vi13", "vi14", "vi141", "vi142", "vi143", "vi144", "vi1511", "vi1512",
    "vi1521", "vi1522", "vi1531", "vi1532", "vi1533", "vi1534", "vi1541", "vi1542", "vi1543",
    "vi1544", "vi1551", "vi1552", "vi1553", "vi1554", "vi1561", "vi1562", "vi1563", "vi1564",
    "vi16", "vi161", "vi162", "vi163", "vi164", "vi165", "vi166", "vi167", "vi168", "vi169",
    "vi1610", "vi1611", "vi1612", "vi1613", "vi1614", "vi17", "vi171", "vi172", "vi173",
    "vi174", "vi175", "vi176", "vi177", "vi178", "vi179", "vi1710", "vi1711", "vi1712",
    "vi1713", "vi1714", "vi18", "vi181", "vi182", "vi183", "vi184", "vi185", "vi186", "vi187",
    "vi188", "vi189", "vi1810", "vi1811", "vi1812", "vi1813", "vi1814",
];

const HOUSING_CODE: &[&str] = &["area", "ciudad", "conglomerado", "estrato", "periodo", "panelm"];

static PERSON_INT_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| PERSON_INT.iter().copied().collect());
static HOUSING_INT_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HOUSING_INT
        .iter()
        .chain(HOUSING_QUESTIONS)
        .copied()
        .collect()
});

/// Storage type of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Int,
    /// Identifier-like text that must keep leading zeros.
    Code,
    Text,
}

/// The raw survey tables loaded alongside the indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawTable {
    Person,
    Housing,
    /// INEC housing code lists; every column is kept as text.
    Codes,
}

impl RawTable {
    pub const ALL: [RawTable; 3] = [RawTable::Person, RawTable::Housing, RawTable::Codes];

    pub fn name(&self) -> &'static str {
        match self {
            RawTable::Person => "enemdu_persona",
            RawTable::Housing => "enemdu_vivienda",
            RawTable::Codes => "codigos_vivienda_inec",
        }
    }

    pub fn kind(&self, column: &str) -> ColumnKind {
        let (floats, ints, codes): (&[&str], &HashSet<&str>, &[&str]) = match self {
            RawTable::Person => (PERSON_FLOAT, &*PERSON_INT_SET, PERSON_CODE),
            RawTable::Housing => (HOUSING_FLOAT, &*HOUSING_INT_SET, HOUSING_CODE),
            RawTable::Codes => return ColumnKind::Text,
        };
        if floats.contains(&column) {
            ColumnKind::Float
        } else if ints.contains(column) {
            ColumnKind::Int
        } else if codes.contains(&column) {
            ColumnKind::Code
        } else {
            ColumnKind::Text
        }
    }

    /// Coercion policy for this table given the caller's sentinel choice.
    /// Code lists never carry sentinels; housing text is trimmed.
    pub fn options(&self, use_sentinels: bool) -> CoerceOptions {
        CoerceOptions {
            use_sentinels: use_sentinels && *self != RawTable::Codes,
            trim_text: *self == RawTable::Housing,
        }
    }
}

/// Parsing policy for blank or malformed cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoerceOptions {
    /// Store -404 markers instead of nulls.
    pub use_sentinels: bool,
    pub trim_text: bool,
}

impl CoerceOptions {
    pub fn float(&self, raw: &str) -> Option<f64> {
        let cleaned: String = raw
            .chars()
            .filter(|c| *c != ' ')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        cleaned
            .parse::<f64>()
            .ok()
            .or(self.use_sentinels.then_some(SENTINEL_FLOAT))
    }

    pub fn int(&self, raw: &str) -> Option<i64> {
        let s = raw.trim();
        let digits = s.strip_prefix('-').unwrap_or(s);
        let parsed = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            s.parse::<i64>().ok()
        } else {
            None
        };
        parsed.or(self.use_sentinels.then_some(SENTINEL_INT))
    }

    pub fn text(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return self.use_sentinels.then(|| SENTINEL_STRING.to_string());
        }
        Some(if self.trim_text { raw.trim() } else { raw }.to_string())
    }

    /// Code columns: text, with `ciudad` zero-padded to six digits.
    pub fn code(&self, column: &str, raw: &str) -> Option<String> {
        if column == CITY_COLUMN && !raw.trim().is_empty() {
            return Some(format!("{:0>6}", raw.trim()));
        }
        self.text(raw)
    }
}
