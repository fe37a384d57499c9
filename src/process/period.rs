use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static YEAR_PERIOD_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\D?(\d{2})").expect("valid period regex"));

const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Survey period a file belongs to, read from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurveyPeriod {
    pub year: i32,
    pub period: u32,
}

impl SurveyPeriod {
    /// Local-calendar month name for the period, `None` outside 1..=12.
    pub fn month_name(&self) -> Option<&'static str> {
        match self.period {
            1..=12 => Some(MONTHS[self.period as usize - 1]),
            _ => None,
        }
    }
}

/// First `YYYY?MM` group of the file stem, e.g. `2019_06_enemdu_persona` → 2019/06.
pub fn period_from_stem(stem: &str) -> Option<SurveyPeriod> {
    let caps = YEAR_PERIOD_RX.captures(stem)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let period = caps.get(2)?.as_str().parse().ok()?;
    Some(SurveyPeriod { year, period })
}

pub fn period_from_path(path: &Path) -> Option<SurveyPeriod> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(period_from_stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_year_and_period_from_stem() {
        let p = period_from_stem("2021_12_enemdu_persona_2021_12").unwrap();
        assert_eq!(p, SurveyPeriod { year: 2021, period: 12 });
        assert_eq!(p.month_name(), Some("Diciembre"));

        let p = period_from_stem("personas_201903").unwrap();
        assert_eq!((p.year, p.period), (2019, 3));
        assert_eq!(p.month_name(), Some("Marzo"));
    }

    #[test]
    fn missing_pattern_or_bad_month() {
        assert!(period_from_stem("enemdu_persona").is_none());
        let p = period_from_stem("2020_13_persona").unwrap();
        assert_eq!(p.month_name(), None);
    }

    #[test]
    fn reads_from_full_path() {
        let p = period_from_path(Path::new("/data/2007/12/2007_12_personas.csv")).unwrap();
        assert_eq!((p.year, p.period), (2007, 12));
    }
}
