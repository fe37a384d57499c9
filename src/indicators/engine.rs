use tracing::debug;

use super::prepare::PreparedSurvey;
use super::sector::Sector;
use super::{Indicator, IndicatorValues};
use crate::error::SurveyResult;
use crate::process::SurveyTable;
use crate::roles::RoleCatalog;

const WORKING_AGE: f64 = 15.0;
const MALE: i64 = 1;
const FEMALE: i64 = 2;
const MANUFACTURING_CODE: &str = "3";

/// Rows of a prepared survey an indicator run is restricted to.
#[derive(Debug, Clone, Copy)]
pub enum RowSelection<'a> {
    All,
    Rows(&'a [usize]),
}

/// Boolean row mask plus the expansion-weight total over it.
#[derive(Debug, Clone, PartialEq)]
struct WeightedSubset {
    mask: Vec<bool>,
    weight: f64,
}

/// Weighted totals of the nested population subsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationTotals {
    pub pop: f64,
    pub pet: f64,
    pub pea: f64,
    pub ocu: f64,
}

/// 100 × num / den rounded to two decimals; undefined for a non-positive denominator.
fn pct(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 && den.is_finite() {
        Some(round2(100.0 * num / den))
    } else {
        None
    }
}

/// Two decimals, ties to even. Adding `0.0` turns a `-0.0` result into `0.0`.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0 + 0.0
}

struct Subsets<'a> {
    survey: &'a PreparedSurvey,
    pop: WeightedSubset,
    pet: WeightedSubset,
    pea: WeightedSubset,
    ocu: WeightedSubset,
}

impl<'a> Subsets<'a> {
    fn build(survey: &'a PreparedSurvey, selection: RowSelection<'_>) -> Self {
        let mut base = match selection {
            RowSelection::All => vec![true; survey.len()],
            RowSelection::Rows(rows) => {
                let mut mask = vec![false; survey.len()];
                for &r in rows {
                    mask[r] = true;
                }
                mask
            }
        };
        for (keep, w) in base.iter_mut().zip(&survey.weight) {
            *keep = *keep && w.value().is_some_and(|w| w > 0.0);
        }

        let pop = WeightedSubset::from_mask(survey, base);
        let pet = pop.refine(survey, |r| survey.age[r].at_least(WORKING_AGE));
        let pea = pet.refine(survey, |r| survey.status[r].between(1.0, 8.0));
        let ocu = pea.refine(survey, |r| survey.status[r].between(1.0, 6.0));
        Subsets {
            survey,
            pop,
            pet,
            pea,
            ocu,
        }
    }

    fn totals(&self) -> PopulationTotals {
        PopulationTotals {
            pop: self.pop.weight,
            pet: self.pet.weight,
            pea: self.pea.weight,
            ocu: self.ocu.weight,
        }
    }

    fn status_in(&self, row: usize, codes: &[i64]) -> bool {
        codes.iter().any(|&c| self.survey.status[row].is_code(c))
    }
}

impl WeightedSubset {
    fn from_mask(survey: &PreparedSurvey, mask: Vec<bool>) -> Self {
        let weight = mask
            .iter()
            .zip(&survey.weight)
            .filter(|(m, _)| **m)
            .filter_map(|(_, w)| w.value())
            .fold(0.0, |acc, w| acc + w);
        WeightedSubset { mask, weight }
    }

    fn refine(&self, survey: &PreparedSurvey, pred: impl Fn(usize) -> bool) -> Self {
        let mask = self
            .mask
            .iter()
            .enumerate()
            .map(|(r, &m)| m && pred(r))
            .collect();
        WeightedSubset::from_mask(survey, mask)
    }

    /// Weight of the rows in this subset that also satisfy `pred`.
    fn weight_where(&self, survey: &PreparedSurvey, pred: impl Fn(usize) -> bool) -> f64 {
        self.rows()
            .filter(|&r| pred(r))
            .filter_map(|r| survey.weight[r].value())
            .fold(0.0, |acc, w| acc + w)
    }

    fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(r, &m)| m.then_some(r))
    }
}

fn adequate_gender_gap(s: &Subsets<'_>) -> Option<f64> {
    let survey = s.survey;
    let pea_m = s.pea.weight_where(survey, |r| survey.sex[r].is_code(MALE));
    let pea_f = s.pea.weight_where(survey, |r| survey.sex[r].is_code(FEMALE));
    if pea_m <= 0.0 || pea_f <= 0.0 {
        return None;
    }
    let adequate = |sex: i64| {
        s.ocu.weight_where(survey, |r| {
            survey.sex[r].is_code(sex) && survey.status[r].is_code(1)
        })
    };
    let rate_m = adequate(MALE) / pea_m;
    let rate_f = adequate(FEMALE) / pea_f;
    pct(rate_m - rate_f, rate_m)
}

fn wage_gender_gap(s: &Subsets<'_>) -> Option<f64> {
    let survey = s.survey;
    let mean_income = |sex: i64| -> Option<f64> {
        let (mut total, mut weight, mut n) = (0.0, 0.0, 0usize);
        for r in s.ocu.rows() {
            if !survey.sex[r].is_code(sex) {
                continue;
            }
            if let (Some(inc), Some(w)) = (survey.income[r].value(), survey.weight[r].value()) {
                total += inc * w;
                weight += w;
                n += 1;
            }
        }
        (n > 0 && weight > 0.0).then(|| total / weight)
    };
    let mean_m = mean_income(MALE)?;
    let mean_f = mean_income(FEMALE)?;
    pct(mean_m - mean_f, mean_m)
}

fn youth_neet(s: &Subsets<'_>) -> Option<f64> {
    let survey = s.survey;
    let study = survey.study.as_ref()?;
    let youth = s.pop.refine(survey, |r| survey.age[r].between(15.0, 24.0));
    let neet = youth.weight_where(survey, |r| {
        study.not_studying(r) && s.status_in(r, &[7, 8, 9])
    });
    pct(neet, youth.weight)
}

fn youth_unemployment(s: &Subsets<'_>) -> Option<f64> {
    let survey = s.survey;
    let young_pea = s.pea.refine(survey, |r| survey.age[r].between(18.0, 29.0));
    let unemployed = young_pea.weight_where(survey, |r| s.status_in(r, &[7, 8]));
    pct(unemployed, young_pea.weight)
}

fn child_labor(s: &Subsets<'_>) -> Option<f64> {
    let survey = s.survey;
    let children = s.pop.refine(survey, |r| survey.age[r].between(5.0, 14.0));
    let working = children.weight_where(survey, |r| {
        survey.status[r].between(1.0, 6.0)
            || (survey.has_hours() && survey.hours[r].value().unwrap_or(0.0) > 0.0)
    });
    pct(working, children.weight)
}

fn sector_share(s: &Subsets<'_>, sector: Sector) -> Option<f64> {
    let sectors = s.survey.sector.as_ref()?;
    let num = s.ocu.weight_where(s.survey, |r| sectors[r] == sector);
    pct(num, s.ocu.weight)
}

fn manufacturing_share(s: &Subsets<'_>) -> Option<f64> {
    let industry = s.survey.industry.as_ref()?;
    let num = s
        .ocu
        .weight_where(s.survey, |r| industry[r] == MANUFACTURING_CODE);
    pct(num, s.ocu.weight)
}

/// Weighted POP/PET/PEA/OCU totals over `selection`.
pub fn population_totals(survey: &PreparedSurvey, selection: RowSelection<'_>) -> PopulationTotals {
    Subsets::build(survey, selection).totals()
}

/// Compute every indicator over the selected rows of a prepared survey.
pub fn compute(survey: &PreparedSurvey, selection: RowSelection<'_>) -> IndicatorValues {
    let s = Subsets::build(survey, selection);
    let (pop, pet, pea, ocu) = (s.pop.weight, s.pet.weight, s.pea.weight, s.ocu.weight);
    let ocu_status = |codes: &[i64]| s.ocu.weight_where(survey, |r| s.status_in(r, codes));

    let mut out = IndicatorValues::default();
    out.set(Indicator::GlobalParticipation, pct(pea, pet));
    out.set(Indicator::GrossParticipation, pct(pea, pop));
    out.set(
        Indicator::Unemployment,
        pct(s.pea.weight_where(survey, |r| s.status_in(r, &[7, 8])), pea),
    );
    out.set(Indicator::EmploymentRatio, pct(ocu, pea));
    out.set(Indicator::FormalShare, sector_share(&s, Sector::Formal));
    out.set(Indicator::InformalShare, sector_share(&s, Sector::Informal));
    out.set(Indicator::AdequateEmployment, pct(ocu_status(&[1]), pea));
    out.set(Indicator::Underemployment, pct(ocu_status(&[2, 3]), pea));
    out.set(Indicator::UnpaidWork, pct(ocu_status(&[5]), pea));
    out.set(Indicator::OtherNonFullEmployment, pct(ocu_status(&[4]), pea));
    out.set(Indicator::AdequateGenderGap, adequate_gender_gap(&s));
    out.set(Indicator::WageGenderGap, wage_gender_gap(&s));
    out.set(Indicator::YouthNeet, youth_neet(&s));
    out.set(Indicator::YouthUnemployment, youth_unemployment(&s));
    out.set(Indicator::ChildLabor, child_labor(&s));
    out.set(Indicator::ManufacturingShare, manufacturing_share(&s));

    debug!(pop, pet, pea, ocu, "computed indicators");
    out
}

/// Prepare a raw table and compute its national indicators.
pub fn compute_table(table: &SurveyTable, catalog: &RoleCatalog) -> SurveyResult<IndicatorValues> {
    let survey = PreparedSurvey::prepare(table, catalog)?;
    Ok(compute(&survey, RowSelection::All))
}
