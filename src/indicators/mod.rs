// src/indicators/mod.rs
pub mod engine;
pub mod prepare;
pub mod sector;

use std::ops::Index;

pub use engine::{compute, compute_table, population_totals, PopulationTotals, RowSelection};
pub use prepare::PreparedSurvey;
pub use sector::Sector;

/// The fixed set of labor-market indicators, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    GlobalParticipation,
    GrossParticipation,
    Unemployment,
    EmploymentRatio,
    FormalShare,
    InformalShare,
    AdequateEmployment,
    Underemployment,
    UnpaidWork,
    OtherNonFullEmployment,
    AdequateGenderGap,
    WageGenderGap,
    YouthNeet,
    YouthUnemployment,
    ChildLabor,
    ManufacturingShare,
}

impl Indicator {
    pub const COUNT: usize = 16;

    pub const ALL: [Indicator; Indicator::COUNT] = [
        Indicator::GlobalParticipation,
        Indicator::GrossParticipation,
        Indicator::Unemployment,
        Indicator::EmploymentRatio,
        Indicator::FormalShare,
        Indicator::InformalShare,
        Indicator::AdequateEmployment,
        Indicator::Underemployment,
        Indicator::UnpaidWork,
        Indicator::OtherNonFullEmployment,
        Indicator::AdequateGenderGap,
        Indicator::WageGenderGap,
        Indicator::YouthNeet,
        Indicator::YouthUnemployment,
        Indicator::ChildLabor,
        Indicator::ManufacturingShare,
    ];

    /// Dashboard label, as used in CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::GlobalParticipation => "TPG (%)",
            Indicator::GrossParticipation => "TPB (%)",
            Indicator::Unemployment => "TD (%)",
            Indicator::EmploymentRatio => "Empleo Total (%)",
            Indicator::FormalShare => "Formal (%)",
            Indicator::InformalShare => "Informal (%)",
            Indicator::AdequateEmployment => "Adecuado (%)",
            Indicator::Underemployment => "Subempleo (%)",
            Indicator::UnpaidWork => "No Remun. (%)",
            Indicator::OtherNonFullEmployment => "Otro No Pleno (%)",
            Indicator::AdequateGenderGap => "Brecha Adecuado H-M (%)",
            Indicator::WageGenderGap => "Brecha Salarial H-M (%)",
            Indicator::YouthNeet => "NiNi (%)",
            Indicator::YouthUnemployment => "Desempleo Juvenil (%)",
            Indicator::ChildLabor => "Trabajo Infantil (%)",
            Indicator::ManufacturingShare => "Manufactura / Empleo (%)",
        }
    }

    /// Column name in the analytical store.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::GlobalParticipation => "tpg",
            Indicator::GrossParticipation => "tpb",
            Indicator::Unemployment => "td",
            Indicator::EmploymentRatio => "empleo_total",
            Indicator::FormalShare => "formal",
            Indicator::InformalShare => "informal",
            Indicator::AdequateEmployment => "adecuado",
            Indicator::Underemployment => "subempleo",
            Indicator::UnpaidWork => "no_remunerado",
            Indicator::OtherNonFullEmployment => "otro_no_pleno",
            Indicator::AdequateGenderGap => "brecha_adecuado_hm",
            Indicator::WageGenderGap => "brecha_salarial_hm",
            Indicator::YouthNeet => "nini",
            Indicator::YouthUnemployment => "desempleo_juvenil",
            Indicator::ChildLabor => "trabajo_infantil",
            Indicator::ManufacturingShare => "manufactura_empleo",
        }
    }

    /// Signed gaps may leave `[0, 100]`; every other indicator is a share.
    pub fn is_signed_gap(&self) -> bool {
        matches!(
            self,
            Indicator::AdequateGenderGap | Indicator::WageGenderGap
        )
    }

    pub fn from_label(label: &str) -> Option<Indicator> {
        Indicator::ALL.into_iter().find(|i| i.label() == label)
    }
}

/// Indicator → percentage. `None` means "not measurable", which is distinct from 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorValues([Option<f64>; Indicator::COUNT]);

impl IndicatorValues {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.0[indicator as usize]
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        self.0[indicator as usize] = value;
    }

    /// Pairs in output column order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, Option<f64>)> + '_ {
        Indicator::ALL.into_iter().map(move |i| (i, self.get(i)))
    }
}

impl Index<Indicator> for IndicatorValues {
    type Output = Option<f64>;

    fn index(&self, indicator: Indicator) -> &Option<f64> {
        &self.0[indicator as usize]
    }
}

/// One output row: indicators for a survey period, nationally or for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRecord {
    pub year: i32,
    pub period: u32,
    pub month: String,
    /// Six-digit, zero-padded city code; `None` for national rows.
    pub city: Option<String>,
    pub values: IndicatorValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_matches_discriminants() {
        for (pos, ind) in Indicator::ALL.iter().enumerate() {
            assert_eq!(*ind as usize, pos);
        }
    }

    #[test]
    fn labels_round_trip_to_columns() {
        assert_eq!(Indicator::from_label("TD (%)"), Some(Indicator::Unemployment));
        assert_eq!(Indicator::Unemployment.column(), "td");
        assert_eq!(Indicator::from_label("nope"), None);
        let cols: std::collections::HashSet<_> = Indicator::ALL.iter().map(|i| i.column()).collect();
        assert_eq!(cols.len(), Indicator::COUNT);
    }

    #[test]
    fn default_values_are_undefined() {
        let mut v = IndicatorValues::default();
        assert!(v.iter().all(|(_, x)| x.is_none()));
        v.set(Indicator::ChildLabor, Some(0.0));
        assert_eq!(v[Indicator::ChildLabor], Some(0.0));
        assert_eq!(v.get(Indicator::YouthNeet), None);
    }
}
