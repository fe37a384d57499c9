// src/roles/mod.rs
pub mod resolve;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs, path::Path};

pub use resolve::{fold_column_name, resolve_column};

use crate::error::{SurveyError, SurveyResult};

/// A semantic field the indicator engine needs out of a survey file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Age,
    Sex,
    ActivityStatus,
    Weight,
    Income,
    StudyStatus,
    HoursWorked,
    IndustryCode,
    CityCode,
    SectorCode,
    EstablishmentSize,
    TaxRegistration,
    DomesticWorker,
}

impl Role {
    /// Roles without which a file cannot be processed at all.
    pub const REQUIRED: [Role; 5] = [
        Role::Age,
        Role::Sex,
        Role::ActivityStatus,
        Role::Weight,
        Role::Income,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Age => "age",
            Role::Sex => "sex",
            Role::ActivityStatus => "activity_status",
            Role::Weight => "weight",
            Role::Income => "income",
            Role::StudyStatus => "study_status",
            Role::HoursWorked => "hours_worked",
            Role::IndustryCode => "industry_code",
            Role::CityCode => "city_code",
            Role::SectorCode => "sector_code",
            Role::EstablishmentSize => "establishment_size",
            Role::TaxRegistration => "tax_registration",
            Role::DomesticWorker => "domestic_worker",
        }
    }

    pub fn is_required(&self) -> bool {
        Role::REQUIRED.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static BUILTIN_ROLES_JSON: &str = include_str!("../../config/roles.json");

static BUILTIN: Lazy<RoleCatalog> = Lazy::new(|| {
    RoleCatalog::from_json(BUILTIN_ROLES_JSON).expect("embedded config/roles.json is valid")
});

/// Ordered column-name candidates per role, loaded from a versioned JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleCatalog {
    pub version: u32,
    roles: BTreeMap<Role, Vec<String>>,
}

impl RoleCatalog {
    /// The catalog shipped with the crate (`config/roles.json`).
    pub fn builtin() -> &'static RoleCatalog {
        &BUILTIN
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut catalog: RoleCatalog =
            serde_json::from_str(text).context("parsing role catalog JSON")?;
        for candidates in catalog.roles.values_mut() {
            for c in candidates.iter_mut() {
                *c = fold_column_name(c);
            }
            candidates.retain(|c| !c.is_empty());
        }
        for role in Role::REQUIRED {
            if catalog.candidates(role).is_empty() {
                bail!("role catalog v{} has no candidates for required role `{}`", catalog.version, role);
            }
        }
        Ok(catalog)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading role catalog {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Candidates for `role` in priority order; empty when the catalog omits the role.
    pub fn candidates(&self, role: Role) -> &[String] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Index into `columns` (already folded) of the column for `role`, if any.
    pub fn resolve(&self, columns: &[String], role: Role) -> Option<usize> {
        resolve_column(columns, self.candidates(role))
    }

    /// Like [`resolve`](Self::resolve) but a miss is a `ColumnNotFound` error.
    pub fn resolve_required(&self, columns: &[String], role: Role) -> SurveyResult<usize> {
        self.resolve(columns, role)
            .ok_or(SurveyError::ColumnNotFound { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_covers_required_roles() {
        let catalog = RoleCatalog::builtin();
        assert_eq!(catalog.version, 1);
        for role in Role::REQUIRED {
            assert!(!catalog.candidates(role).is_empty(), "{role} has no candidates");
        }
        assert_eq!(catalog.candidates(Role::Weight)[0], "fexp");
        assert_eq!(catalog.candidates(Role::CityCode).len(), 4);
    }

    #[test]
    fn candidates_are_case_folded_on_load() {
        let json = r#"{"version": 7, "roles": {
            "age": [" EDAD "], "sex": ["Sexo"], "activity_status": ["CONDACT"],
            "weight": ["FEXP"], "income": ["Ingrl"]
        }}"#;
        let catalog = RoleCatalog::from_json(json).unwrap();
        assert_eq!(catalog.version, 7);
        assert_eq!(catalog.candidates(Role::Age), ["edad".to_string()]);
        assert!(catalog.candidates(Role::CityCode).is_empty());
    }

    #[test]
    fn catalog_missing_required_role_is_rejected() {
        let json = r#"{"version": 1, "roles": {"age": ["edad"]}}"#;
        let err = RoleCatalog::from_json(json).unwrap_err();
        assert!(err.to_string().contains("sex"));
    }

    #[test]
    fn required_miss_reports_the_role() {
        let columns = vec!["edad".to_string(), "sexo".to_string()];
        let err = RoleCatalog::builtin()
            .resolve_required(&columns, Role::Weight)
            .unwrap_err();
        assert!(matches!(err, SurveyError::ColumnNotFound { role: Role::Weight }));
        assert_eq!(err.to_string(), "no column found for required role `weight`");
    }
}
